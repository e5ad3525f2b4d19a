//! Pure domain logic for recovery agreement.
//!
//! Everything here is side-effect free: the application service gathers
//! replica reports over the network, then hands them to these functions to
//! compute what the round agreed on.

use super::{BlockRecord, RecoveryQuorum, ReplicaState};

/// Result of a recovery agreement over the responding participants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryAgreement {
    /// Agreed generation stamp: max over local + responders, plus one.
    pub generation_stamp: u64,
    /// Agreed finalized length.
    pub length: u64,
    /// Number of participants that reported.
    pub responders: usize,
}

/// Computes the agreement for one recovery round.
///
/// - New stamp: `max(local stamp, reported stamps) + 1`. Folding the local
///   stamp in keeps the stamp strictly increasing even when the local node
///   was not among the requested targets.
/// - New length: the local record's length when `keep_length`, otherwise
///   the minimum reported length (truncation to the shortest valid replica).
///
/// Returns `None` when no participant reported — the round cannot commit.
pub fn agree_recovery(
    local: &BlockRecord,
    keep_length: bool,
    reports: &[ReplicaState],
) -> Option<RecoveryAgreement> {
    if reports.is_empty() {
        return None;
    }

    let max_reported = reports
        .iter()
        .map(|r| r.generation_stamp)
        .max()
        .unwrap_or(0);
    let generation_stamp = local.id.generation_stamp.max(max_reported) + 1;

    let length = if keep_length {
        local.length
    } else {
        reports.iter().map(|r| r.length).min().unwrap_or(local.length)
    };

    Some(RecoveryAgreement {
        generation_stamp,
        length,
        responders: reports.len(),
    })
}

/// Whether the configured quorum is satisfied by `responders` out of
/// `targets` requested participants.
pub fn quorum_met(quorum: RecoveryQuorum, responders: usize, targets: usize) -> bool {
    match quorum {
        RecoveryQuorum::Any => responders >= 1,
        RecoveryQuorum::Majority => responders * 2 > targets,
        RecoveryQuorum::All => responders == targets && targets > 0,
    }
}
