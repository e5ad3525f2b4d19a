//! Invariants checked before a recovery round commits.

use super::BlockRecord;

/// INVARIANT-1: Generation stamps only move forward.
pub fn invariant_stamp_monotonic(current: u64, proposed: u64) -> bool {
    proposed > current
}

/// INVARIANT-2: A keep-length round never changes the finalized length.
pub fn invariant_keep_length(keep_length: bool, current: u64, proposed: u64) -> bool {
    !keep_length || proposed == current
}

/// INVARIANT-3: A round only starts while its deadline is ahead of the clock.
pub fn invariant_deadline_ahead(now_ms: u64, deadline_ms: u64) -> bool {
    deadline_ms > now_ms
}

/// Commit check result.
#[derive(Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    StampNotMonotonic,
    LengthChangedOnKeep,
}

/// Check all commit invariants for an agreed `(stamp, length)` pair against
/// the record the round started from.
pub fn check_recovery_commit(
    prior: &BlockRecord,
    keep_length: bool,
    proposed_stamp: u64,
    proposed_length: u64,
) -> Result<(), InvariantViolation> {
    if !invariant_stamp_monotonic(prior.id.generation_stamp, proposed_stamp) {
        return Err(InvariantViolation::StampNotMonotonic);
    }

    if !invariant_keep_length(keep_length, prior.length, proposed_length) {
        return Err(InvariantViolation::LengthChangedOnKeep);
    }

    Ok(())
}
