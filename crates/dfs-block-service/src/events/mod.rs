//! Error taxonomy for the datanode block service.
//!
//! Every failure is a distinguishable typed variant so callers can decide
//! whether to retry, pick a different node, or abort. None of these are
//! fatal to the service process — a failed operation affects only its own
//! block and caller.

use thiserror::Error;

/// Block service errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockServiceError {
    /// The requested block is absent from the local table. Recoverable by
    /// retrying against another node.
    #[error("Block not found: namespace {namespace_id}, block {block_id}")]
    BlockNotFound { namespace_id: u64, block_id: u64 },

    /// The recovery deadline was already behind the service clock at entry.
    #[error("Deadline exceeded: deadline {deadline_ms} behind clock {now_ms}")]
    DeadlineExceeded { deadline_ms: u64, now_ms: u64 },

    /// A time-bounded operation ran out of budget.
    #[error("{operation} timed out after {elapsed_ms} ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    /// The recovery round could not satisfy its quorum before the deadline.
    #[error("Recovery failed for block {block_id}: {responders}/{targets} participants responded")]
    RecoveryFailed {
        block_id: u64,
        responders: usize,
        targets: usize,
    },

    /// Network or write error while streaming block bytes to a target.
    #[error("Transfer to {target} failed: {reason}")]
    TransferFailed { target: String, reason: String },

    /// A peer could not be reached for a replica-state or commit RPC.
    /// Surfaced by outbound adapters; the recovery round downgrades it to a
    /// logged degraded-replica exclusion.
    #[error("Replica unreachable: {node}")]
    ReplicaUnreachable { node: String },
}
