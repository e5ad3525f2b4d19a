//! Value objects for block service configuration and state.

use serde::{Deserialize, Serialize};

/// Quorum rule for recovery rounds.
///
/// How many of the requested targets must report replica state before the
/// round may commit. The original system never pins this down, so it is a
/// configuration knob rather than a constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryQuorum {
    /// Any single responding participant suffices (default).
    Any,
    /// Strictly more than half of the requested targets must respond.
    Majority,
    /// Every requested target must respond.
    All,
}

/// Block service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockServiceConfig {
    /// Per-target cap on a single replica-state or commit RPC, in ms.
    pub replica_rpc_timeout_ms: u64,
    /// Deadline for a synchronous block transfer, in ms.
    pub transfer_timeout_ms: u64,
    /// Quorum rule applied to recovery rounds.
    pub quorum: RecoveryQuorum,
    /// Directories known to mirror local blocks (path-info responses).
    pub mirror_dirs: Vec<String>,
}

impl Default for BlockServiceConfig {
    fn default() -> Self {
        Self {
            replica_rpc_timeout_ms: 5_000,
            transfer_timeout_ms: 30_000,
            quorum: RecoveryQuorum::Any,
            mirror_dirs: Vec::new(),
        }
    }
}

/// Lifecycle state of a block entry.
///
/// `Registered → Recovering → Registered`; a failed round returns the entry
/// to `Registered` with the prior record intact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
    /// Stable; reads and copies may proceed.
    Registered,
    /// An exclusive recovery round is in flight.
    Recovering,
}

/// Operation counters for monitoring.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceMetrics {
    pub recoveries_completed: u64,
    pub recoveries_failed: u64,
    pub copies_scheduled: u64,
    pub copies_completed: u64,
    pub copies_failed: u64,
    /// Targets that failed to report during recovery rounds.
    pub degraded_replicas_seen: u64,
}
