//! Domain layer for the datanode block service.
//!
//! Pure types and logic, no I/O:
//!
//! - `entities`: block identity, records, peers, replica reports
//! - `value_objects`: configuration, lifecycle state, metrics
//! - `table`: the concurrent per-node block table
//! - `services`: recovery agreement computation
//! - `invariants`: commit checks for recovery rounds

pub mod entities;
pub mod invariants;
pub mod services;
pub mod table;
pub mod value_objects;

pub use entities::{BlockId, BlockKey, BlockPathInfo, BlockRecord, NodeId, ReplicaState};
pub use invariants::{
    check_recovery_commit, invariant_deadline_ahead, invariant_keep_length,
    invariant_stamp_monotonic, InvariantViolation,
};
pub use services::{agree_recovery, quorum_met, RecoveryAgreement};
pub use table::{BlockEntry, BlockTable};
pub use value_objects::{BlockServiceConfig, BlockState, RecoveryQuorum, ServiceMetrics};
