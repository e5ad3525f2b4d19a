//! Outbound ports (SPI) for the datanode block service.
//!
//! Implemented by adapters at the node runtime: the peer RPC client, the
//! data-transfer client, and the local volume. The service only sees these
//! traits.

use async_trait::async_trait;

use crate::domain::{BlockId, NodeId, ReplicaState};
use crate::events::BlockServiceError;

/// Peer coordination interface for recovery rounds.
#[async_trait]
pub trait ReplicaGateway: Send + Sync {
    /// Ask a participant for its current stamp and length for `block`.
    async fn replica_state(
        &self,
        node: &NodeId,
        namespace_id: u64,
        block: BlockId,
    ) -> Result<ReplicaState, BlockServiceError>;

    /// Push the agreed `(stamp, length)` to a responding participant.
    async fn commit_recovery(
        &self,
        node: &NodeId,
        namespace_id: u64,
        block: BlockId,
        generation_stamp: u64,
        length: u64,
    ) -> Result<(), BlockServiceError>;
}

/// Data-transfer interface for block copies.
#[async_trait]
pub trait BlockTransfer: Send + Sync {
    /// Write `data` to `target` under `block`'s identity in `namespace_id`.
    async fn send_block(
        &self,
        target: &NodeId,
        namespace_id: u64,
        block: BlockId,
        data: Vec<u8>,
    ) -> Result<(), BlockServiceError>;
}

/// Read access to block bytes on the local volume.
#[async_trait]
pub trait VolumeReader: Send + Sync {
    /// Read the full byte content of the block file at `path`.
    async fn read_block(&self, path: &str) -> Result<Vec<u8>, BlockServiceError>;
}

/// Clock seam so deadline arithmetic is testable.
pub trait TimeSource: Send + Sync {
    /// Current unix time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time source used outside tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
