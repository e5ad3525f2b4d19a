//! Inbound ports (API) for the datanode block service.
//!
//! The RPC layer is an external collaborator: it decodes requests off the
//! wire, calls these traits with typed arguments, and maps the typed result
//! or [`BlockServiceError`] back onto the transport.

use async_trait::async_trait;

use crate::domain::{BlockId, BlockPathInfo, BlockRecord, NodeId};
use crate::events::BlockServiceError;

/// Primary RPC surface of one datanode's block service.
#[async_trait]
pub trait DatanodeBlockApi: Send + Sync {
    /// Run a recovery round for `block` with the given targets.
    ///
    /// Agrees on a fresh generation stamp (max across participants + 1) and
    /// a final length — the current length when `keep_length`, otherwise the
    /// minimum reported by responding participants. Unresponsive targets are
    /// excluded and logged as degraded, never fatal while the quorum holds.
    ///
    /// # Arguments
    /// * `requester` - Node that initiated the recovery
    /// * `namespace_id` - Namespace the block belongs to
    /// * `block` - Block identity as the requester knows it (stamp may be stale)
    /// * `keep_length` - Preserve the local finalized length
    /// * `targets` - Participants of the round; this node short-circuits locally
    /// * `deadline_ms` - Absolute unix-millis deadline for the whole round
    ///
    /// # Returns
    /// The committed local record.
    async fn recover_block(
        &self,
        requester: NodeId,
        namespace_id: u64,
        block: BlockId,
        keep_length: bool,
        targets: Vec<NodeId>,
        deadline_ms: u64,
    ) -> Result<BlockRecord, BlockServiceError>;

    /// Consistent snapshot of the block's metadata. Pure read.
    async fn get_block_info(
        &self,
        requester: NodeId,
        namespace_id: u64,
        block: BlockId,
    ) -> Result<BlockRecord, BlockServiceError>;

    /// Stream the source block's bytes to `target` under `dest_block`'s
    /// identity in `dst_namespace_id`.
    ///
    /// With `asynchronous` the call returns once the transfer is scheduled;
    /// completion is logged, not reported. Otherwise it blocks until the
    /// transfer finishes, times out, or fails.
    #[allow(clippy::too_many_arguments)]
    async fn copy_block(
        &self,
        requester: NodeId,
        src_namespace_id: u64,
        src_block: BlockId,
        dst_namespace_id: u64,
        dest_block: BlockId,
        target: NodeId,
        asynchronous: bool,
    ) -> Result<(), BlockServiceError>;

    /// Local path plus mirror directories for trusted co-located readers.
    /// Pure read.
    async fn get_block_path_info(
        &self,
        requester: NodeId,
        namespace_id: u64,
        block: BlockId,
    ) -> Result<BlockPathInfo, BlockServiceError>;
}

/// Write-path hook that populates the table.
///
/// Block ingest itself (packet pipeline, checksums) lives outside this
/// crate; finished blocks are handed over through this trait.
pub trait BlockRegistry: Send + Sync {
    /// Insert or replace the record for a finished block.
    fn register_block(&self, record: BlockRecord);
}
