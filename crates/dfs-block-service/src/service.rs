//! # Datanode Block Service
//!
//! The one implementation of [`DatanodeBlockApi`]: owns the per-node block
//! table and services the four block-management RPCs.
//!
//! ## Architecture
//!
//! The service depends on four outbound ports (implemented by adapters at
//! the node runtime):
//! - [`ReplicaGateway`]: replica-state queries and recovery commits to peers
//! - [`BlockTransfer`]: streaming block bytes to a target datanode
//! - [`VolumeReader`]: reading block bytes off the local volume
//! - [`TimeSource`]: clock seam for deadline arithmetic
//!
//! ## Locking discipline
//!
//! Per-block gate in [`BlockEntry`]: recovery holds it exclusively for the
//! whole coordination round, a copy holds it shared for the streaming read.
//! Metadata reads never touch the gate — they clone the current
//! `Arc<BlockRecord>` snapshot. Different blocks proceed fully in parallel.
//!
//! ## Time bounds
//!
//! Every remote wait is capped: replica RPCs by the round deadline and a
//! per-target cap, transfers by the configured transfer timeout. A timeout
//! is always surfaced as a typed error, never a hang.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::timeout;
use uuid::Uuid;

use crate::domain::{
    agree_recovery, check_recovery_commit, invariant_deadline_ahead, quorum_met, BlockEntry,
    BlockId, BlockKey, BlockPathInfo, BlockRecord, BlockServiceConfig, BlockState, BlockTable,
    NodeId, ReplicaState, ServiceMetrics,
};
use crate::events::BlockServiceError;
use crate::ports::inbound::{BlockRegistry, DatanodeBlockApi};
use crate::ports::outbound::{BlockTransfer, ReplicaGateway, TimeSource, VolumeReader};

/// Block-management service for one datanode.
///
/// Thread-safe; share across async tasks via `Arc`. The block table is the
/// only shared mutable resource and all mutation goes through this service.
pub struct BlockService<R, T, V, C>
where
    R: ReplicaGateway,
    T: BlockTransfer,
    V: VolumeReader,
    C: TimeSource,
{
    config: BlockServiceConfig,
    /// This node's own identity; targets equal to it short-circuit locally.
    local_node: NodeId,
    table: BlockTable,
    replicas: Arc<R>,
    transfer: Arc<T>,
    volume: Arc<V>,
    clock: Arc<C>,
    metrics: Arc<RwLock<ServiceMetrics>>,
}

impl<R, T, V, C> BlockService<R, T, V, C>
where
    R: ReplicaGateway,
    T: BlockTransfer + 'static,
    V: VolumeReader + 'static,
    C: TimeSource,
{
    pub fn new(
        config: BlockServiceConfig,
        local_node: NodeId,
        replicas: Arc<R>,
        transfer: Arc<T>,
        volume: Arc<V>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            config,
            local_node,
            table: BlockTable::new(),
            replicas,
            transfer,
            volume,
            clock,
            metrics: Arc::new(RwLock::new(ServiceMetrics::default())),
        }
    }

    /// Snapshot of the operation counters.
    pub fn metrics(&self) -> ServiceMetrics {
        self.metrics.read().clone()
    }

    /// Number of blocks currently registered.
    pub fn block_count(&self) -> usize {
        self.table.len()
    }

    /// Resolve the live entry for `(namespace_id, block.block_id)`.
    ///
    /// The namespace argument takes precedence over the one embedded in the
    /// block identity, matching the wire signature where both travel
    /// separately.
    fn lookup(
        &self,
        namespace_id: u64,
        block: &BlockId,
    ) -> Result<Arc<BlockEntry>, BlockServiceError> {
        self.table
            .entry(&BlockKey::new(namespace_id, block.block_id))
            .ok_or(BlockServiceError::BlockNotFound {
                namespace_id,
                block_id: block.block_id,
            })
    }

    /// Query every target for its replica state, bounded by the round
    /// deadline and the per-target RPC cap. Targets that fail or time out
    /// are excluded and reported back as degraded.
    async fn gather_reports(
        &self,
        round_id: Uuid,
        local: &BlockRecord,
        namespace_id: u64,
        block: &BlockId,
        targets: &[NodeId],
        deadline_ms: u64,
    ) -> (Vec<ReplicaState>, Vec<NodeId>) {
        let mut reports = Vec::with_capacity(targets.len());
        let mut degraded = Vec::new();

        for target in targets {
            if *target == self.local_node {
                reports.push(ReplicaState::new(
                    self.local_node.clone(),
                    local.id.generation_stamp,
                    local.length,
                ));
                continue;
            }

            let remaining = deadline_ms.saturating_sub(self.clock.now_ms());
            if remaining == 0 {
                tracing::warn!(
                    %round_id,
                    node = %target,
                    "replica degraded: round deadline reached before query"
                );
                degraded.push(target.clone());
                continue;
            }

            let budget = remaining.min(self.config.replica_rpc_timeout_ms);
            let query = self.replicas.replica_state(target, namespace_id, *block);
            match timeout(Duration::from_millis(budget), query).await {
                Ok(Ok(state)) => reports.push(state),
                Ok(Err(err)) => {
                    tracing::warn!(
                        %round_id,
                        node = %target,
                        error = %err,
                        "replica degraded: state query failed"
                    );
                    degraded.push(target.clone());
                }
                Err(_) => {
                    tracing::warn!(
                        %round_id,
                        node = %target,
                        budget_ms = budget,
                        "replica degraded: state query timed out"
                    );
                    degraded.push(target.clone());
                }
            }
        }

        (reports, degraded)
    }

    /// The coordination round proper, run under the exclusive per-block gate.
    #[allow(clippy::too_many_arguments)]
    async fn run_round(
        &self,
        entry: &BlockEntry,
        round_id: Uuid,
        namespace_id: u64,
        block: &BlockId,
        keep_length: bool,
        targets: &[NodeId],
        deadline_ms: u64,
    ) -> Result<BlockRecord, BlockServiceError> {
        let local = entry.snapshot();

        let (reports, degraded) = self
            .gather_reports(round_id, &local, namespace_id, block, targets, deadline_ms)
            .await;
        self.metrics.write().degraded_replicas_seen += degraded.len() as u64;

        if !quorum_met(self.config.quorum, reports.len(), targets.len()) {
            return Err(BlockServiceError::RecoveryFailed {
                block_id: block.block_id,
                responders: reports.len(),
                targets: targets.len(),
            });
        }

        let agreement = agree_recovery(&local, keep_length, &reports).ok_or(
            BlockServiceError::RecoveryFailed {
                block_id: block.block_id,
                responders: 0,
                targets: targets.len(),
            },
        )?;

        check_recovery_commit(
            &local,
            keep_length,
            agreement.generation_stamp,
            agreement.length,
        )
        .map_err(|violation| {
            tracing::error!(%round_id, ?violation, "recovery agreement rejected");
            BlockServiceError::RecoveryFailed {
                block_id: block.block_id,
                responders: agreement.responders,
                targets: targets.len(),
            }
        })?;

        // Push the agreement to remote responders. A participant that drops
        // out here stays on the replica list but keeps its old stamp until
        // the next round; the local commit below stays authoritative.
        for state in &reports {
            if state.node == self.local_node {
                continue;
            }
            let remaining = deadline_ms.saturating_sub(self.clock.now_ms());
            let budget = remaining.min(self.config.replica_rpc_timeout_ms).max(1);
            let commit = self.replicas.commit_recovery(
                &state.node,
                namespace_id,
                *block,
                agreement.generation_stamp,
                agreement.length,
            );
            match timeout(Duration::from_millis(budget), commit).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(%round_id, node = %state.node, error = %err, "participant missed recovery commit");
                }
                Err(_) => {
                    tracing::warn!(%round_id, node = %state.node, "recovery commit timed out");
                }
            }
        }

        let replicas = reports.iter().map(|r| r.node.clone()).collect();
        let committed = local.recovered(
            agreement.generation_stamp,
            agreement.length,
            replicas,
            self.clock.now_ms(),
        );
        entry.replace(committed.clone());

        tracing::info!(
            %round_id,
            block_id = block.block_id,
            generation_stamp = committed.id.generation_stamp,
            length = committed.length,
            responders = agreement.responders,
            degraded = degraded.len(),
            "recovery round committed"
        );

        Ok(committed)
    }
}

#[async_trait]
impl<R, T, V, C> DatanodeBlockApi for BlockService<R, T, V, C>
where
    R: ReplicaGateway,
    T: BlockTransfer + 'static,
    V: VolumeReader + 'static,
    C: TimeSource,
{
    async fn recover_block(
        &self,
        requester: NodeId,
        namespace_id: u64,
        block: BlockId,
        keep_length: bool,
        targets: Vec<NodeId>,
        deadline_ms: u64,
    ) -> Result<BlockRecord, BlockServiceError> {
        let now = self.clock.now_ms();
        if !invariant_deadline_ahead(now, deadline_ms) {
            return Err(BlockServiceError::DeadlineExceeded {
                deadline_ms,
                now_ms: now,
            });
        }

        let entry = self.lookup(namespace_id, &block)?;
        let round_id = Uuid::new_v4();
        tracing::info!(
            %round_id,
            requester = %requester,
            namespace_id,
            block_id = block.block_id,
            keep_length,
            targets = targets.len(),
            deadline_ms,
            "recovery round started"
        );

        let _gate = entry.gate.write().await;
        entry.set_state(BlockState::Recovering);
        let result = self
            .run_round(
                &entry,
                round_id,
                namespace_id,
                &block,
                keep_length,
                &targets,
                deadline_ms,
            )
            .await;
        entry.set_state(BlockState::Registered);

        match &result {
            Ok(_) => self.metrics.write().recoveries_completed += 1,
            Err(err) => {
                self.metrics.write().recoveries_failed += 1;
                tracing::warn!(%round_id, error = %err, "recovery round failed");
            }
        }

        result
    }

    async fn get_block_info(
        &self,
        requester: NodeId,
        namespace_id: u64,
        block: BlockId,
    ) -> Result<BlockRecord, BlockServiceError> {
        tracing::debug!(requester = %requester, namespace_id, block_id = block.block_id, "block info");
        self.table
            .snapshot(&BlockKey::new(namespace_id, block.block_id))
            .map(|record| (*record).clone())
            .ok_or(BlockServiceError::BlockNotFound {
                namespace_id,
                block_id: block.block_id,
            })
    }

    async fn copy_block(
        &self,
        requester: NodeId,
        src_namespace_id: u64,
        src_block: BlockId,
        dst_namespace_id: u64,
        dest_block: BlockId,
        target: NodeId,
        asynchronous: bool,
    ) -> Result<(), BlockServiceError> {
        let entry = self.lookup(src_namespace_id, &src_block)?;
        tracing::info!(
            requester = %requester,
            to = %target,
            src_block_id = src_block.block_id,
            dest_block_id = dest_block.block_id,
            asynchronous,
            "copy requested"
        );

        if asynchronous {
            self.metrics.write().copies_scheduled += 1;
            let volume = Arc::clone(&self.volume);
            let transfer = Arc::clone(&self.transfer);
            let metrics = Arc::clone(&self.metrics);
            let transfer_timeout_ms = self.config.transfer_timeout_ms;
            tokio::spawn(async move {
                let result = stream_block(
                    entry,
                    volume,
                    transfer,
                    target.clone(),
                    dst_namespace_id,
                    dest_block,
                    transfer_timeout_ms,
                )
                .await;
                match result {
                    Ok(()) => {
                        metrics.write().copies_completed += 1;
                        tracing::info!(to = %target, dest_block_id = dest_block.block_id, "background copy finished");
                    }
                    Err(err) => {
                        metrics.write().copies_failed += 1;
                        tracing::warn!(to = %target, error = %err, "background copy failed");
                    }
                }
            });
            return Ok(());
        }

        let result = stream_block(
            entry,
            Arc::clone(&self.volume),
            Arc::clone(&self.transfer),
            target,
            dst_namespace_id,
            dest_block,
            self.config.transfer_timeout_ms,
        )
        .await;
        match &result {
            Ok(()) => self.metrics.write().copies_completed += 1,
            Err(_) => self.metrics.write().copies_failed += 1,
        }
        result
    }

    async fn get_block_path_info(
        &self,
        requester: NodeId,
        namespace_id: u64,
        block: BlockId,
    ) -> Result<BlockPathInfo, BlockServiceError> {
        tracing::debug!(requester = %requester, namespace_id, block_id = block.block_id, "block path info");
        self.table
            .snapshot(&BlockKey::new(namespace_id, block.block_id))
            .map(|record| BlockPathInfo {
                id: record.id,
                local_path: record.path.clone(),
                mirror_dirs: self.config.mirror_dirs.clone(),
            })
            .ok_or(BlockServiceError::BlockNotFound {
                namespace_id,
                block_id: block.block_id,
            })
    }
}

impl<R, T, V, C> BlockRegistry for BlockService<R, T, V, C>
where
    R: ReplicaGateway,
    T: BlockTransfer + 'static,
    V: VolumeReader + 'static,
    C: TimeSource,
{
    fn register_block(&self, record: BlockRecord) {
        tracing::debug!(
            namespace_id = record.id.namespace_id,
            block_id = record.id.block_id,
            generation_stamp = record.id.generation_stamp,
            length = record.length,
            "block registered"
        );
        self.table.insert(record);
    }
}

/// Stream one block to a target under a shared source gate.
///
/// Reading the bytes and writing them to the target share one time budget;
/// exceeding it yields [`BlockServiceError::Timeout`].
async fn stream_block<T, V>(
    entry: Arc<BlockEntry>,
    volume: Arc<V>,
    transfer: Arc<T>,
    target: NodeId,
    namespace_id: u64,
    dest_block: BlockId,
    transfer_timeout_ms: u64,
) -> Result<(), BlockServiceError>
where
    T: BlockTransfer,
    V: VolumeReader,
{
    let _shared = entry.gate.read().await;
    let record = entry.snapshot();

    let send = async {
        let data = volume.read_block(&record.path).await?;
        transfer
            .send_block(&target, namespace_id, dest_block, data)
            .await
    };

    match timeout(Duration::from_millis(transfer_timeout_ms), send).await {
        Ok(result) => result,
        Err(_) => Err(BlockServiceError::Timeout {
            operation: format!("copy of block {} to {}", record.id.block_id, target),
            elapsed_ms: transfer_timeout_ms,
        }),
    }
}
