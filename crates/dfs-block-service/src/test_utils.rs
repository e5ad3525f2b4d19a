//! In-memory port adapters and a manual clock for tests.
//!
//! Available to dependent crates as well — the unified test suite builds a
//! whole service on these.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{BlockId, NodeId, ReplicaState};
use crate::events::BlockServiceError;
use crate::ports::outbound::{BlockTransfer, ReplicaGateway, TimeSource, VolumeReader};

/// Clock that only moves when a test says so.
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Replica gateway backed by a per-node state map.
///
/// Nodes marked unreachable fail every RPC with `ReplicaUnreachable`, as a
/// refused connection would. Commits are recorded for assertions.
pub struct InMemoryReplicaGateway {
    states: RwLock<HashMap<NodeId, ReplicaState>>,
    unreachable: RwLock<HashSet<NodeId>>,
    commits: RwLock<Vec<(NodeId, u64, u64)>>,
}

impl InMemoryReplicaGateway {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            unreachable: RwLock::new(HashSet::new()),
            commits: RwLock::new(Vec::new()),
        }
    }

    pub fn set_state(&self, node: NodeId, state: ReplicaState) {
        self.states.write().insert(node, state);
    }

    pub fn set_unreachable(&self, node: NodeId) {
        self.unreachable.write().insert(node);
    }

    /// Recovery commits received so far: `(node, stamp, length)`.
    pub fn commits(&self) -> Vec<(NodeId, u64, u64)> {
        self.commits.read().clone()
    }

    fn check_reachable(&self, node: &NodeId) -> Result<(), BlockServiceError> {
        if self.unreachable.read().contains(node) {
            return Err(BlockServiceError::ReplicaUnreachable {
                node: node.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryReplicaGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplicaGateway for InMemoryReplicaGateway {
    async fn replica_state(
        &self,
        node: &NodeId,
        _namespace_id: u64,
        _block: BlockId,
    ) -> Result<ReplicaState, BlockServiceError> {
        self.check_reachable(node)?;
        self.states
            .read()
            .get(node)
            .cloned()
            .ok_or(BlockServiceError::ReplicaUnreachable {
                node: node.to_string(),
            })
    }

    async fn commit_recovery(
        &self,
        node: &NodeId,
        _namespace_id: u64,
        _block: BlockId,
        generation_stamp: u64,
        length: u64,
    ) -> Result<(), BlockServiceError> {
        self.check_reachable(node)?;
        self.commits
            .write()
            .push((node.clone(), generation_stamp, length));
        Ok(())
    }
}

/// One recorded outbound transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentBlock {
    pub target: NodeId,
    pub namespace_id: u64,
    pub block: BlockId,
    pub bytes: usize,
}

/// Transfer client that records sends instead of hitting the network.
pub struct InMemoryTransfer {
    sent: RwLock<Vec<SentBlock>>,
    failing: RwLock<HashSet<NodeId>>,
    delay_ms: AtomicU64,
}

impl InMemoryTransfer {
    pub fn new() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            failing: RwLock::new(HashSet::new()),
            delay_ms: AtomicU64::new(0),
        }
    }

    pub fn set_failing(&self, node: NodeId) {
        self.failing.write().insert(node);
    }

    /// Delay every send, for timeout tests under a paused runtime.
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentBlock> {
        self.sent.read().clone()
    }
}

impl Default for InMemoryTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockTransfer for InMemoryTransfer {
    async fn send_block(
        &self,
        target: &NodeId,
        namespace_id: u64,
        block: BlockId,
        data: Vec<u8>,
    ) -> Result<(), BlockServiceError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        if self.failing.read().contains(target) {
            return Err(BlockServiceError::TransferFailed {
                target: target.to_string(),
                reason: "connection refused".into(),
            });
        }

        self.sent.write().push(SentBlock {
            target: target.clone(),
            namespace_id,
            block,
            bytes: data.len(),
        });
        Ok(())
    }
}

/// Volume holding block files in a path-keyed map.
pub struct InMemoryVolume {
    blocks: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryVolume {
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    pub fn put(&self, path: impl Into<String>, data: Vec<u8>) {
        self.blocks.write().insert(path.into(), data);
    }
}

impl Default for InMemoryVolume {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VolumeReader for InMemoryVolume {
    async fn read_block(&self, path: &str) -> Result<Vec<u8>, BlockServiceError> {
        self.blocks
            .read()
            .get(path)
            .cloned()
            .ok_or(BlockServiceError::TransferFailed {
                target: "local volume".into(),
                reason: format!("no block file at {path}"),
            })
    }
}
