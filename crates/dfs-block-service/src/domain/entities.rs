//! # Core Domain Entities
//!
//! Defines the fundamental data structures for datanode block management.
//!
//! ## Entities
//!
//! - [`BlockId`]: Versioned block identity (namespace, id, generation stamp)
//! - [`BlockKey`]: Table lookup key (namespace, id) — stamp excluded
//! - [`NodeId`]: Peer datanode identity (host, port)
//! - [`BlockRecord`]: Authoritative per-block metadata held by this node
//! - [`ReplicaState`]: A participant's report during a recovery round
//! - [`BlockPathInfo`]: Local path plus mirror directories for trusted
//!   co-located readers

use serde::{Deserialize, Serialize};

/// Versioned identity of one block.
///
/// The generation stamp is a monotonically increasing version counter,
/// bumped by every successful recovery. Two `BlockId`s with equal
/// `(namespace_id, block_id)` but different stamps name different versions
/// of the same block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId {
    /// Partitioning identifier separating otherwise-colliding id spaces.
    pub namespace_id: u64,
    /// Numeric block identifier within the namespace.
    pub block_id: u64,
    /// Version counter, bumped on each recovery.
    pub generation_stamp: u64,
}

impl BlockId {
    /// Creates a new block identity.
    pub fn new(namespace_id: u64, block_id: u64, generation_stamp: u64) -> Self {
        Self {
            namespace_id,
            block_id,
            generation_stamp,
        }
    }

    /// Lookup key for this identity (drops the generation stamp).
    pub fn key(&self) -> BlockKey {
        BlockKey {
            namespace_id: self.namespace_id,
            block_id: self.block_id,
        }
    }
}

/// Block table lookup key.
///
/// The generation stamp is versioning metadata, not part of the key: a
/// caller holding a stale stamp must still be able to resolve the block
/// (recovery is exactly the operation that runs with a stale view).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockKey {
    pub namespace_id: u64,
    pub block_id: u64,
}

impl BlockKey {
    pub fn new(namespace_id: u64, block_id: u64) -> Self {
        Self {
            namespace_id,
            block_id,
        }
    }
}

/// Identity of a peer datanode.
///
/// Pure reference — the service never owns the peer, only addresses it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub host: String,
    pub port: u16,
}

impl NodeId {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Authoritative metadata for one block stored on this node.
///
/// Owned exclusively by the block service. The length is immutable once
/// finalized unless a recovery round with `keep_length = false` truncates
/// it to the shortest valid replica.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Versioned identity, including the current generation stamp.
    pub id: BlockId,
    /// Finalized length in bytes.
    pub length: u64,
    /// Opaque local storage path.
    pub path: String,
    /// Peer nodes known to hold a replica. Set semantics, order irrelevant.
    pub replicas: Vec<NodeId>,
    /// Unix-millis timestamp of the last time replica state was confirmed.
    pub last_verified: u64,
}

impl BlockRecord {
    pub fn new(id: BlockId, length: u64, path: impl Into<String>) -> Self {
        Self {
            id,
            length,
            path: path.into(),
            replicas: Vec::new(),
            last_verified: 0,
        }
    }

    /// Builder method: set the replica set.
    pub fn with_replicas(mut self, replicas: Vec<NodeId>) -> Self {
        self.replicas = replicas;
        self
    }

    /// Lookup key for this record.
    pub fn key(&self) -> BlockKey {
        self.id.key()
    }

    /// Successor record produced by a committed recovery round.
    pub fn recovered(
        &self,
        generation_stamp: u64,
        length: u64,
        replicas: Vec<NodeId>,
        verified_at: u64,
    ) -> Self {
        Self {
            id: BlockId {
                generation_stamp,
                ..self.id
            },
            length,
            path: self.path.clone(),
            replicas,
            last_verified: verified_at,
        }
    }
}

/// One participant's report during a recovery round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaState {
    pub node: NodeId,
    pub generation_stamp: u64,
    pub length: u64,
}

impl ReplicaState {
    pub fn new(node: NodeId, generation_stamp: u64, length: u64) -> Self {
        Self {
            node,
            generation_stamp,
            length,
        }
    }
}

/// Local path information for a block, for trusted co-located clients that
/// bypass the streaming read path and open the file directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPathInfo {
    pub id: BlockId,
    /// Path of the block file on the local volume.
    pub local_path: String,
    /// Directories known to mirror this block.
    pub mirror_dirs: Vec<String>,
}
