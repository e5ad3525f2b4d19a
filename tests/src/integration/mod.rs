//! Cross-operation integration tests.

pub mod copy_flows;
pub mod recovery_flows;

#[cfg(test)]
pub(crate) mod harness {
    use std::sync::Arc;

    use dfs_block_service::test_utils::{
        InMemoryReplicaGateway, InMemoryTransfer, InMemoryVolume, ManualClock,
    };
    use dfs_block_service::{
        BlockId, BlockRecord, BlockRegistry, BlockService, BlockServiceConfig, NodeId,
    };

    pub type TestService =
        BlockService<InMemoryReplicaGateway, InMemoryTransfer, InMemoryVolume, ManualClock>;

    pub struct Harness {
        pub service: Arc<TestService>,
        pub replicas: Arc<InMemoryReplicaGateway>,
        pub transfer: Arc<InMemoryTransfer>,
        pub volume: Arc<InMemoryVolume>,
    }

    pub fn local_node() -> NodeId {
        NodeId::new("dn0", 50010)
    }

    pub fn harness() -> Harness {
        harness_with(BlockServiceConfig::default())
    }

    pub fn harness_with(config: BlockServiceConfig) -> Harness {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let replicas = Arc::new(InMemoryReplicaGateway::new());
        let transfer = Arc::new(InMemoryTransfer::new());
        let volume = Arc::new(InMemoryVolume::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let service = Arc::new(BlockService::new(
            config,
            local_node(),
            Arc::clone(&replicas),
            Arc::clone(&transfer),
            Arc::clone(&volume),
            clock,
        ));
        Harness {
            service,
            replicas,
            transfer,
            volume,
        }
    }

    /// Register a block and back it with bytes on the volume.
    pub fn seed_block(h: &Harness, namespace_id: u64, block_id: u64, length: u64) -> BlockId {
        let id = BlockId::new(namespace_id, block_id, 1);
        let path = format!("/data/vol0/blk_{block_id}");
        h.service
            .register_block(BlockRecord::new(id, length, path.clone()));
        h.volume.put(path, vec![0xCD; length as usize]);
        id
    }
}
