//! # Copy Integration Flows
//!
//! `copy_block` interplay with the rest of the service: source immutability,
//! parallel copies, and contention with recovery on the same block.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dfs_block_service::{BlockId, DatanodeBlockApi, NodeId};

    use crate::integration::harness::{harness, local_node, seed_block};

    #[tokio::test]
    async fn copy_leaves_source_record_untouched() {
        let h = harness();
        let id = seed_block(&h, 1, 100, 1024);
        let target = NodeId::new("dn2", 50010);

        h.service
            .copy_block(
                local_node(),
                1,
                id,
                2,
                BlockId::new(2, 700, 1),
                target,
                false,
            )
            .await
            .expect("target reachable");

        let record = h
            .service
            .get_block_info(local_node(), 1, id)
            .await
            .expect("present");
        assert_eq!(record.id.generation_stamp, 1);
        assert_eq!(record.length, 1024);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_copies_of_different_blocks_all_land() {
        let h = harness();
        let mut handles = Vec::new();
        for i in 0..8u64 {
            let id = seed_block(&h, 1, 100 + i, 512);
            let service = Arc::clone(&h.service);
            handles.push(tokio::spawn(async move {
                service
                    .copy_block(
                        local_node(),
                        1,
                        id,
                        2,
                        BlockId::new(2, 700 + i, 1),
                        NodeId::new("dn2", 50010),
                        false,
                    )
                    .await
            }));
        }

        for handle in handles {
            handle.await.expect("task").expect("copy");
        }
        assert_eq!(h.transfer.sent().len(), 8);
        assert_eq!(h.service.metrics().copies_completed, 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn copy_and_recovery_on_one_block_serialize() {
        let h = harness();
        let id = seed_block(&h, 1, 100, 1024);
        let target = NodeId::new("dn2", 50010);
        // Keep the copy's shared gate held long enough to overlap the round.
        h.transfer.set_delay_ms(50);

        let copy = {
            let service = Arc::clone(&h.service);
            let target = target.clone();
            tokio::spawn(async move {
                service
                    .copy_block(
                        local_node(),
                        1,
                        id,
                        2,
                        BlockId::new(2, 700, 1),
                        target,
                        false,
                    )
                    .await
            })
        };
        let recovery = {
            let service = Arc::clone(&h.service);
            tokio::spawn(async move {
                service
                    .recover_block(local_node(), 1, id, true, vec![local_node()], 600_000)
                    .await
            })
        };

        copy.await.expect("task").expect("copy");
        let record = recovery.await.expect("task").expect("round");
        assert_eq!(record.id.generation_stamp, 2);

        // The copy streamed a consistent pre- or post-recovery snapshot.
        let sent = h.transfer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].bytes, 1024);
    }

    #[tokio::test]
    async fn copy_then_recover_end_to_end() {
        let h = harness();
        let id = seed_block(&h, 1, 100, 1024);

        h.service
            .copy_block(
                local_node(),
                1,
                id,
                2,
                BlockId::new(2, 700, 1),
                NodeId::new("dn2", 50010),
                false,
            )
            .await
            .expect("copy");

        let recovered = h
            .service
            .recover_block(local_node(), 1, id, true, vec![local_node()], 600_000)
            .await
            .expect("round");
        assert_eq!(recovered.id.generation_stamp, 2);
        assert_eq!(recovered.length, 1024);
    }
}
