//! # Recovery Integration Flows
//!
//! Cross-task behavior of `recover_block`: linearization of concurrent
//! rounds, snapshot consistency for lock-free readers, and isolation between
//! blocks.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dfs_block_service::{
        BlockServiceConfig, BlockServiceError, DatanodeBlockApi, NodeId, RecoveryQuorum,
        ReplicaState,
    };

    use crate::integration::harness::{harness, harness_with, local_node, seed_block};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_recoveries_on_one_block_linearize() {
        let h = harness();
        let id = seed_block(&h, 1, 100, 1024);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = Arc::clone(&h.service);
            handles.push(tokio::spawn(async move {
                service
                    .recover_block(local_node(), 1, id, true, vec![local_node()], 600_000)
                    .await
            }));
        }

        for handle in handles {
            handle.await.expect("task").expect("round");
        }

        let record = h
            .service
            .get_block_info(local_node(), 1, id)
            .await
            .expect("present");
        // Initial stamp 1 + exactly one bump per successful round.
        assert_eq!(record.id.generation_stamp, 11);
        assert_eq!(record.length, 1024);
        assert_eq!(h.service.metrics().recoveries_completed, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_observe_torn_records() {
        let h = harness();
        let id = seed_block(&h, 1, 100, 1024);
        let peer = NodeId::new("dn1", 50010);

        // Each round moves stamp and length in lockstep:
        // after round k, stamp = 1 + k and length = 1024 - 100 * k.
        let reader = {
            let service = Arc::clone(&h.service);
            tokio::spawn(async move {
                for _ in 0..2_000 {
                    let record = service
                        .get_block_info(local_node(), 1, id)
                        .await
                        .expect("present");
                    let k = record.id.generation_stamp - 1;
                    assert_eq!(
                        record.length,
                        1024 - 100 * k,
                        "torn record: stamp {} with length {}",
                        record.id.generation_stamp,
                        record.length
                    );
                    tokio::task::yield_now().await;
                }
            })
        };

        for k in 1..=5u64 {
            h.replicas.set_state(
                peer.clone(),
                ReplicaState::new(peer.clone(), k, 1024 - 100 * k),
            );
            h.service
                .recover_block(
                    local_node(),
                    1,
                    id,
                    false,
                    vec![local_node(), peer.clone()],
                    600_000,
                )
                .await
                .expect("round");
        }

        reader.await.expect("reader saw only consistent snapshots");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failed_round_is_isolated_to_its_block() {
        let h = harness();
        let healthy = seed_block(&h, 1, 100, 1024);
        let orphan = seed_block(&h, 1, 200, 2048);
        let dead = NodeId::new("dn9", 50010);
        h.replicas.set_unreachable(dead.clone());

        let ok_round = {
            let service = Arc::clone(&h.service);
            tokio::spawn(async move {
                service
                    .recover_block(local_node(), 1, healthy, true, vec![local_node()], 600_000)
                    .await
            })
        };
        let failed_round = {
            let service = Arc::clone(&h.service);
            tokio::spawn(async move {
                service
                    .recover_block(local_node(), 1, orphan, true, vec![dead], 600_000)
                    .await
            })
        };

        ok_round.await.expect("task").expect("healthy block commits");
        let err = failed_round.await.expect("task").expect_err("no responder");
        assert!(matches!(err, BlockServiceError::RecoveryFailed { .. }));

        let healthy_record = h
            .service
            .get_block_info(local_node(), 1, healthy)
            .await
            .expect("present");
        let orphan_record = h
            .service
            .get_block_info(local_node(), 1, orphan)
            .await
            .expect("present");
        assert_eq!(healthy_record.id.generation_stamp, 2);
        assert_eq!(orphan_record.id.generation_stamp, 1);
    }

    #[tokio::test]
    async fn majority_quorum_rejects_minority_round() {
        let h = harness_with(BlockServiceConfig {
            quorum: RecoveryQuorum::Majority,
            ..Default::default()
        });
        let id = seed_block(&h, 1, 100, 1024);
        let dead_a = NodeId::new("dn8", 50010);
        let dead_b = NodeId::new("dn9", 50010);
        h.replicas.set_unreachable(dead_a.clone());
        h.replicas.set_unreachable(dead_b.clone());

        // 1 of 3 responding is not a majority.
        let err = h
            .service
            .recover_block(
                local_node(),
                1,
                id,
                true,
                vec![local_node(), dead_a, dead_b],
                600_000,
            )
            .await
            .expect_err("minority round");
        assert!(matches!(
            err,
            BlockServiceError::RecoveryFailed {
                responders: 1,
                targets: 3,
                ..
            }
        ));

        let record = h
            .service
            .get_block_info(local_node(), 1, id)
            .await
            .expect("present");
        assert_eq!(record.id.generation_stamp, 1);
    }
}
