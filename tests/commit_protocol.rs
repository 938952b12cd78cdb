//! End-to-end commit arbitration scenarios driven through the public facade.

use std::sync::Arc;
use std::time::{Duration, Instant};

use commitgate::{
    CoordinatorConfig, CoordinatorMessage, OutputCommitCoordinator, TaskEndReason,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn start_coordinator() -> OutputCommitCoordinator {
    init_tracing();
    OutputCommitCoordinator::start(CoordinatorConfig::development()).unwrap()
}

#[tokio::test]
async fn speculation_race_has_one_winner() {
    let coordinator = start_coordinator();
    coordinator.stage_start(5).await;

    assert!(coordinator.can_commit(5, 9, 100).await.unwrap());
    assert!(!coordinator.can_commit(5, 9, 101).await.unwrap());

    coordinator
        .task_completed(5, 9, 100, TaskEndReason::Success)
        .await;
    assert!(!coordinator.can_commit(5, 9, 102).await.unwrap());

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn failed_committer_hands_slot_to_next_attempt() {
    let coordinator = start_coordinator();
    coordinator.stage_start(5).await;

    assert!(coordinator.can_commit(5, 9, 100).await.unwrap());
    coordinator
        .task_completed(5, 9, 100, TaskEndReason::failure("executor lost"))
        .await;

    assert!(coordinator.can_commit(5, 9, 101).await.unwrap());
    coordinator
        .task_completed(5, 9, 101, TaskEndReason::Success)
        .await;

    let snap = coordinator.metrics();
    assert_eq!(snap.commits_granted, 2);
    assert_eq!(snap.locks_released, 1);

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn stale_completion_does_not_release_the_lock() {
    let coordinator = start_coordinator();
    coordinator.stage_start(5).await;

    assert!(coordinator.can_commit(5, 9, 100).await.unwrap());
    // Attempt 77 was never granted; its failure must not free the slot.
    coordinator
        .task_completed(5, 9, 77, TaskEndReason::failure("disk error"))
        .await;

    assert!(!coordinator.can_commit(5, 9, 101).await.unwrap());
    assert_eq!(coordinator.metrics().locks_released, 0);

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn stage_gating_denies_outside_lifetime() {
    let coordinator = start_coordinator();

    // Before StageStarted.
    assert!(!coordinator.can_commit(7, 0, 1).await.unwrap());

    coordinator.stage_start(7).await;
    assert!(coordinator.can_commit(7, 0, 1).await.unwrap());

    coordinator.stage_end(7).await;
    assert!(!coordinator.can_commit(7, 0, 2).await.unwrap());

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn commit_denied_completion_is_inert() {
    let coordinator = start_coordinator();
    coordinator.stage_start(5).await;

    assert!(coordinator.can_commit(5, 9, 100).await.unwrap());
    coordinator
        .task_completed(
            5,
            9,
            101,
            TaskEndReason::CommitDenied {
                job: 5,
                split: 9,
                attempt: 101,
            },
        )
        .await;

    // The lock is still held by attempt 100.
    assert!(!coordinator.can_commit(5, 9, 102).await.unwrap());

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn stopped_coordinator_denies_promptly() {
    let coordinator = start_coordinator();
    coordinator.stage_start(1).await;
    coordinator.stop().await.unwrap();

    let started = Instant::now();
    assert!(!coordinator.can_commit(1, 0, 0).await.unwrap());
    assert!(!coordinator.can_commit(99, 99, 99).await.unwrap());
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn stage_restart_voids_previous_grants() {
    let coordinator = start_coordinator();
    coordinator.stage_start(5).await;
    assert!(coordinator.can_commit(5, 9, 100).await.unwrap());

    // The driver re-attempts the stage; the old grant must not survive.
    coordinator.stage_start(5).await;
    assert!(coordinator.can_commit(5, 9, 200).await.unwrap());

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn concurrent_attempts_get_exactly_one_grant() {
    let coordinator = Arc::new(start_coordinator());
    coordinator.stage_start(3).await;

    let asks = (0..24).map(|attempt| {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.can_commit(3, 7, attempt).await.unwrap() })
    });
    let verdicts: Vec<bool> = futures::future::join_all(asks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(verdicts.iter().filter(|granted| **granted).count(), 1);
    assert_eq!(coordinator.metrics().commits_granted, 1);
    assert_eq!(coordinator.metrics().commits_denied, 23);

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn wire_traffic_drives_the_same_kernel() {
    let coordinator = start_coordinator();
    let handle = coordinator.handle().await.unwrap();

    let started = CoordinatorMessage::StageStarted { stage: 5 }.encode().unwrap();
    assert_eq!(handle.deliver_encoded(&started).await, None);

    assert!(coordinator.can_commit(5, 9, 100).await.unwrap());

    // Garbage on the wire is dropped without disturbing the dispatcher.
    assert_eq!(handle.deliver_encoded(b"{\"type\":\"Bogus\"}").await, None);
    assert!(!coordinator.can_commit(5, 9, 101).await.unwrap());
    assert_eq!(coordinator.metrics().events_dropped, 1);

    let ended = CoordinatorMessage::StageEnded { stage: 5 }.encode().unwrap();
    assert_eq!(handle.deliver_encoded(&ended).await, None);
    assert!(!coordinator.can_commit(5, 9, 102).await.unwrap());

    // A stop arriving over the wire is acknowledged like any other ask.
    let stop = CoordinatorMessage::StopCoordinator.encode().unwrap();
    assert_eq!(handle.deliver_encoded(&stop).await, Some(true));
    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn completions_before_stage_start_are_tolerated() {
    let coordinator = start_coordinator();

    // Scheduler contract violation: completion for a stage never started.
    coordinator
        .task_completed(4, 0, 1, TaskEndReason::failure("lost"))
        .await;

    coordinator.stage_start(4).await;
    assert!(coordinator.can_commit(4, 0, 2).await.unwrap());

    coordinator.stop().await.unwrap();
}
