/// Worker pool tests over the in-memory queue
///
/// Covers:
/// - Claim-execute-complete happy path with terminal events
/// - Retry with exponential backoff, then success
/// - Attempt exhaustion ending in failed with the last error recorded
/// - Non-retryable errors failing immediately
/// - Terminal-write outages and stalled-job recovery
mod utils;

use atsume::modules::jobs::domain::{JobQueue, JobStatus, RetryDisposition};
use atsume::modules::notify::JobEvent;
use atsume::modules::scraper::SourceKind;
use atsume::shared::utils::RetryPolicy;
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use utils::fakes::{EnricherScript, InMemoryQueue, Scripted};
use utils::helpers::{
    build_harness, episode_spec, episode_stubs, run_pool_until_terminal, title_partial,
    title_spec,
};

// ================================================================================================
// HAPPY PATH
// ================================================================================================

#[tokio::test]
async fn worker_drives_a_title_job_to_completed() {
    let harness = build_harness(EnricherScript::Nothing);
    harness
        .otakudesu
        .script_title("one-piece", Scripted::Ok(title_partial("one-piece", "One Piece")));
    harness
        .otakudesu
        .script_episode_list("one-piece", Scripted::Ok(episode_stubs("one-piece", &[1, 2])));

    let job = harness
        .queue
        .enqueue(&title_spec("one-piece", None))
        .await
        .unwrap();

    let pool = harness.worker_pool(1);
    run_pool_until_terminal(&harness, pool, job.id).await;

    let finished = harness.queue.job(job.id).unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.progress, 100);
    assert!(finished.result.is_some());
    assert!(finished.completed_at.is_some());

    // Progress reported over the job's life is monotonic and ends at 100
    let progress = harness.queue.progress_values(job.id);
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(progress.last(), Some(&100));

    let events = harness.publisher.events();
    assert!(events
        .iter()
        .any(|event| matches!(event, JobEvent::JobCompleted { job_id, .. } if *job_id == job.id)));
}

// ================================================================================================
// RETRY & BACKOFF
// ================================================================================================

#[tokio::test]
async fn transient_failures_retry_with_doubling_backoff_then_succeed() {
    let harness = build_harness(EnricherScript::Nothing);
    harness.otakudesu.script_title("flaky", Scripted::Transient);
    harness.otakudesu.script_title("flaky", Scripted::Transient);
    harness
        .otakudesu
        .script_title("flaky", Scripted::Ok(title_partial("flaky", "Flaky")));
    harness
        .otakudesu
        .script_episode_list("flaky", Scripted::Ok(vec![]));
    // The second source fails too, so each attempt exhausts the fallback
    harness.anoboy.script_title("flaky", Scripted::Transient);

    let job = harness
        .queue
        .enqueue(&title_spec("flaky", Some(SourceKind::Otakudesu)))
        .await
        .unwrap();

    let pool = harness.worker_pool(1);
    run_pool_until_terminal(&harness, pool, job.id).await;

    let finished = harness.queue.job(job.id).unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.attempts, 3);

    // Backoff requested between attempts: 2s after the first failure,
    // 4s after the second
    let backoffs = harness.queue.backoff_log.lock().unwrap().clone();
    assert_eq!(
        backoffs,
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
}

#[tokio::test]
async fn attempt_budget_exhaustion_fails_with_last_error() {
    let harness = build_harness(EnricherScript::Nothing);
    harness.otakudesu.script_title("doomed", Scripted::Transient);
    harness.anoboy.script_title("doomed", Scripted::Transient);

    let job = harness
        .queue
        .enqueue(&title_spec("doomed", None))
        .await
        .unwrap();

    let pool = harness.worker_pool(1);
    run_pool_until_terminal(&harness, pool, job.id).await;

    let finished = harness.queue.job(job.id).unwrap();
    assert_eq!(finished.status, JobStatus::Failed);
    assert_eq!(finished.attempts, 3);
    assert!(finished
        .error
        .as_deref()
        .unwrap()
        .contains("No source produced data"));

    let events = harness.publisher.events();
    assert!(events
        .iter()
        .any(|event| matches!(event, JobEvent::JobFailed { job_id, .. } if *job_id == job.id)));
}

#[tokio::test]
async fn requeued_job_is_invisible_until_its_backoff_elapses() {
    let queue = InMemoryQueue::new(
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        },
        true,
    );

    let job = queue.enqueue(&title_spec("slow-lane", None)).await.unwrap();
    assert_eq!(queue.claim().await.unwrap().unwrap().id, job.id);

    let disposition = queue
        .fail_or_retry(job.id, "fetch broke: slow-lane", true)
        .await
        .unwrap();
    let run_at = match disposition {
        RetryDisposition::Requeued { run_at } => run_at,
        RetryDisposition::Failed => panic!("expected a requeue"),
    };
    assert!(run_at > Utc::now());

    // Pending again, but gated behind run_at
    assert_eq!(queue.job(job.id).unwrap().status, JobStatus::Pending);
    assert!(queue.claim().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(80)).await;
    let reclaimed = queue.claim().await.unwrap().unwrap();
    assert_eq!(reclaimed.id, job.id);
    assert_eq!(reclaimed.attempts, 2);
}

// ================================================================================================
// NON-RETRYABLE FAILURES
// ================================================================================================

#[tokio::test]
async fn missing_parent_fails_on_the_first_attempt() {
    let harness = build_harness(EnricherScript::Nothing);

    let job = harness
        .queue
        .enqueue(&episode_spec("orphan", None, uuid::Uuid::new_v4()))
        .await
        .unwrap();

    let pool = harness.worker_pool(1);
    run_pool_until_terminal(&harness, pool, job.id).await;

    let finished = harness.queue.job(job.id).unwrap();
    assert_eq!(finished.status, JobStatus::Failed);
    // A validation error burns no retries
    assert_eq!(finished.attempts, 1);
    assert!(harness.queue.backoff_log.lock().unwrap().is_empty());
}

// ================================================================================================
// TERMINAL-WRITE OUTAGES & STALLED JOBS
// ================================================================================================

#[tokio::test]
async fn terminal_write_retries_until_the_store_recovers() {
    let harness = build_harness(EnricherScript::Nothing);
    harness
        .otakudesu
        .script_title("one-piece", Scripted::Ok(title_partial("one-piece", "One Piece")));
    harness
        .otakudesu
        .script_episode_list("one-piece", Scripted::Ok(episode_stubs("one-piece", &[1])));

    // The first two completion writes are refused; the worker keeps trying
    harness.queue.fail_next_completes(2);

    let job = harness
        .queue
        .enqueue(&title_spec("one-piece", None))
        .await
        .unwrap();

    let pool = harness.worker_pool(1);
    run_pool_until_terminal(&harness, pool, job.id).await;

    let finished = harness.queue.job(job.id).unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert!(finished.completed_at.is_some());

    let events = harness.publisher.events();
    assert!(events
        .iter()
        .any(|event| matches!(event, JobEvent::JobCompleted { job_id, .. } if *job_id == job.id)));
}

#[tokio::test]
async fn stall_sweep_requeues_interrupted_attempts() {
    let harness = build_harness(EnricherScript::Nothing);
    let job = harness
        .queue
        .enqueue(&title_spec("one-piece", None))
        .await
        .unwrap();

    // Claim without finishing, as if the worker died mid-attempt
    assert_eq!(harness.queue.claim().await.unwrap().unwrap().id, job.id);

    // A fresh attempt is not stalled
    assert_eq!(
        harness
            .queue
            .reclaim_stalled(ChronoDuration::hours(1))
            .await
            .unwrap(),
        0
    );

    assert_eq!(
        harness
            .queue
            .reclaim_stalled(ChronoDuration::zero())
            .await
            .unwrap(),
        1
    );
    assert_eq!(harness.queue.job(job.id).unwrap().status, JobStatus::Pending);

    // The recovered job is immediately claimable for another attempt
    let reclaimed = harness.queue.claim().await.unwrap().unwrap();
    assert_eq!(reclaimed.id, job.id);
    assert_eq!(reclaimed.attempts, 2);
}

#[tokio::test]
async fn stall_sweep_fails_jobs_with_no_budget_left() {
    let harness = build_harness(EnricherScript::Nothing);
    let job = harness
        .queue
        .enqueue(&title_spec("one-piece", None))
        .await
        .unwrap();

    // Burn the whole attempt budget on interrupted attempts
    for _ in 0..2 {
        harness.queue.claim().await.unwrap().unwrap();
        harness
            .queue
            .reclaim_stalled(ChronoDuration::zero())
            .await
            .unwrap();
    }
    let last = harness.queue.claim().await.unwrap().unwrap();
    assert_eq!(last.attempts, last.max_attempts);

    assert_eq!(
        harness
            .queue
            .reclaim_stalled(ChronoDuration::zero())
            .await
            .unwrap(),
        1
    );

    let finished = harness.queue.job(job.id).unwrap();
    assert_eq!(finished.status, JobStatus::Failed);
    assert!(finished.completed_at.is_some());
    assert!(finished.error.as_deref().unwrap().contains("stalled"));
}
