use std::time::Duration;

use tokio::time::sleep;

use super::run_control::{RunControl, RunSignal};
use super::task_queue::SharedTaskQueue;
use crate::application::eventbus::SharedEventBus;
use crate::domain::error::DownloadResult;
use crate::domain::event::DomainEvent;
use crate::domain::model::{DownloadTask, RunSummary, TaskState};
use crate::infrastructure::config::RunConfig;
use crate::infrastructure::fetch::SharedFetcher;
use crate::infrastructure::storage;

/// Retry and skip rules for one run.
#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// Extra attempts after a transient failure
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub skip_existing: bool,
}

impl RunPolicy {
    pub fn new(run: &RunConfig, skip_existing: bool) -> Self {
        Self {
            retry_attempts: run.retry_attempts,
            retry_delay: run.retry_delay,
            skip_existing,
        }
    }
}

/// Everything a run needs besides the queue itself.
#[derive(Clone)]
pub struct RunContext {
    pub fetcher: SharedFetcher,
    pub control: RunControl,
    pub event_bus: SharedEventBus,
    pub policy: RunPolicy,
}

/// How a task that did not fail ended.
enum TaskOutcome {
    Downloaded,
    Skipped,
}

/// Walks the queue one task at a time.
pub struct DownloadOrchestrator {
    queue: SharedTaskQueue,
    ctx: RunContext,
}

impl DownloadOrchestrator {
    pub fn new(queue: SharedTaskQueue, ctx: RunContext) -> Self {
        Self { queue, ctx }
    }

    /// Process every pending task and report the aggregate outcome.
    ///
    /// Task failures are contained; only a fatal error or a cancel ends the
    /// run early, and both leave the untouched tasks queued.
    pub async fn run(&self) -> RunSummary {
        let total = self.queue.read().await.pending_count();
        let mut summary = RunSummary {
            total,
            ..Default::default()
        };
        let mut finished = 0;

        tracing::info!("Run started with {} tasks", total);
        self.ctx.event_bus.publish(DomainEvent::RunStarted { total });

        loop {
            let next_id = match self.queue.read().await.next_pending() {
                Some(task) => task.id.clone(),
                None => break,
            };

            if self.ctx.control.is_paused() {
                self.wait_for_resume(&next_id).await;
            }
            if self.ctx.control.is_cancelled() {
                tracing::info!("Run cancelled");
                summary.cancelled = true;
                break;
            }

            let Some(task) = self.set_state(&next_id, TaskState::InProgress, None).await else {
                break;
            };

            match self.run_task(&task).await {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    let skipped = matches!(outcome, TaskOutcome::Skipped);
                    let message = if skipped {
                        summary.skipped += 1;
                        Some("Already downloaded".to_string())
                    } else {
                        None
                    };
                    self.queue
                        .write()
                        .await
                        .update(&task.id, |t| t.skipped = skipped);
                    self.set_state(&task.id, TaskState::Completed, message).await;
                }
                Err(err) => {
                    summary.failed += 1;
                    tracing::warn!(
                        task_id = %task.id,
                        kind = err.kind(),
                        "{} failed: {}",
                        task.label(),
                        err
                    );
                    let reason = err.to_string();
                    self.queue
                        .write()
                        .await
                        .update(&task.id, |t| t.error = Some(reason.clone()));
                    self.set_state(&task.id, TaskState::Failed, Some(reason.clone()))
                        .await;

                    if err.is_fatal() {
                        tracing::error!("Run halted: {}", reason);
                        self.ctx
                            .event_bus
                            .publish(DomainEvent::FatalError { reason: reason.clone() });
                        summary.halted = Some(reason);
                        break;
                    }
                }
            }

            finished += 1;
            self.ctx
                .event_bus
                .publish(DomainEvent::RunProgress { finished, total });
        }

        summary.remaining = self.queue.read().await.pending_count();
        tracing::info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            remaining = summary.remaining,
            "Run finished"
        );
        self.ctx.event_bus.publish(DomainEvent::RunFinished {
            summary: summary.clone(),
        });
        summary
    }

    /// Hold the next task as Paused until the run is resumed or cancelled.
    async fn wait_for_resume(&self, next_id: &str) {
        self.set_state(next_id, TaskState::Paused, None).await;
        self.ctx.event_bus.publish(DomainEvent::RunPaused);
        tracing::info!("Run paused");

        let signal = self.ctx.control.wait_while_paused().await;

        self.set_state(next_id, TaskState::Queued, None).await;
        if signal == RunSignal::Running {
            tracing::info!("Run resumed");
            self.ctx.event_bus.publish(DomainEvent::RunResumed);
        }
    }

    async fn run_task(&self, task: &DownloadTask) -> DownloadResult<TaskOutcome> {
        let policy = &self.ctx.policy;

        if policy.skip_existing && tokio::fs::try_exists(&task.output_path).await? {
            tracing::info!(task_id = %task.id, "Skipping {}, file exists", task.label());
            return Ok(TaskOutcome::Skipped);
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.queue
                .write()
                .await
                .update(&task.id, |t| t.attempts = attempt);

            match self.attempt(task).await {
                Ok(()) => return Ok(TaskOutcome::Downloaded),
                Err(err) if err.is_transient() && attempt <= policy.retry_attempts => {
                    if self.ctx.control.is_cancelled() {
                        return Err(err);
                    }
                    tracing::warn!(
                        task_id = %task.id,
                        attempt,
                        "Retrying {}: {}",
                        task.label(),
                        err
                    );
                    self.ctx.event_bus.publish(DomainEvent::TaskRetrying {
                        task_id: task.id.clone(),
                        attempt,
                        reason: err.to_string(),
                    });
                    sleep(policy.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(&self, task: &DownloadTask) -> DownloadResult<()> {
        let staged = self.ctx.fetcher.fetch(task).await?;
        storage::place(&staged, &task.output_path).await
    }

    async fn set_state(
        &self,
        id: &str,
        state: TaskState,
        message: Option<String>,
    ) -> Option<DownloadTask> {
        let task = self.queue.write().await.update(id, |t| t.state = state)?;
        self.ctx.event_bus.publish(DomainEvent::TaskStateChanged {
            task_id: task.id.clone(),
            label: task.label(),
            state,
            message,
        });
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::eventbus::create_event_bus;
    use crate::application::service::task_queue::TaskQueue;
    use crate::domain::error::DownloadError;
    use crate::test_support::{animation_task, FakeFetcher};

    const NAMES: [&str; 4] = ["Walking", "Running", "Jumping", "Idle"];

    struct Harness {
        _dir: tempfile::TempDir,
        output: std::path::PathBuf,
        queue: SharedTaskQueue,
        fetcher: Arc<FakeFetcher>,
        control: RunControl,
        event_bus: SharedEventBus,
    }

    impl Harness {
        async fn new(names: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let output = dir.path().join("out");
            let fetcher = Arc::new(FakeFetcher::new(&dir.path().join("staging")));

            let queue = TaskQueue::shared();
            let tasks = names
                .iter()
                .map(|name| animation_task("Remy", name, &output))
                .collect();
            queue.write().await.push_all(tasks);

            Self {
                _dir: dir,
                output,
                queue,
                fetcher,
                control: RunControl::new(),
                event_bus: create_event_bus(),
            }
        }

        fn orchestrator(&self, retry_attempts: u32) -> DownloadOrchestrator {
            let ctx = RunContext {
                fetcher: self.fetcher.clone(),
                control: self.control.clone(),
                event_bus: self.event_bus.clone(),
                policy: RunPolicy {
                    retry_attempts,
                    retry_delay: Duration::from_millis(5),
                    skip_existing: true,
                },
            };
            DownloadOrchestrator::new(self.queue.clone(), ctx)
        }

        async fn states(&self) -> Vec<TaskState> {
            self.queue
                .read()
                .await
                .snapshot()
                .iter()
                .map(|t| t.state)
                .collect()
        }

        fn path(&self, name: &str) -> std::path::PathBuf {
            self.output.join("Remy").join("animations").join(format!("{}.fbx", name))
        }
    }

    fn label(name: &str) -> String {
        format!("Remy / {}", name)
    }

    #[tokio::test]
    async fn test_all_tasks_succeed() {
        let h = Harness::new(&NAMES).await;
        let summary = h.orchestrator(1).run().await;

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.failed, 0);
        assert!(summary.is_clean());
        for name in NAMES {
            assert!(h.path(name).is_file(), "{} missing", name);
        }
        assert_eq!(h.states().await, vec![TaskState::Completed; 4]);
    }

    #[tokio::test]
    async fn test_timeout_fails_only_that_task() {
        let h = Harness::new(&NAMES).await;
        h.fetcher.fail_next(
            &label("Running"),
            DownloadError::DownloadTimeout(Duration::from_secs(120)),
        );

        let summary = h.orchestrator(0).run().await;

        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            h.states().await,
            vec![
                TaskState::Completed,
                TaskState::Failed,
                TaskState::Completed,
                TaskState::Completed
            ]
        );
        assert!(!h.path("Running").exists());
        assert!(h.path("Idle").is_file());

        let failed = &h.queue.read().await.snapshot()[1];
        assert_eq!(
            failed.error.as_deref(),
            Some("Download did not finish within 2m")
        );
    }

    #[tokio::test]
    async fn test_pause_after_task_resumes_with_next() {
        let h = Harness::new(&NAMES).await;
        let control = h.control.clone();
        h.fetcher.on_fetch(move |task| {
            if task.label() == "Remy / Running" {
                control.pause();
            }
        });
        let mut events = h.event_bus.subscribe();

        let orchestrator = Arc::new(h.orchestrator(0));
        let run = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.run().await })
        };

        loop {
            if let DomainEvent::RunPaused = events.recv().await.unwrap() {
                break;
            }
        }
        assert_eq!(h.fetcher.calls(), vec![label("Walking"), label("Running")]);
        assert_eq!(h.states().await[2], TaskState::Paused);

        h.control.resume();
        let summary = run.await.unwrap();

        assert_eq!(summary.succeeded, 4);
        assert_eq!(
            h.fetcher.calls(),
            NAMES.iter().map(|n| label(n)).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let h = Harness::new(&["Walking"]).await;
        h.fetcher
            .fail_next(&label("Walking"), DownloadError::element_not_found("button.download-btn"));

        let mut events = h.event_bus.subscribe();
        let summary = h.orchestrator(1).run().await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(h.fetcher.calls().len(), 2);
        assert_eq!(h.queue.read().await.snapshot()[0].attempts, 2);

        let mut retried = false;
        while let Ok(event) = events.try_recv() {
            if let DomainEvent::TaskRetrying { attempt, .. } = event {
                assert_eq!(attempt, 1);
                retried = true;
            }
        }
        assert!(retried);
    }

    #[tokio::test]
    async fn test_non_transient_failure_not_retried() {
        let h = Harness::new(&["Walking"]).await;
        h.fetcher.fail_next(
            &label("Walking"),
            DownloadError::AuthenticationFailed("token expired".into()),
        );

        let summary = h.orchestrator(3).run().await;

        assert_eq!(summary.failed, 1);
        assert_eq!(h.fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fatal_error_halts_run() {
        let h = Harness::new(&NAMES).await;
        h.fetcher.fail_next(
            &label("Running"),
            DownloadError::BrowserUnavailable("channel closed".into()),
        );
        let mut events = h.event_bus.subscribe();

        let summary = h.orchestrator(1).run().await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.remaining, 2);
        assert!(summary.halted.is_some());
        assert_eq!(
            h.states().await,
            vec![
                TaskState::Completed,
                TaskState::Failed,
                TaskState::Queued,
                TaskState::Queued
            ]
        );

        let mut fatal = false;
        while let Ok(event) = events.try_recv() {
            if let DomainEvent::FatalError { .. } = event {
                fatal = true;
            }
        }
        assert!(fatal);
    }

    #[tokio::test]
    async fn test_cancel_leaves_rest_queued() {
        let h = Harness::new(&NAMES).await;
        let control = h.control.clone();
        h.fetcher.on_fetch(move |task| {
            if task.label() == "Remy / Walking" {
                control.cancel();
            }
        });

        let summary = h.orchestrator(0).run().await;

        assert!(summary.cancelled);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.remaining, 3);
        assert_eq!(h.fetcher.calls(), vec![label("Walking")]);
        assert_eq!(&h.states().await[1..], &[TaskState::Queued; 3]);
    }

    #[tokio::test]
    async fn test_cancel_while_paused() {
        let h = Harness::new(&NAMES).await;
        h.control.pause();
        let control = h.control.clone();
        let canceller = tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            control.cancel();
        });

        let summary = h.orchestrator(0).run().await;
        canceller.await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.remaining, 4);
        assert!(h.fetcher.calls().is_empty());
        assert_eq!(h.states().await, vec![TaskState::Queued; 4]);
    }

    #[tokio::test]
    async fn test_existing_file_is_skipped() {
        let h = Harness::new(&["Walking", "Running"]).await;
        std::fs::create_dir_all(h.path("Walking").parent().unwrap()).unwrap();
        std::fs::write(h.path("Walking"), b"from an earlier run").unwrap();

        let summary = h.orchestrator(0).run().await;

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(h.fetcher.calls(), vec![label("Running")]);
        assert!(h.queue.read().await.snapshot()[0].skipped);
        assert_eq!(
            std::fs::read(h.path("Walking")).unwrap(),
            b"from an earlier run"
        );
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let h = Harness::new(&[]).await;
        let summary = h.orchestrator(0).run().await;
        assert_eq!(summary, RunSummary::default());
    }
}
