use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

/// What the orchestrator should do before starting the next task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunSignal {
    Running,
    Paused,
    Cancelled,
}

/// Pause/resume/cancel flag shared by the coordinator and the orchestrator.
///
/// Only consulted between tasks; an in-flight download always runs to its end.
#[derive(Clone)]
pub struct RunControl {
    tx: Arc<watch::Sender<RunSignal>>,
}

impl RunControl {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RunSignal::Running);
        Self { tx: Arc::new(tx) }
    }

    pub fn signal(&self) -> RunSignal {
        *self.tx.borrow()
    }

    pub fn is_paused(&self) -> bool {
        self.signal() == RunSignal::Paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal() == RunSignal::Cancelled
    }

    /// Returns false unless the run was running.
    pub fn pause(&self) -> bool {
        self.transition(RunSignal::Running, RunSignal::Paused)
    }

    /// Returns false unless the run was paused.
    pub fn resume(&self) -> bool {
        self.transition(RunSignal::Paused, RunSignal::Running)
    }

    pub fn cancel(&self) {
        self.tx.send_replace(RunSignal::Cancelled);
    }

    /// Arm the flag for a new run.
    pub fn reset(&self) {
        self.tx.send_replace(RunSignal::Running);
    }

    fn transition(&self, from: RunSignal, to: RunSignal) -> bool {
        self.tx.send_if_modified(|signal| {
            if *signal == from {
                *signal = to;
                true
            } else {
                false
            }
        })
    }

    /// Block while paused. Returns the signal that ended the wait.
    pub async fn wait_while_paused(&self) -> RunSignal {
        let mut rx = self.tx.subscribe();
        loop {
            let signal = *rx.borrow_and_update();
            if signal != RunSignal::Paused {
                return signal;
            }
            if rx.changed().await.is_err() {
                return RunSignal::Cancelled;
            }
        }
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}
