use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::model::{DownloadTask, TaskState};

/// Ordered download tasks. Order of insertion is the order of execution.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<DownloadTask>,
}

pub type SharedTaskQueue = Arc<RwLock<TaskQueue>>;

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedTaskQueue {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Append tasks, skipping any whose target is already waiting in the
    /// queue. Returns how many were added.
    pub fn push_all(&mut self, tasks: Vec<DownloadTask>) -> usize {
        let mut added = 0;
        for task in tasks {
            let duplicate = self
                .tasks
                .iter()
                .any(|t| t.state.is_pending() && t.output_path == task.output_path);
            if duplicate {
                tracing::debug!("Already queued: {}", task.label());
                continue;
            }
            self.tasks.push(task);
            added += 1;
        }
        added
    }

    pub fn snapshot(&self) -> Vec<DownloadTask> {
        self.tasks.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DownloadTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// First task not yet started, in queue order.
    pub fn next_pending(&self) -> Option<&DownloadTask> {
        self.tasks.iter().find(|t| t.state.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.state.is_pending()).count()
    }

    /// Apply `f` to a task and return a copy of the result.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut DownloadTask)) -> Option<DownloadTask> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        f(task);
        Some(task.clone())
    }

    /// Put failed tasks back in line. Returns how many were re-queued.
    pub fn requeue_failed(&mut self) -> usize {
        let mut count = 0;
        for task in self.tasks.iter_mut().filter(|t| t.state == TaskState::Failed) {
            task.reset();
            count += 1;
        }
        count
    }

    /// Drop every task. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }
}
