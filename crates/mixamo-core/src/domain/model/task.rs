use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::{Animation, Character, ExportOptions};

/// What a download task fetches for its character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskAsset {
    Animation(Animation),
    /// The rigged character in T-pose
    CharacterModel,
}

/// Lifecycle of a single download task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskState {
    #[default]
    Queued,
    InProgress,
    /// Next in line while the run is paused
    Paused,
    Completed,
    Failed,
}

impl TaskState {
    /// Not yet started in the current run.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::Paused)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTask {
    pub id: String,
    pub character: Character,
    pub asset: TaskAsset,
    pub output_path: PathBuf,
    pub options: ExportOptions,
    pub state: TaskState,
    /// Attempts made in the last run, retries included
    pub attempts: u32,
    /// Reason of the last failure
    pub error: Option<String>,
    /// Completed without downloading because the file was already there
    #[serde(default)]
    pub skipped: bool,
}

impl DownloadTask {
    pub fn new(
        character: Character,
        asset: TaskAsset,
        output_path: PathBuf,
        options: ExportOptions,
    ) -> Self {
        Self {
            id: Ulid::new().to_string(),
            character,
            asset,
            output_path,
            options,
            state: TaskState::Queued,
            attempts: 0,
            error: None,
            skipped: false,
        }
    }

    /// Returns a display label in format "Character / Asset"
    pub fn label(&self) -> String {
        match &self.asset {
            TaskAsset::Animation(animation) => {
                format!("{} / {}", self.character.name, animation.name)
            }
            TaskAsset::CharacterModel => format!("{} / character model", self.character.name),
        }
    }

    /// Page to load before triggering the download.
    pub fn page_url(&self) -> &str {
        match &self.asset {
            TaskAsset::Animation(animation) => &animation.page_url,
            TaskAsset::CharacterModel => &self.character.page_url,
        }
    }

    /// Put the task back in line for another run.
    pub fn reset(&mut self) {
        self.state = TaskState::Queued;
        self.attempts = 0;
        self.error = None;
        self.skipped = false;
    }
}

/// Aggregate outcome of one pass over the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    /// Completed tasks, skipped ones included
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Tasks left queued by a cancel or a halt
    pub remaining: usize,
    pub cancelled: bool,
    /// Reason the run was halted by an unrecoverable error
    pub halted: Option<String>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.remaining == 0 && self.halted.is_none()
    }
}
