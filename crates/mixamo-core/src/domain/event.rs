use serde::{Deserialize, Serialize};

use super::model::{Animation, Character, RunSummary, SessionState, TaskState};

/// Domain events that represent state changes in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    /// Session state changed
    SessionStateChanged {
        session_id: String,
        old_state: SessionState,
        new_state: SessionState,
    },

    /// Login succeeded
    LoginSucceeded { session_id: String },

    /// Login failed
    LoginFailed { session_id: String, reason: String },

    /// Character listing scraped
    CharactersLoaded { characters: Vec<Character> },

    /// Animation listing scraped for a character
    AnimationsLoaded {
        character_id: String,
        animations: Vec<Animation>,
    },

    /// Tasks were added to the queue
    TasksQueued { count: usize },

    /// A pass over the queue started
    RunStarted { total: usize },

    /// A task moved to a new state
    TaskStateChanged {
        task_id: String,
        label: String,
        state: TaskState,
        message: Option<String>,
    },

    /// A task failed transiently and will be tried again
    TaskRetrying {
        task_id: String,
        attempt: u32,
        reason: String,
    },

    /// Finished tasks out of the run total
    RunProgress { finished: usize, total: usize },

    RunPaused,

    RunResumed,

    /// The pass over the queue ended
    RunFinished { summary: RunSummary },

    /// Unrecoverable condition; the run was halted
    FatalError { reason: String },
}

impl DomainEvent {
    /// Get the event type name for frontend routing
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::SessionStateChanged { .. } => "session_state_changed",
            Self::LoginSucceeded { .. } => "login_succeeded",
            Self::LoginFailed { .. } => "login_failed",
            Self::CharactersLoaded { .. } => "characters_loaded",
            Self::AnimationsLoaded { .. } => "animations_loaded",
            Self::TasksQueued { .. } => "tasks_queued",
            Self::RunStarted { .. } => "run_started",
            Self::TaskStateChanged { .. } => "task_state_changed",
            Self::TaskRetrying { .. } => "task_retrying",
            Self::RunProgress { .. } => "run_progress",
            Self::RunPaused => "run_paused",
            Self::RunResumed => "run_resumed",
            Self::RunFinished { .. } => "run_finished",
            Self::FatalError { .. } => "fatal_error",
        }
    }
}
