use tokio::sync::oneshot;

use crate::domain::error::DownloadResult;
use crate::domain::model::{Animation, Character, Credentials, RunSummary};
use crate::infrastructure::config::UserSettings;

/// Commands that can be sent to a SessionActor
#[derive(Debug)]
pub enum SessionCommand {
    /// Launch the browser and sign in
    Start { credentials: Option<Credentials> },

    /// Stop the session and close the browser
    Stop,

    /// Scrape the character listing
    ListCharacters {
        reply: oneshot::Sender<DownloadResult<Vec<Character>>>,
    },

    /// Select a character and scrape the animation listing
    ListAnimations {
        character: Character,
        reply: oneshot::Sender<DownloadResult<Vec<Animation>>>,
    },

    /// Work through the queue with the given settings
    Download {
        settings: UserSettings,
        reply: Option<oneshot::Sender<RunSummary>>,
    },
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Stop => "stop",
            Self::ListCharacters { .. } => "list_characters",
            Self::ListAnimations { .. } => "list_animations",
            Self::Download { .. } => "download",
        }
    }
}
