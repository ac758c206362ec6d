use serde::{Deserialize, Serialize};

/// Session states representing the lifecycle of the browser session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    LoggingIn,
    Ready,
    Downloading,
    Stopped,
}

impl SessionState {
    /// Check if the session can serve catalog requests and start runs
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Stopped)
    }
}

/// Information about a session for UI display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub state: SessionState,
}

/// Sign-in credentials. Never persisted.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
