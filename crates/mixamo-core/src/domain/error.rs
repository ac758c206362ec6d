use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures raised while driving the site or placing files.
///
/// Everything except [`DownloadError::BrowserUnavailable`] is contained at the
/// task boundary: the task is marked failed and the queue moves on.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Download did not finish within {}", format_wait(.0))]
    DownloadTimeout(Duration),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Browser command failed: {0}")]
    Browser(String),

    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),
}

pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

fn format_wait(wait: &Duration) -> String {
    humantime::format_duration(*wait).to_string()
}

impl DownloadError {
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Halts the whole run instead of failing a single task.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BrowserUnavailable(_))
    }

    /// Worth another attempt before the task is marked failed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::DownloadTimeout(_)
                | Self::Network(_)
                | Self::Browser(_)
        )
    }

    /// Short machine-readable kind for the status panel.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::ElementNotFound { .. } => "element_not_found",
            Self::DownloadTimeout(_) => "download_timeout",
            Self::Filesystem(_) => "filesystem_error",
            Self::Network(_) => "network_error",
            Self::Browser(_) => "browser_error",
            Self::BrowserUnavailable(_) => "browser_unavailable",
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::Network(err.to_string())
    }
}
