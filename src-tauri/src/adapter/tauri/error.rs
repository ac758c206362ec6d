use mixamo_core::domain::error::DomainError;
use serde::Serialize;

/// Error shape handed to the front end; Tauri commands return its message.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Keep the root cause visible in the status log
        ApiError {
            message: format!("{:#}", err),
        }
    }
}

impl From<ApiError> for String {
    fn from(err: ApiError) -> Self {
        err.message
    }
}
