//! Ways of getting a task's file from the site into the staging directory.

mod api;
mod browser;

pub use api::ApiFetcher;
pub use browser::BrowserFetcher;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::DownloadResult;
use crate::domain::model::DownloadTask;

/// Obtains the exported file for a task.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Download the asset and return where it was staged.
    async fn fetch(&self, task: &DownloadTask) -> DownloadResult<PathBuf>;
}

pub type SharedFetcher = Arc<dyn AssetFetcher>;
