use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::AssetFetcher;
use crate::domain::error::DownloadResult;
use crate::domain::model::{DownloadTask, TaskAsset};
use crate::infrastructure::browser::{BrowserDriver, DownloadWatcher};
use crate::infrastructure::config::{SelectorConfig, TimeoutConfig};

/// Drives the site's own export dialog and picks the file up from the
/// browser's download directory.
pub struct BrowserFetcher {
    driver: Arc<dyn BrowserDriver>,
    watcher: DownloadWatcher,
    selectors: SelectorConfig,
    timeouts: TimeoutConfig,
}

impl BrowserFetcher {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        watcher: DownloadWatcher,
        selectors: SelectorConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            driver,
            watcher,
            selectors,
            timeouts,
        }
    }

    /// Fill the export dialog with the task's options.
    async fn apply_options(&self, task: &DownloadTask) -> DownloadResult<()> {
        let s = &self.selectors;
        let options = &task.options;

        self.driver
            .select_option(&s.format_select, options.format.site_code())
            .await?;
        self.driver
            .select_option(&s.skin_select, if options.skin { "true" } else { "false" })
            .await?;

        // The character model dialog has no motion settings
        if let TaskAsset::Animation(_) = task.asset {
            self.driver
                .select_option(&s.fps_select, &options.fps.to_string())
                .await?;
            self.driver
                .select_option(
                    &s.keyframe_select,
                    if options.reduce_keyframes { "1" } else { "0" },
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AssetFetcher for BrowserFetcher {
    async fn fetch(&self, task: &DownloadTask) -> DownloadResult<PathBuf> {
        let s = &self.selectors;

        self.driver.navigate(task.page_url()).await?;
        self.driver
            .wait_visible(&s.download_button, self.timeouts.page_load)
            .await?;

        self.driver.click_element(&s.download_button).await?;
        self.driver
            .wait_visible(&s.download_dialog, self.timeouts.page_load)
            .await?;
        self.apply_options(task).await?;

        let marker = self.watcher.prepare().await?;
        self.driver.click_element(&s.download_confirm).await?;
        tracing::debug!(task_id = %task.id, "Export confirmed, waiting for download");

        self.watcher
            .wait_for_new_file(&marker, self.timeouts.download)
            .await
    }
}
