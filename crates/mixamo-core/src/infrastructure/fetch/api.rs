use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::AssetFetcher;
use crate::domain::error::{DownloadError, DownloadResult};
use crate::domain::model::{DownloadTask, TaskAsset};
use crate::infrastructure::browser::BrowserDriver;
use crate::infrastructure::config::ApiConfig;
use crate::infrastructure::mixamo_api::{ExportRequest, MixamoApi};

/// Requests exports over HTTP, authenticated with the token the logged-in
/// page keeps in `localStorage`.
pub struct ApiFetcher {
    driver: Arc<dyn BrowserDriver>,
    api: MixamoApi,
    token_key: String,
    monitor_interval: Duration,
    download_timeout: Duration,
    staging_dir: PathBuf,
}

impl ApiFetcher {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        config: &ApiConfig,
        download_timeout: Duration,
        staging_dir: PathBuf,
    ) -> DownloadResult<Self> {
        Ok(Self {
            driver,
            api: MixamoApi::new(config, download_timeout)?,
            token_key: config.token_storage_key.clone(),
            monitor_interval: config.monitor_interval,
            download_timeout,
            staging_dir,
        })
    }

    async fn token(&self) -> DownloadResult<String> {
        self.driver
            .local_storage_item(&self.token_key)
            .await?
            .ok_or_else(|| {
                DownloadError::AuthenticationFailed(
                    "No access token on the page; sign in first".to_string(),
                )
            })
    }
}

#[async_trait]
impl AssetFetcher for ApiFetcher {
    async fn fetch(&self, task: &DownloadTask) -> DownloadResult<PathBuf> {
        let token = self.token().await?;
        let character_id = &task.character.id;

        let request = match &task.asset {
            TaskAsset::Animation(animation) => {
                let product = self.api.product(&token, &animation.id, character_id).await?;
                ExportRequest::animation(character_id, &product, &task.options)
            }
            TaskAsset::CharacterModel => {
                ExportRequest::character_model(character_id, &task.character.name, &task.options)
            }
        };

        self.api.export(&token, &request).await?;
        let url = self
            .api
            .wait_for_export(&token, character_id, self.monitor_interval, self.download_timeout)
            .await?;

        let staged = self
            .staging_dir
            .join(format!("{}.{}", task.id, task.options.format.extension()));
        self.api.download_to(&url, &staged).await?;
        Ok(staged)
    }
}
