use super::driver::BrowserDriver;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::domain::error::{DownloadError, DownloadResult};
use crate::infrastructure::config::{paths, BrowserOptions};

/// Poll interval while waiting for an element to show up
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Chromium browser driver using chromiumoxide
pub struct ChromiumDriver {
    options: BrowserOptions,
    browser: RwLock<Option<Browser>>,
    page: RwLock<Option<Arc<Mutex<Page>>>>,
    handler_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
    user_data_dir: PathBuf,
}

impl ChromiumDriver {
    /// Create a new ChromiumDriver with a persistent user data directory.
    /// Profile data (cookies, localStorage) is preserved across sessions, so
    /// a login done once is reused on the next start.
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            options,
            browser: RwLock::new(None),
            page: RwLock::new(None),
            handler_handle: RwLock::new(None),
            user_data_dir: paths::profile_dir(),
        }
    }

    async fn page(&self) -> DownloadResult<Arc<Mutex<Page>>> {
        self.page
            .read()
            .await
            .clone()
            .ok_or_else(|| DownloadError::BrowserUnavailable("Browser not started".to_string()))
    }

    /// Clean stale lockfiles left by crashed browser instances.
    /// Chrome creates "SingletonLock" and "SingletonSocket" files that prevent
    /// multiple processes from using the same profile directory.
    fn clean_stale_lockfiles(&self) {
        let lockfile_names = ["SingletonLock", "SingletonSocket", "SingletonCookie"];
        for name in lockfile_names {
            let lockfile = self.user_data_dir.join(name);
            if lockfile.exists() {
                if let Err(e) = std::fs::remove_file(&lockfile) {
                    tracing::warn!("Failed to remove stale lockfile {:?}: {}", lockfile, e);
                } else {
                    tracing::debug!("Removed stale lockfile: {:?}", lockfile);
                }
            }
        }
    }

    fn build_config(&self) -> DownloadResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.options.viewport_width, self.options.viewport_height + 120)
            .viewport(Viewport {
                width: self.options.viewport_width,
                height: self.options.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .user_data_dir(&self.user_data_dir)
            .arg("--disable-infobars")
            .arg("--mute-audio");

        builder = if self.options.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        if !self.options.executable.is_empty() {
            builder = builder.chrome_executable(&self.options.executable);
        }

        builder.build().map_err(|e| {
            DownloadError::BrowserUnavailable(format!("Invalid browser config: {}", e))
        })
    }
}

/// Map a DevTools failure onto the task error taxonomy.
fn cdp_error(err: CdpError) -> DownloadError {
    match err {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) => {
            DownloadError::BrowserUnavailable(err.to_string())
        }
        other => DownloadError::Browser(other.to_string()),
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn start(&self) -> DownloadResult<()> {
        std::fs::create_dir_all(&self.user_data_dir).map_err(|e| {
            DownloadError::BrowserUnavailable(format!("Failed to create user data dir: {}", e))
        })?;

        // Clean stale lockfiles from previous crashed sessions
        self.clean_stale_lockfiles();

        tracing::info!(
            "Starting browser (headless={}) with profile: {:?}",
            self.options.headless,
            self.user_data_dir
        );

        let config = self.build_config()?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            DownloadError::BrowserUnavailable(format!("Failed to launch browser: {}", e))
        })?;

        let handler_handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
            tracing::debug!("Browser handler finished");
        });

        let page = browser.new_page("about:blank").await.map_err(cdp_error)?;

        *self.browser.write().await = Some(browser);
        *self.page.write().await = Some(Arc::new(Mutex::new(page)));
        *self.handler_handle.write().await = Some(handler_handle);

        tracing::info!("Browser started successfully");
        Ok(())
    }

    async fn stop(&self) -> DownloadResult<()> {
        tracing::info!("Stopping browser");

        if let Some(mut browser) = self.browser.write().await.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("Browser close returned: {}", e);
            }
        }

        if let Some(handle) = self.handler_handle.write().await.take() {
            handle.abort();
        }

        *self.page.write().await = None;

        tracing::info!("Browser stopped (profile preserved at {:?})", self.user_data_dir);
        Ok(())
    }

    async fn navigate(&self, url: &str) -> DownloadResult<()> {
        let page = self.page().await?;
        let page = page.lock().await;
        page.goto(url).await.map_err(cdp_error)?;
        tracing::debug!("Navigated to {}", url);
        Ok(())
    }

    async fn current_url(&self) -> DownloadResult<Option<String>> {
        let page = self.page().await?;
        let page = page.lock().await;
        page.url().await.map_err(cdp_error)
    }

    async fn page_html(&self) -> DownloadResult<String> {
        let page = self.page().await?;
        let page = page.lock().await;
        page.content().await.map_err(cdp_error)
    }

    async fn evaluate(&self, script: &str) -> DownloadResult<serde_json::Value> {
        let page = self.page().await?;
        let page = page.lock().await;

        let result = page.evaluate(script).await.map_err(cdp_error)?;
        // Scripts returning undefined carry no value
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn input_text(&self, selector: &str, text: &str) -> DownloadResult<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        let element = page
            .find_element(selector)
            .await
            .map_err(|_| DownloadError::element_not_found(selector))?;
        element.click().await.map_err(cdp_error)?;
        element.type_str(text).await.map_err(cdp_error)?;

        tracing::debug!("Input text into {}", selector);
        Ok(())
    }

    async fn click_element(&self, selector: &str) -> DownloadResult<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        let element = page
            .find_element(selector)
            .await
            .map_err(|_| DownloadError::element_not_found(selector))?;
        element.click().await.map_err(cdp_error)?;

        tracing::debug!("Clicked element {}", selector);
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> DownloadResult<()> {
        let page = self.page().await?;
        let start = Instant::now();

        loop {
            {
                let page_guard = page.lock().await;
                match page_guard.find_element(selector).await {
                    Ok(_) => {
                        tracing::debug!("Element {} is visible", selector);
                        return Ok(());
                    }
                    Err(err @ (CdpError::Ws(_) | CdpError::ChannelSendError(_))) => {
                        return Err(cdp_error(err));
                    }
                    Err(_) => {}
                }
            }

            if start.elapsed() > timeout {
                return Err(DownloadError::element_not_found(selector));
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn set_download_dir(&self, dir: &Path) -> DownloadResult<()> {
        let browser = self.browser.read().await;
        let browser = browser
            .as_ref()
            .ok_or_else(|| DownloadError::BrowserUnavailable("Browser not started".to_string()))?;

        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(dir.to_string_lossy().to_string())
            .build()
            .map_err(DownloadError::Browser)?;
        browser.execute(params).await.map_err(cdp_error)?;

        tracing::info!("Browser downloads directed to {:?}", dir);
        Ok(())
    }

    async fn refresh(&self) -> DownloadResult<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        page.reload().await.map_err(cdp_error)?;

        tracing::info!("Page refreshed");
        Ok(())
    }
}
