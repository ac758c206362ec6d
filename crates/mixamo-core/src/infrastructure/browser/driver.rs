use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::domain::error::{DownloadError, DownloadResult};

/// Browser driver trait for abstracting browser automation
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Start the browser instance
    async fn start(&self) -> DownloadResult<()>;

    /// Stop the browser instance
    async fn stop(&self) -> DownloadResult<()>;

    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> DownloadResult<()>;

    /// URL of the current page, if any
    async fn current_url(&self) -> DownloadResult<Option<String>>;

    /// Rendered HTML of the current page
    async fn page_html(&self) -> DownloadResult<String>;

    /// Execute JavaScript and return its JSON result
    async fn evaluate(&self, script: &str) -> DownloadResult<serde_json::Value>;

    /// Input text into a form field by selector
    async fn input_text(&self, selector: &str, text: &str) -> DownloadResult<()>;

    /// Click an element by selector
    async fn click_element(&self, selector: &str) -> DownloadResult<()>;

    /// Wait for an element to be present, failing with `ElementNotFound`
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> DownloadResult<()>;

    /// Direct browser downloads into `dir` without prompting
    async fn set_download_dir(&self, dir: &Path) -> DownloadResult<()>;

    /// Refresh/reload the current page
    async fn refresh(&self) -> DownloadResult<()>;

    /// Set the value of a `<select>` and fire its change event
    async fn select_option(&self, selector: &str, value: &str) -> DownloadResult<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.value = {value};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            selector = js_string(selector),
            value = js_string(value),
        );

        match self.evaluate(&script).await? {
            serde_json::Value::Bool(true) => Ok(()),
            _ => Err(DownloadError::element_not_found(selector)),
        }
    }

    /// Read a `localStorage` entry of the current page
    async fn local_storage_item(&self, key: &str) -> DownloadResult<Option<String>> {
        let script = format!("localStorage.getItem({})", js_string(key));
        match self.evaluate(&script).await? {
            serde_json::Value::String(value) if !value.is_empty() => Ok(Some(value)),
            _ => Ok(None),
        }
    }
}

/// Quote a value as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
