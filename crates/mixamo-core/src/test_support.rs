//! Fakes and fixtures shared by unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::error::{DownloadError, DownloadResult};
use crate::domain::layout;
use crate::domain::model::{
    Animation, Character, DownloadTask, ExportOptions, TaskAsset,
};
use crate::infrastructure::browser::BrowserDriver;
use crate::infrastructure::fetch::AssetFetcher;

pub fn character(name: &str) -> Character {
    let id = name.to_lowercase();
    Character {
        page_url: format!("https://www.mixamo.com/#/characters/{}", id),
        id,
        name: name.to_string(),
    }
}

pub fn animation(name: &str) -> Animation {
    let id = name.to_lowercase().replace(' ', "-");
    Animation {
        page_url: format!("https://www.mixamo.com/#/animations/{}", id),
        id,
        name: name.to_string(),
    }
}

pub fn animation_task(
    character_name: &str,
    animation_name: &str,
    output_dir: &Path,
) -> DownloadTask {
    let options = ExportOptions::default();
    DownloadTask::new(
        character(character_name),
        TaskAsset::Animation(animation(animation_name)),
        layout::animation_path(output_dir, character_name, animation_name, options.format),
        options,
    )
}

pub fn model_task(character_name: &str, output_dir: &Path) -> DownloadTask {
    let options = ExportOptions {
        skin: true,
        ..Default::default()
    };
    DownloadTask::new(
        character(character_name),
        TaskAsset::CharacterModel,
        layout::character_model_path(output_dir, character_name, options.format),
        options,
    )
}

/// In-memory browser that records every command it receives.
#[derive(Default)]
pub struct FakeDriver {
    calls: Mutex<Vec<String>>,
    hidden: Mutex<HashSet<String>>,
    pages: Mutex<HashMap<String, String>>,
    current: Mutex<Option<String>>,
    local_storage: Mutex<HashMap<String, String>>,
    click_files: Mutex<HashMap<String, PathBuf>>,
    crashed: AtomicBool,
    fail_start: AtomicBool,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make an element never appear.
    pub fn hide(&self, selector: &str) {
        self.hidden.lock().unwrap().insert(selector.to_string());
    }

    pub fn show(&self, selector: &str) {
        self.hidden.lock().unwrap().remove(selector);
    }

    /// HTML served once `url` has been navigated to.
    pub fn set_page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    pub fn set_local_storage(&self, key: &str, value: &str) {
        self.local_storage
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    /// Clicking `selector` writes a file at `path`, like a finished download.
    pub fn write_on_click(&self, selector: &str, path: PathBuf) {
        self.click_files
            .lock()
            .unwrap()
            .insert(selector.to_string(), path);
    }

    /// Every later command fails as if the browser process died.
    pub fn crash(&self) {
        self.crashed.store(true, Ordering::SeqCst);
    }

    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_alive(&self) -> DownloadResult<()> {
        if self.crashed.load(Ordering::SeqCst) {
            return Err(DownloadError::BrowserUnavailable("browser crashed".into()));
        }
        Ok(())
    }

    fn check_visible(&self, selector: &str) -> DownloadResult<()> {
        if self.hidden.lock().unwrap().contains(selector) {
            return Err(DownloadError::element_not_found(selector));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn start(&self) -> DownloadResult<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(DownloadError::BrowserUnavailable("no chrome".into()));
        }
        self.record("start".into());
        Ok(())
    }

    async fn stop(&self) -> DownloadResult<()> {
        self.record("stop".into());
        Ok(())
    }

    async fn navigate(&self, url: &str) -> DownloadResult<()> {
        self.check_alive()?;
        self.record(format!("navigate {}", url));
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> DownloadResult<Option<String>> {
        self.check_alive()?;
        Ok(self.current.lock().unwrap().clone())
    }

    async fn page_html(&self) -> DownloadResult<String> {
        self.check_alive()?;
        let current = self.current.lock().unwrap().clone();
        Ok(current
            .and_then(|url| self.pages.lock().unwrap().get(&url).cloned())
            .unwrap_or_default())
    }

    async fn evaluate(&self, _script: &str) -> DownloadResult<serde_json::Value> {
        self.check_alive()?;
        Ok(serde_json::Value::Null)
    }

    async fn input_text(&self, selector: &str, _text: &str) -> DownloadResult<()> {
        self.check_alive()?;
        self.check_visible(selector)?;
        self.record(format!("type {}", selector));
        Ok(())
    }

    async fn click_element(&self, selector: &str) -> DownloadResult<()> {
        self.check_alive()?;
        self.check_visible(selector)?;
        self.record(format!("click {}", selector));

        let file = self.click_files.lock().unwrap().get(selector).cloned();
        if let Some(path) = file {
            std::fs::write(path, b"exported asset")?;
        }
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> DownloadResult<()> {
        self.check_alive()?;
        if self.check_visible(selector).is_err() {
            tokio::time::sleep(timeout).await;
        }
        self.check_visible(selector)
    }

    async fn set_download_dir(&self, dir: &Path) -> DownloadResult<()> {
        self.check_alive()?;
        self.record(format!("download_dir {}", dir.display()));
        Ok(())
    }

    async fn refresh(&self) -> DownloadResult<()> {
        self.check_alive()?;
        self.record("refresh".into());
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> DownloadResult<()> {
        self.check_alive()?;
        self.check_visible(selector)?;
        self.record(format!("select {}={}", selector, value));
        Ok(())
    }

    async fn local_storage_item(&self, key: &str) -> DownloadResult<Option<String>> {
        self.check_alive()?;
        Ok(self.local_storage.lock().unwrap().get(key).cloned())
    }
}

type FetchHook = Box<dyn Fn(&DownloadTask) + Send + Sync>;

/// Fetcher with scripted per-task failures. Unscripted fetches succeed by
/// writing a small file into the staging directory.
pub struct FakeFetcher {
    staging: PathBuf,
    failures: Mutex<HashMap<String, VecDeque<DownloadError>>>,
    calls: Mutex<Vec<String>>,
    hook: Mutex<Option<FetchHook>>,
}

impl FakeFetcher {
    pub fn new(staging: &Path) -> Self {
        Self {
            staging: staging.to_path_buf(),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            hook: Mutex::new(None),
        }
    }

    /// Fail the next fetch of the task labelled `label` with `err`.
    pub fn fail_next(&self, label: &str, err: DownloadError) {
        self.failures
            .lock()
            .unwrap()
            .entry(label.to_string())
            .or_default()
            .push_back(err);
    }

    /// Run `hook` at the start of every fetch.
    pub fn on_fetch(&self, hook: impl Fn(&DownloadTask) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Labels of fetched tasks, in order, retries included.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, task: &DownloadTask) -> DownloadResult<PathBuf> {
        let label = task.label();
        self.calls.lock().unwrap().push(label.clone());

        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(task);
        }

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(&label)
            .and_then(|queue| queue.pop_front());
        if let Some(err) = failure {
            return Err(err);
        }

        std::fs::create_dir_all(&self.staging)?;
        let staged = self
            .staging
            .join(format!("{}.{}", task.id, task.options.format.extension()));
        std::fs::write(&staged, label.as_bytes())?;
        Ok(staged)
    }
}
