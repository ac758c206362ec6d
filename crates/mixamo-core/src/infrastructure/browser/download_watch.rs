//! Completion detection for browser downloads.
//!
//! Chrome writes `<name>.crdownload` while a transfer is running and renames
//! it when done, so a download is finished once a new file without a partial
//! suffix shows up and its size stops changing.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::domain::error::{DownloadError, DownloadResult};

const PARTIAL_SUFFIXES: [&str; 4] = ["crdownload", "part", "tmp", "download"];

/// Snapshot of the staging directory taken before a download is triggered.
///
/// A partial file from an earlier trigger also reserves the name it will be
/// renamed to, so a late finish is never taken for the current download.
#[derive(Debug, Default)]
pub struct DownloadMarker {
    existing: HashSet<PathBuf>,
}

/// Polls a directory for a newly finished download.
#[derive(Debug, Clone)]
pub struct DownloadWatcher {
    dir: PathBuf,
    poll_interval: Duration,
}

impl DownloadWatcher {
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            poll_interval,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if needed and remember what is already in it.
    pub async fn prepare(&self) -> DownloadResult<DownloadMarker> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut existing = HashSet::new();
        for path in self.scan().await?.into_keys() {
            if is_partial(&path) {
                tracing::debug!(path = ?path, "Earlier download still in progress");
                existing.insert(path.with_extension(""));
            }
            existing.insert(path);
        }
        Ok(DownloadMarker { existing })
    }

    /// Wait until a file absent from `marker` is complete, or time out.
    pub async fn wait_for_new_file(
        &self,
        marker: &DownloadMarker,
        timeout: Duration,
    ) -> DownloadResult<PathBuf> {
        let deadline = Instant::now() + timeout;
        let mut last_sizes: HashMap<PathBuf, u64> = HashMap::new();

        loop {
            let current = self.scan().await?;

            let mut candidates: Vec<(&PathBuf, &u64)> = current
                .iter()
                .filter(|(path, _)| !marker.existing.contains(*path) && !is_partial(path))
                .collect();
            candidates.sort();

            for (path, size) in candidates {
                if last_sizes.get(path) == Some(size) {
                    tracing::debug!(path = ?path, size, "Download finished");
                    return Ok(path.clone());
                }
            }
            last_sizes = current;

            if Instant::now() >= deadline {
                return Err(DownloadError::DownloadTimeout(timeout));
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Regular files in the directory with their sizes.
    async fn scan(&self) -> DownloadResult<HashMap<PathBuf, u64>> {
        let mut files = HashMap::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            // Entries can vanish between listing and stat while Chrome renames
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if metadata.is_file() {
                files.insert(entry.path(), metadata.len());
            }
        }

        Ok(files)
    }
}

fn is_partial(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PARTIAL_SUFFIXES.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
