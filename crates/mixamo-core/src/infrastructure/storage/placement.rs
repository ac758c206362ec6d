use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::domain::error::DownloadResult;

/// Move a staged download to its final location.
///
/// Parent directories are created and an existing file at `target` is
/// replaced only once the new content is complete beside it. A rename that
/// crosses filesystems falls back to copying into a sibling file first.
pub async fn place(staged: &Path, target: &Path) -> DownloadResult<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::metadata(target).await {
        Ok(meta) if meta.is_dir() => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a file", target.display()),
            )
            .into());
        }
        Ok(_) => tracing::debug!("Replacing existing file {:?}", target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    if let Err(e) = fs::rename(staged, target).await {
        tracing::debug!("Rename failed ({}), copying instead", e);
        let sibling = sibling_path(target);
        if let Err(e) = copy_into_place(staged, &sibling, target).await {
            let _ = fs::remove_file(&sibling).await;
            return Err(e.into());
        }
        fs::remove_file(staged).await?;
    }

    tracing::info!("Saved {:?}", target);
    Ok(())
}

async fn copy_into_place(staged: &Path, sibling: &Path, target: &Path) -> io::Result<()> {
    fs::copy(staged, sibling).await?;
    fs::rename(sibling, target).await
}

/// Hidden file next to `target` on the same filesystem.
fn sibling_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.placing", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DownloadError;

    #[tokio::test]
    async fn test_place_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.fbx");
        std::fs::write(&staged, b"data").unwrap();

        let target = dir.path().join("out/Remy/animations/walking.fbx");
        place(&staged, &target).await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"data");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_place_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.fbx");
        let target = dir.path().join("walking.fbx");
        std::fs::write(&staged, b"new").unwrap();
        std::fs::write(&target, b"old").unwrap();

        place(&staged, &target).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_place_missing_source_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = place(&dir.path().join("nope.fbx"), &dir.path().join("out.fbx"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Filesystem(_)));
    }

    #[tokio::test]
    async fn test_place_refuses_directory_target() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.fbx");
        std::fs::write(&staged, b"data").unwrap();
        let target = dir.path().join("taken");
        std::fs::create_dir(&target).unwrap();

        assert!(place(&staged, &target).await.is_err());
        assert!(staged.exists());
    }

    #[tokio::test]
    async fn test_failed_placement_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("walking.fbx");
        std::fs::write(&target, b"earlier download").unwrap();

        let err = place(&dir.path().join("vanished.fbx"), &target)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Filesystem(_)));
        assert_eq!(std::fs::read(&target).unwrap(), b"earlier download");
        assert!(!sibling_path(&target).exists());
    }

    #[test]
    fn test_sibling_path() {
        assert_eq!(
            sibling_path(Path::new("/out/Remy/walking.fbx")),
            Path::new("/out/Remy/.walking.fbx.placing")
        );
    }
}
