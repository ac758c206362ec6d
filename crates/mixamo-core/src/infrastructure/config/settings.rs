use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::loader::ensure_config_dir;
use super::paths;
use crate::domain::error::DomainError;
use crate::domain::model::{DownloadMethod, ExportFormat, ExportOptions};

/// Frame rates offered by the export dialog
pub const SUPPORTED_FPS: [u32; 3] = [24, 30, 60];

/// User settings stored in settings.json in user config directory.
/// All fields are optional - missing values use defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Root of the output tree; platform downloads folder when unset
    pub output_dir: Option<PathBuf>,
    pub format: ExportFormat,
    pub fps: u32,
    /// Export animations with the character mesh
    pub skin: bool,
    pub reduce_keyframes: bool,
    pub download_method: DownloadMethod,
    /// Complete tasks whose target file already exists without downloading
    pub skip_existing: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            format: ExportFormat::Fbx,
            fps: 30,
            skin: false,
            reduce_keyframes: false,
            download_method: DownloadMethod::Browser,
            skip_existing: true,
        }
    }
}

impl UserSettings {
    pub fn effective_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(paths::default_output_dir)
    }

    /// Export options applied to animation tasks
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            format: self.format,
            fps: self.fps,
            skin: self.skin,
            reduce_keyframes: self.reduce_keyframes,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !SUPPORTED_FPS.contains(&self.fps) {
            return Err(DomainError::Validation(format!(
                "Unsupported frame rate {} (expected one of {:?})",
                self.fps, SUPPORTED_FPS
            )));
        }
        if let Some(dir) = &self.output_dir {
            if dir.as_os_str().is_empty() {
                return Err(DomainError::Validation("Output folder is empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Load settings from a JSON file.
/// Returns default settings if file doesn't exist or is invalid
pub fn load_user_settings_from(path: &Path) -> UserSettings {
    if !path.exists() {
        tracing::debug!("No settings file at {:?}, using defaults", path);
        return UserSettings::default();
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_json::from_str::<UserSettings>(&content).map_err(Into::into));

    match parsed {
        Ok(settings) => {
            tracing::info!("Loaded user settings from {:?}", path);
            settings
        }
        Err(e) => {
            tracing::warn!("Failed to read settings {:?}: {}, using defaults", path, e);
            UserSettings::default()
        }
    }
}

/// Save settings to a JSON file, creating its directory if needed
pub fn save_user_settings_to(path: &Path, settings: &UserSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    tracing::info!("Saved user settings to {:?}", path);
    Ok(())
}

/// Load user settings from settings.json in user config directory
pub fn load_user_settings() -> UserSettings {
    load_user_settings_from(&paths::settings_path())
}

/// Save user settings to settings.json in user config directory
pub fn save_user_settings(settings: &UserSettings) -> anyhow::Result<()> {
    ensure_config_dir()?;
    save_user_settings_to(&paths::settings_path(), settings)
}
