use std::path::PathBuf;

const APP_DIR: &str = "mixamo-downloader";

/// Get platform-specific configuration directory
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library/Application Support")
            .join(APP_DIR)
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn log_dir() -> PathBuf {
    config_dir().join("logs")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Persistent browser profile, so the site login survives restarts
pub fn profile_dir() -> PathBuf {
    config_dir().join("browser-profile")
}

/// Where the browser drops files before they are moved into the output tree
pub fn default_staging_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("staging")
}

/// Fallback output directory when the user has not picked one
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Mixamo")
}
