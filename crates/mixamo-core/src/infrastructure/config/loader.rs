use include_dir::{include_dir, Dir};
use serde::de::DeserializeOwned;
use std::path::Path;

use super::paths::config_dir;

// Embed the entire configs directory at compile time
static CONFIGS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources/configs");

/// Load a YAML configuration file from disk
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Parse YAML from string
pub fn parse_yaml<T: DeserializeOwned>(content: &str) -> anyhow::Result<T> {
    let config: T = serde_yaml::from_str(content)?;
    Ok(config)
}

/// Load embedded configuration by name from the configs directory
/// Files are embedded at compile time using include_dir
pub fn load_embedded_config<T: DeserializeOwned + Default>(name: &str) -> T {
    let file_name = format!("{}.yaml", name);

    let Some(file) = CONFIGS_DIR.get_file(&file_name) else {
        tracing::warn!("Embedded config {} not found, using defaults", name);
        return T::default();
    };

    let Some(content) = file.contents_utf8() else {
        tracing::error!("Embedded config {} is not valid UTF-8", name);
        return T::default();
    };

    match parse_yaml::<T>(content) {
        Ok(config) => {
            tracing::debug!("Loaded embedded config: {}", name);
            config
        }
        Err(e) => {
            tracing::error!("Failed to parse embedded config {}: {}", name, e);
            T::default()
        }
    }
}

/// Load configuration by name: a user copy in the config directory wins over
/// the embedded default.
pub fn load_config<T: DeserializeOwned + Default>(name: &str) -> T {
    let user_path = config_dir().join(format!("{}.yaml", name));

    if user_path.exists() {
        match load_yaml::<T>(&user_path) {
            Ok(config) => {
                tracing::info!("Loaded config override from {:?}", user_path);
                return config;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse {:?}: {}, falling back to embedded config",
                    user_path,
                    e
                );
            }
        }
    }

    load_embedded_config(name)
}

/// Ensure user config directory exists
pub fn ensure_config_dir() -> std::io::Result<()> {
    let dir = config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::AppConfig;

    #[test]
    fn test_embedded_app_config_parses() {
        let file = CONFIGS_DIR.get_file("app.yaml").expect("app.yaml embedded");
        let content = file.contents_utf8().expect("utf-8");
        let config: AppConfig = parse_yaml(content).unwrap();
        assert!(config.site.base_url.starts_with("https://"));
        assert!(!config.selectors.download_button.is_empty());
    }

    #[test]
    fn test_missing_embedded_config_uses_default() {
        let config: AppConfig = load_embedded_config("does-not-exist");
        assert_eq!(config.listing.max_pages, AppConfig::default().listing.max_pages);
    }
}
