use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::paths;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub selectors: SelectorConfig,
    pub listing: ListingConfig,
    pub timeouts: TimeoutConfig,
    pub browser: BrowserOptions,
    pub run: RunConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub login_url: String,
    pub characters_url: String,
    /// Animation listing, shown for the currently selected character
    pub animations_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.mixamo.com".to_string(),
            login_url: "https://www.mixamo.com/#/login".to_string(),
            characters_url: "https://www.mixamo.com/#/?page=1&type=Character".to_string(),
            animations_url: "https://www.mixamo.com/#/?page=1&type=Motion%2CMotionPack"
                .to_string(),
        }
    }
}

/// CSS selectors for every element the automation touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    // Sign-in form
    pub email_field: String,
    pub email_submit: String,
    pub password_field: String,
    pub password_submit: String,
    /// Visible only once the site considers the user logged in
    pub logged_in_marker: String,

    // Listings
    pub character_card: String,
    pub animation_card: String,
    /// Relative to a card
    pub card_name: String,
    /// Relative to a card
    pub card_link: String,
    /// Attribute on the card carrying the asset id
    pub id_attribute: String,
    pub next_page: String,
    pub select_character: String,

    // Export dialog
    pub download_button: String,
    pub download_dialog: String,
    pub format_select: String,
    pub fps_select: String,
    pub skin_select: String,
    pub keyframe_select: String,
    pub download_confirm: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            email_field: "#EmailPage-EmailField".to_string(),
            email_submit: "[data-id=EmailPage-ContinueButton]".to_string(),
            password_field: "#PasswordPage-PasswordField".to_string(),
            password_submit: "[data-id=PasswordPage-ContinueButton]".to_string(),
            logged_in_marker: ".product-list".to_string(),
            character_card: ".product-list .product[data-type=Character]".to_string(),
            animation_card: ".product-list .product".to_string(),
            card_name: ".product-name".to_string(),
            card_link: "a".to_string(),
            id_attribute: "data-id".to_string(),
            next_page: ".pagination li.next:not(.disabled) a".to_string(),
            select_character: "button.use-character".to_string(),
            download_button: "button.download-btn".to_string(),
            download_dialog: ".modal-dialog.download".to_string(),
            format_select: ".modal-dialog.download select[name=format]".to_string(),
            fps_select: ".modal-dialog.download select[name=fps]".to_string(),
            skin_select: ".modal-dialog.download select[name=skin]".to_string(),
            keyframe_select: ".modal-dialog.download select[name=reducekf]".to_string(),
            download_confirm: ".modal-dialog.download button.btn-primary".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Upper bound on listing pages walked per request
    pub max_pages: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { max_pages: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    #[serde(with = "humantime_serde")]
    pub page_load: Duration,
    #[serde(with = "humantime_serde")]
    pub login: Duration,
    #[serde(with = "humantime_serde")]
    pub download: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_load: Duration::from_secs(30),
            login: Duration::from_secs(300),
            download: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Headed by default so the user can finish the sign-in by hand
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Leave empty to use platform default path
    pub staging_dir: String,
    /// Leave empty to let chromiumoxide locate Chrome
    pub executable: String,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            viewport_width: 1280,
            viewport_height: 800,
            staging_dir: String::new(),
            executable: String::new(),
        }
    }
}

impl BrowserOptions {
    pub fn effective_staging_dir(&self) -> PathBuf {
        if self.staging_dir.is_empty() {
            paths::default_staging_dir()
        } else {
            PathBuf::from(&self.staging_dir)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Extra attempts for transient failures before a task is marked failed
    pub retry_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 1,
            retry_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// localStorage key holding the bearer token
    pub token_storage_key: String,
    #[serde(with = "humantime_serde")]
    pub monitor_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.mixamo.com/api/v1".to_string(),
            api_key: "mixamo2".to_string(),
            token_storage_key: "access_token".to_string(),
            monitor_interval: Duration::from_secs(1),
        }
    }
}

/// Helper module for humantime duration parsing
mod humantime_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "timeouts:\n  download: 45s\nrun:\n  retry_attempts: 0\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timeouts.download, Duration::from_secs(45));
        assert_eq!(config.timeouts.poll_interval, Duration::from_millis(500));
        assert_eq!(config.run.retry_attempts, 0);
        assert_eq!(config.api.api_key, "mixamo2");
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let yaml = "timeouts:\n  download: soon\n";
        assert!(serde_yaml::from_str::<AppConfig>(yaml).is_err());
    }
}
