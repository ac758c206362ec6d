use serde::{Deserialize, Serialize};

/// File format offered by the site's export dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Fbx,
    /// Collada exports arrive as a zip archive holding the .dae and its textures.
    Collada,
}

impl ExportFormat {
    /// File extension of the downloaded asset.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Fbx => "fbx",
            Self::Collada => "zip",
        }
    }

    /// Format code understood by the export endpoint and dialog.
    pub fn site_code(&self) -> &'static str {
        match self {
            Self::Fbx => "fbx7",
            Self::Collada => "dae_mixamo",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fbx => "FBX Binary (.fbx)",
            Self::Collada => "Collada (.dae)",
        }
    }
}

/// How a task's file is obtained from the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMethod {
    /// Click through the site's own download dialog and watch the downloads folder
    #[default]
    Browser,
    /// Call the export endpoints with the page's access token
    Api,
}

/// Per-task export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub fps: u32,
    pub skin: bool,
    pub reduce_keyframes: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Fbx,
            fps: 30,
            skin: false,
            reduce_keyframes: false,
        }
    }
}
