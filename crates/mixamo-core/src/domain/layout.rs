//! Where downloaded assets land on disk.
//!
//! `<output>/<Character>/animations/<Animation>.<ext>` for animations and
//! `<output>/<Character>/character_model.<ext>` for the model. Pure functions
//! of their inputs, so re-planning the same selection yields the same paths.

use std::path::{Path, PathBuf};

use super::model::ExportFormat;

const ANIMATIONS_DIR: &str = "animations";
const CHARACTER_MODEL_STEM: &str = "character_model";

/// Path of an exported animation.
pub fn animation_path(
    output_dir: &Path,
    character: &str,
    animation: &str,
    format: ExportFormat,
) -> PathBuf {
    output_dir
        .join(sanitize_component(character))
        .join(ANIMATIONS_DIR)
        .join(format!("{}.{}", sanitize_component(animation), format.extension()))
}

/// Path of the exported character model.
pub fn character_model_path(output_dir: &Path, character: &str, format: ExportFormat) -> PathBuf {
    output_dir
        .join(sanitize_component(character))
        .join(format!("{}.{}", CHARACTER_MODEL_STEM, format.extension()))
}

/// Turn a display name into a single safe path component.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // "." and ".." would escape or alias the parent directory
    let cleaned = cleaned.trim_end_matches('.').to_string();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
