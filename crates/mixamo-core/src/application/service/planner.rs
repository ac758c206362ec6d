//! Turns a catalog selection into download tasks.

use crate::domain::error::DomainError;
use crate::domain::layout;
use crate::domain::model::{
    Animation, Character, DownloadTask, ExportOptions, SelectionMode, TaskAsset,
};
use crate::infrastructure::config::UserSettings;

/// Build the tasks for `selection`, in catalog order.
///
/// `include_model` appends the character model to an animation selection.
/// Output paths are resolved here and never change afterwards.
pub fn plan_tasks(
    character: &Character,
    animations: &[Animation],
    selection: &SelectionMode,
    include_model: bool,
    settings: &UserSettings,
) -> Result<Vec<DownloadTask>, DomainError> {
    settings.validate()?;
    let output_dir = settings.effective_output_dir();
    let options = settings.export_options();

    let chosen: Vec<&Animation> = match selection {
        SelectionMode::All => animations.iter().collect(),
        SelectionMode::Matching { query } => {
            animations.iter().filter(|a| a.matches(query)).collect()
        }
        SelectionMode::Selected { ids } => {
            let unknown: Vec<&str> = ids
                .iter()
                .filter(|id| !animations.iter().any(|a| &a.id == *id))
                .map(String::as_str)
                .collect();
            if !unknown.is_empty() {
                return Err(DomainError::NotFound(format!(
                    "Animations not in the catalog: {}",
                    unknown.join(", ")
                )));
            }
            animations.iter().filter(|a| ids.contains(&a.id)).collect()
        }
        SelectionMode::CharacterModel => Vec::new(),
    };

    let mut tasks: Vec<DownloadTask> = chosen
        .into_iter()
        .map(|animation| {
            DownloadTask::new(
                character.clone(),
                TaskAsset::Animation(animation.clone()),
                layout::animation_path(
                    &output_dir,
                    &character.name,
                    &animation.name,
                    options.format,
                ),
                options,
            )
        })
        .collect();

    if include_model || *selection == SelectionMode::CharacterModel {
        // The T-pose export is only useful with the mesh
        let model_options = ExportOptions {
            skin: true,
            ..options
        };
        tasks.push(DownloadTask::new(
            character.clone(),
            TaskAsset::CharacterModel,
            layout::character_model_path(&output_dir, &character.name, options.format),
            model_options,
        ));
    }

    tracing::debug!(
        "Planned {} tasks for {} ({:?})",
        tasks.len(),
        character.name,
        selection
    );
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ExportFormat;
    use crate::test_support::{animation, character};
    use std::path::PathBuf;

    fn settings() -> UserSettings {
        UserSettings {
            output_dir: Some(PathBuf::from("downloads")),
            ..Default::default()
        }
    }

    fn catalog() -> Vec<Animation> {
        vec![animation("Walking"), animation("Running"), animation("Walk Back")]
    }

    fn labels(tasks: &[DownloadTask]) -> Vec<String> {
        tasks.iter().map(|t| t.label()).collect()
    }

    #[test]
    fn test_all_in_catalog_order() {
        let tasks = plan_tasks(
            &character("Remy"),
            &catalog(),
            &SelectionMode::All,
            false,
            &settings(),
        )
        .unwrap();
        assert_eq!(
            labels(&tasks),
            vec!["Remy / Walking", "Remy / Running", "Remy / Walk Back"]
        );
        assert_eq!(
            tasks[0].output_path,
            PathBuf::from("downloads/Remy/animations/Walking.fbx")
        );
    }

    #[test]
    fn test_matching_query() {
        let selection = SelectionMode::Matching {
            query: "WALK".into(),
        };
        let tasks =
            plan_tasks(&character("Remy"), &catalog(), &selection, false, &settings()).unwrap();
        assert_eq!(labels(&tasks), vec!["Remy / Walking", "Remy / Walk Back"]);
    }

    #[test]
    fn test_selected_ids_keep_catalog_order() {
        let selection = SelectionMode::Selected {
            ids: vec!["walk-back".into(), "walking".into()],
        };
        let tasks =
            plan_tasks(&character("Remy"), &catalog(), &selection, false, &settings()).unwrap();
        assert_eq!(labels(&tasks), vec!["Remy / Walking", "Remy / Walk Back"]);
    }

    #[test]
    fn test_selected_unknown_id() {
        let selection = SelectionMode::Selected {
            ids: vec!["moonwalk".into()],
        };
        let err = plan_tasks(&character("Remy"), &catalog(), &selection, false, &settings())
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_character_model_always_skinned() {
        let settings = UserSettings {
            format: ExportFormat::Collada,
            skin: false,
            ..settings()
        };
        let tasks = plan_tasks(
            &character("Remy"),
            &[],
            &SelectionMode::CharacterModel,
            false,
            &settings,
        )
        .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].asset, TaskAsset::CharacterModel);
        assert!(tasks[0].options.skin);
        assert_eq!(
            tasks[0].output_path,
            PathBuf::from("downloads/Remy/character_model.zip")
        );
    }

    #[test]
    fn test_include_model_appends_after_animations() {
        let tasks = plan_tasks(
            &character("Remy"),
            &catalog(),
            &SelectionMode::All,
            true,
            &settings(),
        )
        .unwrap();
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[3].asset, TaskAsset::CharacterModel);
        assert!(!tasks[0].options.skin);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = UserSettings {
            fps: 25,
            ..settings()
        };
        let err = plan_tasks(&character("Remy"), &catalog(), &SelectionMode::All, false, &settings)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
