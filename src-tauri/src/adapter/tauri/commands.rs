use crate::adapter::tauri::error::ApiError;
use crate::adapter::tauri::state::AppState;
use mixamo_core::domain::model::{
    Animation, Character, Credentials, DownloadTask, SelectionMode, SessionInfo,
};
use mixamo_core::infrastructure::config::{self, UserSettings};
use serde::Deserialize;
use tauri::{AppHandle, State};
use tauri_plugin_shell::ShellExt;

// ====== Settings Commands ======

#[tauri::command]
pub async fn get_settings(state: State<'_, AppState>) -> Result<UserSettings, String> {
    Ok(state.settings.read().await.clone())
}

#[tauri::command]
pub async fn save_settings(
    state: State<'_, AppState>,
    settings: UserSettings,
) -> Result<UserSettings, String> {
    settings.validate().map_err(|e| String::from(ApiError::from(e)))?;
    config::save_user_settings(&settings).map_err(|e| String::from(ApiError::from(e)))?;

    *state.settings.write().await = settings.clone();
    Ok(settings)
}

/// Native folder picker; `None` when the user cancels
#[tauri::command]
pub async fn pick_output_dir() -> Result<Option<String>, String> {
    let folder = rfd::AsyncFileDialog::new()
        .set_title("Choose the output folder")
        .pick_folder()
        .await;

    Ok(folder.map(|handle| handle.path().display().to_string()))
}

#[tauri::command]
#[allow(deprecated)]
pub async fn open_output_dir(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let dir = state.settings.read().await.effective_output_dir();
    std::fs::create_dir_all(&dir).map_err(|e| format!("Failed to create {:?}: {}", dir, e))?;

    app.shell()
        .open(dir.display().to_string(), None)
        .map_err(|e| format!("Failed to open {:?}: {}", dir, e))
}

// ====== Session Commands ======

#[derive(Deserialize)]
pub struct StartSessionRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[tauri::command]
pub async fn start_session(
    state: State<'_, AppState>,
    request: StartSessionRequest,
) -> Result<SessionInfo, String> {
    // Blank credentials reuse the sign-in kept in the browser profile
    let credentials = if request.username.trim().is_empty() {
        None
    } else {
        Some(Credentials {
            username: request.username.trim().to_string(),
            password: request.password,
        })
    };

    state
        .coordinator
        .start_session(credentials)
        .await
        .map_err(|e| ApiError::from(e).into())
}

#[tauri::command]
pub async fn stop_session(state: State<'_, AppState>) -> Result<(), String> {
    state
        .coordinator
        .stop_session()
        .await
        .map_err(|e| ApiError::from(e).into())
}

#[tauri::command]
pub async fn get_session(state: State<'_, AppState>) -> Result<Option<SessionInfo>, String> {
    Ok(state.coordinator.session_info().await)
}

// ====== Catalog Commands ======

#[tauri::command]
pub async fn list_characters(state: State<'_, AppState>) -> Result<Vec<Character>, String> {
    state
        .coordinator
        .list_characters()
        .await
        .map_err(|e| ApiError::from(e).into())
}

#[tauri::command]
pub async fn list_animations(
    state: State<'_, AppState>,
    character_id: String,
) -> Result<Vec<Animation>, String> {
    state
        .coordinator
        .list_animations(&character_id)
        .await
        .map_err(|e| ApiError::from(e).into())
}

// ====== Queue Commands ======

#[derive(Deserialize)]
pub struct QueueDownloadsRequest {
    character_id: String,
    selection: SelectionMode,
    #[serde(default)]
    include_model: bool,
}

#[tauri::command]
pub async fn queue_downloads(
    state: State<'_, AppState>,
    request: QueueDownloadsRequest,
) -> Result<usize, String> {
    let settings = state.settings.read().await.clone();
    state
        .coordinator
        .queue_downloads(
            &request.character_id,
            request.selection,
            request.include_model,
            &settings,
        )
        .await
        .map_err(|e| ApiError::from(e).into())
}

#[tauri::command]
pub async fn get_tasks(state: State<'_, AppState>) -> Result<Vec<DownloadTask>, String> {
    Ok(state.coordinator.tasks().await)
}

#[tauri::command]
pub async fn clear_tasks(state: State<'_, AppState>) -> Result<usize, String> {
    state
        .coordinator
        .clear_tasks()
        .await
        .map_err(|e| ApiError::from(e).into())
}

#[tauri::command]
pub async fn requeue_failed(state: State<'_, AppState>) -> Result<usize, String> {
    state
        .coordinator
        .requeue_failed()
        .await
        .map_err(|e| ApiError::from(e).into())
}

// ====== Run Commands ======

#[tauri::command]
pub async fn start_download(state: State<'_, AppState>) -> Result<usize, String> {
    let settings = state.settings.read().await.clone();
    state
        .coordinator
        .start_download(settings)
        .await
        .map_err(|e| ApiError::from(e).into())
}

#[tauri::command]
pub async fn pause_download(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(state.coordinator.pause_download().await)
}

#[tauri::command]
pub fn resume_download(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(state.coordinator.resume_download())
}

#[tauri::command]
pub fn cancel_download(state: State<'_, AppState>) -> Result<(), String> {
    state.coordinator.cancel_download();
    Ok(())
}
