mod adapter;

use adapter::tauri::{commands, events, state::AppState};
use mixamo_core::application::eventbus::create_event_bus;
use mixamo_core::infrastructure::{config, logging};
use tauri::{Manager, RunEvent};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging
    logging::setup(!cfg!(debug_assertions));

    // Initialize configuration
    config::init();

    let settings = config::load_user_settings();
    tracing::info!(
        "Output folder: {}",
        settings.effective_output_dir().display()
    );

    let event_bus = create_event_bus();
    let app_state = AppState::new(event_bus.clone(), settings);

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .manage(app_state)
        .setup(move |app| {
            // Start event forwarder to push domain events to frontend
            events::start_event_forwarder(app.handle().clone(), event_bus.clone());
            tracing::info!("Mixamo Downloader started");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Settings
            commands::get_settings,
            commands::save_settings,
            commands::pick_output_dir,
            commands::open_output_dir,
            // Session
            commands::start_session,
            commands::stop_session,
            commands::get_session,
            // Catalog
            commands::list_characters,
            commands::list_animations,
            // Queue
            commands::queue_downloads,
            commands::get_tasks,
            commands::clear_tasks,
            commands::requeue_failed,
            // Run
            commands::start_download,
            commands::pause_download,
            commands::resume_download,
            commands::cancel_download,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| {
            if let RunEvent::ExitRequested { .. } = event {
                let coordinator = app.state::<AppState>().coordinator.clone();
                tauri::async_runtime::block_on(async move {
                    if let Err(e) = coordinator.stop_session().await {
                        tracing::warn!("Failed to stop session on exit: {}", e);
                    }
                });
            }
        });
}
