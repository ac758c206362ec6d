use mixamo_core::application::eventbus::SharedEventBus;
use mixamo_core::domain::event::DomainEvent;
use tauri::{AppHandle, Emitter};

/// Start listening to the event bus and forward events to the frontend
pub fn start_event_forwarder(app: AppHandle, event_bus: SharedEventBus) {
    let mut receiver = event_bus.subscribe();

    // Use tauri's async runtime instead of tokio::spawn directly
    // This ensures the task runs within Tauri's managed runtime
    tauri::async_runtime::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let DomainEvent::FatalError { reason } = &event {
                        show_fatal_dialog(reason.clone());
                    }
                    forward_event(&app, event);
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event forwarder lagged by {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, stopping forwarder");
                    break;
                }
            }
        }
    });
}

fn forward_event(app: &AppHandle, event: DomainEvent) {
    let event_name = event.event_name();

    if let Err(e) = app.emit(event_name, &event) {
        tracing::warn!("Failed to emit event {}: {}", event_name, e);
    }
}

/// Modal error dialog; the run is already halted when this shows.
fn show_fatal_dialog(reason: String) {
    tauri::async_runtime::spawn(async move {
        rfd::AsyncMessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("Mixamo Downloader")
            .set_description(format!("The download was stopped.\n\n{}", reason))
            .set_buttons(rfd::MessageButtons::Ok)
            .show()
            .await;
    });
}
