use std::sync::Arc;

use mixamo_core::application::coordinator::{Coordinator, DriverFactory};
use mixamo_core::application::eventbus::SharedEventBus;
use mixamo_core::infrastructure::browser::{BrowserDriver, ChromiumDriver};
use mixamo_core::infrastructure::config::{self, UserSettings};
use tokio::sync::RwLock;

pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub event_bus: SharedEventBus,
    /// Last saved settings, used for planning and runs
    pub settings: RwLock<UserSettings>,
}

impl AppState {
    pub fn new(event_bus: SharedEventBus, settings: UserSettings) -> Self {
        let app_config = config::app();

        let browser_options = app_config.browser.clone();
        let driver_factory: DriverFactory = Arc::new(move || {
            Arc::new(ChromiumDriver::new(browser_options.clone())) as Arc<dyn BrowserDriver>
        });

        let coordinator = Arc::new(Coordinator::new(
            event_bus.clone(),
            app_config.clone(),
            driver_factory,
        ));

        Self {
            coordinator,
            event_bus,
            settings: RwLock::new(settings),
        }
    }
}
