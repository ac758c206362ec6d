mod chromium;
mod download_watch;
mod driver;

pub use chromium::ChromiumDriver;
pub use download_watch::{DownloadMarker, DownloadWatcher};
pub use driver::BrowserDriver;
