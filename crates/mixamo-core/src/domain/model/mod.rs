mod catalog;
mod export;
mod selection;
mod session;
mod task;

pub use catalog::{Animation, Character};
pub use export::{DownloadMethod, ExportFormat, ExportOptions};
pub use selection::SelectionMode;
pub use session::{Credentials, SessionInfo, SessionState};
pub use task::{DownloadTask, RunSummary, TaskAsset, TaskState};
