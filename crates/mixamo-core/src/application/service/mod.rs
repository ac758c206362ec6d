mod orchestrator;
mod planner;
mod run_control;
mod session_actor;
mod task_queue;

pub use orchestrator::{DownloadOrchestrator, RunContext, RunPolicy};
pub use planner::plan_tasks;
pub use run_control::{RunControl, RunSignal};
pub use session_actor::{SessionActor, SessionHandle};
pub use task_queue::{SharedTaskQueue, TaskQueue};
