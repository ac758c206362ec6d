//! mixamo-core: catalog scraping, task planning and the sequential download
//! orchestrator behind the desktop shell.
//!
//! Kept free of any UI toolkit; the Tauri shell lives in `src-tauri`.

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;
