pub mod commands;
pub mod error;
pub mod events;
pub mod state;
