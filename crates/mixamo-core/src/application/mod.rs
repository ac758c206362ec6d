pub mod command;
pub mod coordinator;
pub mod eventbus;
pub mod service;
