pub mod error;
pub mod event;
pub mod layout;
pub mod model;
