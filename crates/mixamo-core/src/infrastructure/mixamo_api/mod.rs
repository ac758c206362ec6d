//! Client for the site's export endpoints, used by the API download method.

mod client;
mod types;

pub use client::MixamoApi;
pub use types::{ExportRequest, MonitorStatus, Product};
