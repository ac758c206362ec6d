pub mod browser;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod mixamo_api;
pub mod scrape;
pub mod storage;
