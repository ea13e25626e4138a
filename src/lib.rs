pub mod app;
pub mod clock;
pub mod config;
pub mod duration;
pub mod format;
pub mod market_data;
pub mod models;
pub mod portfolio;
pub mod report;
