pub mod config;
pub mod db;
pub mod export;
pub mod metrics;
pub mod models;
pub mod points;
pub mod report;
