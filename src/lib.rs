pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod services;
pub mod sources;

pub use error::ScanError;
