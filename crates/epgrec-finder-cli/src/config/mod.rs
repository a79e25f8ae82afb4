//! Application configuration module.
//!
//! Loads the TOML config file holding the database connection
//! parameters and the exclusion rules.

#[allow(clippy::module_inception)]
mod config;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
