//! Configuration module for Fleet Sentinel.
//!
//! This module handles parsing, validation, and access to the two read-only
//! documents the core depends on, the resource type catalog and the threshold
//! table, along with runtime and API settings. Configurations load from JSON
//! or YAML files or strings.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use fleet_sentinel::config::Config;
//!
//! let config = Config::from_file("sentinel.json").unwrap();
//! println!("Loaded catalog with {} resource types", config.templates.len());
//! ```
//!
//! Building a configuration programmatically:
//!
//! ```
//! use fleet_sentinel::config::{Config, ResourceTemplate, TemplateCatalog, validate_config};
//!
//! let config = Config {
//!     templates: TemplateCatalog::from_templates([
//!         ResourceTemplate::new("web_server", "web_server_{id}", "nginx:alpine"),
//!     ]),
//!     ..Config::default()
//! };
//! validate_config(&config).unwrap();
//! ```
mod parser;
pub mod validator;

pub use parser::{
    ApiConfig, Config, DEFAULT_WORKERS, ID_PLACEHOLDER, MonitoringConfig, ResourceTemplate,
    RuntimeConfig, TemplateCatalog, ThresholdConfig,
};
pub use validator::validate_config;
