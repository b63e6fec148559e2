//! Configuration and credential resolution for Aptible tooling
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Settings come from a TOML file in the platform config directory, then
//! `APTIBLE_*` environment variables. Bearer tokens come from
//! `APTIBLE_TOKEN` or the CLI's token file, keyed by auth server URL.

pub mod config;
pub mod credential;
pub mod error;

pub use config::{Config, PollConfig};
pub use credential::TokenStore;
pub use error::ConfigError;
