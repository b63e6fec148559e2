//! # aptible-core
//!
//! Shared engine for Aptible tooling: an authenticated client for the
//! platform's HAL+JSON API, typed resource snapshots, per-resource managers,
//! and the poller that waits on asynchronous backend operations.
//!
//! ## Layers
//!
//! - [`client`] - authenticated GET/POST/PUT/DELETE with bearer-token memoization
//! - [`resource`] - the [`Resource`] trait and the generic [`ResourceManager`]
//! - [`models`] - Account, App, Database, Service, Vhost, Stack, Operation
//! - [`progress`] - operation polling with a deadline and capped backoff
//! - [`lookup`] - handle resolution with parent-scope disambiguation
//! - [`platform`] - wires every manager together from one [`ApiClient`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use aptible_core::{ApiClient, Config, Platform};
//!
//! # async fn example() -> aptible_core::Result<()> {
//! let config = Config::load()?.with_env_overrides();
//! let client = ApiClient::from_config(&config)?;
//! let platform = Platform::new(client, config.poll.options());
//!
//! for account in platform.accounts.list().await? {
//!     println!("{} (stack {:?})", account.handle, account.stack_id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod platform;
pub mod progress;
pub mod resource;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{Config, ConfigError, PollConfig};
pub use error::{CoreError, Result};
pub use models::{
    Account, AccountManager, App, AppManager, Database, DatabaseImage, DatabaseManager, Operation,
    OperationManager, OperationStatus, OperationSummary, ScaleRequest, Service, ServiceManager,
    Stack, StackManager, Vhost, VhostManager,
};
pub use platform::Platform;
pub use progress::{PollOptions, ProgressCallback, ProgressEvent, wait_for_operation};
pub use resource::{Link, Links, Resource, ResourceManager};
