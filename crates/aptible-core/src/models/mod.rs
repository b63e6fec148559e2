//! Typed platform resources and their managers
//!
//! Each resource is an immutable snapshot hydrated from a server payload.
//! Fields the server sends that are not modelled here are kept in an
//! `extra` side-table so they survive serialization.

/// Forward the read-only half of [`crate::ResourceManager`] from a wrapping manager
macro_rules! delegate_reads {
    ($manager:ty, $resource:ty) => {
        impl $manager {
            /// List every resource of this type
            pub async fn list(&self) -> $crate::error::Result<Vec<$resource>> {
                self.base.list().await
            }

            /// First resource whose handle equals `handle`
            pub async fn get(&self, handle: &str) -> $crate::error::Result<Option<$resource>> {
                self.base.get(handle).await
            }

            /// Fetch one resource directly; a 404 is `None`
            pub async fn get_by_id(&self, id: i64) -> $crate::error::Result<Option<$resource>> {
                self.base.get_by_id(id).await
            }
        }
    };
}

pub mod account;
pub mod app;
pub mod database;
pub mod operation;
pub mod service;
pub mod stack;
pub mod vhost;

pub use account::{Account, AccountManager};
pub use app::{App, AppManager};
pub use database::{Database, DatabaseImage, DatabaseManager};
pub use operation::{Operation, OperationManager, OperationRequest, OperationStatus, OperationSummary};
pub use service::{ScaleRequest, Service, ServiceManager};
pub use stack::{Stack, StackManager};
pub use vhost::{Vhost, VhostManager};
