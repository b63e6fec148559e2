//! Operation polling for asynchronous backend jobs
//!
//! Mutating calls (configure, deploy, scale, provision, deprovision) return
//! an operation that must be polled until it reaches a terminal status. An
//! operation that disappears (HTTP 404) counts as finished: deprovisioning
//! deletes the record once the work is done.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::models::operation::{OperationStatus, StatusProbe};

/// Progress events emitted during polling
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Polling has begun
    Started { operation_id: i64 },
    /// One status fetch came back non-terminal
    Polling {
        operation_id: i64,
        status: OperationStatus,
        elapsed: Duration,
    },
    /// Operation reached `succeeded`
    Completed { operation_id: i64 },
    /// Operation no longer exists
    Gone { operation_id: i64 },
    /// Operation reached `failed`
    Failed { operation_id: i64, error: String },
}

/// Callback type for progress updates
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Deadline and pacing for [`wait_for_operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay after the first non-terminal fetch
    pub interval: Duration,
    /// Cap for the doubling delay
    pub max_interval: Duration,
    /// Total time allowed before giving up
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        crate::config::PollConfig::default().options()
    }
}

impl PollOptions {
    /// Same pacing with a different deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay before the poll following attempt `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.interval.saturating_mul(factor).min(self.max_interval)
    }
}

/// Poll `/operations/{id}` until it succeeds, fails, disappears, or the deadline passes
///
/// # Example
///
/// ```rust,ignore
/// use aptible_core::{PollOptions, ProgressEvent, wait_for_operation};
///
/// wait_for_operation(
///     &client,
///     operation.id,
///     &PollOptions::default(),
///     Some(Box::new(|event| {
///         if let ProgressEvent::Polling { status, elapsed, .. } = event {
///             eprintln!("{status:?} after {:.0}s", elapsed.as_secs_f64());
///         }
///     })),
/// )
/// .await?;
/// ```
pub async fn wait_for_operation(
    client: &ApiClient,
    operation_id: i64,
    options: &PollOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let start = Instant::now();
    let path = format!("/operations/{}", operation_id);
    let mut attempt = 0u32;

    emit(&on_progress, ProgressEvent::Started { operation_id });

    loop {
        let elapsed = start.elapsed();
        if elapsed > options.timeout {
            warn!(operation_id, timeout = ?options.timeout, "Operation timed out");
            return Err(CoreError::OperationTimeout {
                id: operation_id,
                timeout: options.timeout,
            });
        }

        let body = match client.get(&path).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => {
                info!(operation_id, "Operation no longer exists; treating as complete");
                emit(&on_progress, ProgressEvent::Gone { operation_id });
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let probe: StatusProbe = serde_json::from_value(body).map_err(CoreError::decode)?;
        debug!(operation_id, status = ?probe.status, "Polled operation");

        match probe.status {
            OperationStatus::Succeeded => {
                info!(operation_id, "Operation succeeded");
                emit(&on_progress, ProgressEvent::Completed { operation_id });
                return Ok(());
            }
            OperationStatus::Failed => {
                let error = probe
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "No error message".to_string());
                warn!(operation_id, error = %error, "Operation failed");
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        operation_id,
                        error: error.clone(),
                    },
                );
                return Err(CoreError::OperationFailed {
                    id: operation_id,
                    message: error,
                });
            }
            status => {
                emit(
                    &on_progress,
                    ProgressEvent::Polling {
                        operation_id,
                        status,
                        elapsed,
                    },
                );
                tokio::time::sleep(options.backoff(attempt)).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Helper to emit progress events
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
