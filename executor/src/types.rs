//! Error types and small abstraction traits used by the executor.

use async_trait::async_trait;
use core_types::{AppError, CanonicalMessage};
use thiserror::Error;

/// Errors specific to the executor's own glue logic, before they are
/// folded into the shared [`AppError`] the scheduler understands.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("provider not found: type={provider_type:?} name={name:?}")]
    ProviderNotFound { provider_type: String, name: String },

    #[error("bad job params: {0}")]
    BadParams(String),

    #[error(transparent)]
    Provider(#[from] AppError),

    #[error("bus publish failed: {0}")]
    Bus(String),

    #[error("message encoding failed: {0}")]
    Encoding(String),
}

impl From<ExecutorError> for AppError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::ProviderNotFound { .. } => AppError::InvalidArgument(err.to_string()),
            ExecutorError::BadParams(msg) => AppError::InvalidArgument(msg),
            ExecutorError::Provider(app_err) => app_err,
            ExecutorError::Bus(msg) => AppError::Transient(msg),
            ExecutorError::Encoding(msg) => AppError::Other(msg),
        }
    }
}

/// Append-only message bus the executor publishes a completed fetch's
/// [`CanonicalMessage`] onto. `stream` is the spec.md §6 stream name
/// (`stock:stream:<payload_type>`, or a job-specified override).
#[async_trait]
pub trait Bus: Send + Sync {
    async fn publish(&self, stream: &str, message: &CanonicalMessage) -> Result<(), ExecutorError>;

    /// Best-effort liveness probe, used by bootstrap (C11) before wiring
    /// the rest of the node.
    async fn ping(&self) -> Result<(), ExecutorError>;

    /// Release any held connection. The default is a no-op: most bus
    /// implementations drop their connection cleanly when the handle
    /// is dropped and have nothing else to flush.
    async fn close(&self) -> Result<(), ExecutorError> {
        Ok(())
    }
}
