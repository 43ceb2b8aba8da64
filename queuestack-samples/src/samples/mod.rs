//! Sample procedures
//!
//! Each sample is a linear sequence of service calls. Samples never clean
//! up after a failure: the first error stops the sample and whatever it had
//! created stays behind.

pub mod lifecycle;
pub mod messages;
pub mod metadata;
pub mod properties;
pub mod runner;

use queuestack_core::QueueError;
use thiserror::Error;

/// Failure of a sample
#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Service properties could not be put back after a sample changed them
    #[error("failed to restore original service properties: {restore}")]
    RestoreFailed {
        restore: QueueError,
        /// Error of the sample itself, if it failed before the restore
        cause: Option<QueueError>,
    },
}

impl SampleError {
    /// The service error that ended the sample
    pub fn queue_error(&self) -> &QueueError {
        match self {
            Self::Queue(err) => err,
            Self::RestoreFailed { restore, .. } => restore,
        }
    }
}
