//! Queue storage samples
//!
//! Walks through the queue service the way an application uses it: queue
//! lifecycle, message posting and leasing, queue metadata, and service-wide
//! properties. Every sample runs against any [`queuestack_queue::QueueService`].

pub mod config;
pub mod names;
pub mod samples;

pub use config::{Config, SampleSettings};
pub use samples::runner::{SampleRunner, Suite, SuiteOutcome};
pub use samples::SampleError;
