//! Core types for queuestack
//!
//! This crate provides the error model, account settings and clock shared by
//! the queue backend and the samples.

pub mod account;
pub mod clock;
pub mod error;

pub use account::StorageAccount;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorCode, QueueError, Result};
