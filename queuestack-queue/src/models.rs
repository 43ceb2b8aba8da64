//! Queue and message value types

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// User-defined name/value pairs attached to a queue
pub type Metadata = BTreeMap<String, String>;

/// Time-to-live applied to a message when none is given (7 days)
pub const DEFAULT_MESSAGE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Longest visibility timeout the service accepts (7 days)
pub const MAX_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Visibility timeout applied by a dequeue when none is given
pub const DEFAULT_DEQUEUE_VISIBILITY: Duration = Duration::from_secs(30);

/// Largest message body in bytes (64 KiB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Most messages a single peek or dequeue returns
pub const MAX_MESSAGES_PER_CALL: u32 = 32;

/// How long a message lives before the service discards it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageTtl {
    After(Duration),
    Never,
}

impl Default for MessageTtl {
    fn default() -> Self {
        Self::After(DEFAULT_MESSAGE_TTL)
    }
}

/// Estimated number of messages in a queue.
///
/// The service computes this value asynchronously: it counts messages that
/// are leased or not yet expired, and concurrent producers and consumers can
/// move it at any time. Treat it as a hint, never as the exact queue length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApproximateCount(u64);

impl ApproximateCount {
    pub fn new(estimate: u64) -> Self {
        Self(estimate)
    }

    pub fn estimate(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ApproximateCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "~{}", self.0)
    }
}

/// Lease token for a dequeued message.
///
/// Issued by enqueue, dequeue and update. Only the most recently issued
/// receipt of a message is accepted, and only until its visibility timeout
/// runs out.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopReceipt(String);

impl PopReceipt {
    /// Issue a fresh receipt
    pub fn issue() -> Self {
        let raw = uuid::Uuid::new_v4();
        Self(base64::engine::general_purpose::STANDARD.encode(raw.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PopReceipt {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PopReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Receipts are credentials for a message; keep them short in logs.
impl std::fmt::Debug for PopReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown: String = self.0.chars().take(8).collect();
        write!(f, "PopReceipt({}..)", shown)
    }
}

/// A queue returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub name: String,
    /// Only populated when the listing asked for metadata
    pub metadata: Option<Metadata>,
}

/// Result of reading a queue's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueProperties {
    pub metadata: Metadata,
    pub approximate_message_count: ApproximateCount,
}

/// Result of posting a message
#[derive(Debug, Clone)]
pub struct EnqueuedMessage {
    pub id: String,
    pub pop_receipt: PopReceipt,
    pub insertion_time: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub time_next_visible: DateTime<Utc>,
}

/// A message read without taking a lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeekedMessage {
    pub id: String,
    pub text: String,
    pub insertion_time: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub dequeue_count: u32,
}

/// A message leased to the caller until `time_next_visible`
#[derive(Debug, Clone)]
pub struct DequeuedMessage {
    pub id: String,
    pub pop_receipt: PopReceipt,
    pub text: String,
    pub insertion_time: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub time_next_visible: DateTime<Utc>,
    pub dequeue_count: u32,
}

/// Result of updating a leased message
#[derive(Debug, Clone)]
pub struct UpdatedMessage {
    pub pop_receipt: PopReceipt,
    pub time_next_visible: DateTime<Utc>,
}
