//! Queue service client for queuestack
//!
//! Provides the [`QueueService`] seam used by the samples and an in-memory
//! backend with support for:
//! - CreateQueue, DeleteQueue, ListQueues (paged, lazily streamed)
//! - Queue metadata and approximate message counts
//! - PutMessage, PeekMessages, GetMessages, UpdateMessage, DeleteMessage, ClearMessages
//! - Pop-receipt leases with visibility timeouts and message time-to-live
//! - Service properties (logging, metrics, CORS) with partial updates

pub mod models;
pub mod pager;
pub mod properties;
pub mod service;
pub mod storage;
mod validation;

pub use models::{
    ApproximateCount, DequeuedMessage, EnqueuedMessage, MessageTtl, Metadata, PeekedMessage,
    PopReceipt, QueueItem, QueueProperties, UpdatedMessage,
};
pub use pager::{list_queues, list_queues_with};
pub use properties::{Cors, CorsRule, Logging, Metrics, RetentionPolicy, ServiceProperties};
pub use service::{CreateMessageOptions, ListQueuesOptions, ListQueuesSegment, QueueService};
pub use storage::{InMemoryQueueService, Operation};

pub use queuestack_core::{QueueError, Result};
