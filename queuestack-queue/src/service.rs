//! Queue service client trait

use async_trait::async_trait;
use queuestack_core::Result;
use std::time::Duration;

use crate::models::{
    DequeuedMessage, EnqueuedMessage, MessageTtl, Metadata, PeekedMessage, PopReceipt, QueueItem,
    QueueProperties, UpdatedMessage,
};
use crate::properties::ServiceProperties;

/// Largest page a listing returns
pub const MAX_LIST_RESULTS: u32 = 5000;

/// Options for posting a message
#[derive(Debug, Clone, Default)]
pub struct CreateMessageOptions {
    /// Delay before the message becomes visible; immediate when unset
    pub visibility_timeout: Option<Duration>,
    /// Lifetime of the message; 7 days when unset
    pub time_to_live: Option<MessageTtl>,
}

impl CreateMessageOptions {
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = Some(timeout);
        self
    }

    pub fn with_time_to_live(mut self, ttl: MessageTtl) -> Self {
        self.time_to_live = Some(ttl);
        self
    }
}

/// Options for one page of a queue listing
#[derive(Debug, Clone, Default)]
pub struct ListQueuesOptions {
    pub prefix: Option<String>,
    /// Name of the first queue to return, taken from a previous `next_marker`
    pub marker: Option<String>,
    /// Page size, 1 to 5000; the service maximum when unset
    pub max_results: Option<u32>,
    pub include_metadata: bool,
}

impl ListQueuesOptions {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn include_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }
}

/// One page of a queue listing
#[derive(Debug, Clone, Default)]
pub struct ListQueuesSegment {
    pub queues: Vec<QueueItem>,
    /// Marker of the next page, `None` on the last page
    pub next_marker: Option<String>,
}

/// Client operations of the queue service.
///
/// Every call is a single remote request. Failures surface as
/// [`queuestack_core::QueueError`]; nothing here retries.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Create a queue. Returns `false` when an identical queue already exists.
    async fn create_queue(&self, name: &str, metadata: Metadata) -> Result<bool>;

    /// Delete a queue and all of its messages
    async fn delete_queue(&self, name: &str) -> Result<()>;

    /// Fetch one page of queues in name order
    async fn list_queues_segment(&self, options: &ListQueuesOptions) -> Result<ListQueuesSegment>;

    /// Read user metadata and the approximate message count
    async fn get_queue_metadata(&self, name: &str) -> Result<QueueProperties>;

    /// Replace the user metadata of a queue
    async fn set_queue_metadata(&self, name: &str, metadata: Metadata) -> Result<()>;

    /// Post a message to the back of a queue
    async fn create_message(
        &self,
        queue: &str,
        text: &str,
        options: CreateMessageOptions,
    ) -> Result<EnqueuedMessage>;

    /// Read visible messages without changing their visibility
    async fn peek_messages(&self, queue: &str, count: u32) -> Result<Vec<PeekedMessage>>;

    /// Lease up to `count` visible messages for `visibility_timeout`
    async fn get_messages(
        &self,
        queue: &str,
        count: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<DequeuedMessage>>;

    /// Change the text and visibility of a leased message
    async fn update_message(
        &self,
        queue: &str,
        message_id: &str,
        pop_receipt: &PopReceipt,
        text: Option<&str>,
        visibility_timeout: Duration,
    ) -> Result<UpdatedMessage>;

    /// Delete a leased message
    async fn delete_message(
        &self,
        queue: &str,
        message_id: &str,
        pop_receipt: &PopReceipt,
    ) -> Result<()>;

    /// Delete every message in a queue
    async fn clear_messages(&self, queue: &str) -> Result<()>;

    async fn get_service_properties(&self) -> Result<ServiceProperties>;

    /// Apply the sections set in `properties`, leaving the others unchanged
    async fn set_service_properties(&self, properties: &ServiceProperties) -> Result<()>;
}
