//! In-memory queue backend

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::{Mutex, RwLock};
use queuestack_core::{Clock, QueueError, Result, StorageAccount, SystemClock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::models::{
    ApproximateCount, DequeuedMessage, EnqueuedMessage, MessageTtl, Metadata, PeekedMessage,
    PopReceipt, QueueItem, QueueProperties, UpdatedMessage, MAX_VISIBILITY_TIMEOUT,
};
use crate::properties::ServiceProperties;
use crate::service::{
    CreateMessageOptions, ListQueuesOptions, ListQueuesSegment, QueueService, MAX_LIST_RESULTS,
};
use crate::validation;

/// Service operations, used to count calls and to inject faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateQueue,
    DeleteQueue,
    ListQueues,
    GetQueueMetadata,
    SetQueueMetadata,
    CreateMessage,
    PeekMessages,
    GetMessages,
    UpdateMessage,
    DeleteMessage,
    ClearMessages,
    GetServiceProperties,
    SetServiceProperties,
}

#[derive(Debug)]
struct StoredMessage {
    id: String,
    text: String,
    insertion_time: DateTime<Utc>,
    expiration_time: Option<DateTime<Utc>>,
    time_next_visible: DateTime<Utc>,
    dequeue_count: u32,
    pop_receipt: PopReceipt,
}

impl StoredMessage {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time.is_some_and(|t| t <= now)
    }

    fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.time_next_visible <= now
    }

    /// The receipt is the latest one issued and its lease has not run out
    fn holds_lease(&self, pop_receipt: &PopReceipt, now: DateTime<Utc>) -> bool {
        self.pop_receipt == *pop_receipt && now < self.time_next_visible
    }

    fn peeked(&self) -> PeekedMessage {
        PeekedMessage {
            id: self.id.clone(),
            text: self.text.clone(),
            insertion_time: self.insertion_time,
            expiration_time: self.expiration_time,
            dequeue_count: self.dequeue_count,
        }
    }
}

#[derive(Debug, Default)]
struct StoredQueue {
    metadata: Metadata,
    messages: VecDeque<StoredMessage>,
}

impl StoredQueue {
    fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.messages.retain(|m| !m.is_expired(now));
    }

    fn leased_message(
        &mut self,
        queue: &str,
        message_id: &str,
        pop_receipt: &PopReceipt,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| QueueError::MessageNotFound {
                queue: queue.to_string(),
                message_id: message_id.to_string(),
            })?;

        if !self.messages[index].holds_lease(pop_receipt, now) {
            return Err(QueueError::LeaseExpiredOrMismatch {
                queue: queue.to_string(),
                message_id: message_id.to_string(),
            });
        }
        Ok(index)
    }
}

fn after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Queue service held entirely in memory.
///
/// Implements the full [`QueueService`] contract for one storage account:
/// name-ordered paged listings, lease checks on pop-receipts, lazy purging
/// of expired messages and partial service property updates. Time comes
/// from an injected [`Clock`].
#[derive(Debug)]
pub struct InMemoryQueueService {
    account: StorageAccount,
    queues: DashMap<String, StoredQueue>,
    properties: RwLock<ServiceProperties>,
    clock: Arc<dyn Clock>,
    faults: Mutex<HashMap<Operation, QueueError>>,
    calls: DashMap<Operation, usize>,
}

impl Default for InMemoryQueueService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueueService {
    /// Backend for the emulator account using the wall clock
    pub fn new() -> Self {
        Self::with_clock(StorageAccount::emulator(), Arc::new(SystemClock))
    }

    pub fn with_clock(account: StorageAccount, clock: Arc<dyn Clock>) -> Self {
        Self {
            account,
            queues: DashMap::new(),
            properties: RwLock::new(ServiceProperties::service_defaults()),
            clock,
            faults: Mutex::new(HashMap::new()),
            calls: DashMap::new(),
        }
    }

    /// Open a backend for `account` after checking its credentials
    pub fn connect(account: &StorageAccount) -> Result<Self> {
        let valid_name = (3..=24).contains(&account.name.len())
            && account
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !valid_name {
            return Err(QueueError::AuthenticationFailed(format!(
                "invalid account name: {:?}",
                account.name
            )));
        }

        let key = base64::engine::general_purpose::STANDARD
            .decode(&account.key)
            .map_err(|e| QueueError::AuthenticationFailed(format!("account key: {e}")))?;
        if key.is_empty() {
            return Err(QueueError::AuthenticationFailed(
                "account key is empty".to_string(),
            ));
        }

        info!(account = %account.name, endpoint = %account.queue_endpoint(), "Opened queue service");
        Ok(Self::with_clock(account.clone(), Arc::new(SystemClock)))
    }

    pub fn account(&self) -> &StorageAccount {
        &self.account
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: Operation, error: QueueError) {
        self.faults.lock().insert(operation, error);
    }

    /// Number of times `operation` has been called
    pub fn calls(&self, operation: Operation) -> usize {
        self.calls.get(&operation).map_or(0, |c| *c)
    }

    /// Record the call, surface an injected fault, and read the clock
    fn begin(&self, operation: Operation) -> Result<DateTime<Utc>> {
        *self.calls.entry(operation).or_insert(0) += 1;
        if let Some(error) = self.faults.lock().remove(&operation) {
            return Err(error);
        }
        Ok(self.clock.now())
    }
}

#[async_trait]
impl QueueService for InMemoryQueueService {
    async fn create_queue(&self, name: &str, metadata: Metadata) -> Result<bool> {
        self.begin(Operation::CreateQueue)?;
        validation::queue_name(name)?;
        validation::metadata(&metadata)?;

        match self.queues.entry(name.to_string()) {
            Entry::Occupied(existing) => {
                if existing.get().metadata == metadata {
                    debug!(name = %name, "Queue already exists");
                    Ok(false)
                } else {
                    Err(QueueError::QueueAlreadyExists(name.to_string()))
                }
            }
            Entry::Vacant(slot) => {
                info!(name = %name, "Creating queue");
                slot.insert(StoredQueue {
                    metadata,
                    messages: VecDeque::new(),
                });
                Ok(true)
            }
        }
    }

    async fn delete_queue(&self, name: &str) -> Result<()> {
        self.begin(Operation::DeleteQueue)?;
        self.queues
            .remove(name)
            .ok_or_else(|| QueueError::QueueNotFound(name.to_string()))?;
        info!(name = %name, "Deleted queue");
        Ok(())
    }

    async fn list_queues_segment(&self, options: &ListQueuesOptions) -> Result<ListQueuesSegment> {
        self.begin(Operation::ListQueues)?;
        let max_results = options.max_results.unwrap_or(MAX_LIST_RESULTS);
        if max_results == 0 || max_results > MAX_LIST_RESULTS {
            return Err(QueueError::out_of_range(
                "maxresults",
                format!("must be between 1 and {MAX_LIST_RESULTS}, got {max_results}"),
            ));
        }

        let prefix = options.prefix.as_deref().unwrap_or("");
        let marker = options.marker.as_deref().unwrap_or("");
        let mut queues: Vec<QueueItem> = self
            .queues
            .iter()
            .filter(|q| q.key().starts_with(prefix) && q.key().as_str() >= marker)
            .map(|q| QueueItem {
                name: q.key().clone(),
                metadata: options.include_metadata.then(|| q.value().metadata.clone()),
            })
            .collect();
        queues.sort_by(|a, b| a.name.cmp(&b.name));

        let page_size = usize::try_from(max_results).unwrap_or(usize::MAX);
        let next_marker = queues.get(page_size).map(|q| q.name.clone());
        queues.truncate(page_size);

        debug!(prefix = %prefix, count = queues.len(), more = next_marker.is_some(), "Listed queues");
        Ok(ListQueuesSegment {
            queues,
            next_marker,
        })
    }

    async fn get_queue_metadata(&self, name: &str) -> Result<QueueProperties> {
        let now = self.begin(Operation::GetQueueMetadata)?;
        let mut queue = self
            .queues
            .get_mut(name)
            .ok_or_else(|| QueueError::QueueNotFound(name.to_string()))?;
        queue.purge_expired(now);

        let count = u64::try_from(queue.messages.len()).unwrap_or(u64::MAX);
        Ok(QueueProperties {
            metadata: queue.metadata.clone(),
            approximate_message_count: ApproximateCount::new(count),
        })
    }

    async fn set_queue_metadata(&self, name: &str, metadata: Metadata) -> Result<()> {
        self.begin(Operation::SetQueueMetadata)?;
        validation::metadata(&metadata)?;
        let mut queue = self
            .queues
            .get_mut(name)
            .ok_or_else(|| QueueError::QueueNotFound(name.to_string()))?;

        info!(name = %name, entries = metadata.len(), "Set queue metadata");
        queue.metadata = metadata;
        Ok(())
    }

    async fn create_message(
        &self,
        queue: &str,
        text: &str,
        options: CreateMessageOptions,
    ) -> Result<EnqueuedMessage> {
        let now = self.begin(Operation::CreateMessage)?;
        validation::message_text(text)?;

        let visibility_timeout = options.visibility_timeout.unwrap_or(Duration::ZERO);
        validation::duration_between(
            "visibilitytimeout",
            visibility_timeout,
            Duration::ZERO,
            MAX_VISIBILITY_TIMEOUT,
        )?;

        let ttl = options.time_to_live.unwrap_or_default();
        let expiration_time = match ttl {
            MessageTtl::After(ttl) => {
                if ttl < Duration::from_secs(1) {
                    return Err(QueueError::out_of_range(
                        "messagettl",
                        "must be at least 1 second",
                    ));
                }
                if visibility_timeout >= ttl {
                    return Err(QueueError::out_of_range(
                        "visibilitytimeout",
                        "must be shorter than the message time-to-live",
                    ));
                }
                chrono::Duration::from_std(ttl)
                    .ok()
                    .and_then(|d| now.checked_add_signed(d))
            }
            MessageTtl::Never => None,
        };

        let mut stored = self
            .queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;
        stored.purge_expired(now);

        let message = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            insertion_time: now,
            expiration_time,
            time_next_visible: after(now, visibility_timeout),
            dequeue_count: 0,
            pop_receipt: PopReceipt::issue(),
        };
        let enqueued = EnqueuedMessage {
            id: message.id.clone(),
            pop_receipt: message.pop_receipt.clone(),
            insertion_time: message.insertion_time,
            expiration_time: message.expiration_time,
            time_next_visible: message.time_next_visible,
        };
        stored.messages.push_back(message);

        info!(queue = %queue, message_id = %enqueued.id, "Put message");
        Ok(enqueued)
    }

    async fn peek_messages(&self, queue: &str, count: u32) -> Result<Vec<PeekedMessage>> {
        let now = self.begin(Operation::PeekMessages)?;
        validation::message_count("numofmessages", count)?;

        // Read access only: peeking never changes leases or receipts.
        let stored = self
            .queues
            .get(queue)
            .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;
        let limit = usize::try_from(count).unwrap_or(usize::MAX);
        let peeked: Vec<PeekedMessage> = stored
            .messages
            .iter()
            .filter(|m| !m.is_expired(now) && m.is_visible(now))
            .take(limit)
            .map(StoredMessage::peeked)
            .collect();

        debug!(queue = %queue, count = peeked.len(), "Peeked messages");
        Ok(peeked)
    }

    async fn get_messages(
        &self,
        queue: &str,
        count: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<DequeuedMessage>> {
        let now = self.begin(Operation::GetMessages)?;
        validation::message_count("numofmessages", count)?;
        validation::duration_between(
            "visibilitytimeout",
            visibility_timeout,
            Duration::from_secs(1),
            MAX_VISIBILITY_TIMEOUT,
        )?;

        let mut stored = self
            .queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;
        stored.purge_expired(now);

        let limit = usize::try_from(count).unwrap_or(usize::MAX);
        let hidden_until = after(now, visibility_timeout);
        let dequeued: Vec<DequeuedMessage> = stored
            .messages
            .iter_mut()
            .filter(|m| m.is_visible(now))
            .take(limit)
            .map(|m| {
                m.dequeue_count += 1;
                m.time_next_visible = hidden_until;
                m.pop_receipt = PopReceipt::issue();
                DequeuedMessage {
                    id: m.id.clone(),
                    pop_receipt: m.pop_receipt.clone(),
                    text: m.text.clone(),
                    insertion_time: m.insertion_time,
                    expiration_time: m.expiration_time,
                    time_next_visible: m.time_next_visible,
                    dequeue_count: m.dequeue_count,
                }
            })
            .collect();

        info!(
            queue = %queue,
            count = dequeued.len(),
            visibility_secs = visibility_timeout.as_secs(),
            "Got messages"
        );
        Ok(dequeued)
    }

    async fn update_message(
        &self,
        queue: &str,
        message_id: &str,
        pop_receipt: &PopReceipt,
        text: Option<&str>,
        visibility_timeout: Duration,
    ) -> Result<UpdatedMessage> {
        let now = self.begin(Operation::UpdateMessage)?;
        if let Some(text) = text {
            validation::message_text(text)?;
        }
        validation::duration_between(
            "visibilitytimeout",
            visibility_timeout,
            Duration::ZERO,
            MAX_VISIBILITY_TIMEOUT,
        )?;

        let mut stored = self
            .queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;
        stored.purge_expired(now);
        let index = stored.leased_message(queue, message_id, pop_receipt, now)?;

        let message = &mut stored.messages[index];
        if let Some(text) = text {
            message.text = text.to_string();
        }
        message.time_next_visible = after(now, visibility_timeout);
        message.pop_receipt = PopReceipt::issue();

        info!(queue = %queue, message_id = %message_id, "Updated message");
        Ok(UpdatedMessage {
            pop_receipt: message.pop_receipt.clone(),
            time_next_visible: message.time_next_visible,
        })
    }

    async fn delete_message(
        &self,
        queue: &str,
        message_id: &str,
        pop_receipt: &PopReceipt,
    ) -> Result<()> {
        let now = self.begin(Operation::DeleteMessage)?;
        let mut stored = self
            .queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;
        stored.purge_expired(now);

        let index = stored.leased_message(queue, message_id, pop_receipt, now)?;
        stored.messages.remove(index);

        info!(queue = %queue, message_id = %message_id, "Deleted message");
        Ok(())
    }

    async fn clear_messages(&self, queue: &str) -> Result<()> {
        self.begin(Operation::ClearMessages)?;
        let mut stored = self
            .queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;

        let cleared = stored.messages.len();
        stored.messages.clear();
        info!(queue = %queue, cleared, "Cleared messages");
        Ok(())
    }

    async fn get_service_properties(&self) -> Result<ServiceProperties> {
        self.begin(Operation::GetServiceProperties)?;
        Ok(self.properties.read().clone())
    }

    async fn set_service_properties(&self, properties: &ServiceProperties) -> Result<()> {
        self.begin(Operation::SetServiceProperties)?;
        properties.validate()?;

        let mut current = self.properties.write();
        properties.apply_to(&mut current);
        info!(
            logging = properties.logging.is_some(),
            hour_metrics = properties.hour_metrics.is_some(),
            minute_metrics = properties.minute_metrics.is_some(),
            cors = properties.cors.is_some(),
            "Set service properties"
        );
        Ok(())
    }
}
