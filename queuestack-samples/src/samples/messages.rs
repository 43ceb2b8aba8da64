//! Message workflow: post, count, peek, lease and delete, clear

use queuestack_core::Result;
use queuestack_queue::{ApproximateCount, CreateMessageOptions, Metadata, QueueService};
use tracing::{info, warn};

use crate::config::SampleSettings;

/// What the message workflow observed
#[derive(Debug, Clone)]
pub struct MessageReport {
    /// Queue length estimate read after posting; not an exact count
    pub approximate_count: ApproximateCount,
    /// Texts of the single-message peek
    pub first_peek: Vec<String>,
    /// Texts of the multi-message peek
    pub peeked: Vec<String>,
    /// Messages returned by the dequeue
    pub dequeued: usize,
    /// Dequeued messages deleted with their pop-receipt
    pub deleted: usize,
    /// Dequeued messages whose lease was lost before the delete
    pub leases_lost: usize,
}

/// Run the message workflow on a new queue named `queue`.
///
/// A dequeue may return fewer messages than were posted; only what it
/// returns is processed. A delete rejected because the lease was lost is
/// logged and counted, since another consumer now owns that message. Any
/// other failure ends the workflow.
pub async fn run(
    service: &dyn QueueService,
    queue: &str,
    settings: &SampleSettings,
) -> Result<MessageReport> {
    info!(queue = %queue, "Create queue");
    service.create_queue(queue, Metadata::new()).await?;

    // Without a time-to-live a message expires after 7 days; without a
    // visibility timeout it is visible immediately.
    for i in 1..=settings.message_count {
        let text = format!("test message {i}");
        service
            .create_message(queue, &text, CreateMessageOptions::default())
            .await?;
        info!(message = %text, "Successfully added message");
    }

    info!(queue = %queue, "Get number of messages in the queue");
    let approximate_count = service
        .get_queue_metadata(queue)
        .await?
        .approximate_message_count;
    info!(queue = %queue, length = %approximate_count, "Approximate length of the queue");

    info!("Peek first message from queue without changing visibility");
    let first_peek = peek_texts(service, queue, 1).await?;

    info!(count = settings.peek_count, "Peek first messages from queue without changing visibility");
    let peeked = peek_texts(service, queue, settings.peek_count).await?;

    let messages = service
        .get_messages(queue, settings.dequeue_batch, settings.visibility_timeout())
        .await?;
    let dequeued = messages.len();
    let mut deleted = 0;
    let mut leases_lost = 0;
    for message in messages {
        info!(message = %message.text, "Dequeued message content");

        // Deleting needs the id and the pop-receipt issued by this dequeue.
        match service
            .delete_message(queue, &message.id, &message.pop_receipt)
            .await
        {
            Ok(()) => {
                deleted += 1;
                info!(message_id = %message.id, "Successfully dequeued message");
            }
            Err(err) if err.is_lease_error() => {
                leases_lost += 1;
                warn!(message_id = %message.id, error = %err, "Lease lost before delete");
            }
            Err(err) => return Err(err),
        }
    }

    service.clear_messages(queue).await?;
    info!(queue = %queue, "Successfully cleared out all queue messages");

    info!(queue = %queue, "Delete queue");
    service.delete_queue(queue).await?;

    Ok(MessageReport {
        approximate_count,
        first_peek,
        peeked,
        dequeued,
        deleted,
        leases_lost,
    })
}

async fn peek_texts(service: &dyn QueueService, queue: &str, count: u32) -> Result<Vec<String>> {
    let messages = service.peek_messages(queue, count).await?;
    Ok(messages
        .into_iter()
        .map(|m| {
            info!(message = %m.text, "Peeked message content");
            m.text
        })
        .collect())
}
