//! Queue lifecycle: create, list by prefix, delete

use futures::TryStreamExt;
use queuestack_core::Result;
use queuestack_queue::{list_queues, Metadata, QueueService};
use tracing::info;

/// Create `count` queues named `{prefix}{index}`, list them, delete them.
///
/// Returns the names the listing produced. Calls run strictly in order:
/// every create, then the listing, then every delete, each in index order.
pub async fn run(service: &dyn QueueService, prefix: &str, count: usize) -> Result<Vec<String>> {
    info!(prefix = %prefix, count, "Create multiple queues with prefix");
    for i in 0..count {
        service
            .create_queue(&format!("{prefix}{i}"), Metadata::new())
            .await?;
    }

    info!(prefix = %prefix, "List queues with prefix");
    let mut queues = list_queues(service, prefix);
    let mut listed = Vec::with_capacity(count);
    while let Some(queue) = queues.try_next().await? {
        info!(queue = %queue.name, "  queue");
        listed.push(queue.name);
    }

    info!(prefix = %prefix, "Delete queues with prefix");
    for i in 0..count {
        service.delete_queue(&format!("{prefix}{i}")).await?;
    }

    info!("List queues sample completed");
    Ok(listed)
}
