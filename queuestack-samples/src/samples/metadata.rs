//! Queue metadata: set and read user-defined pairs

use queuestack_core::Result;
use queuestack_queue::{Metadata, QueueService};
use tracing::info;

pub async fn run(service: &dyn QueueService, queue: &str) -> Result<Metadata> {
    info!(queue = %queue, "Create queue");
    service.create_queue(queue, Metadata::new()).await?;

    let metadata: Metadata = [
        ("MetadataKey1", "MetaDataValue1"),
        ("MetadataKey2", "MetaDataValue2"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    info!(queue = %queue, "Set queue metadata");
    service.set_queue_metadata(queue, metadata).await?;

    info!(queue = %queue, "Get queue metadata");
    let properties = service.get_queue_metadata(queue).await?;
    for (key, value) in &properties.metadata {
        info!(key = %key, value = %value, "  metadata");
    }

    info!(queue = %queue, "Delete queue");
    service.delete_queue(queue).await?;

    info!("Queue metadata sample completed");
    Ok(properties.metadata)
}
