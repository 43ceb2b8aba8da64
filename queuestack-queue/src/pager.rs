//! Lazy queue listing across pages

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use queuestack_core::QueueError;

use crate::models::QueueItem;
use crate::service::{ListQueuesOptions, QueueService};

/// Stream every queue whose name starts with `prefix`
pub fn list_queues<'a>(
    service: &'a dyn QueueService,
    prefix: &str,
) -> BoxStream<'a, Result<QueueItem, QueueError>> {
    list_queues_with(service, ListQueuesOptions::with_prefix(prefix))
}

/// Stream every queue matched by `options`.
///
/// Pages are requested only as the stream is polled, and each follows the
/// marker of the page before it. An error ends the stream after it is
/// yielded.
pub fn list_queues_with<'a>(
    service: &'a dyn QueueService,
    options: ListQueuesOptions,
) -> BoxStream<'a, Result<QueueItem, QueueError>> {
    stream::try_unfold(Some(options), move |next| async move {
        let Some(options) = next else {
            return Ok::<_, QueueError>(None);
        };

        let segment = service.list_queues_segment(&options).await?;
        let following = segment.next_marker.map(|marker| ListQueuesOptions {
            marker: Some(marker),
            ..options
        });

        let page = stream::iter(segment.queues.into_iter().map(Ok::<_, QueueError>));
        Ok(Some((page, following)))
    })
    .try_flatten()
    .boxed()
}
