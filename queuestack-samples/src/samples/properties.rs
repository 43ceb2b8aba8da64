//! Service properties: CORS rules and logging retention

use queuestack_core::QueueError;
use queuestack_queue::{CorsRule, Logging, QueueService, RetentionPolicy, ServiceProperties};
use std::future::Future;
use tracing::{debug, info, warn};

use super::SampleError;

/// Apply `update`, run `body`, then put the original properties back.
///
/// The original snapshot is taken before anything changes. The restore is
/// attempted whatever happened in between: after a successful body, after a
/// failing body, and after a rejected update.
pub async fn apply_then_restore<T, F, Fut>(
    service: &dyn QueueService,
    update: &ServiceProperties,
    body: F,
) -> Result<T, SampleError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, QueueError>>,
{
    let original = service.get_service_properties().await?;
    debug!(?original, "Captured original service properties");

    let outcome = match service.set_service_properties(update).await {
        Ok(()) => body().await,
        Err(err) => Err(err),
    };

    let restored = service.set_service_properties(&original).await;
    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(err), Ok(())) => Err(err.into()),
        (outcome, Err(restore)) => {
            warn!(error = %restore, "Could not restore original service properties");
            Err(SampleError::RestoreFailed {
                restore,
                cause: outcome.err(),
            })
        }
    }
}

/// Replace the CORS rules with one allow-all rule, then revert.
///
/// Returns the properties observed while the rule was in place.
pub async fn cors_rules(service: &dyn QueueService) -> Result<ServiceProperties, SampleError> {
    let rule = CorsRule::allow_all(&["POST", "GET"], 3600);
    let update = ServiceProperties::default().with_cors_rules(vec![rule]);

    info!("Overwrite Cors Rules");
    let applied = apply_then_restore(service, &update, || async {
        let current = service.get_service_properties().await?;
        let rules = current.cors.as_ref().map_or(0, |c| c.rules.len());
        info!(rules, "Cors rules in place");
        Ok::<_, QueueError>(current)
    })
    .await?;

    info!("Reverted Cors Rules back to the original ones");
    info!("CORS sample completed");
    Ok(applied)
}

/// Turn on delete/read/write logging with 10 days retention, then revert.
///
/// Returns the properties observed while logging was enabled.
pub async fn logging_retention(
    service: &dyn QueueService,
) -> Result<ServiceProperties, SampleError> {
    let logging = Logging {
        delete: true,
        read: true,
        write: true,
        retention_policy: RetentionPolicy::days(10),
        ..Logging::default()
    };
    let update = ServiceProperties::default().with_logging(logging);

    info!("Overwrite Service Properties");
    let applied = apply_then_restore(service, &update, || async {
        let current = service.get_service_properties().await?;
        if let Some(logging) = &current.logging {
            info!(
                delete = logging.delete,
                read = logging.read,
                write = logging.write,
                retention_days = ?logging.retention_policy.days,
                "Logging in place"
            );
        }
        Ok::<_, QueueError>(current)
    })
    .await?;

    info!("Reverted Service Properties back to the original ones");
    info!("Service Properties sample completed");
    Ok(applied)
}
