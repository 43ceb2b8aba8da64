//! Sample suites and their error boundary

use clap::ValueEnum;
use queuestack_queue::QueueService;
use tracing::{info, warn};

use super::{lifecycle, messages, metadata, properties, SampleError};
use crate::config::SampleSettings;
use crate::names;

/// Which samples to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Suite {
    /// Queue lifecycle and message workflow
    Basic,
    /// Queue listing, CORS, queue metadata and service properties
    Advanced,
    All,
}

/// Result of one suite
#[derive(Debug)]
pub struct SuiteOutcome {
    pub suite: &'static str,
    pub result: Result<(), SampleError>,
}

impl SuiteOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs sample suites against one queue service.
///
/// A suite stops at its first error. The error is logged with a hint about
/// the likely cause and the next suite still runs.
pub struct SampleRunner<'a> {
    service: &'a dyn QueueService,
    settings: SampleSettings,
    emulated: bool,
}

impl<'a> SampleRunner<'a> {
    pub fn new(service: &'a dyn QueueService, settings: SampleSettings, emulated: bool) -> Self {
        Self {
            service,
            settings,
            emulated,
        }
    }

    pub async fn run(&self, suite: Suite) -> Vec<SuiteOutcome> {
        let mut outcomes = Vec::new();
        if matches!(suite, Suite::Basic | Suite::All) {
            let result = self.basic().await;
            outcomes.push(self.finish("basic", result));
        }
        if matches!(suite, Suite::Advanced | Suite::All) {
            let result = self.advanced().await;
            outcomes.push(self.finish("advanced", result));
        }
        outcomes
    }

    /// What to check when a suite fails
    pub fn failure_hint(&self) -> &'static str {
        if self.emulated {
            "Error occurred in the sample. If you are using the emulator, please make sure the emulator is running."
        } else {
            "Error occurred in the sample. Please make sure the account name and key are correct."
        }
    }

    async fn basic(&self) -> Result<(), SampleError> {
        info!("* Basic queue operations *");
        lifecycle::run(
            self.service,
            &names::queue_prefix(),
            self.settings.basic_queue_count,
        )
        .await?;

        info!("* Basic message operations *");
        let report = messages::run(self.service, &names::queue_prefix(), &self.settings).await?;
        info!(
            dequeued = report.dequeued,
            deleted = report.deleted,
            leases_lost = report.leases_lost,
            "Message workflow finished"
        );

        info!("Queue samples - Completed");
        Ok(())
    }

    async fn advanced(&self) -> Result<(), SampleError> {
        info!("* List queues *");
        lifecycle::run(
            self.service,
            &names::queue_prefix(),
            self.settings.advanced_queue_count,
        )
        .await?;

        info!("* Set Cors *");
        properties::cors_rules(self.service).await?;

        info!("* Queue Metadata *");
        let queue = format!("queue{}", names::random_name());
        metadata::run(self.service, &queue).await?;

        info!("* Service Properties *");
        properties::logging_retention(self.service).await?;

        info!("Queue advanced samples - Completed");
        Ok(())
    }

    fn finish(&self, suite: &'static str, result: Result<(), SampleError>) -> SuiteOutcome {
        if let Err(err) = &result {
            let cause = err.queue_error();
            warn!(
                suite,
                error = %err,
                code = %cause.code(),
                status = cause.http_status(),
                transient = cause.is_transient(),
                "{}",
                self.failure_hint()
            );
        }
        SuiteOutcome { suite, result }
    }
}
