use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::field::display;
use tracing::Span;

use crate::domain::{AlertMessage, RateAlert};
use crate::email_client::Notifier;
use crate::rate_client::RateSource;
use crate::subscriber_store::SubscriberStore;

/// How a notification cycle ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was still running
    Skipped,
    /// No rate could be fetched, nobody was notified
    FetchFailed,
    /// The subscriber list could not be read, nobody was notified
    StoreFailed,
    Completed { attempted: usize, failed: usize },
}

/// Fetch → evaluate → notify-all pipeline
pub struct AlertCycle {
    rate_source: Arc<dyn RateSource>,
    subscribers: Arc<dyn SubscriberStore>,
    notifier: Arc<dyn Notifier>,
    threshold: f64,
    running: Mutex<()>,
}

impl AlertCycle {
    pub fn new(
        rate_source: Arc<dyn RateSource>,
        subscribers: Arc<dyn SubscriberStore>,
        notifier: Arc<dyn Notifier>,
        threshold: f64,
    ) -> Self {
        Self {
            rate_source,
            subscribers,
            notifier,
            threshold,
            running: Mutex::new(()),
        }
    }

    /// Fetch and classify the current rate for display. Never fails: any upstream error
    /// yields the neutral "unknown" message.
    #[tracing::instrument(name = "Evaluate current exchange rate", skip(self))]
    pub async fn current_message(&self) -> AlertMessage {
        match self.rate_source.fetch().await {
            Ok(sample) => AlertMessage::evaluate(sample.value(), self.threshold),
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to fetch exchange rate"
                );
                AlertMessage::unknown()
            }
        }
    }

    /// Run one notification cycle. Returns `Skipped` without doing anything if a previous
    /// cycle has not finished yet.
    #[tracing::instrument(
        name = "Run alert cycle",
        skip(self),
        fields(
            rate = tracing::field::Empty,
            classification = tracing::field::Empty
        )
    )]
    pub async fn run(&self) -> CycleOutcome {
        let Ok(_running) = self.running.try_lock() else {
            tracing::warn!("Previous alert cycle is still running, skipping this one");
            return CycleOutcome::Skipped;
        };

        let sample = match self.rate_source.fetch().await {
            Ok(sample) => sample,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to fetch exchange rate, skipping notifications"
                );
                return CycleOutcome::FetchFailed;
            }
        };
        let alert = RateAlert::new(sample, self.threshold);
        Span::current()
            .record("rate", sample.value())
            .record("classification", display(alert.message.classification()));

        let subscribers = match self.subscribers.list_all().await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to list subscribers, skipping notifications"
                );
                return CycleOutcome::StoreFailed;
            }
        };

        // One failed delivery must not stop the others
        let mut failed = 0;
        for subscriber in &subscribers {
            if let Err(e) = self.notifier.send(subscriber, &alert).await {
                failed += 1;
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to deliver rate alert to {}", subscriber.email
                );
            }
        }

        let attempted = subscribers.len();
        tracing::info!(attempted, failed, "Alert cycle completed");
        CycleOutcome::Completed { attempted, failed }
    }
}
