//! Concurrent fan-out of messages

use common::Email;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::NotifyError;
use crate::mailer::Notifier;
use crate::message::Message;

/// A message that could not be delivered
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    pub recipient: Email,
    pub error: NotifyError,
}

/// Result of dispatching a batch of messages
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub total: usize,
    pub sent: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DispatchReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn all_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Send every message, at most `concurrency` at a time
///
/// Each send is bounded by `timeout`. Failures are collected into the
/// report; one failed send never stops the others.
pub async fn dispatch(
    notifier: &dyn Notifier,
    messages: Vec<Message>,
    concurrency: usize,
    timeout: Duration,
) -> DispatchReport {
    let total = messages.len();

    let outcomes: Vec<(Email, Result<(), NotifyError>)> = stream::iter(messages)
        .map(|message| async move {
            let outcome = match tokio::time::timeout(timeout, notifier.send(&message)).await {
                Ok(result) => result,
                Err(_) => Err(NotifyError::Timeout {
                    recipient: message.to.clone(),
                    seconds: timeout.as_secs(),
                }),
            };
            (message.to, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = DispatchReport {
        total,
        ..Default::default()
    };
    for (recipient, outcome) in outcomes {
        match outcome {
            Ok(()) => report.sent += 1,
            Err(error) => {
                warn!(to = %recipient, error = %error, "Notification failed");
                report.failures.push(DeliveryFailure { recipient, error });
            }
        }
    }

    info!(
        total = report.total,
        sent = report.sent,
        failed = report.failed(),
        "Notifications dispatched"
    );
    report
}
