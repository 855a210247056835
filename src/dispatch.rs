//! Rate notifications to every subscriber.

use std::{fmt, sync::Arc};

use crate::{domain::SubscriberEmail, email_client::MailSender};

const SUBJECT: &str = "Bitcoin to UAH exchange rate update";

#[derive(Clone)]
pub struct BroadcastDispatcher {
    sender: Arc<dyn MailSender>,
}

impl BroadcastDispatcher {
    pub fn new(sender: Arc<dyn MailSender>) -> Self {
        Self { sender }
    }

    /// Sends the rate to each recipient in order. A failed delivery is recorded and the remaining
    /// recipients are still attempted.
    #[tracing::instrument(skip(self, recipients), fields(recipients = recipients.len()))]
    pub async fn broadcast(
        &self,
        rate_display: &str,
        recipients: &[SubscriberEmail],
    ) -> BatchResult {
        let body = format!("Bitcoin now costs {} UAH", rate_display);
        let mut deliveries = Vec::with_capacity(recipients.len());

        for recipient in recipients {
            let outcome = match self.sender.send(recipient, SUBJECT, &body).await {
                Ok(()) => DispatchOutcome::Delivered,
                Err(error) => {
                    tracing::warn!(%recipient, error = ?error, "failed to send rate notification");
                    DispatchOutcome::Failed(format!("{:#}", error))
                }
            };
            deliveries.push(Delivery {
                recipient: recipient.clone(),
                outcome,
            });
        }

        let batch = BatchResult { deliveries };
        tracing::info!(
            delivered = batch.delivered(),
            failed = batch.failed(),
            "finished broadcast"
        );
        batch
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered,
    Failed(String),
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct Delivery {
    pub recipient: SubscriberEmail,
    pub outcome: DispatchOutcome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Delivered,
    Partial,
    Failed,
}

/// Per-recipient outcomes of a broadcast.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BatchResult {
    deliveries: Vec<Delivery>,
}

impl BatchResult {
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    pub fn attempts(&self) -> usize {
        self.deliveries.len()
    }

    pub fn delivered(&self) -> usize {
        self.attempts() - self.failed()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SubscriberEmail, &str)> {
        self.deliveries
            .iter()
            .filter_map(|delivery| match &delivery.outcome {
                DispatchOutcome::Failed(reason) => Some((&delivery.recipient, reason.as_str())),
                DispatchOutcome::Delivered => None,
            })
    }

    pub fn status(&self) -> BatchStatus {
        match self.failed() {
            0 => BatchStatus::Delivered,
            failed if failed == self.attempts() => BatchStatus::Failed,
            _ => BatchStatus::Partial,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == BatchStatus::Delivered
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to deliver {} of {} notifications",
            self.failed(),
            self.attempts()
        )
    }
}
