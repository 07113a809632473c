//! Outbound notifications to submitters.
//!
//! Handlers only see the narrow [`Notifier`] interface: hand over a
//! [`Notification`] and learn whether it was accepted. Delivery happens on a
//! background worker so a slow or failing mail provider never delays or fails
//! the request that triggered it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use deinshop_core::Email;

use super::email::EmailError;

/// Capacity of the in-process delivery queue.
pub const QUEUE_CAPACITY: usize = 256;

/// What happened to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    SubmissionApproved,
    SubmissionRejected,
}

/// A message for a submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient: Email,
    pub shop_name: String,
    /// Shown to the submitter on rejections.
    pub admin_note: Option<String>,
}

/// Accepts notifications for best-effort delivery.
pub trait Notifier: Send + Sync {
    /// Hand over a notification. Returns `true` if it was accepted for delivery.
    fn notify(&self, notification: Notification) -> bool;
}

/// Sends a single notification.
pub trait Mailer: Send + Sync + 'static {
    fn deliver(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), EmailError>> + Send;
}

/// Retry policy for the delivery worker.
#[derive(Debug, Clone, Copy)]
pub struct DeliverySettings {
    /// Upper bound for a single delivery attempt.
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff` before retrying.
    pub backoff: Duration,
}

impl DeliverySettings {
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Queue in front of a [`Mailer`], drained by a single worker task.
#[derive(Clone)]
pub struct EmailQueue {
    tx: mpsc::Sender<Notification>,
}

impl EmailQueue {
    /// Start the delivery worker.
    ///
    /// The worker stops once every `EmailQueue` handle has been dropped and
    /// the queue is drained.
    #[must_use]
    pub fn spawn<M: Mailer>(mailer: M, settings: DeliverySettings) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Notification>(QUEUE_CAPACITY);

        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                deliver_with_retry(&mailer, &notification, settings).await;
            }
            tracing::debug!("Notification worker stopped");
        });

        (Self { tx }, handle)
    }
}

impl Notifier for EmailQueue {
    fn notify(&self, notification: Notification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(n)) => {
                tracing::warn!(kind = ?n.kind, "Notification queue full, dropping notification");
                false
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                tracing::error!(kind = ?n.kind, "Notification worker is gone");
                false
            }
        }
    }
}

/// Wait for the delivery worker to work off its queue.
///
/// Call after every `EmailQueue` handle has been dropped. Returns `false` if
/// the worker did not finish within `limit`.
pub async fn drain(worker: JoinHandle<()>, limit: Duration) -> bool {
    match tokio::time::timeout(limit, worker).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Notification worker failed");
            false
        }
        Err(_) => {
            tracing::warn!(?limit, "Notification queue not drained before shutdown");
            false
        }
    }
}

/// Try to deliver a notification, retrying with linear backoff.
///
/// Returns `true` on success.
async fn deliver_with_retry<M: Mailer>(
    mailer: &M,
    notification: &Notification,
    settings: DeliverySettings,
) -> bool {
    let attempts = settings.max_attempts.max(1);
    for attempt in 1..=attempts {
        match tokio::time::timeout(settings.timeout, mailer.deliver(notification)).await {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => {
                tracing::warn!(attempt, error = %e, kind = ?notification.kind, "Notification delivery failed");
            }
            Err(_) => {
                tracing::warn!(attempt, kind = ?notification.kind, "Notification delivery timed out");
            }
        }
        if attempt < attempts {
            tokio::time::sleep(settings.backoff * attempt).await;
        }
    }

    tracing::error!(
        kind = ?notification.kind,
        attempts,
        "Giving up on notification"
    );
    false
}

/// Used when no mail transport is configured: logs and drops.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyNotifier;

impl Notifier for LogOnlyNotifier {
    fn notify(&self, notification: Notification) -> bool {
        tracing::warn!(
            kind = ?notification.kind,
            shop_name = %notification.shop_name,
            "Email not configured, notification dropped"
        );
        false
    }
}
