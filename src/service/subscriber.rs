//! Subscriber callbacks registered on the broker.

use std::fmt;

use crate::domain::Notification;
use crate::error::GatewayError;

/// Handle returned by [`super::NotificationBroker::subscribe`], used to
/// unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receives every notification pushed through the broker.
///
/// Called synchronously on the producer's `push` path, so implementations
/// must not block: hand work off to a channel or a spawned task instead.
/// Errors and panics are caught by the broker and never reach the producer.
pub trait Subscriber: Send + Sync {
    /// Handles one notification.
    ///
    /// # Errors
    ///
    /// Any error is logged by the broker and otherwise ignored.
    fn on_notification(&self, notification: &Notification) -> Result<(), GatewayError>;
}

impl<F> Subscriber for F
where
    F: Fn(&Notification) -> Result<(), GatewayError> + Send + Sync,
{
    fn on_notification(&self, notification: &Notification) -> Result<(), GatewayError> {
        self(notification)
    }
}
