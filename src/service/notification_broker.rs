//! Notification broker: builds notifications, records them, fans them out.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::subscriber::{Subscriber, SubscriptionId};
use crate::config::BrokerConfig;
use crate::domain::{
    HistoryFilter, Notification, NotificationContext, NotificationType, ROOM_KEY,
};
use crate::error::GatewayError;
use crate::store::NotificationStore;

type SubscriberList = Vec<(SubscriptionId, Arc<dyn Subscriber>)>;

/// Outcome of delivering one notification to the subscriber snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Subscribers that returned `Ok`.
    pub delivered: usize,
    /// Subscribers that returned an error or panicked.
    pub failed: usize,
}

/// Counters exposed on the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BrokerStats {
    /// Notifications pushed since start.
    pub pushed: u64,
    /// Subscriber invocations that failed since start.
    pub subscriber_failures: u64,
    /// Currently registered subscribers.
    pub subscribers: usize,
    /// Notifications currently retained in history.
    pub stored: usize,
    /// Whether history is kept at all.
    pub persist: bool,
}

/// In-process publish/subscribe hub for [`Notification`]s.
///
/// Cheap to clone; clones share the same subscriber list and history.
/// Every domain service that wants to notify users holds a clone and calls
/// [`push`](Self::push) or [`broadcast`](Self::broadcast).
///
/// # Concurrency
///
/// - The subscriber list sits behind one `RwLock`; `push` takes a snapshot
///   under the read lock and releases it before calling anyone.
/// - Concurrent `push` calls are independent and unordered with respect to
///   each other.
#[derive(Clone)]
pub struct NotificationBroker {
    inner: Arc<BrokerInner>,
}

struct BrokerInner {
    store: NotificationStore,
    subscribers: RwLock<SubscriberList>,
    next_subscription: AtomicU64,
    enable_logging: bool,
    pushed: AtomicU64,
    subscriber_failures: AtomicU64,
}

impl fmt::Debug for NotificationBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBroker")
            .field("store", &self.inner.store)
            .field("subscribers", &self.subscriber_count())
            .field("enable_logging", &self.inner.enable_logging)
            .finish()
    }
}

impl NotificationBroker {
    /// Creates a broker with an in-memory history sized from `config`.
    #[must_use]
    pub fn new(config: &BrokerConfig) -> Self {
        let store =
            NotificationStore::in_memory(config.history_capacity, config.retry, config.persist);
        Self::with_store(store, config.enable_logging)
    }

    /// Creates a broker over an existing store.
    #[must_use]
    pub fn with_store(store: NotificationStore, enable_logging: bool) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                store,
                subscribers: RwLock::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
                enable_logging,
                pushed: AtomicU64::new(0),
                subscriber_failures: AtomicU64::new(0),
            }),
        }
    }

    /// Publishes a new notification.
    ///
    /// Stamps an id and timestamp, writes to history (best effort, retried),
    /// then hands the notification to every subscriber registered when the
    /// call started. Subscriber failures are logged and isolated; they never
    /// change the returned value.
    pub async fn push(
        &self,
        notification_type: NotificationType,
        message: impl Into<String>,
        context: Option<NotificationContext>,
    ) -> Notification {
        let notification = Notification::new(notification_type, message, context);
        let subscribers = self.snapshot();

        if self.inner.enable_logging {
            tracing::info!(
                id = %notification.id,
                kind = %notification.notification_type,
                room = notification.room(),
                "notification pushed"
            );
        } else {
            tracing::debug!(id = %notification.id, "notification pushed");
        }

        self.inner.store.append(&notification).await;
        let report = self.fan_out(&notification, &subscribers);
        self.inner.pushed.fetch_add(1, Ordering::Relaxed);

        tracing::trace!(
            id = %notification.id,
            delivered = report.delivered,
            failed = report.failed,
            "fan-out complete"
        );
        notification
    }

    /// Like [`push`](Self::push) but takes the type as a string.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidNotificationType`] if `notification_type`
    /// is not one of `SUCCESS`, `ERROR`, `INFO`, `UPDATE`. Nothing is stored
    /// or delivered in that case.
    pub async fn push_raw(
        &self,
        notification_type: &str,
        message: impl Into<String>,
        context: Option<NotificationContext>,
    ) -> Result<Notification, GatewayError> {
        let notification_type = notification_type.parse::<NotificationType>()?;
        Ok(self.push(notification_type, message, context).await)
    }

    /// Publishes a notification scoped to `room`.
    ///
    /// `room` is trimmed and merged into the context under `"room"`,
    /// replacing any producer-supplied value for that key. Other keys are
    /// preserved. A blank `room` scopes nothing, so the notification goes to
    /// every client; [`broadcast_raw`](Self::broadcast_raw) rejects it instead.
    pub async fn broadcast(
        &self,
        room: &str,
        notification_type: NotificationType,
        message: impl Into<String>,
        context: Option<NotificationContext>,
    ) -> Notification {
        let room = room.trim();
        if room.is_empty() {
            tracing::warn!("broadcast with blank room goes to every client");
        }
        let mut context = context.unwrap_or_default();
        if let Some(previous) = context.insert(ROOM_KEY.to_string(), Value::from(room))
            && previous.as_str() != Some(room)
        {
            tracing::debug!(room, %previous, "broadcast room overrides context.room");
        }
        self.push(notification_type, message, Some(context)).await
    }

    /// Like [`broadcast`](Self::broadcast) but takes the type as a string.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidNotificationType`] for unknown types
    /// and [`GatewayError::InvalidRequest`] for a blank room.
    pub async fn broadcast_raw(
        &self,
        room: &str,
        notification_type: &str,
        message: impl Into<String>,
        context: Option<NotificationContext>,
    ) -> Result<Notification, GatewayError> {
        if room.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "room must not be empty".to_string(),
            ));
        }
        let notification_type = notification_type.parse::<NotificationType>()?;
        Ok(self
            .broadcast(room, notification_type, message, context)
            .await)
    }

    /// Returns stored notifications matching `filter`, oldest first.
    ///
    /// Empty (with a warning) when persistence is disabled.
    #[must_use]
    pub fn history(&self, filter: &HistoryFilter) -> Vec<Notification> {
        self.inner.store.history(filter)
    }

    /// Registers a subscriber for all future notifications.
    pub fn subscribe<S>(&self, subscriber: S) -> SubscriptionId
    where
        S: Subscriber + 'static,
    {
        let id = SubscriptionId::new(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        let subscriber: Arc<dyn Subscriber> = Arc::new(subscriber);
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, subscriber));
        tracing::debug!(subscription = %id, "subscriber registered");
        id
    }

    /// Removes a subscriber. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        let removed = subscribers.len() != before;
        if removed {
            tracing::debug!(subscription = %id, "subscriber removed");
        }
        removed
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            pushed: self.inner.pushed.load(Ordering::Relaxed),
            subscriber_failures: self.inner.subscriber_failures.load(Ordering::Relaxed),
            subscribers: self.subscriber_count(),
            stored: self.inner.store.len(),
            persist: self.inner.store.is_enabled(),
        }
    }

    fn snapshot(&self) -> SubscriberList {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect()
    }

    fn fan_out(&self, notification: &Notification, subscribers: &SubscriberList) -> FanOutReport {
        let mut report = FanOutReport::default();
        for (id, subscriber) in subscribers {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                subscriber.on_notification(notification)
            }));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::warn!(
                        subscription = %id,
                        id = %notification.id,
                        error = %err,
                        "subscriber failed"
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    tracing::error!(
                        subscription = %id,
                        id = %notification.id,
                        panic = panic_message(panic.as_ref()),
                        "subscriber panicked"
                    );
                }
            }
        }
        if report.failed > 0 {
            self.inner
                .subscriber_failures
                .fetch_add(report.failed as u64, Ordering::Relaxed);
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
