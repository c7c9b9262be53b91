//! Service layer: the notification broker.
//!
//! [`NotificationBroker`] is the producer-facing entry point. Domain
//! services call `push`/`broadcast`; the transport gateway registers as a
//! [`Subscriber`].

pub mod notification_broker;
pub mod subscriber;

pub use notification_broker::{BrokerStats, FanOutReport, NotificationBroker};
pub use subscriber::{Subscriber, SubscriptionId};
