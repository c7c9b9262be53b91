//! Domain layer: notification model, identifiers, and history filters.
//!
//! Everything here is plain data shared by the broker, the store, and the
//! transport layer.

pub mod client_id;
pub mod history_filter;
pub mod notification;
pub mod notification_id;

pub use client_id::ClientId;
pub use history_filter::HistoryFilter;
pub use notification::{Notification, NotificationContext, NotificationType, ROOM_KEY};
pub use notification_id::NotificationId;
