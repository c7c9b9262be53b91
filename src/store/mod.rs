//! Notification history: bounded in-memory log behind a retrying writer.
//!
//! [`NotificationStore`] owns the retry policy and the persist switch.
//! Storage itself sits behind the [`HistoryBackend`] trait; the only
//! backend is the [`MemoryHistory`] ring buffer, so history is lost on
//! restart.

pub mod memory;
pub mod notification_store;

pub use memory::{DEFAULT_HISTORY_CAPACITY, MemoryHistory};
pub use notification_store::{AppendOutcome, NotificationStore, RetryPolicy};

use crate::domain::Notification;
use crate::error::GatewayError;

/// Storage seam for notification history.
///
/// Implementations must be cheap and non-blocking: `append` runs on the
/// producer's `push` path.
pub trait HistoryBackend: Send + Sync + std::fmt::Debug {
    /// Appends one notification, evicting the oldest entries past capacity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the write was rejected.
    fn append(&self, notification: &Notification) -> Result<(), GatewayError>;

    /// Returns all retained notifications, oldest first.
    fn snapshot(&self) -> Vec<Notification>;

    /// Number of retained notifications.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is retained.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of retained notifications.
    fn capacity(&self) -> usize;
}
