//! In-memory ring buffer history backend.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::HistoryBackend;
use crate::domain::Notification;
use crate::error::GatewayError;

/// Default number of notifications kept in memory.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Bounded FIFO log of notifications.
///
/// Appending past `capacity` evicts from the front, so the buffer always
/// holds the newest `capacity` entries in insertion order. A capacity of
/// zero keeps nothing.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl MemoryHistory {
    /// Creates an empty buffer holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity,
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBackend for MemoryHistory {
    fn append(&self, notification: &Notification) -> Result<(), GatewayError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_back(notification.clone());
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<Notification> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
