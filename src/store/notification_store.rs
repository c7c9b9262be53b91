//! Retrying writer and filtered reader over a [`HistoryBackend`].

use std::sync::Arc;
use std::time::Duration;

use super::{HistoryBackend, MemoryHistory};
use crate::domain::{HistoryFilter, Notification};

/// Backoff schedule for history writes.
///
/// One initial attempt is followed by up to `max_retries` retries. The
/// delay before retry `n` (1-based) is `base_delay * 2^(n-1)`, capped at
/// `max_delay`, so the worst-case added latency is at most
/// `max_retries * max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// No delay between attempts. Useful in tests.
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
        }
    }
}

/// Result of [`NotificationStore::append`]. Never an error: failures are
/// logged and the notification dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Written after `attempts` tries.
    Stored {
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed; the notification is not in history.
    Dropped,
    /// Persistence is off.
    Disabled,
}

/// Bounded notification history with retry-guarded writes.
#[derive(Debug, Clone)]
pub struct NotificationStore {
    backend: Arc<dyn HistoryBackend>,
    retry: RetryPolicy,
    enabled: bool,
}

impl NotificationStore {
    /// Creates a store over an in-memory buffer of `capacity` entries.
    #[must_use]
    pub fn in_memory(capacity: usize, retry: RetryPolicy, enabled: bool) -> Self {
        Self::with_backend(Arc::new(MemoryHistory::new(capacity)), retry, enabled)
    }

    /// Creates a store over an arbitrary backend.
    #[must_use]
    pub fn with_backend(
        backend: Arc<dyn HistoryBackend>,
        retry: RetryPolicy,
        enabled: bool,
    ) -> Self {
        Self {
            backend,
            retry,
            enabled,
        }
    }

    /// Creates a store that keeps nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::in_memory(0, RetryPolicy::default(), false)
    }

    /// Whether writes and reads are active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of notifications currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.enabled { self.backend.len() } else { 0 }
    }

    /// Returns `true` if nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of retained notifications.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.backend.capacity()
    }

    /// Writes `notification`, retrying per the [`RetryPolicy`].
    pub async fn append(&self, notification: &Notification) -> AppendOutcome {
        if !self.enabled {
            return AppendOutcome::Disabled;
        }

        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match self.backend.append(notification) {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::debug!(id = %notification.id, attempt, "history write recovered");
                    }
                    return AppendOutcome::Stored { attempts: attempt };
                }
                Err(err) if attempt <= self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        id = %notification.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "history write failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => {
                    tracing::error!(
                        id = %notification.id,
                        attempts = attempt,
                        error = %err,
                        "history write failed, dropping notification"
                    );
                    return AppendOutcome::Dropped;
                }
            }
        }
    }

    /// Returns retained notifications matching `filter`, oldest first.
    ///
    /// Returns an empty list with a warning when persistence is disabled.
    #[must_use]
    pub fn history(&self, filter: &HistoryFilter) -> Vec<Notification> {
        if !self.enabled {
            tracing::warn!("history requested but persistence is disabled");
            return Vec::new();
        }
        filter.apply(self.backend.snapshot())
    }
}
