//! Filters applied to notification history queries.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{Notification, NotificationType};

/// Optional filters for [`crate::service::NotificationBroker::history`].
///
/// All criteria are conjunctive. The date range is inclusive on both ends.
/// `limit` keeps the most recent matches; the result stays in insertion
/// order (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryFilter {
    /// Only notifications of this type.
    #[serde(default, rename = "type")]
    pub notification_type: Option<NotificationType>,
    /// Only notifications at or after this instant.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Only notifications at or before this instant.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Keep at most this many (the newest) matches.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl HistoryFilter {
    /// Filter matching only `notification_type`.
    #[must_use]
    pub fn by_type(notification_type: NotificationType) -> Self {
        Self {
            notification_type: Some(notification_type),
            ..Self::default()
        }
    }

    /// Returns `true` if `notification` passes the type and date criteria.
    /// `limit` is not considered here.
    #[must_use]
    pub fn matches(&self, notification: &Notification) -> bool {
        if let Some(t) = self.notification_type
            && notification.notification_type != t
        {
            return false;
        }
        if let Some(start) = self.start_date
            && notification.timestamp < start
        {
            return false;
        }
        if let Some(end) = self.end_date
            && notification.timestamp > end
        {
            return false;
        }
        true
    }

    /// Applies the filter to an oldest-first sequence.
    #[must_use]
    pub fn apply<I>(&self, notifications: I) -> Vec<Notification>
    where
        I: IntoIterator<Item = Notification>,
    {
        let mut matched: Vec<Notification> = notifications
            .into_iter()
            .filter(|n| self.matches(n))
            .collect();
        if let Some(limit) = self.limit
            && matched.len() > limit
        {
            matched = matched.split_off(matched.len() - limit);
        }
        matched
    }
}
