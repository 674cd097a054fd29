use crate::error::PortalError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Academic,
    Event,
    Announcement,
    Important,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Academic => "academic",
            NotificationCategory::Event => "event",
            NotificationCategory::Announcement => "announcement",
            NotificationCategory::Important => "important",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Notification {
    pub id: u32,
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
    pub category: NotificationCategory,
    pub read: bool,
}

/// Which notifications a list shows: everything, only unread ones, or one
/// category.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    Category(NotificationCategory),
}

impl NotificationFilter {
    pub fn admits(&self, notification: &Notification) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::Unread => !notification.read,
            NotificationFilter::Category(category) => notification.category == *category,
        }
    }
}

impl std::str::FromStr for NotificationFilter {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(NotificationFilter::All),
            "unread" => Ok(NotificationFilter::Unread),
            "academic" => Ok(NotificationFilter::Category(NotificationCategory::Academic)),
            "event" => Ok(NotificationFilter::Category(NotificationCategory::Event)),
            "announcement" => Ok(NotificationFilter::Category(
                NotificationCategory::Announcement,
            )),
            "important" => Ok(NotificationFilter::Category(NotificationCategory::Important)),
            other => Err(PortalError::ValidationError(format!(
                "Unknown notification filter: {other}"
            ))),
        }
    }
}
