use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    #[serde(rename = "self")]
    Me,
    Counterpart,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    #[default]
    Offline,
}

/// A single entry in a conversation log. Ids are unique within a session.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Message {
    pub id: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub author: Author,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Correspondent {
    pub id: String,
    pub display_name: String,
    pub last_activity_summary: String,
    pub unread_count: u32,
    pub presence: Presence,
    pub department: Option<String>,
}

impl Correspondent {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            last_activity_summary: String::new(),
            unread_count: 0,
            presence: Presence::Offline,
            department: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.last_activity_summary = summary.into();
        self
    }

    pub fn with_unread(mut self, unread_count: u32) -> Self {
        self.unread_count = unread_count;
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Case-insensitive substring match on the display name.
    pub fn matches(&self, search: &str) -> bool {
        self.display_name
            .to_lowercase()
            .contains(&search.trim().to_lowercase())
    }
}
