//! Raw monitoring events as delivered by the host pipeline

use serde::{Deserialize, Serialize};

/// One check result together with the client it ran on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub client: Client,
    pub check: Check,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Topics the client listens to, in configured order
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    /// Severity code, see [`crate::severity::SeverityTable`]
    pub status: i64,
    #[serde(default)]
    pub output: String,
    /// Overrides `output` as the alert summary when non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<String>,
    /// Epoch seconds
    #[serde(default)]
    pub executed: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Restricts which client subscriptions apply to this check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribers: Option<Vec<String>>,
}

impl Check {
    /// The notification text, if one is set and non-empty
    pub fn notification_text(&self) -> Option<&str> {
        self.notification.as_deref().filter(|text| !text.is_empty())
    }
}
