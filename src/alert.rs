//! Canonical alert records
//!
//! An [`AlertRecord`] is the broker-agnostic shape of one monitoring event. The
//! JSON encoding (field names, order and types) is consumed by the notification
//! router and must not change.

use serde::{Deserialize, Serialize};

use crate::event::{Check, Client, RawEvent};
use crate::severity::SeverityTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub entity: String,
    pub check: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub state: String,
    pub summary: String,
    pub details: String,
    pub time: i64,
    pub tags: Vec<String>,
}

impl AlertRecord {
    pub fn from_event(event: &RawEvent, severities: &SeverityTable) -> Self {
        let RawEvent { client, check } = event;
        let tags = derive_tags(client, check);

        Self {
            entity: client.name.clone(),
            check: check.name.clone(),
            kind: AlertKind::Service,
            state: severities.label(check.status).to_string(),
            summary: select_summary(check).to_string(),
            details: build_details(client, check, &tags),
            time: check.executed,
            tags,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Client tags, check tags, environment, then the subscription set
///
/// Duplicates are kept.
pub fn derive_tags(client: &Client, check: &Check) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(client_tags) = &client.tags {
        tags.extend(client_tags.iter().cloned());
    }
    if let Some(check_tags) = &check.tags {
        tags.extend(check_tags.iter().cloned());
    }
    if let Some(environment) = &client.environment {
        tags.push(environment.clone());
    }

    tags.extend(subscription_set(client, check).into_iter().map(str::to_string));
    tags
}

/// The client subscriptions this check applies to, in client order
pub fn subscription_set<'a>(client: &'a Client, check: &Check) -> Vec<&'a str> {
    match check.subscribers.as_deref() {
        None | Some([]) => client.subscriptions.iter().map(String::as_str).collect(),
        Some(subscribers) => client
            .subscriptions
            .iter()
            .filter(|subscription| subscribers.contains(subscription))
            .map(String::as_str)
            .collect(),
    }
}

pub fn select_summary(check: &Check) -> &str {
    check.notification_text().unwrap_or(&check.output)
}

/// `Address:<addr> Tags:<a,b,..>`, plus the raw output when the summary did not carry it
pub fn build_details(client: &Client, check: &Check, tags: &[String]) -> String {
    let mut details = vec![
        format!("Address:{}", client.address),
        format!("Tags:{}", tags.join(",")),
    ];

    if check.notification_text().is_some() {
        details.push(format!("Raw Output: {}", check.output));
    }

    details.join(" ")
}
