//! Check status code to severity label mapping

use std::collections::HashMap;

/// Label used for any status code the table does not know
pub const UNKNOWN_SEVERITY: &str = "unknown";

/// Immutable lookup from check status codes to severity labels
///
/// The default table is the one shared with the host monitoring system. Lookups
/// are total: unrecognized codes, negative ones included, degrade to
/// [`UNKNOWN_SEVERITY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityTable {
    labels: HashMap<i64, String>,
}

impl SeverityTable {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|(status, label)| (status, label.into()))
                .collect(),
        }
    }

    pub fn label(&self, status: i64) -> &str {
        self.labels
            .get(&status)
            .map(String::as_str)
            .filter(|label| !label.is_empty())
            .unwrap_or(UNKNOWN_SEVERITY)
    }
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self::new([(0, "ok"), (1, "warning"), (2, "critical"), (3, "unknown")])
    }
}
