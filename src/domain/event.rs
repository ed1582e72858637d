use super::record_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

record_id!(
    /// Store-assigned identifier of an [`Event`].
    EventId
);

/// Descriptive attributes of an event. Opaque to the membership rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(flatten)]
    pub details: EventDetails,
}

impl Event {
    pub fn new(id: EventId, details: EventDetails) -> Self {
        Self { id, details }
    }
}
