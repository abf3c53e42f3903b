use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A posted chat message. Immutable once created.
///
/// Persisted as JSON with the keys `id`, `createdAt`, `text` and `user`;
/// `createdAt` is an RFC 3339 UTC timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Time-ordered unique identifier (UUID v7)
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub user: String,
}

impl Message {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            created_at: Utc::now(),
            text: text.into(),
            user: user.into(),
        }
    }

    /// Parse a message from its stored JSON form.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Convert the message to the JSON string kept in the durable log.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
