// Record stores
// Where a finished registration gets written

pub mod airtable;
pub mod sqlite;

use crate::record::RegistrationRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use airtable::AirtableStore;
pub use sqlite::SqliteStore;

/// Field name that selects the record id itself instead of a record field
pub const RECORD_ID_FIELD: &str = "id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Transport(String),

    #[error("store rejected the record ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("unreadable store response: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// What a store hands back after a successful create
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreatedRecord {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub fields: Map<String, Value>,

    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl CreatedRecord {
    /// Confirmation number shown to the user.
    ///
    /// `"id"` picks the record id; any other name is looked up in the stored
    /// fields (an autonumber column, for instance). Empty values count as absent.
    pub fn identifier(&self, field: &str) -> Option<String> {
        let raw = if field == RECORD_ID_FIELD {
            Some(self.id.clone())
        } else {
            match self.fields.get(field)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        raw.filter(|id| !id.trim().is_empty())
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    async fn create(&self, record: &RegistrationRecord) -> Result<CreatedRecord, StoreError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// In-memory double that records every create call
    pub(crate) struct RecordingStore {
        pub(crate) reply: Mutex<Option<Result<CreatedRecord, StoreError>>>,
        pub(crate) records: Mutex<Vec<RegistrationRecord>>,
    }

    impl RecordingStore {
        pub(crate) fn returning_id(id: &str) -> Self {
            Self::with_reply(Ok(CreatedRecord {
                id: id.to_string(),
                ..CreatedRecord::default()
            }))
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self::with_reply(Err(StoreError::Remote {
                status: 422,
                message: message.to_string(),
            }))
        }

        pub(crate) fn with_reply(reply: Result<CreatedRecord, StoreError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                records: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        pub(crate) fn last_record(&self) -> Option<RegistrationRecord> {
            self.records.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl RecordStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn create(&self, record: &RegistrationRecord) -> Result<CreatedRecord, StoreError> {
            self.records.lock().unwrap().push(record.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(StoreError::Transport("no reply configured".to_string())))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_from_record_id() {
        let created = CreatedRecord {
            id: "recAbc123".to_string(),
            ..CreatedRecord::default()
        };

        assert_eq!(created.identifier("id"), Some("recAbc123".to_string()));
    }

    #[test]
    fn test_identifier_from_autonumber_field() {
        let created: CreatedRecord = serde_json::from_value(json!({
            "id": "recAbc123",
            "createdTime": "2024-05-01T10:00:00.000Z",
            "fields": { "Kayit No": 42, "isim_soyisim": "Ali Veli" }
        }))
        .unwrap();

        assert_eq!(created.identifier("Kayit No"), Some("42".to_string()));
        assert_eq!(created.created_time.as_deref(), Some("2024-05-01T10:00:00.000Z"));
    }

    #[test]
    fn test_identifier_missing() {
        let created: CreatedRecord = serde_json::from_value(json!({ "fields": {} })).unwrap();

        assert_eq!(created.identifier("id"), None);
        assert_eq!(created.identifier("Kayit No"), None);
    }
}
