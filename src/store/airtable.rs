//! Airtable REST client.
//!
//! Only the create call is used: `POST {api}/{base}/{table}` with the record
//! wrapped in `{"fields": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CreatedRecord, RecordStore, StoreError};
use crate::record::RegistrationRecord;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

pub struct AirtableStore {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    fields: &'a RegistrationRecord,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Airtable sends either `{"error": {"type", "message"}}` or `{"error": "NOT_FOUND"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        message: Option<String>,
    },
    Code(String),
}

impl AirtableStore {
    pub fn new(
        api_url: &str,
        base_id: &str,
        table_name: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: table_endpoint(api_url, base_id, table_name),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    fn name(&self) -> &str {
        "airtable"
    }

    async fn create(&self, record: &RegistrationRecord) -> Result<CreatedRecord, StoreError> {
        debug!(endpoint = %self.endpoint, "creating airtable record");

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&CreateRequest { fields: record })
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "airtable rejected record");
            return Err(remote_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Table names may contain spaces or non-ASCII letters
pub fn table_endpoint(api_url: &str, base_id: &str, table_name: &str) -> String {
    format!(
        "{}/{}/{}",
        api_url.trim_end_matches('/'),
        base_id,
        urlencoding::encode(table_name)
    )
}

fn remote_error(status: u16, body: &str) -> StoreError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody::Detailed { kind, message: Some(message) },
        }) => format!("{kind}: {message}"),
        Ok(ErrorEnvelope {
            error: ErrorBody::Detailed { kind, message: None },
        }) => kind,
        Ok(ErrorEnvelope {
            error: ErrorBody::Code(code),
        }) => code,
        Err(_) if body.trim().is_empty() => "empty response".to_string(),
        Err(_) => body.trim().to_string(),
    };

    StoreError::Remote { status, message }
}

// ============================================================================
// TESTS
// ============================================================================
