//! Cloud Logging query client.
//!
//! Narrow seam over the log store: one method returning the single newest
//! entry matching a filter. The production implementation talks to the
//! Cloud Logging REST API (`v2/entries:list`); tests substitute fakes.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::identity::Identity;

/// Public Cloud Logging endpoint.
pub const DEFAULT_LOGGING_ENDPOINT: &str = "https://logging.googleapis.com";

const QUERY_TIMEOUT_SECS: u64 = 30;

/// Log entry as returned by `entries:list`.
///
/// Only the fields the lookup cares about; `textPayload` and `jsonPayload`
/// are mutually exclusive in practice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEntry {
    pub text_payload: Option<String>,
    pub json_payload: Option<Map<String, Value>>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Error)]
pub enum LogQueryError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Logging API error: {0}")]
    Api(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Queries the log store for the most recent entries matching a filter.
#[async_trait]
pub trait LogQuery: Send + Sync {
    /// Return the newest matching entry, or `None` when nothing matches.
    async fn find_latest(
        &self,
        identity: &Identity,
        filter: &str,
        page_size: i32,
    ) -> Result<Option<LogEntry>, LogQueryError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesRequest<'a> {
    resource_names: Vec<String>,
    filter: &'a str,
    order_by: &'a str,
    page_size: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListEntriesResponse {
    entries: Vec<LogEntry>,
}

/// `LogQuery` implementation backed by the Cloud Logging REST API.
pub struct GoogleLogQuery {
    client: Client,
    endpoint: String,
}

impl GoogleLogQuery {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl LogQuery for GoogleLogQuery {
    async fn find_latest(
        &self,
        identity: &Identity,
        filter: &str,
        page_size: i32,
    ) -> Result<Option<LogEntry>, LogQueryError> {
        let request = ListEntriesRequest {
            resource_names: vec![format!("projects/{}", identity.project_id)],
            filter,
            order_by: "timestamp desc",
            page_size,
        };

        debug!("Querying log entries: filter={}", filter);

        let response = self
            .client
            .post(format!("{}/v2/entries:list", self.endpoint))
            .bearer_auth(&identity.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| LogQueryError::Api(format!("Failed to reach logging API: {}", e)))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(LogQueryError::PermissionDenied(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LogQueryError::Api(format!(
                "Logging API returned {}: {}",
                status, body
            )));
        }

        let list: ListEntriesResponse = response.json().await.map_err(|e| {
            LogQueryError::Unexpected(format!("Failed to parse logging API response: {}", e))
        })?;

        Ok(list.entries.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_identity() -> Identity {
        Identity {
            project_id: "demo-project".to_string(),
            access_token: "test-token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_latest_returns_newest_entry() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v2/entries:list")
                .header("authorization", "Bearer test-token")
                .json_body(json!({
                    "resourceNames": ["projects/demo-project"],
                    "filter": "resource.type=\"cloud_run_revision\"",
                    "orderBy": "timestamp desc",
                    "pageSize": 1,
                }));
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"entries": [{"textPayload": "INFO:root:{\"percent\": 10}",
                        "timestamp": "2024-01-01T00:00:00Z"}]}"#,
                );
        });

        let client = GoogleLogQuery::new(server.base_url()).unwrap();
        let entry = client
            .find_latest(&test_identity(), "resource.type=\"cloud_run_revision\"", 1)
            .await
            .unwrap()
            .unwrap();

        mock.assert();
        assert_eq!(
            entry.text_payload.as_deref(),
            Some("INFO:root:{\"percent\": 10}")
        );
        assert_eq!(entry.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_find_latest_empty_result() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/v2/entries:list");
            then.status(200)
                .header("content-type", "application/json")
                .body("{}");
        });

        let client = GoogleLogQuery::new(server.base_url()).unwrap();
        let entry = client.find_latest(&test_identity(), "f", 1).await.unwrap();

        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_find_latest_permission_denied() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/v2/entries:list");
            then.status(403).body("caller lacks logging.logEntries.list");
        });

        let client = GoogleLogQuery::new(server.base_url()).unwrap();
        let err = client
            .find_latest(&test_identity(), "f", 1)
            .await
            .unwrap_err();

        match err {
            LogQueryError::PermissionDenied(details) => {
                assert!(details.contains("logging.logEntries.list"));
            }
            other => panic!("expected PermissionDenied, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_find_latest_api_error() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/v2/entries:list");
            then.status(503).body("backend unavailable");
        });

        let client = GoogleLogQuery::new(server.base_url()).unwrap();
        let err = client
            .find_latest(&test_identity(), "f", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, LogQueryError::Api(_)));
    }

    #[tokio::test]
    async fn test_find_latest_connection_error() {
        let client = GoogleLogQuery::new("http://127.0.0.1:65534").unwrap();
        let err = client
            .find_latest(&test_identity(), "f", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, LogQueryError::Api(_)));
    }

    #[tokio::test]
    async fn test_find_latest_malformed_body() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/v2/entries:list");
            then.status(200).body("not json");
        });

        let client = GoogleLogQuery::new(server.base_url()).unwrap();
        let err = client
            .find_latest(&test_identity(), "f", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, LogQueryError::Unexpected(_)));
    }
}
