//! Ambient identity resolution.
//!
//! Resolves the project id and an access token from the GCE/Cloud Run
//! metadata server. The `ProjectResolver` trait is the seam the HTTP
//! handler depends on, so tests can substitute a fake identity.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default metadata server reachable from GCE, Cloud Run and Cloud Functions.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

const METADATA_TIMEOUT_SECS: u64 = 10;

/// Resolved ambient identity: the project to query and a token to do it with.
#[derive(Debug, Clone)]
pub struct Identity {
    pub project_id: String,
    pub access_token: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Failed to resolve project id: {0}")]
    Project(String),
    #[error("Failed to obtain access token: {0}")]
    Token(String),
}

/// Supplies the ambient cloud identity for outbound log queries.
#[async_trait]
pub trait ProjectResolver: Send + Sync {
    async fn resolve(&self) -> Result<Identity, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Resolver backed by the metadata server.
///
/// An explicit project id (e.g. from `GOOGLE_CLOUD_PROJECT`) skips the
/// project lookup; the token always comes from the default service account.
pub struct MetadataProjectResolver {
    client: Client,
    metadata_url: String,
    project_override: Option<String>,
}

impl MetadataProjectResolver {
    pub fn new(metadata_url: impl Into<String>, project_override: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(METADATA_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            metadata_url: metadata_url.into(),
            project_override,
        })
    }

    async fn metadata_get(&self, path: &str) -> Result<String, String> {
        let url = format!("{}{}", self.metadata_url, path);

        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| format!("Failed to reach metadata server: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Metadata server returned {}", response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("Failed to read metadata response: {}", e))
    }
}

#[async_trait]
impl ProjectResolver for MetadataProjectResolver {
    async fn resolve(&self) -> Result<Identity, IdentityError> {
        let project_id = match &self.project_override {
            Some(project_id) => project_id.clone(),
            None => {
                let body = self
                    .metadata_get("/computeMetadata/v1/project/project-id")
                    .await
                    .map_err(IdentityError::Project)?;

                let project_id = body.trim().to_string();
                if project_id.is_empty() {
                    return Err(IdentityError::Project(
                        "Metadata server returned an empty project id".to_string(),
                    ));
                }
                project_id
            }
        };

        let token_body = self
            .metadata_get("/computeMetadata/v1/instance/service-accounts/default/token")
            .await
            .map_err(IdentityError::Token)?;

        let token: TokenResponse = serde_json::from_str(&token_body)
            .map_err(|e| IdentityError::Token(format!("Failed to parse token response: {}", e)))?;

        debug!("Resolved identity for project {}", project_id);

        Ok(Identity {
            project_id,
            access_token: token.access_token,
        })
    }
}
