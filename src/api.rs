//! Run-Progress API Endpoints
//!
//! A single lookup endpoint: given a `run_id`, find the newest `progress`
//! log event for that run and report its percent/step/timestamp fields.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::filter::{progress_filter, resource_type_or_default};
use crate::identity::ProjectResolver;
use crate::logging_client::{LogQuery, LogQueryError};
use crate::payload::entry_payload;
use crate::util::timestamp::utc_now_iso;

// ============================================================================
// SHARED STATE
// ============================================================================

/// API state shared across all handlers
pub struct ApiState {
    pub resolver: Arc<dyn ProjectResolver>,
    pub log_query: Arc<dyn LogQuery>,
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProgressRequest {
    pub run_id: Option<String>,
    pub resource_type: Option<String>,
    pub service_name: Option<String>,
}

/// Progress fields found for the run. `percent`/`step`/`ts_utc` are passed
/// through exactly as logged and may be null.
#[derive(Debug, Serialize)]
pub struct ProgressFoundResponse {
    pub found: bool,
    pub run_id: String,
    pub percent: Option<Value>,
    pub step: Option<Value>,
    pub ts_utc: Option<Value>,
    pub checked_at_utc: String,
}

/// An entry matched the filter but carried no parseable payload.
#[derive(Debug, Serialize)]
pub struct ProgressUnparsedResponse {
    pub found: bool,
    pub run_id: String,
    pub checked_at_utc: String,
    pub warning: String,
}

/// No entry matched; the filter is echoed back for debugging.
#[derive(Debug, Serialize)]
pub struct ProgressNotFoundResponse {
    pub found: bool,
    pub run_id: String,
    pub checked_at_utc: String,
    pub filter: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("run_id is required")]
    MissingRunId,
    #[error("Project id resolution failed: {0}")]
    ProjectResolution(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Logging API error: {0}")]
    LoggingApi(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<LogQueryError> for ApiError {
    fn from(err: LogQueryError) -> Self {
        match err {
            LogQueryError::PermissionDenied(details) => ApiError::PermissionDenied(details),
            LogQueryError::Api(details) => ApiError::LoggingApi(details),
            LogQueryError::Unexpected(details) => ApiError::Unexpected(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingRunId => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "run_id is required".to_string(),
                    details: None,
                    hint: None,
                },
            ),
            ApiError::ProjectResolution(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "project_id_resolution_failed".to_string(),
                    details: Some(details),
                    hint: None,
                },
            ),
            ApiError::PermissionDenied(details) => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    error: "permission_denied".to_string(),
                    details: Some(details),
                    hint: Some(
                        "Grant roles/logging.viewer to the service account running this service."
                            .to_string(),
                    ),
                },
            ),
            ApiError::LoggingApi(details) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: "logging_api_error".to_string(),
                    details: Some(details),
                    hint: None,
                },
            ),
            ApiError::Unexpected(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "unexpected_error".to_string(),
                    details: Some(details),
                    hint: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// LOOKUP ENDPOINT
// ============================================================================

/// POST / - Look up the latest progress event for a run
///
/// The body is JSON with `run_id` (required), `resource_type` (defaults to
/// `cloud_run_revision`) and `service_name` (optional scope). A missing or
/// unparseable body is treated as an empty object.
pub async fn lookup_progress(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ProgressRequest = serde_json::from_slice(&body).unwrap_or_default();

    let run_id = request.run_id.as_deref().unwrap_or("").trim().to_string();
    if run_id.is_empty() {
        warn!("Progress lookup rejected: missing run_id");
        return Err(ApiError::MissingRunId);
    }

    let resource_type = resource_type_or_default(request.resource_type.as_deref());
    let service_name = request
        .service_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let identity = state.resolver.resolve().await.map_err(|e| {
        error!("Project id resolution failed: {}", e);
        ApiError::ProjectResolution(e.to_string())
    })?;

    let filter = progress_filter(&run_id, resource_type, service_name);

    let entry = state
        .log_query
        .find_latest(&identity, &filter, 1)
        .await
        .map_err(|e| {
            match &e {
                LogQueryError::PermissionDenied(_) => {
                    warn!("Log query denied for run {}: {}", run_id, e)
                }
                _ => error!("Log query failed for run {}: {}", run_id, e),
            }
            ApiError::from(e)
        })?;

    let Some(entry) = entry else {
        info!("No progress entry found for run {}", run_id);
        return Ok((
            StatusCode::NOT_FOUND,
            Json(ProgressNotFoundResponse {
                found: false,
                run_id,
                checked_at_utc: utc_now_iso(),
                filter,
            }),
        )
            .into_response());
    };

    let Some(payload) = entry_payload(&entry) else {
        warn!("Progress entry for run {} has no parseable payload", run_id);
        return Ok(Json(ProgressUnparsedResponse {
            found: true,
            run_id,
            checked_at_utc: utc_now_iso(),
            warning: "Found log entry but could not parse payload".to_string(),
        })
        .into_response());
    };

    info!("Progress found for run {}", run_id);

    Ok(Json(ProgressFoundResponse {
        found: true,
        run_id,
        percent: payload.get("percent").cloned(),
        step: payload.get("step").cloned(),
        ts_utc: payload.get("ts_utc").cloned(),
        checked_at_utc: utc_now_iso(),
    })
    .into_response())
}

/// Fallback for non-POST methods on the lookup route.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "method_not_allowed".to_string(),
            details: None,
            hint: None,
        }),
    )
        .into_response()
}

// ============================================================================
// HEALTH ENDPOINT
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Liveness probe
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
