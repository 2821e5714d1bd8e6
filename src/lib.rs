//! Run Progress Lookup Service
//!
//! Reports the latest progress status of a named asynchronous run by
//! querying Cloud Logging for the newest `progress` event emitted by the
//! run's worker, parsing its payload, and returning normalized
//! percent/step/timestamp fields over a single HTTP endpoint.
//!
//! ## Module Structure
//!
//! - `filter`: log-query filter construction
//! - `payload`: progress-payload extraction from log entries
//! - `logging_client`: the `LogQuery` seam and its Cloud Logging REST impl
//! - `identity`: ambient project/credential resolution
//! - `api`: request/response types, handler, error-to-status mapping
//! - `server`: router and startup
//! - `util`: shared utilities (timestamp)

/// Shared utility functions
pub mod util;

/// Log-query filter construction
pub mod filter;

/// Progress-payload extraction
pub mod payload;

/// Cloud Logging query client
pub mod logging_client;

/// Ambient identity resolution
pub mod identity;

/// REST API
pub mod api;

/// HTTP server
pub mod server;

pub use api::{
    ApiError, ApiState, ErrorResponse, HealthResponse, ProgressFoundResponse,
    ProgressNotFoundResponse, ProgressRequest, ProgressUnparsedResponse,
};
pub use filter::{progress_filter, resource_type_or_default, DEFAULT_RESOURCE_TYPE};
pub use identity::{
    Identity, IdentityError, MetadataProjectResolver, ProjectResolver, DEFAULT_METADATA_URL,
};
pub use logging_client::{
    GoogleLogQuery, LogEntry, LogQuery, LogQueryError, DEFAULT_LOGGING_ENDPOINT,
};
pub use payload::{entry_payload, extract_json_from_text};
pub use server::{router, run_server};
