//! # Axum Helpers
//!
//! Utilities shared by the HTTP surfaces in the workspace.
//!
//! ## Modules
//!
//! - **[`server`]**: router assembly with OpenAPI documentation, health route, serving
//! - **[`middleware`]**: request correlation ids and per-request log records
//! - **[`errors`]**: structured error responses with error codes
//! - **[`extractors`]**: custom extractors (correlation id)
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_app, create_router};
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! let router = create_router::<ApiDoc>(Router::new());
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! create_app(listener, router, shutdown).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod middleware;
pub mod server;

// Re-export server types
pub use server::{HealthResponse, Readiness, create_app, create_router, health_router};

// Re-export middleware
pub use middleware::{REQUEST_ID_HEADER, log_requests};

// Re-export error types
pub use errors::{AppError, ErrorCode, ErrorResponse};

// Re-export extractors
pub use extractors::CorrelationId;
