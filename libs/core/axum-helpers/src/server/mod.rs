//! Server infrastructure module.
//!
//! This module provides:
//! - Router assembly with OpenAPI documentation and the standard middleware stack
//! - Health endpoint backed by the caller's lifecycle state
//! - Serving a pre-bound listener until a shutdown future resolves
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{create_app, create_router, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes.merge(health_router(lifecycle)));
//! create_app(listener, router, lifecycle.draining()).await?;
//! ```

pub mod app;
pub mod health;

pub use app::{create_app, create_router};
pub use health::{HealthResponse, Readiness, health_router};
