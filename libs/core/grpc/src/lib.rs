//! # gRPC Helpers
//!
//! Server-side building blocks shared by gRPC services in the workspace.
//!
//! - **[`server`]**: listener configuration loaded from the environment and
//!   `grpc.health.v1` status management.
//! - **[`interceptors`]**: tower layers wrapped around the tonic server, such as
//!   one structured log record per call.
//! - **[`conversions`]**: `google.protobuf.Timestamp` ↔ `chrono` conversions.
//!
//! ## Quick Start
//!
//! ```ignore
//! use grpc_helpers::{GrpcLoggingLayer, GrpcServer, ServerConfig};
//! use core_config::FromEnv;
//! use tonic::transport::Server;
//!
//! let config = ServerConfig::from_env()?;
//! let (health_reporter, health_service) = GrpcServer::health_service();
//! GrpcServer::setup_health(&health_reporter, SERVICE_NAME).await;
//! GrpcServer::log_startup(&config, SERVICE_NAME);
//!
//! Server::builder()
//!     .layer(GrpcLoggingLayer::new())
//!     .add_service(health_service)
//!     .add_service(my_service)
//!     .serve(config.socket_addr()?)
//!     .await?;
//! ```

pub mod conversions;
pub mod interceptors;
pub mod server;

pub use conversions::{ConversionError, datetime_to_timestamp, timestamp_to_datetime};
pub use interceptors::{GrpcLogging, GrpcLoggingLayer, REQUEST_ID_HEADER, request_id};
pub use server::{GrpcServer, ServerConfig};
