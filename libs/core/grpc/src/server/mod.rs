//! gRPC server helpers.
//!
//! ```ignore
//! use grpc_helpers::server::{GrpcServer, ServerConfig};
//! use core_config::FromEnv;
//!
//! let config = ServerConfig::from_env()?;
//! let (health_reporter, health_service) = GrpcServer::health_service();
//!
//! GrpcServer::setup_health(&health_reporter, SERVICE_NAME).await;
//! GrpcServer::log_startup(&config, SERVICE_NAME);
//! ```

mod builder;
mod config;

pub use builder::GrpcServer;
pub use config::ServerConfig;
