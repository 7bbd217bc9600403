//! gRPC Server utilities.

use super::config::ServerConfig;
use tonic_health::ServingStatus;
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_health::server::HealthReporter;
use tracing::info;

/// Helpers for gRPC servers that expose `grpc.health.v1.Health`.
pub struct GrpcServer;

impl GrpcServer {
    /// Log server startup information for a single service.
    pub fn log_startup(config: &ServerConfig, service_name: &str) {
        info!(
            addr = %config.addr_string(),
            service = service_name,
            compression = config.enable_compression,
            "gRPC server starting"
        );
        info!("Health check service enabled (grpc.health.v1.Health)");
    }

    /// Create the health reporter and the service to register on the router.
    pub fn health_service() -> (HealthReporter, HealthServer<impl Health>) {
        tonic_health::server::health_reporter()
    }

    /// Mark `service_name` and the empty service name as serving.
    ///
    /// The empty name is what generic health checkers query.
    pub async fn setup_health(health_reporter: &HealthReporter, service_name: &str) {
        Self::set_status(health_reporter, service_name, ServingStatus::Serving).await;
        info!(service = service_name, "Service marked as serving");
    }

    /// Flip `service_name` and the empty service name to `NOT_SERVING`, so
    /// load balancers stop routing new calls while in-flight ones finish.
    pub async fn mark_not_serving(health_reporter: &HealthReporter, service_name: &str) {
        Self::set_status(health_reporter, service_name, ServingStatus::NotServing).await;
        info!(service = service_name, "Service marked as not serving");
    }

    async fn set_status(
        health_reporter: &HealthReporter,
        service_name: &str,
        status: ServingStatus,
    ) {
        health_reporter
            .set_service_status(service_name, status)
            .await;
        health_reporter.set_service_status("", status).await;
    }
}
