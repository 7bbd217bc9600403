use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum_helpers::{create_app, create_router, health_router};
use database::sql::{connect_with_retry, run_migrations};
use domain_todos::{GatewayApiDoc, SqlStore, Store, TodoHandler, TodoServiceImpl, gateway_router};
use eyre::WrapErr;
use grpc_helpers::{GrpcLoggingLayer, GrpcServer};
use migration::Migrator;
use rpc::todo::v1::todo_service_server::SERVICE_NAME;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::lifecycle::{LifecycleCoordinator, Listeners};

/// Run the todo server until it is told to stop.
///
/// 1. Load configuration and initialize tracing
/// 2. Connect to the database (with retry) and apply migrations
/// 3. Bind the RPC and gateway ports
/// 4. Serve both until an interrupt, then drain
/// 5. Close the database pool
pub async fn run() -> eyre::Result<()> {
    let config = Config::from_env().wrap_err("failed to load configuration")?;
    core_config::tracing::init_tracing(&config.environment, &config.log);

    let db = connect_with_retry(&config.database, None)
        .await
        .wrap_err("failed to connect to database")?;
    run_migrations::<Migrator>(&db, "todo")
        .await
        .wrap_err("failed to run migrations")?;

    GrpcServer::log_startup(&config.grpc, SERVICE_NAME);
    let listeners = Listeners::bind(&config.grpc.addr_string(), &config.http.address()).await?;

    let lifecycle = LifecycleCoordinator::new();
    let signals = tokio::spawn(lifecycle.clone().watch_signals());

    let store = SqlStore::new(db);
    let result = serve(
        listeners,
        store.clone(),
        config.grpc,
        lifecycle,
        config.drain_timeout,
    )
    .await;
    signals.abort();

    if let Err(e) = store.close().await {
        warn!(error = %e, "Failed to close database pool");
    }
    info!("Server stopped");
    result
}

/// Serve both listeners over `store` and walk `lifecycle` from `Starting`
/// to `Stopped`.
///
/// Returns once the state is `Stopped`: either both listeners finished
/// draining, or `drain_timeout` elapsed (or [`LifecycleCoordinator::force_stop`]
/// was called) and the remaining work was cancelled. The first listener
/// failure is returned on either path.
pub async fn serve<S: Store + 'static>(
    listeners: Listeners,
    store: S,
    grpc_config: grpc_helpers::ServerConfig,
    lifecycle: LifecycleCoordinator,
    drain_timeout: Duration,
) -> eyre::Result<()> {
    let rpc_addr = listeners.rpc_addr()?;
    let http_addr = listeners.http_addr()?;
    let handler = Arc::new(TodoHandler::new(store));
    let failures = FirstFailure::default();

    let (health_reporter, health_service) = GrpcServer::health_service();
    GrpcServer::setup_health(&health_reporter, SERVICE_NAME).await;

    let grpc = Server::builder()
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(GrpcLoggingLayer::new()),
        )
        .add_service(health_service)
        .add_service(
            TodoServiceImpl::new(handler.clone(), lifecycle.root_token()).into_server(&grpc_config),
        )
        .serve_with_incoming_shutdown(TcpListenerStream::new(listeners.rpc), lifecycle.draining());
    let grpc_task = spawn_listener("RPC", grpc, lifecycle.clone(), failures.clone());

    let router = create_router::<GatewayApiDoc>(
        gateway_router(handler, lifecycle.root_token()).merge(health_router(lifecycle.clone())),
    );
    let http = create_app(listeners.http, router, lifecycle.draining());
    let http_task = spawn_listener("gateway", http, lifecycle.clone(), failures.clone());

    lifecycle.mark_running();
    info!(rpc = %rpc_addr, http = %http_addr, "Todo server running");

    lifecycle.draining().await;
    GrpcServer::mark_not_serving(&health_reporter, SERVICE_NAME).await;

    drain([grpc_task, http_task], &lifecycle, drain_timeout, &failures).await
}

/// Wait for the listeners to stop, for at most `drain_timeout` or until a
/// forced stop, then move to `Stopped` and report the first failure.
async fn drain(
    tasks: [JoinHandle<()>; 2],
    lifecycle: &LifecycleCoordinator,
    drain_timeout: Duration,
    failures: &FirstFailure,
) -> eyre::Result<()> {
    info!(timeout_secs = drain_timeout.as_secs_f64(), "Draining in-flight calls");

    let [first, second] = tasks;
    let aborts = [first.abort_handle(), second.abort_handle()];
    let drained = tokio::select! {
        (first, second) = async { tokio::join!(first, second) } => {
            for result in [first, second] {
                if let Err(e) = result {
                    failures.record(eyre::Report::new(e).wrap_err("listener task panicked"));
                }
            }
            true
        }
        _ = tokio::time::sleep(drain_timeout) => {
            warn!("Drain timeout elapsed");
            false
        }
        _ = lifecycle.stopped() => false,
    };

    if drained {
        lifecycle.finish();
        info!("All listeners drained");
    } else {
        lifecycle.force_stop();
        for abort in aborts {
            abort.abort();
        }
    }

    failures.take().map_or(Ok(()), Err)
}

/// First listener failure, kept until `serve` returns.
#[derive(Clone, Default)]
struct FirstFailure(Arc<Mutex<Option<eyre::Report>>>);

impl FirstFailure {
    fn record(&self, report: eyre::Report) {
        error!(error = %report, "Listener failed");
        if let Ok(mut slot) = self.0.lock() {
            slot.get_or_insert(report);
        }
    }

    fn take(&self) -> Option<eyre::Report> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Spawn one listener. Whichever way it ends, the coordinator starts
/// draining so the other listener stops too.
fn spawn_listener<F, E>(
    name: &'static str,
    serve: F,
    lifecycle: LifecycleCoordinator,
    failures: FirstFailure,
) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = serve.await.wrap_err_with(|| format!("{name} listener failed")) {
            failures.record(e);
        }
        if lifecycle.begin_drain() {
            error!(listener = name, "Listener stopped while running");
        }
    })
}
