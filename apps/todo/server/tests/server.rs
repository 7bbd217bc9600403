use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use database::sql::{DatabaseConfig, connect, run_migrations};
use domain_todos::{
    CallContext, ExecOutcome, SqlStore, Statement, Store, StoreConnection, StoreError, StoreResult,
    TodoRow,
};
use grpc_helpers::{ServerConfig, datetime_to_timestamp};
use migration::Migrator;
use rpc::todo::v1::todo_service_client::TodoServiceClient;
use rpc::todo::v1::{
    CreateRequest, DeleteRequest, ReadAllRequest, ReadRequest, Todo, UpdateRequest,
};
use serde_json::{Value, json};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use todo_server::{LifecycleCoordinator, LifecycleState, Listeners, serve};
use tonic::Code;
use tonic::transport::Channel;
use tonic_health::pb::HealthCheckRequest;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;

struct Running {
    rpc: SocketAddr,
    http: SocketAddr,
    lifecycle: LifecycleCoordinator,
    task: JoinHandle<eyre::Result<()>>,
}

impl Running {
    async fn start<S: Store + 'static>(store: S, drain_timeout: Duration) -> Self {
        Self::start_with(store, ServerConfig::default(), drain_timeout).await
    }

    async fn start_with<S: Store + 'static>(
        store: S,
        grpc_config: ServerConfig,
        drain_timeout: Duration,
    ) -> Self {
        let listeners = Listeners::bind("127.0.0.1:0", "127.0.0.1:0").await.unwrap();
        let rpc = listeners.rpc_addr().unwrap();
        let http = listeners.http_addr().unwrap();
        let lifecycle = LifecycleCoordinator::new();
        let task = tokio::spawn(serve(
            listeners,
            store,
            grpc_config,
            lifecycle.clone(),
            drain_timeout,
        ));

        tokio::time::timeout(Duration::from_secs(5), lifecycle.running())
            .await
            .unwrap();
        Self {
            rpc,
            http,
            lifecycle,
            task,
        }
    }

    async fn sqlite() -> Self {
        Self::sqlite_with(ServerConfig::default()).await
    }

    async fn sqlite_with(grpc_config: ServerConfig) -> Self {
        let db = connect(&DatabaseConfig::in_memory_sqlite()).await.unwrap();
        run_migrations::<Migrator>(&db, "todo").await.unwrap();
        Self::start_with(SqlStore::new(db), grpc_config, Duration::from_secs(5)).await
    }

    async fn client(&self) -> TodoServiceClient<Channel> {
        TodoServiceClient::connect(format!("http://{}", self.rpc))
            .await
            .unwrap()
            .max_decoding_message_size(16 * 1024 * 1024)
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.http, path)
    }

    async fn stop(self) -> LifecycleCoordinator {
        self.lifecycle.begin_drain();
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        self.lifecycle
    }
}

fn buy_milk() -> Todo {
    Todo {
        id: 0,
        title: "Buy milk".to_string(),
        description: "2%".to_string(),
        reminder: Some(datetime_to_timestamp(
            Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
        )),
    }
}

#[tokio::test]
async fn test_rpc_crud_scenario() {
    let server = Running::sqlite().await;
    let mut client = server.client().await;

    let created = client
        .create(CreateRequest {
            api: "v1".into(),
            todo: Some(buy_milk()),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(created.api, "v1");
    assert_eq!(created.id, 1);

    let read = client
        .read(ReadRequest { api: "v1".into(), id: 1 })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(read.todo, Some(Todo { id: 1, ..buy_milk() }));

    let mut changed = buy_milk();
    changed.id = 1;
    changed.title = "Buy oat milk".into();
    let updated = client
        .update(UpdateRequest {
            api: "v1".into(),
            todo: Some(changed),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(updated.updated, 1);

    let read = client
        .read(ReadRequest { api: "v1".into(), id: 1 })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(read.todo.unwrap().title, "Buy oat milk");

    let deleted = client
        .delete(DeleteRequest { api: "v1".into(), id: 1 })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(deleted.deleted, 1);

    let status = client
        .read(ReadRequest { api: "v1".into(), id: 1 })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);

    let all = client
        .read_all(ReadAllRequest { api: "v1".into() })
        .await
        .unwrap()
        .into_inner();
    assert!(all.todos.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_rpc_rejects_other_versions() {
    let server = Running::sqlite().await;
    let mut client = server.client().await;

    let status = client
        .create(CreateRequest {
            api: "v2".into(),
            todo: Some(buy_milk()),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);

    let all = client
        .read_all(ReadAllRequest { api: "v1".into() })
        .await
        .unwrap()
        .into_inner();
    assert!(all.todos.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_rpc_message_size_follows_config() {
    let mut large = buy_milk();
    large.title = "x".repeat(5 * 1024 * 1024);

    // The default 8 MiB limit is above tonic's own 4 MiB default.
    let server = Running::sqlite().await;
    let created = server
        .client()
        .await
        .create(CreateRequest {
            api: "v1".into(),
            todo: Some(large.clone()),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(created.id, 1);
    server.stop().await;

    let mut config = ServerConfig::default().with_compression(false);
    config.max_decoding_message_size = 1024 * 1024;
    let server = Running::sqlite_with(config).await;
    let mut client = server.client().await;

    let status = client
        .create(CreateRequest {
            api: "v1".into(),
            todo: Some(large),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::OutOfRange);

    let created = client
        .create(CreateRequest {
            api: "v1".into(),
            todo: Some(buy_milk()),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(created.id, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_not_found_on_both_listeners() {
    let server = Running::sqlite().await;
    let http = reqwest::Client::new();

    let response = http.get(server.url("/v1/todo/999")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "NOT_FOUND");

    let status = server
        .client()
        .await
        .read(ReadRequest { api: "v1".into(), id: 999 })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);

    server.stop().await;
}

#[tokio::test]
async fn test_gateway_writes_are_visible_over_rpc() {
    let server = Running::sqlite().await;
    let http = reqwest::Client::new();

    let response = http
        .post(server.url("/v1/todo"))
        .header("x-request-id", "e2e-1")
        .json(&json!({
            "api": "v1",
            "todo": {"title": "Buy milk", "description": "2%", "reminder": "2025-01-01T09:00:00Z"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-request-id"], "e2e-1");
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let read = server
        .client()
        .await
        .read(ReadRequest { api: String::new(), id })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(read.todo, Some(Todo { id, ..buy_milk() }));

    let response = http.get(server.url("/v1/todo/all")).send().await.unwrap();
    let all: Value = response.json().await.unwrap();
    assert_eq!(all["todos"][0]["title"], "Buy milk");

    server.stop().await;
}

#[tokio::test]
async fn test_health_follows_lifecycle() {
    let server = Running::sqlite().await;
    let http = reqwest::Client::new();

    let response = http.get(server.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["state"], "running");

    let channel = Channel::from_shared(format!("http://{}", server.rpc))
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut health = HealthClient::new(channel);
    let status = health
        .check(HealthCheckRequest {
            service: "todo.v1.TodoService".into(),
        })
        .await
        .unwrap()
        .into_inner()
        .status;
    assert_eq!(status, ServingStatus::Serving as i32);

    let lifecycle = server.stop().await;
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn test_listeners_close_after_stop() {
    let server = Running::sqlite().await;
    let (rpc, http) = (server.rpc, server.http);

    let lifecycle = server.stop().await;
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    assert!(!lifecycle.root_token().is_cancelled());

    assert!(tokio::net::TcpStream::connect(rpc).await.is_err());
    assert!(tokio::net::TcpStream::connect(http).await.is_err());
}

/// Answers `ReadAll` with nothing after `delay`, or never if `delay` is
/// `None`; records whether the call saw its cancellation.
#[derive(Clone)]
struct SlowStore {
    delay: Option<Duration>,
    entered: Arc<Notify>,
    cancelled: Arc<AtomicBool>,
}

impl SlowStore {
    fn new(delay: Option<Duration>) -> Self {
        Self {
            delay,
            entered: Arc::new(Notify::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Store for SlowStore {
    async fn connect(&self, _ctx: &CallContext) -> StoreResult<Box<dyn StoreConnection>> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl StoreConnection for SlowStore {
    async fn execute(&mut self, _ctx: &CallContext, _statement: Statement) -> StoreResult<ExecOutcome> {
        Err(StoreError::Query("read only".into()))
    }

    async fn query(&mut self, ctx: &CallContext, _statement: Statement) -> StoreResult<Vec<TodoRow>> {
        self.entered.notify_one();
        let wait = async {
            match self.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = wait => Ok(Vec::new()),
            _ = ctx.cancel.cancelled() => {
                self.cancelled.store(true, Ordering::SeqCst);
                Err(StoreError::Cancelled)
            }
        }
    }
}

#[tokio::test]
async fn test_drain_lets_in_flight_call_finish() {
    let store = SlowStore::new(Some(Duration::from_millis(300)));
    let server = Running::start(store.clone(), Duration::from_secs(5)).await;
    let mut client = server.client().await;

    let call = tokio::spawn(async move { client.read_all(ReadAllRequest::default()).await });
    store.entered.notified().await;

    let lifecycle = server.stop().await;
    let reply = call.await.unwrap().unwrap().into_inner();
    assert_eq!(reply.api, "v1");
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    assert!(!store.cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_drain_timeout_cancels_stuck_call() {
    let store = SlowStore::new(None);
    let server = Running::start(store.clone(), Duration::from_millis(200)).await;
    let http = reqwest::Client::new();

    let url = server.url("/v1/todo/all");
    let call = tokio::spawn(async move { http.get(url).send().await });
    store.entered.notified().await;

    let lifecycle = server.stop().await;
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    assert!(lifecycle.root_token().is_cancelled());

    tokio::time::timeout(Duration::from_secs(5), async {
        while !store.cancelled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    // The call ends one way or another: a 503 or a dropped connection.
    if let Ok(response) = call.await.unwrap() {
        assert_eq!(response.status(), 503);
    }
}

#[tokio::test]
async fn test_forced_stop_during_drain() {
    let store = SlowStore::new(None);
    let server = Running::start(store.clone(), Duration::from_secs(60)).await;
    let mut client = server.client().await;

    let call = tokio::spawn(async move { client.read_all(ReadAllRequest::default()).await });
    store.entered.notified().await;

    server.lifecycle.begin_drain();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.lifecycle.state(), LifecycleState::Draining);

    server.lifecycle.force_stop();
    tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let _ = call.await.unwrap();
    assert!(store.cancelled.load(Ordering::SeqCst));
}
