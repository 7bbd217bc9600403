//! Todo Domain
//!
//! One set of business rules for the `todo.v1` contract, exposed through two
//! thin adapters that share a single [`TodoHandler`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ gRPC adapter │   │ HTTP gateway │  ← wire translation only
//! └──────┬───────┘   └──────┬───────┘
//!        └────────┬─────────┘
//!          ┌──────▼──────┐
//!          │ TodoHandler │  ← version gating, validation, error taxonomy
//!          └──────┬──────┘
//!          ┌──────▼──────┐
//!          │    Store    │  ← connect / execute / query (SqlStore)
//!          └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_todos::{SqlStore, TodoHandler, TodoServiceImpl, gateway_router};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(db: sea_orm::DatabaseConnection) {
//! let handler = Arc::new(TodoHandler::new(SqlStore::new(db)));
//! let shutdown = CancellationToken::new();
//!
//! let grpc = TodoServiceImpl::new(handler.clone(), shutdown.clone());
//! let http = gateway_router(handler, shutdown);
//! # }
//! ```

pub mod context;
pub mod conversions;
pub mod error;
pub mod handlers;
pub mod models;
pub mod service;
pub mod sql_store;
pub mod store;

pub use context::CallContext;
pub use error::{TodoError, TodoResult};
pub use handlers::{GatewayApiDoc, GatewayState, TodoServiceImpl, gateway_router};
pub use service::{API_VERSION, TodoHandler};
pub use sql_store::SqlStore;
pub use store::{ExecOutcome, Statement, Store, StoreConnection, StoreError, StoreResult, TodoRow};
