//! # Todo server
//!
//! One process, two listeners over one [`domain_todos::TodoHandler`]:
//!
//! - **RPC** (`GRPC_HOST:GRPC_PORT`): `todo.v1.TodoService` plus
//!   `grpc.health.v1.Health`
//! - **Gateway** (`HOST:PORT`): `/v1/todo` JSON routes, `/health`,
//!   `/swagger.json` and `/docs`
//!
//! The [`lifecycle::LifecycleCoordinator`] owns both listeners and moves the
//! process through `Starting → Running → Draining → Stopped`.

pub mod config;
pub mod lifecycle;
pub mod server;

pub use config::Config;
pub use lifecycle::{LifecycleCoordinator, LifecycleState, Listeners};
pub use server::{run, serve};
