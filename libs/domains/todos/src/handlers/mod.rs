mod gateway;
mod grpc;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use axum_helpers::{ErrorCode, ErrorResponse};
use tokio_util::sync::CancellationToken;
use utoipa::OpenApi;

use crate::models::{
    CreateReply, DeleteReply, ReadAllReply, ReadReply, TodoBody, TodoJson, UpdateReply,
};
use crate::service::TodoHandler;
use crate::store::Store;

pub use gateway::GatewayState;
pub use grpc::TodoServiceImpl;

/// OpenAPI documentation for the HTTP/JSON gateway
#[derive(OpenApi)]
#[openapi(
    info(title = "todo.v1 gateway", description = "HTTP/JSON view of todo.v1.TodoService"),
    paths(
        gateway::create_todo,
        gateway::read_all_todos,
        gateway::read_todo,
        gateway::update_todo,
        gateway::delete_todo,
    ),
    components(
        schemas(
            TodoJson,
            TodoBody,
            CreateReply,
            ReadReply,
            UpdateReply,
            DeleteReply,
            ReadAllReply,
            ErrorResponse,
            ErrorCode,
        )
    ),
    tags(
        (name = "todo", description = "Todo operations")
    )
)]
pub struct GatewayApiDoc;

/// Routes under `/v1/todo`, calling the handler in-process.
///
/// `shutdown` is the process root token; each request gets a child of it.
pub fn gateway_router<S: Store + 'static>(
    handler: Arc<TodoHandler<S>>,
    shutdown: CancellationToken,
) -> Router {
    Router::new()
        .route("/v1/todo", post(gateway::create_todo::<S>))
        .route("/v1/todo/all", get(gateway::read_all_todos::<S>))
        .route(
            "/v1/todo/{id}",
            get(gateway::read_todo::<S>)
                .put(gateway::update_todo::<S>)
                .patch(gateway::update_todo::<S>)
                .delete(gateway::delete_todo::<S>),
        )
        .with_state(GatewayState::new(handler, shutdown))
}
