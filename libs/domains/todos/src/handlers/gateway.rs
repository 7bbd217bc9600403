use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use axum_helpers::{AppError, CorrelationId, ErrorResponse};
use rpc::todo::v1::{
    CreateRequest, DeleteRequest, ReadAllRequest, ReadRequest, Todo, UpdateRequest,
};
use tokio_util::sync::CancellationToken;

use crate::context::CallContext;
use crate::models::{
    ApiQuery, CreateReply, DeleteReply, ReadAllReply, ReadReply, TodoBody, UpdateReply,
};
use crate::service::TodoHandler;
use crate::store::Store;

/// Shared by every gateway route: the handler plus the root token calls
/// derive their context from.
pub struct GatewayState<S: Store + 'static> {
    handler: Arc<TodoHandler<S>>,
    shutdown: CancellationToken,
}

impl<S: Store + 'static> Clone for GatewayState<S> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: Store + 'static> GatewayState<S> {
    pub fn new(handler: Arc<TodoHandler<S>>, shutdown: CancellationToken) -> Self {
        Self { handler, shutdown }
    }

    fn context(&self, request_id: Option<String>) -> CallContext {
        CallContext::child_of(&self.shutdown, request_id)
    }
}

fn api_of(query: Result<Query<ApiQuery>, QueryRejection>) -> Result<String, AppError> {
    let Query(query) = query?;
    Ok(query.api)
}

/// Create a todo
#[utoipa::path(
    post,
    path = "/v1/todo",
    tag = "todo",
    request_body = TodoBody,
    responses(
        (status = 200, description = "Todo created", body = CreateReply),
        (status = 400, description = "Invalid request or unsupported API version", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_todo<S: Store + 'static>(
    State(state): State<GatewayState<S>>,
    CorrelationId(request_id): CorrelationId,
    body: Result<Json<TodoBody>, JsonRejection>,
) -> Result<Json<CreateReply>, AppError> {
    let Json(body) = body?;
    let ctx = state.context(request_id);
    let _cancel_on_drop = ctx.cancel_on_drop();

    let todo = body.todo.map(Todo::try_from).transpose()?;
    let reply = state
        .handler
        .create(&ctx, CreateRequest { api: body.api, todo })
        .await?;

    Ok(Json(reply.into()))
}

/// Get a todo by ID
#[utoipa::path(
    get,
    path = "/v1/todo/{id}",
    tag = "todo",
    params(
        ("id" = i64, Path, description = "Todo ID"),
        ApiQuery
    ),
    responses(
        (status = 200, description = "Todo found", body = ReadReply),
        (status = 400, description = "Invalid ID or unsupported API version", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn read_todo<S: Store + 'static>(
    State(state): State<GatewayState<S>>,
    CorrelationId(request_id): CorrelationId,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<ApiQuery>, QueryRejection>,
) -> Result<Json<ReadReply>, AppError> {
    let Path(id) = path?;
    let api = api_of(query)?;
    let ctx = state.context(request_id);
    let _cancel_on_drop = ctx.cancel_on_drop();

    let reply = state.handler.read(&ctx, ReadRequest { api, id }).await?;

    Ok(Json(ReadReply::try_from(reply)?))
}

/// Replace a todo
///
/// Served on both PUT and PATCH. The path ID wins over `todo.id` in the body.
#[utoipa::path(
    put,
    path = "/v1/todo/{id}",
    tag = "todo",
    params(
        ("id" = i64, Path, description = "Todo ID")
    ),
    request_body = TodoBody,
    responses(
        (status = 200, description = "Todo updated", body = UpdateReply),
        (status = 400, description = "Invalid request or unsupported API version", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_todo<S: Store + 'static>(
    State(state): State<GatewayState<S>>,
    CorrelationId(request_id): CorrelationId,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<TodoBody>, JsonRejection>,
) -> Result<Json<UpdateReply>, AppError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let ctx = state.context(request_id);
    let _cancel_on_drop = ctx.cancel_on_drop();

    let mut todo = body.todo.map(Todo::try_from).transpose()?;
    if let Some(todo) = todo.as_mut() {
        todo.id = id;
    }
    let reply = state
        .handler
        .update(&ctx, UpdateRequest { api: body.api, todo })
        .await?;

    Ok(Json(reply.into()))
}

/// Delete a todo
#[utoipa::path(
    delete,
    path = "/v1/todo/{id}",
    tag = "todo",
    params(
        ("id" = i64, Path, description = "Todo ID"),
        ApiQuery
    ),
    responses(
        (status = 200, description = "Todo deleted", body = DeleteReply),
        (status = 400, description = "Invalid ID or unsupported API version", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_todo<S: Store + 'static>(
    State(state): State<GatewayState<S>>,
    CorrelationId(request_id): CorrelationId,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<ApiQuery>, QueryRejection>,
) -> Result<Json<DeleteReply>, AppError> {
    let Path(id) = path?;
    let api = api_of(query)?;
    let ctx = state.context(request_id);
    let _cancel_on_drop = ctx.cancel_on_drop();

    let reply = state.handler.delete(&ctx, DeleteRequest { api, id }).await?;

    Ok(Json(reply.into()))
}

/// List all todos
#[utoipa::path(
    get,
    path = "/v1/todo/all",
    tag = "todo",
    params(ApiQuery),
    responses(
        (status = 200, description = "All todos, possibly none", body = ReadAllReply),
        (status = 400, description = "Unsupported API version", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn read_all_todos<S: Store + 'static>(
    State(state): State<GatewayState<S>>,
    CorrelationId(request_id): CorrelationId,
    query: Result<Query<ApiQuery>, QueryRejection>,
) -> Result<Json<ReadAllReply>, AppError> {
    let api = api_of(query)?;
    let ctx = state.context(request_id);
    let _cancel_on_drop = ctx.cancel_on_drop();

    let reply = state.handler.read_all(&ctx, ReadAllRequest { api }).await?;

    Ok(Json(ReadAllReply::try_from(reply)?))
}
