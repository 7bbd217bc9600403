use rpc::todo::v1::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ReadAllRequest,
    ReadAllResponse, ReadRequest, ReadResponse, Todo, UpdateRequest, UpdateResponse,
};
use tracing::instrument;

use crate::context::CallContext;
use crate::conversions::{reminder_from_wire, row_to_todo};
use crate::error::{TodoError, TodoResult};
use crate::store::{Statement, Store};

/// The only contract version this server implements.
pub const API_VERSION: &str = "v1";

/// Business rules for the five todo operations.
///
/// Each call checks the requested API version before touching the store,
/// takes one connection, runs exactly one statement and maps store failures
/// onto [`TodoError`]. Holds nothing but the store, so one instance is shared
/// by every listener.
pub struct TodoHandler<S: Store> {
    store: S,
}

impl<S: Store> TodoHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reject a non-empty version tag other than [`API_VERSION`].
    pub fn check_api(api: &str) -> TodoResult<()> {
        if api.is_empty() || api == API_VERSION {
            Ok(())
        } else {
            Err(TodoError::VersionMismatch {
                requested: api.to_string(),
                supported: API_VERSION,
            })
        }
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id()))]
    pub async fn create(&self, ctx: &CallContext, request: CreateRequest) -> TodoResult<CreateResponse> {
        Self::check_api(&request.api)?;
        let todo = require_todo(request.todo)?;
        let reminder = reminder_from_wire(todo.reminder.as_ref())?;
        require_title(&todo.title)?;

        let mut conn = self.store.connect(ctx).await?;
        let outcome = conn
            .execute(
                ctx,
                Statement::Insert {
                    title: todo.title,
                    description: todo.description,
                    reminder,
                },
            )
            .await?;

        let id = outcome
            .last_insert_id
            .ok_or_else(|| TodoError::Internal("store did not return the new identifier".to_string()))?;

        Ok(CreateResponse {
            api: API_VERSION.to_string(),
            id,
        })
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id(), todo_id = request.id))]
    pub async fn read(&self, ctx: &CallContext, request: ReadRequest) -> TodoResult<ReadResponse> {
        Self::check_api(&request.api)?;

        let mut conn = self.store.connect(ctx).await?;
        let mut rows = conn
            .query(ctx, Statement::SelectById { id: request.id })
            .await?;

        let row = match rows.len() {
            0 => return Err(TodoError::NotFound(request.id)),
            1 => rows.remove(0),
            n => {
                return Err(TodoError::Internal(format!(
                    "found {n} rows with ID='{}'",
                    request.id
                )));
            }
        };

        Ok(ReadResponse {
            api: API_VERSION.to_string(),
            todo: Some(row_to_todo(row)?),
        })
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id()))]
    pub async fn update(&self, ctx: &CallContext, request: UpdateRequest) -> TodoResult<UpdateResponse> {
        Self::check_api(&request.api)?;
        let todo = require_todo(request.todo)?;
        let reminder = reminder_from_wire(todo.reminder.as_ref())?;
        require_title(&todo.title)?;

        let mut conn = self.store.connect(ctx).await?;
        let outcome = conn
            .execute(
                ctx,
                Statement::Update {
                    id: todo.id,
                    title: todo.title,
                    description: todo.description,
                    reminder,
                },
            )
            .await?;

        if outcome.rows_affected == 0 {
            return Err(TodoError::NotFound(todo.id));
        }

        Ok(UpdateResponse {
            api: API_VERSION.to_string(),
            updated: rows_to_i64(outcome.rows_affected),
        })
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id(), todo_id = request.id))]
    pub async fn delete(&self, ctx: &CallContext, request: DeleteRequest) -> TodoResult<DeleteResponse> {
        Self::check_api(&request.api)?;

        let mut conn = self.store.connect(ctx).await?;
        let outcome = conn
            .execute(ctx, Statement::Delete { id: request.id })
            .await?;

        if outcome.rows_affected == 0 {
            return Err(TodoError::NotFound(request.id));
        }

        Ok(DeleteResponse {
            api: API_VERSION.to_string(),
            deleted: rows_to_i64(outcome.rows_affected),
        })
    }

    #[instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id()))]
    pub async fn read_all(&self, ctx: &CallContext, request: ReadAllRequest) -> TodoResult<ReadAllResponse> {
        Self::check_api(&request.api)?;

        let mut conn = self.store.connect(ctx).await?;
        let rows = conn.query(ctx, Statement::SelectAll).await?;

        Ok(ReadAllResponse {
            api: API_VERSION.to_string(),
            todos: rows
                .into_iter()
                .map(row_to_todo)
                .collect::<TodoResult<_>>()?,
        })
    }
}

fn require_todo(todo: Option<Todo>) -> TodoResult<Todo> {
    todo.ok_or_else(|| TodoError::InvalidArgument("todo is required".to_string()))
}

fn require_title(title: &str) -> TodoResult<()> {
    if title.trim().is_empty() {
        return Err(TodoError::InvalidArgument("title is required".to_string()));
    }
    Ok(())
}

fn rows_to_i64(rows: u64) -> i64 {
    i64::try_from(rows).unwrap_or(i64::MAX)
}
