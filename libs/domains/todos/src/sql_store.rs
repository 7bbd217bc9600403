//! [`Store`] over a SeaORM connection pool.
//!
//! Each call runs inside its own transaction, which holds one pooled
//! connection from `connect` until the statement commits or the handle is
//! dropped (rolled back). Every await races the call's cancellation token.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait, Order, Query};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, DeriveIden,
    FromQueryResult, Statement as SqlStatement, TransactionTrait,
};
use tracing::debug;

use crate::context::CallContext;
use crate::store::{
    ExecOutcome, Statement, Store, StoreConnection, StoreError, StoreResult, TodoRow,
};

#[derive(DeriveIden)]
enum TodoTable {
    #[sea_orm(iden = "todo")]
    Table,
    Id,
    Title,
    Description,
    Reminder,
}

#[derive(Debug, FromQueryResult)]
struct TodoRecord {
    id: i64,
    title: String,
    description: String,
    reminder: DateTime<Utc>,
}

impl From<TodoRecord> for TodoRow {
    fn from(record: TodoRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            reminder: record.reminder,
        }
    }
}

#[derive(Clone)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Close the pool once no call can reach the store any more.
    pub async fn close(self) -> Result<(), DbErr> {
        self.db.close().await
    }
}

#[async_trait]
impl Store for SqlStore {
    async fn connect(&self, ctx: &CallContext) -> StoreResult<Box<dyn StoreConnection>> {
        let txn = ctx
            .cancel
            .run_until_cancelled(self.db.begin())
            .await
            .ok_or(StoreError::Cancelled)?
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Box::new(SqlConnection { txn: Some(txn) }))
    }
}

struct SqlConnection {
    txn: Option<DatabaseTransaction>,
}

impl SqlConnection {
    fn take(&mut self) -> StoreResult<DatabaseTransaction> {
        self.txn
            .take()
            .ok_or_else(|| StoreError::Query("connection already used".to_string()))
    }
}

#[async_trait]
impl StoreConnection for SqlConnection {
    async fn execute(&mut self, ctx: &CallContext, statement: Statement) -> StoreResult<ExecOutcome> {
        let txn = self.take()?;
        let backend = txn.get_database_backend();
        let returns_id = matches!(statement, Statement::Insert { .. });
        let sql = render(backend, statement)?;
        debug!(request_id = %ctx.request_id(), sql = %sql, "execute");

        guarded(ctx, async move {
            let outcome = if returns_id {
                let row = txn
                    .query_one_raw(sql)
                    .await?
                    .ok_or(DbErr::RecordNotInserted)?;
                ExecOutcome {
                    rows_affected: 1,
                    last_insert_id: Some(row.try_get::<i64>("", "id")?),
                }
            } else {
                let result = txn.execute_raw(sql).await?;
                ExecOutcome {
                    rows_affected: result.rows_affected(),
                    last_insert_id: None,
                }
            };
            txn.commit().await?;
            Ok(outcome)
        })
        .await
    }

    async fn query(&mut self, ctx: &CallContext, statement: Statement) -> StoreResult<Vec<TodoRow>> {
        if !matches!(statement, Statement::SelectById { .. } | Statement::SelectAll) {
            return Err(StoreError::Query(format!(
                "{statement:?} does not return rows"
            )));
        }

        let txn = self.take()?;
        let sql = render(txn.get_database_backend(), statement)?;
        debug!(request_id = %ctx.request_id(), sql = %sql, "query");

        guarded(ctx, async move {
            let records = TodoRecord::find_by_statement(sql).all(&txn).await?;
            txn.commit().await?;
            Ok(records.into_iter().map(TodoRow::from).collect())
        })
        .await
    }
}

/// Run `op` unless the call is cancelled first; dropping `op` rolls back.
async fn guarded<T>(
    ctx: &CallContext,
    op: impl Future<Output = Result<T, DbErr>>,
) -> StoreResult<T> {
    ctx.cancel
        .run_until_cancelled(op)
        .await
        .ok_or(StoreError::Cancelled)?
        .map_err(store_error)
}

fn store_error(err: DbErr) -> StoreError {
    match err {
        DbErr::ConnectionAcquire(e) => StoreError::Unavailable(e.to_string()),
        DbErr::Conn(e) => StoreError::Unavailable(e.to_string()),
        DbErr::Type(msg) => StoreError::Decode(msg),
        err @ DbErr::TryIntoErr { .. } => StoreError::Decode(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

fn render(backend: DbBackend, statement: Statement) -> StoreResult<SqlStatement> {
    let columns = [
        TodoTable::Id,
        TodoTable::Title,
        TodoTable::Description,
        TodoTable::Reminder,
    ];

    let sql = match statement {
        Statement::Insert {
            title,
            description,
            reminder,
        } => {
            let mut insert = Query::insert();
            insert
                .into_table(TodoTable::Table)
                .columns([TodoTable::Title, TodoTable::Description, TodoTable::Reminder])
                .values([title.into(), description.into(), reminder.into()])
                .map_err(|e| StoreError::Query(e.to_string()))?;
            insert.returning_col(TodoTable::Id);
            backend.build(&insert)
        }
        Statement::SelectById { id } => backend.build(
            Query::select()
                .columns(columns)
                .from(TodoTable::Table)
                .and_where(Expr::col(TodoTable::Id).eq(id)),
        ),
        Statement::SelectAll => backend.build(
            Query::select()
                .columns(columns)
                .from(TodoTable::Table)
                .order_by(TodoTable::Id, Order::Asc),
        ),
        Statement::Update {
            id,
            title,
            description,
            reminder,
        } => backend.build(
            Query::update()
                .table(TodoTable::Table)
                .values([
                    (TodoTable::Title, title.into()),
                    (TodoTable::Description, description.into()),
                    (TodoTable::Reminder, reminder.into()),
                ])
                .and_where(Expr::col(TodoTable::Id).eq(id)),
        ),
        Statement::Delete { id } => backend.build(
            Query::delete()
                .from_table(TodoTable::Table)
                .and_where(Expr::col(TodoTable::Id).eq(id)),
        ),
    };

    Ok(sql)
}
