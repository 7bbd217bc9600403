//! Conversions between store rows, `todo.v1` messages and gateway JSON.
//!
//! Input-side failures are [`TodoError::InvalidArgument`]; output-side ones
//! are [`TodoError::Internal`] because the value was already accepted once.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use grpc_helpers::{datetime_to_timestamp, timestamp_to_datetime};
use prost_types::Timestamp;
use rpc::todo::v1::{
    CreateResponse, DeleteResponse, ReadAllResponse, ReadResponse, Todo, UpdateResponse,
};

use crate::error::{TodoError, TodoResult};
use crate::models::{CreateReply, DeleteReply, ReadAllReply, ReadReply, TodoJson, UpdateReply};
use crate::store::TodoRow;

/// Wire reminder to the value handed to the store, truncated to microseconds.
pub fn reminder_from_wire(reminder: Option<&Timestamp>) -> TodoResult<DateTime<Utc>> {
    let reminder =
        reminder.ok_or_else(|| TodoError::InvalidArgument("reminder is required".to_string()))?;
    timestamp_to_datetime(reminder)
        .map(|dt| dt.trunc_subsecs(6))
        .map_err(|e| TodoError::InvalidArgument(format!("reminder field has invalid format: {e}")))
}

pub fn row_to_todo(row: TodoRow) -> TodoResult<Todo> {
    if row.id <= 0 {
        return Err(TodoError::Internal(format!(
            "store returned invalid identifier {}",
            row.id
        )));
    }
    Ok(Todo {
        id: row.id,
        title: row.title,
        description: row.description,
        reminder: Some(datetime_to_timestamp(row.reminder)),
    })
}

fn parse_rfc3339(value: &str) -> TodoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            TodoError::InvalidArgument(format!("reminder field has invalid format: {e}"))
        })
}

impl TryFrom<TodoJson> for Todo {
    type Error = TodoError;

    fn try_from(json: TodoJson) -> TodoResult<Self> {
        let reminder = json
            .reminder
            .as_deref()
            .map(parse_rfc3339)
            .transpose()?
            .map(datetime_to_timestamp);

        Ok(Todo {
            id: json.id,
            title: json.title,
            description: json.description,
            reminder,
        })
    }
}

impl TryFrom<Todo> for TodoJson {
    type Error = TodoError;

    fn try_from(todo: Todo) -> TodoResult<Self> {
        let reminder = todo
            .reminder
            .as_ref()
            .ok_or_else(|| TodoError::Internal(format!("todo {} has no reminder", todo.id)))
            .and_then(|ts| {
                timestamp_to_datetime(ts)
                    .map_err(|e| TodoError::Internal(format!("todo {} reminder: {e}", todo.id)))
            })?;

        Ok(TodoJson {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            reminder: Some(reminder.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        })
    }
}

impl From<CreateResponse> for CreateReply {
    fn from(response: CreateResponse) -> Self {
        Self {
            api: response.api,
            id: response.id,
        }
    }
}

impl TryFrom<ReadResponse> for ReadReply {
    type Error = TodoError;

    fn try_from(response: ReadResponse) -> TodoResult<Self> {
        let todo = response
            .todo
            .ok_or_else(|| TodoError::Internal("read reply without todo".to_string()))?;
        Ok(Self {
            api: response.api,
            todo: todo.try_into()?,
        })
    }
}

impl From<UpdateResponse> for UpdateReply {
    fn from(response: UpdateResponse) -> Self {
        Self {
            api: response.api,
            updated: response.updated,
        }
    }
}

impl From<DeleteResponse> for DeleteReply {
    fn from(response: DeleteResponse) -> Self {
        Self {
            api: response.api,
            deleted: response.deleted,
        }
    }
}

impl TryFrom<ReadAllResponse> for ReadAllReply {
    type Error = TodoError;

    fn try_from(response: ReadAllResponse) -> TodoResult<Self> {
        Ok(Self {
            api: response.api,
            todos: response
                .todos
                .into_iter()
                .map(TodoJson::try_from)
                .collect::<TodoResult<_>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reminder_is_truncated_to_micros() {
        let ts = Timestamp {
            seconds: 1_735_722_000,
            nanos: 123_456_789,
        };
        let reminder = reminder_from_wire(Some(&ts)).unwrap();
        assert_eq!(reminder.timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn test_missing_or_bad_reminder_is_invalid_argument() {
        assert!(matches!(
            reminder_from_wire(None),
            Err(TodoError::InvalidArgument(_))
        ));

        let bad = Timestamp {
            seconds: 0,
            nanos: -1,
        };
        assert!(matches!(
            reminder_from_wire(Some(&bad)),
            Err(TodoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_json_reminder_parsing() {
        let todo = Todo::try_from(TodoJson {
            title: "Buy milk".into(),
            reminder: Some("2025-01-01T10:00:00+01:00".into()),
            ..Default::default()
        })
        .unwrap();
        let reminder = timestamp_to_datetime(&todo.reminder.unwrap()).unwrap();
        assert_eq!(reminder, Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());

        let err = Todo::try_from(TodoJson {
            reminder: Some("tomorrow".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, TodoError::InvalidArgument(_)));
    }

    #[test]
    fn test_todo_to_json_uses_utc() {
        let json = TodoJson::try_from(Todo {
            id: 1,
            title: "Buy milk".into(),
            description: "2%".into(),
            reminder: Some(datetime_to_timestamp(
                Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            )),
        })
        .unwrap();
        assert_eq!(json.reminder.as_deref(), Some("2025-01-01T09:00:00Z"));
    }

    #[test]
    fn test_row_with_bad_id_is_internal() {
        let row = TodoRow {
            id: 0,
            title: String::new(),
            description: String::new(),
            reminder: Utc::now(),
        };
        assert!(matches!(row_to_todo(row), Err(TodoError::Internal(_))));
    }
}
