//! JSON shapes served by the HTTP gateway.
//!
//! They mirror the `todo.v1` messages field for field; the reminder travels
//! as an RFC 3339 string instead of a `google.protobuf.Timestamp`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TodoJson {
    /// Assigned by the store; ignored on create
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    #[schema(example = "Buy milk")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "2%")]
    pub description: String,
    /// RFC 3339 timestamp, stored with microsecond precision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "2025-01-01T09:00:00Z")]
    pub reminder: Option<String>,
}

/// Body of create and update calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TodoBody {
    /// Requested API version; empty means the server's version
    #[serde(default)]
    #[schema(example = "v1")]
    pub api: String,
    #[serde(default)]
    pub todo: Option<TodoJson>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApiQuery {
    /// Requested API version; empty means the server's version
    #[serde(default)]
    pub api: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateReply {
    pub api: String,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReadReply {
    pub api: String,
    pub todo: TodoJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateReply {
    pub api: String,
    /// Rows affected
    pub updated: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteReply {
    pub api: String,
    /// Rows deleted
    pub deleted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReadAllReply {
    pub api: String,
    pub todos: Vec<TodoJson>,
}
