use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use tonic::Status;

use crate::store::StoreError;

/// Every failure a todo operation can surface, whichever listener it came in on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TodoError {
    #[error("unsupported API version: service implements '{supported}', but asked for '{requested}'")]
    VersionMismatch {
        requested: String,
        supported: &'static str,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("ToDo with ID='{0}' is not found")]
    NotFound(i64),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type TodoResult<T> = Result<T, TodoError>;

impl From<StoreError> for TodoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => TodoError::Unavailable(msg),
            StoreError::Cancelled => TodoError::Unavailable("operation cancelled".to_string()),
            StoreError::Query(msg) => TodoError::Internal(format!("query failed: {msg}")),
            StoreError::Decode(msg) => TodoError::Internal(format!("cannot decode row: {msg}")),
        }
    }
}

impl From<TodoError> for Status {
    fn from(err: TodoError) -> Self {
        let message = err.to_string();
        match err {
            TodoError::VersionMismatch { .. } => Status::unimplemented(message),
            TodoError::InvalidArgument(_) => Status::invalid_argument(message),
            TodoError::NotFound(_) => Status::not_found(message),
            TodoError::Unavailable(_) => Status::unavailable(message),
            TodoError::Internal(_) => Status::internal(message),
        }
    }
}

/// Convert TodoError to AppError for standardized error responses
impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        let message = err.to_string();
        match err {
            TodoError::VersionMismatch { .. } => AppError::UnsupportedVersion(message),
            TodoError::InvalidArgument(_) => AppError::BadRequest(message),
            TodoError::NotFound(_) => AppError::NotFound(message),
            TodoError::Unavailable(_) => AppError::ServiceUnavailable(message),
            TodoError::Internal(_) => AppError::InternalServerError(message),
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tonic::Code;

    fn all() -> Vec<TodoError> {
        vec![
            TodoError::VersionMismatch {
                requested: "v2".into(),
                supported: "v1",
            },
            TodoError::InvalidArgument("reminder".into()),
            TodoError::NotFound(999),
            TodoError::Unavailable("pool".into()),
            TodoError::Internal("boom".into()),
        ]
    }

    #[test]
    fn test_grpc_codes() {
        let codes: Vec<Code> = all().into_iter().map(|e| Status::from(e).code()).collect();
        assert_eq!(
            codes,
            vec![
                Code::Unimplemented,
                Code::InvalidArgument,
                Code::NotFound,
                Code::Unavailable,
                Code::Internal,
            ]
        );
    }

    #[test]
    fn test_http_statuses() {
        let statuses: Vec<StatusCode> = all()
            .into_iter()
            .map(|e| e.into_response().status())
            .collect();
        assert_eq!(
            statuses,
            vec![
                StatusCode::BAD_REQUEST,
                StatusCode::BAD_REQUEST,
                StatusCode::NOT_FOUND,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::INTERNAL_SERVER_ERROR,
            ]
        );
    }

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        assert!(matches!(
            TodoError::from(StoreError::Cancelled),
            TodoError::Unavailable(_)
        ));
        assert!(matches!(
            TodoError::from(StoreError::Decode("reminder".into())),
            TodoError::Internal(_)
        ));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            TodoError::NotFound(7).to_string(),
            "ToDo with ID='7' is not found"
        );
    }
}
