use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{ErrorCode, ErrorReport, ErrorResponse};

fn error_response(status: StatusCode, code: ErrorCode) -> Response {
    let message = code.default_message().to_string();
    let mut response = (status, Json(ErrorResponse::new(code, message.clone()))).into_response();
    response
        .extensions_mut()
        .insert(ErrorReport { code, message });
    response
}

/// Handler for 404 Not Found errors.
///
/// This can be used as a fallback handler in your router.
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound)
}

/// Handler for 405 Method Not Allowed errors.
pub async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, ErrorCode::MethodNotAllowed)
}
