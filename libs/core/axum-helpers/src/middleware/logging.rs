use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, error};

use super::request_id::REQUEST_ID_HEADER;
use crate::errors::ErrorReport;

/// Emit one structured record per HTTP request.
///
/// Responses below 400 are logged at DEBUG, everything else at ERROR with the
/// error code and message taken from the [`ErrorReport`] the error response
/// carries. Mirrors the per-call record written on the gRPC side so a call can
/// be followed by `request_id` whichever surface it came through.
///
/// # Example
/// ```ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn(log_requests));
/// ```
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    if status < 400 {
        debug!(
            http.method = %method,
            http.path = %path,
            http.status = status,
            request_id = %request_id,
            latency_ms,
            "finished request"
        );
    } else {
        let report = response.extensions().get::<ErrorReport>();
        error!(
            http.method = %method,
            http.path = %path,
            http.status = status,
            request_id = %request_id,
            error.code = report.map(|r| r.code.as_str()).unwrap_or("-"),
            error.message = report.map(|r| r.message.as_str()).unwrap_or("-"),
            latency_ms,
            "finished request"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/missing",
                get(|| async { AppError::NotFound("nothing here".into()) }),
            )
            .layer(axum::middleware::from_fn(log_requests))
    }

    #[tokio::test]
    async fn test_passes_responses_through() {
        let ok = app()
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let missing = app()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(missing.extensions().get::<ErrorReport>().is_some());
    }

    fn get_request(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header(REQUEST_ID_HEADER, "req-7")
            .body(Body::empty())
            .unwrap()
    }

    fn single_request_record(lines: &[&str]) -> Result<String, String> {
        let records: Vec<&&str> = lines
            .iter()
            .filter(|line| line.contains("finished request"))
            .collect();
        match records.as_slice() {
            [record] => Ok(record.to_string()),
            other => Err(format!("expected one request record, got {other:?}")),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_success_logs_one_debug_record() {
        app().oneshot(get_request("/ok")).await.unwrap();

        logs_assert(|lines: &[&str]| {
            let record = single_request_record(lines)?;
            if record.contains("DEBUG")
                && record.contains("http.status=200")
                && record.contains("/ok")
                && record.contains("req-7")
            {
                Ok(())
            } else {
                Err(format!("unexpected record: {record}"))
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_client_error_logs_one_error_record() {
        app().oneshot(get_request("/missing")).await.unwrap();

        logs_assert(|lines: &[&str]| {
            let record = single_request_record(lines)?;
            if record.contains("ERROR")
                && record.contains("http.status=404")
                && record.contains("NOT_FOUND")
            {
                Ok(())
            } else {
                Err(format!("unexpected record: {record}"))
            }
        });
    }
}
