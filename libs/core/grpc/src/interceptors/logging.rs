use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use http::{HeaderMap, Request, Response};
use tonic::Code;
use tower::{Layer, Service};
use tracing::{debug, error};

use super::request_id::REQUEST_ID_HEADER;

/// Layer emitting exactly one structured record per gRPC call.
///
/// The record carries the full method path, the correlation id, the final
/// status code and the latency. `OK` is logged at DEBUG, every other code at
/// ERROR. Calls dropped before completion (caller went away, forced shutdown)
/// are reported as `CANCELLED`.
///
/// # Example
/// ```ignore
/// Server::builder()
///     .layer(GrpcLoggingLayer::new())
///     .add_service(TodoServiceServer::new(service))
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct GrpcLoggingLayer;

impl GrpcLoggingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for GrpcLoggingLayer {
    type Service = GrpcLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GrpcLogging { inner }
    }
}

/// Service produced by [`GrpcLoggingLayer`].
#[derive(Clone, Debug)]
pub struct GrpcLogging<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for GrpcLogging<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let mut record = CallRecord::start(&request);
        let future = self.inner.call(request);

        Box::pin(async move {
            let result = future.await;
            match &result {
                Ok(response) => {
                    let (code, message) = status_from_headers(response.headers());
                    record.finish(code, message.as_deref());
                }
                Err(_) => record.finish(Code::Unknown, Some("transport error")),
            }
            result
        })
    }
}

/// Reads the status of a trailers-only response. Successful unary calls send
/// their status in trailers, so an absent header means `OK`.
fn status_from_headers(headers: &HeaderMap) -> (Code, Option<String>) {
    let code = headers
        .get(tonic::Status::GRPC_STATUS)
        .map(|value| Code::from_bytes(value.as_bytes()))
        .unwrap_or(Code::Ok);
    let message = headers
        .get("grpc-message")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    (code, message)
}

struct CallRecord {
    method: String,
    request_id: Option<String>,
    started: Instant,
    finished: bool,
}

impl CallRecord {
    fn start<B>(request: &Request<B>) -> Self {
        Self {
            method: request.uri().path().to_owned(),
            request_id: request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            started: Instant::now(),
            finished: false,
        }
    }

    fn finish(&mut self, code: Code, message: Option<&str>) {
        self.finished = true;
        let latency_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let request_id = self.request_id.as_deref().unwrap_or("-");

        if code == Code::Ok {
            debug!(
                grpc.method = %self.method,
                grpc.code = ?code,
                request_id,
                latency_ms,
                "finished unary call"
            );
        } else {
            error!(
                grpc.method = %self.method,
                grpc.code = ?code,
                grpc.message = message.unwrap_or_default(),
                request_id,
                latency_ms,
                "finished unary call"
            );
        }
    }
}

impl Drop for CallRecord {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(Code::Cancelled, Some("call dropped before completion"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn response_with_status(code: Option<Code>) -> Response<()> {
        let mut response = Response::new(());
        if let Some(code) = code {
            response
                .headers_mut()
                .insert(tonic::Status::GRPC_STATUS, (code as i32).into());
            response
                .headers_mut()
                .insert("grpc-message", "nope".parse().unwrap());
        }
        response
    }

    #[test]
    fn test_status_absent_means_ok() {
        let response = response_with_status(None);
        let (code, message) = status_from_headers(response.headers());
        assert_eq!(code, Code::Ok);
        assert!(message.is_none());
    }

    #[test]
    fn test_status_from_trailers_only_response() {
        let response = response_with_status(Some(Code::NotFound));
        let (code, message) = status_from_headers(response.headers());
        assert_eq!(code, Code::NotFound);
        assert_eq!(message.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn test_layer_passes_response_through() {
        let inner = tower::service_fn(|_request: Request<()>| async {
            Ok::<_, Infallible>(response_with_status(Some(Code::InvalidArgument)))
        });
        let service = GrpcLoggingLayer::new().layer(inner);
        let response = service
            .oneshot(request("/todo.v1.TodoService/Read"))
            .await
            .unwrap();

        let (code, _) = status_from_headers(response.headers());
        assert_eq!(code, Code::InvalidArgument);
    }

    fn request(path: &str) -> Request<()> {
        Request::builder()
            .uri(path)
            .header(REQUEST_ID_HEADER, "req-1")
            .body(())
            .unwrap()
    }

    fn single_call_record(lines: &[&str]) -> Result<String, String> {
        let records: Vec<&&str> = lines
            .iter()
            .filter(|line| line.contains("finished unary call"))
            .collect();
        match records.as_slice() {
            [record] => Ok(record.to_string()),
            other => Err(format!("expected one call record, got {other:?}")),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_ok_call_logs_one_debug_record() {
        let inner = tower::service_fn(|_request: Request<()>| async {
            Ok::<_, Infallible>(response_with_status(None))
        });
        GrpcLoggingLayer::new()
            .layer(inner)
            .oneshot(request("/todo.v1.TodoService/ReadAll"))
            .await
            .unwrap();

        logs_assert(|lines: &[&str]| {
            let record = single_call_record(lines)?;
            if record.contains("DEBUG")
                && record.contains("grpc.code=Ok")
                && record.contains("/todo.v1.TodoService/ReadAll")
                && record.contains("req-1")
            {
                Ok(())
            } else {
                Err(format!("unexpected record: {record}"))
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_call_logs_one_error_record() {
        let inner = tower::service_fn(|_request: Request<()>| async {
            Ok::<_, Infallible>(response_with_status(Some(Code::NotFound)))
        });
        GrpcLoggingLayer::new()
            .layer(inner)
            .oneshot(request("/todo.v1.TodoService/Read"))
            .await
            .unwrap();

        logs_assert(|lines: &[&str]| {
            let record = single_call_record(lines)?;
            if record.contains("ERROR") && record.contains("grpc.code=NotFound") {
                Ok(())
            } else {
                Err(format!("unexpected record: {record}"))
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dropped_call_logs_one_cancelled_record() {
        let inner = tower::service_fn(|_request: Request<()>| {
            std::future::pending::<Result<Response<()>, Infallible>>()
        });
        let mut service = GrpcLoggingLayer::new().layer(inner);

        let call = service
            .ready()
            .await
            .unwrap()
            .call(request("/todo.v1.TodoService/Read"));
        drop(call);

        logs_assert(|lines: &[&str]| {
            let record = single_call_record(lines)?;
            if record.contains("ERROR") && record.contains("grpc.code=Cancelled") {
                Ok(())
            } else {
                Err(format!("unexpected record: {record}"))
            }
        });
    }

    #[test]
    fn test_dropped_call_is_marked_finished() {
        let request = Request::builder().uri("/svc/Method").body(()).unwrap();
        let mut record = CallRecord::start(&request);
        assert_eq!(record.method, "/svc/Method");
        assert!(record.request_id.is_none());
        record.finish(Code::Ok, None);
        assert!(record.finished);
    }
}
