use crate::errors::handlers::{method_not_allowed, not_found};
use crate::middleware::{
    REQUEST_ID_HEADER, log_requests, propagate_request_id_layer, set_request_id_layer,
};
use axum::{Json, Router, body::Body, http::Request, middleware, routing::get};
use std::future::Future;
use std::io;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

/// Serve `router` on an already-bound listener until `shutdown` resolves.
///
/// Binding is left to the caller so that several listeners can be bound up
/// front and a failure on any of them aborts startup before anything serves.
/// After `shutdown` resolves the listener stops accepting and the future
/// completes once in-flight requests are done.
///
/// # Errors
/// Returns an error if the listener address cannot be read or the server
/// fails while running.
pub async fn create_app<F>(listener: TcpListener, router: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        })
}

/// Creates a configured Axum router with common middleware and documentation.
///
/// This function sets up:
/// - `GET /swagger.json`: the OpenAPI document for `T`
/// - `GET /docs`: ReDoc page rendering the same document
/// - 404 / 405 fallbacks with the standard error body
/// - `x-request-id` assignment and propagation
/// - a tracing span per request carrying the request id
/// - one log record per request ([`log_requests`])
///
/// # Example
/// ```ignore
/// #[derive(OpenApi)]
/// #[openapi(paths(/* your paths */))]
/// struct ApiDoc;
///
/// let api_routes = Router::new()
///     .route("/v1/example", get(handler))
///     .with_state(my_state);
///
/// let router = create_router::<ApiDoc>(api_routes);
/// ```
pub fn create_router<T>(apis: Router) -> Router
where
    T: OpenApi + 'static,
{
    let openapi = T::openapi();
    let document = openapi.clone();

    Router::new()
        .route(
            "/swagger.json",
            get(move || {
                let document = document.clone();
                async move { Json(document) }
            }),
        )
        .merge(Redoc::with_url("/docs", openapi))
        .merge(apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn(log_requests))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(())
                .on_response(())
                .on_failure(()),
        )
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}
