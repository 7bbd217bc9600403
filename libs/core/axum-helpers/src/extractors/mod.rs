use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::middleware::REQUEST_ID_HEADER;

/// Correlation id of the current request.
///
/// Populated from `x-request-id`, which the request-id layers installed by
/// [`crate::server::create_router`] guarantee to be present. `None` only when
/// a handler is exercised without those layers (unit tests).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorrelationId(pub Option<String>);

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        ))
    }
}
