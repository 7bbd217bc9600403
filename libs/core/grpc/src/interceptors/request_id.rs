use tonic::metadata::MetadataMap;

/// Correlation header shared by the gRPC and HTTP surfaces.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Read the correlation id attached to an inbound call, if any.
///
/// The id is assigned (or propagated) by a request-id layer in front of the
/// tonic router, so by the time a handler runs it is normally present.
pub fn request_id(metadata: &MetadataMap) -> Option<String> {
    metadata
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
