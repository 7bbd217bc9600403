//! Tower layers applied to the tonic server.

pub mod logging;
pub mod request_id;

pub use logging::{GrpcLogging, GrpcLoggingLayer};
pub use request_id::{REQUEST_ID_HEADER, request_id};
