//! HTTP middleware shared by routers built with [`crate::server::create_router`].

pub mod logging;
pub mod request_id;

pub use logging::log_requests;
pub use request_id::{REQUEST_ID_HEADER, propagate_request_id_layer, set_request_id_layer};
