//! Generated gRPC contracts.
//!
//! Sources live in `proto/`; regenerate with `buf generate` and commit the
//! output under `src/generated/`.

mod generated;

pub use generated::todo;
