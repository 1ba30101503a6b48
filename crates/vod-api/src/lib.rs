//! HTTP glue for the VOD processor.
//!
//! Accepts uploads into the incoming directory, lists and deletes
//! processed artifacts, reports host stats, and serves processed files
//! statically. It never runs a pipeline stage synchronously; the worker
//! picks uploads up from the filesystem.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
