//! Middleware for observability.
//!
//! Request logging with method, path, status, and latency.

pub mod logging;

pub use logging::request_logging;
