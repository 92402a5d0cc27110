//! Tableside Backend Library
//!
//! Exposes core modules for use by the server binary and integration tests.

pub mod auth;
pub mod middleware;
pub mod models;
pub mod routes;
