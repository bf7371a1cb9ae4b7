//! Web server module for the song queue service.
//!
//! This module contains the Axum router that exposes the session layer
//! over HTTP.

pub mod routes;

// Re-export main server functionality
pub use routes::*;
