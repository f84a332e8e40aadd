//! RiderCritic Core - authentication and profile backend
//!
//! REST API over an external identity provider (Firebase Authentication):
//! registration, password login, bearer-token gates, self-service profiles
//! and administrator account operations.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
