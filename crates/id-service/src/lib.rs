//! Identity Controller service library.
//!
//! Owns the account registry and the token lifecycle: registration with
//! proof-of-control verification, login, refresh, logout and password
//! changes. Tokens are minted and checked through the shared contract in
//! the `common` crate, so the edge gateway and this service can never
//! disagree on what a token means.

#![warn(clippy::pedantic)]

/// Service configuration loaded from the environment.
pub mod config;

/// Password hashing and verification.
pub mod crypto;

/// Service error types and their HTTP mappings.
pub mod errors;

/// HTTP request handlers.
pub mod handlers;

/// Request middleware (authentication, metrics).
pub mod middleware;

/// Account and wire data models.
pub mod models;

/// Observability utilities (metrics, correlation hashing).
pub mod observability;

/// Account and audit storage capabilities.
pub mod repositories;

/// Route table construction.
pub mod routes;

/// Business logic for authentication operations.
pub mod services;
