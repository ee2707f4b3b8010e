//! Edge Gateway Service Library
//!
//! This library provides the core functionality for the Gatehouse Edge
//! Gateway, the single ingress in front of the platform:
//!
//! - Perimeter token filtering on every request (allow-list aware)
//! - Identity propagation to upstream handlers via trusted headers
//! - Uniform rejection envelope that leaks nothing about the cause
//!
//! # Architecture
//!
//! The gateway is a thin Axum stack: the authentication filter wraps the
//! whole router, so even unmatched routes are filtered before the 404.
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication filter and HTTP metrics
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

#![warn(clippy::pedantic)]

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
