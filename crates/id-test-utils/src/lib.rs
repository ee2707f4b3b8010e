//! # Identity Test Utilities
//!
//! Shared test utilities for the Identity Controller service.
//!
//! This crate provides:
//! - Token fixtures signed with a fixed secret (`token_builders`)
//! - Server test harness (`TestAuthServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use id_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestAuthServer::spawn().await?;
//!     let client = reqwest::Client::new();
//!
//!     let response = client
//!         .get(format!("{}/health", server.url()))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use server_harness::*;
pub use token_builders::*;
