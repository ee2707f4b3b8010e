//! Test server harness for E2E testing
//!
//! Provides `TestAuthServer` for spawning real Identity Controller
//! instances in tests.

use crate::token_builders::TEST_SIGNING_SECRET;
use common::secret::SecretString;
use common::signing::SigningAuthority;
use common::store::{MemoryStore, TtlStore};
use id_service::config::{Config, DEFAULT_SESSION_CACHE_TTL_SECS, DEFAULT_STORE_OP_TIMEOUT_MS};
use id_service::observability::metrics::init_metrics_recorder;
use id_service::repositories::{InMemoryUserStore, TracingAuditLog, UserStore};
use id_service::routes::{self, AppState};
use id_service::services::verification_service::CODE_KEY_PREFIX;
use id_service::services::AuthService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// bcrypt cost for test servers. The minimum bcrypt accepts; production
/// costs make every registration take hundreds of milliseconds.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Test harness for spawning an Identity Controller server in E2E tests.
///
/// The server runs on in-memory backends (user store and TTL store), so
/// no external services are required and each instance is fully isolated.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_auth_flow_e2e() -> Result<(), anyhow::Error> {
///     let server = TestAuthServer::spawn().await?;
///     let client = reqwest::Client::new();
///
///     let response = client
///         .post(format!("{}/api/v1/auth/login", server.url()))
///         .json(&login_request)
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    config: Config,
    users: Arc<InMemoryUserStore>,
    store: Arc<MemoryStore>,
    _handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a new test server instance with isolated in-memory state.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Sign tokens with [`TEST_SIGNING_SECRET`]
    /// - Start the HTTP server in the background
    ///
    /// # Returns
    /// * `Ok(TestAuthServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If server spawn fails
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        // Build configuration for the test environment
        let config = Config {
            bind_address: "127.0.0.1:0".to_string(),
            // Not used; the harness wires an in-memory store instead
            redis_url: SecretString::from("redis://localhost:6379"),
            signing_secret: SecretString::from(TEST_SIGNING_SECRET),
            token_ttls: common::issuer::TokenTtls::default(),
            session_cache_ttl: Duration::from_secs(DEFAULT_SESSION_CACHE_TTL_SECS),
            bcrypt_cost: TEST_BCRYPT_COST,
            store_op_timeout: Duration::from_millis(DEFAULT_STORE_OP_TIMEOUT_MS),
        };

        // In-memory backends, one set per server instance
        let store = Arc::new(MemoryStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let audit = Arc::new(TracingAuditLog);

        let authority = SigningAuthority::new(&config.signing_secret);
        let auth = AuthService::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            audit,
            Arc::clone(&store) as Arc<dyn TtlStore>,
            authority,
            config.token_ttls,
            config.session_cache_ttl,
            config.bcrypt_cost,
        );

        // Create application state
        let state = Arc::new(AppState {
            auth,
            store: Arc::clone(&store) as Arc<dyn TtlStore>,
        });

        // Initialize metrics recorder for the test server.
        // Note: This may fail if already installed in the test process.
        // In that case, we create a new recorder without installing it globally.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                // If metrics recorder already installed globally, create a standalone
                // recorder without installing it. This allows each test to have its
                // own metrics.
                use metrics_exporter_prometheus::PrometheusBuilder;
                let recorder = PrometheusBuilder::new().build_recorder();
                recorder.handle()
            }
        };

        // Build routes using id-service's real route builder
        let app = routes::build_routes(state, metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            // Use into_make_service_with_connect_info to support SocketAddr extraction
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            users,
            store,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the in-memory user store.
    ///
    /// Tests use this to seed accounts or flip their status without going
    /// through the HTTP surface.
    pub fn user_store(&self) -> &Arc<InMemoryUserStore> {
        &self.users
    }

    /// Get a handle to the TTL store backing revocation, sessions and codes.
    pub fn ttl_store(&self) -> Arc<dyn TtlStore> {
        Arc::clone(&self.store) as Arc<dyn TtlStore>
    }

    /// Read the live verification code issued for `target`, if any.
    ///
    /// Codes are never returned over HTTP, so tests fish them out of the
    /// store the way a delivery worker would.
    pub async fn verification_code(&self, target: &str) -> Option<String> {
        let key = format!("{CODE_KEY_PREFIX}{target}");
        self.store
            .get(&key)
            .await
            .expect("in-memory store cannot fail")
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        // Explicitly abort the HTTP server task to ensure immediate cleanup
        // when the test completes. This stops the server gracefully.
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestAuthServer::spawn().await?;

        // Verify server is accessible
        assert!(server.url().starts_with("http://127.0.0.1:"));

        // Verify health endpoint works
        let response = reqwest::get(format!("{}/health", server.url())).await?;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await?, "OK");

        Ok(())
    }

    #[tokio::test]
    async fn test_server_provides_addr() -> Result<(), anyhow::Error> {
        let server = TestAuthServer::spawn().await?;

        let addr = server.addr();

        // Should be localhost with a real port
        assert!(addr.ip().is_loopback());
        assert!(addr.port() > 0);

        // Verify addr matches url
        let expected_url = format!("http://{}", addr);
        assert_eq!(server.url(), expected_url);

        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_servers_different_ports() -> Result<(), anyhow::Error> {
        // The second spawn exercises the metrics recorder fallback path.
        let server1 = TestAuthServer::spawn().await?;
        let server2 = TestAuthServer::spawn().await?;

        assert_ne!(server1.addr(), server2.addr());

        let response1 = reqwest::get(format!("{}/health", server1.url())).await?;
        assert_eq!(response1.status(), 200);

        let response2 = reqwest::get(format!("{}/health", server2.url())).await?;
        assert_eq!(response2.status(), 200);

        Ok(())
    }

    #[tokio::test]
    async fn test_server_cleanup_on_drop() -> Result<(), anyhow::Error> {
        let addr;
        {
            let server = TestAuthServer::spawn().await?;
            addr = server.addr();

            // Verify server is running
            let response = reqwest::get(format!("http://{}/health", addr)).await?;
            assert_eq!(response.status(), 200);

            // Server will be dropped here
        }

        // Give the server time to shut down. We can't reliably assert the
        // port refuses connections (it may be reused), but this exercises
        // the Drop implementation path.
        tokio::time::sleep(Duration::from_millis(100)).await;

        Ok(())
    }
}
