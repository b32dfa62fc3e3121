//! Runtime orchestration.
//!
//! [`ParlorRuntime`] ties configuration, logging and a client session
//! together and drives the puppet's lifecycle.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use parlor_runtime::ParlorRuntime;
//!
//! // Auto-loads config from the current directory
//! let runtime = ParlorRuntime::new(puppet)?;
//!
//! // Custom configuration path
//! let runtime = ParlorRuntime::builder()
//!     .config_file("config/parlor.toml")
//!     .build(puppet)?;
//!
//! let room = runtime.client().room("R1");
//! ```

use std::future::Future;

use tokio::signal;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{ConfigLoader, ParlorConfig};
use crate::error::RuntimeResult;
use crate::logging;
use parlor_core::BoxedPuppet;
use parlor_framework::Client;

/// The Parlor runtime: configuration, logging and one client session.
pub struct ParlorRuntime {
    config: ParlorConfig,
    client: Client,
    running: RwLock<bool>,
}

impl ParlorRuntime {
    /// Creates a runtime, loading configuration from the default locations.
    pub fn new(puppet: BoxedPuppet) -> RuntimeResult<Self> {
        Self::builder().build(puppet)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Initializes logging and opens the client session on `puppet`.
    pub fn from_config(config: &ParlorConfig, puppet: BoxedPuppet) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging)?;

        let client = Client::with_options(puppet, config.client.to_options());

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            puppet = %client.puppet().name(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            client,
            running: RwLock::new(false),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ParlorConfig {
        &self.config
    }

    /// Returns the client session.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns whether the runtime is currently running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Starts the puppet.
    pub async fn start(&self) -> RuntimeResult<()> {
        let mut running = self.running.write().await;
        if *running {
            warn!("Runtime is already running");
            return Ok(());
        }

        let puppet = self.client.puppet();
        info!(puppet = %puppet.name(), "Starting Parlor runtime");
        puppet.start().await?;
        *running = true;

        info!("Runtime started");
        Ok(())
    }

    /// Stops the puppet.
    pub async fn stop(&self) -> RuntimeResult<()> {
        let mut running = self.running.write().await;
        if !*running {
            warn!("Runtime is not running");
            return Ok(());
        }

        let puppet = self.client.puppet();
        info!(puppet = %puppet.name(), "Stopping Parlor runtime");
        puppet.stop().await?;
        *running = false;

        info!("Runtime stopped");
        Ok(())
    }

    /// Runs until a shutdown signal is received.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;
        info!("Parlor runtime is now running. Press Ctrl+C to stop.");

        let signalled = wait_for_shutdown().await;
        self.stop().await?;
        signalled
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`ParlorRuntime`] with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = ParlorRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build(puppet)?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration values programmatically.
    pub fn merge(mut self, config: ParlorConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime on `puppet`.
    pub fn build(self, puppet: BoxedPuppet) -> RuntimeResult<ParlorRuntime> {
        let config = self.config_loader.load()?;
        ParlorRuntime::from_config(&config, puppet)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use std::sync::Arc;

    use parlor_core::{PuppetError, RoomPayload};
    use parlor_puppet_mock::MockPuppet;

    fn builder() -> RuntimeBuilder {
        RuntimeBuilder {
            config_loader: ConfigLoader::new()
                .without_env()
                .search_path(std::env::temp_dir().join("parlor-runtime-test-empty")),
        }
    }

    #[test]
    fn test_client_uses_configured_options() {
        let mut config = ParlorConfig::default();
        config.client.member_concurrency = 2;
        config.client.room_cache_capacity = 8;

        let runtime = builder()
            .merge(config)
            .build(Arc::new(MockPuppet::new()))
            .unwrap();

        assert_eq!(runtime.client().options().member_concurrency, 2);
        assert_eq!(runtime.client().rooms().capacity(), 8);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ParlorConfig::default();
        config.client.member_concurrency = 0;

        let result = builder().merge(config).build(Arc::new(MockPuppet::new()));
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let runtime = builder().build(Arc::new(MockPuppet::new())).unwrap();
        assert!(!runtime.is_running().await);

        runtime.start().await.unwrap();
        runtime.start().await.unwrap();
        assert!(runtime.is_running().await);

        runtime.stop().await.unwrap();
        assert!(!runtime.is_running().await);
        runtime.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_stop_keeps_running() {
        let puppet = Arc::new(MockPuppet::new());
        let runtime = builder().build(puppet.clone()).unwrap();
        runtime.start().await.unwrap();

        puppet.fail_on("stop", PuppetError::NotConnected);
        let result = runtime.stop().await;
        assert!(matches!(result, Err(RuntimeError::Puppet(_))));
        assert!(runtime.is_running().await);

        puppet.clear_failures();
        runtime.stop().await.unwrap();
        assert!(!runtime.is_running().await);
        assert_eq!(puppet.call_count("stop"), 2);
    }

    #[tokio::test]
    async fn test_run_until_serves_the_session() {
        let puppet = Arc::new(MockPuppet::new());
        puppet.insert_room(RoomPayload {
            id: "R1".into(),
            topic: "T".into(),
            ..Default::default()
        });
        let runtime = builder().build(puppet).unwrap();

        let client = runtime.client().clone();
        runtime
            .run_until(async move {
                let room = client.room("R1");
                room.ready(false).await.unwrap();
                assert_eq!(room.topic().as_deref(), Some("T"));
            })
            .await
            .unwrap();

        assert!(!runtime.is_running().await);
    }
}
