//! Parlor Runtime - orchestration layer for the Parlor conversational client.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `ParlorConfig`)
//! - Logging setup on `tracing-subscriber` (`LoggingBuilder`)
//! - Runtime orchestration around one client session (`ParlorRuntime`)
//!
//! ```ignore
//! use parlor_runtime::ParlorRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ParlorRuntime::new(puppet)?;
//!
//!     let room = runtime.client().room("R1");
//!     room.ready(false).await?;
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ClientConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, ParlorConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingError, SpanEvents};
pub use runtime::{ParlorRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module with the commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
