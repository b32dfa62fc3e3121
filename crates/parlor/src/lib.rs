//! # Parlor
//!
//! A client for the rooms, contacts and messages of a remote conversational
//! service, reached through a pluggable transport (the *puppet*).
//!
//! ## Overview
//!
//! Every remote entity is represented by exactly one handle per identifier.
//! Handles are created empty and hydrated on demand:
//!
//! ```text
//! ┌─────────────┐  room("R1")  ┌──────────────┐  ready()  ┌──────────┐
//! │   Client    │─────────────▶│  Room (R1)   │──────────▶│  Puppet  │
//! │  (caches)   │◀─────────────│ unhydrated   │◀──────────│          │
//! └─────────────┘  same Arc    └──────────────┘  payload  └──────────┘
//!                                     │ cascade
//!                                     ▼
//!                              Contact handles (members)
//! ```
//!
//! - **Client**: Owns the puppet and one identity cache per entity kind
//! - **Room / Contact / Message**: Lazily hydrated handles
//! - **Sayable**: Content that can be sent to a room or contact
//! - **Runtime**: Configuration, logging and the puppet lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parlor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ParlorRuntime::new(puppet)?;
//!     let client = runtime.client();
//!
//!     if let Some(room) = client.find_room(&RoomQueryFilter::topic("ops")).await? {
//!         room.say("deploy finished").await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `mock`: the in-memory [`MockPuppet`](parlor_puppet_mock::MockPuppet)

pub use parlor_core;
pub use parlor_framework;
pub use parlor_runtime;

#[cfg(feature = "mock")]
pub use parlor_puppet_mock;

pub use parlor_core::{BoxedPuppet, Puppet, PuppetError, PuppetResult};
pub use parlor_framework::{
    Client, ClientOptions, Contact, Message, ParlorError, ParlorResult, Room, Sayable,
};
pub use parlor_runtime::{ParlorConfig, ParlorRuntime, RuntimeError, RuntimeResult};

/// Prelude for common imports.
pub mod prelude {
    pub use parlor_framework::prelude::*;
    pub use parlor_runtime::prelude::*;
    pub use parlor_runtime::{ParlorConfig, ParlorRuntime, RuntimeError, RuntimeResult};
}
