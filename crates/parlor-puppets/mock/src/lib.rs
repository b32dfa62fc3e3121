//! # Parlor Mock Puppet
//!
//! An in-memory [`Puppet`](parlor_core::Puppet) for running Parlor without a
//! remote service: local experiments, demos and tests.
//!
//! ## Overview
//!
//! The mock keeps rooms, contacts, member aliases and messages in memory and
//! serves every `Puppet` operation from that state. On top of that it offers:
//!
//! - **Call recording**: every call is logged as a [`PuppetCall`] in arrival order
//! - **Failure injection**: any operation can be made to fail, globally or for one target id
//! - **Latency**: an optional per-call delay so concurrent callers overlap
//! - **Send control**: queued message ids, anonymous sends and unloadable sent messages
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use parlor_puppet_mock::MockPuppet;
//! use parlor_core::RoomPayload;
//!
//! let puppet = Arc::new(MockPuppet::new());
//! puppet.insert_room(RoomPayload { id: "R1".into(), topic: "T".into(), ..Default::default() });
//!
//! let client = Client::new(puppet.clone());
//! client.room("R1").ready(false).await?;
//! assert_eq!(puppet.operations(), ["room_payload", "room_member_list"]);
//! ```

mod call;
mod puppet;

pub use call::PuppetCall;
pub use puppet::MockPuppet;
