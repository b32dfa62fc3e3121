//! # Parlor Core
//!
//! The core building blocks of the Parlor conversational client.
//!
//! Parlor models remote conversational entities (rooms, contacts, messages)
//! as lightweight handles keyed by an opaque identifier. A handle's payload is
//! fetched lazily from a [`Puppet`], the transport abstraction that actually
//! talks to the remote service.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Data and bookkeeping shared by every entity:
//! - **Payload Schemas**: Serializable snapshots of remote attributes ([`RoomPayload`], [`ContactPayload`], ...)
//! - **Identity Cache**: At-most-one handle per identifier ([`IdentityCache`])
//! - **Errors**: Transport failures ([`PuppetError`])
//!
//! ### Integration Layer
//!
//! External system interfaces:
//! - **Puppet**: The transport port every entity handle calls into ([`Puppet`], [`BoxedPuppet`])
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌──────────┐
//! │   Client    │────▶│ IdentityCache  │────▶│  Handle  │──┐
//! │  (session)  │     │ (rooms, ...)   │     │  (Room)  │  │
//! └─────────────┘     └────────────────┘     └──────────┘  │
//!                                                          ▼
//!                                                   ┌────────────┐
//!                                                   │   Puppet   │
//!                                                   └────────────┘
//! ```

pub mod foundation;
pub mod integration;

pub use foundation::{
    ContactGender, ContactKind, ContactPayload, Entity, FileBox, FileBoxSource, IdentityCache,
    MessageKind, MessagePayload, MiniProgramPayload, PuppetError, PuppetResult, RoomMemberPayload,
    RoomMemberQueryFilter, RoomPayload, RoomQueryFilter, UrlLinkPayload,
};

pub use integration::{BoxedPuppet, Puppet};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::integration::{BoxedPuppet, Puppet};
}
