//! # Parlor Framework
//!
//! Entity handles on top of the core types.
//!
//! This layer provides:
//! - The client session owning one identity cache per entity kind ([`Client`])
//! - Lazily hydrated handles ([`Room`], [`Contact`], [`Message`])
//! - Room hydration with a bounded, fully joined member cascade
//! - Outbound dispatch of [`Sayable`] content and loading of the sent message
//!
//! Handles are cheap to obtain and never touch the puppet until `ready` or
//! an operation that needs remote data is called.

pub mod client;
pub mod contact;
pub mod error;
pub mod message;
pub mod room;
pub mod sayable;

mod slot;

pub use client::{Client, ClientOptions};
pub use contact::Contact;
pub use error::{ParlorError, ParlorResult};
pub use message::Message;
pub use room::Room;
pub use sayable::Sayable;

pub use parlor_core;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        Client, ClientOptions, Contact, Message, ParlorError, ParlorResult, Room, Sayable,
    };
    pub use parlor_core::prelude::*;
}
