//! Foundation layer - Payload schemas, identity cache and error types.
//!
//! This module contains the fundamental building blocks shared by every
//! entity handle:
//! - Payload schemas for rooms, contacts, messages and outbound content
//! - The identity cache enforcing one handle per identifier
//! - Transport error types

pub mod cache;
pub mod error;
pub mod schema;

pub use cache::{Entity, IdentityCache};
pub use error::{PuppetError, PuppetResult};
pub use schema::{
    ContactGender, ContactKind, ContactPayload, FileBox, FileBoxSource, MessageKind,
    MessagePayload, MiniProgramPayload, RoomMemberPayload, RoomMemberQueryFilter, RoomPayload,
    RoomQueryFilter, UrlLinkPayload,
};
