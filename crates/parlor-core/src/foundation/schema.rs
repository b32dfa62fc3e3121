//! Payload schemas exchanged with a puppet.
//!
//! Payloads are plain snapshots of mutable remote attributes. Entity handles
//! store them behind an `Arc` and replace them wholesale on every hydration,
//! so none of these types carry interior mutability.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Room
// =============================================================================

/// Snapshot of a room (group conversation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomPayload {
    /// The room identifier.
    pub id: String,
    /// The room topic (group name).
    pub topic: String,
    /// Avatar reference, if the service exposes one.
    pub avatar: Option<String>,
    /// Identifier of the room owner.
    pub owner_id: Option<String>,
    /// Identifiers of the room administrators.
    pub admin_ids: Vec<String>,
    /// Identifiers of the members known when the payload was taken.
    pub member_ids: Vec<String>,
}

/// Member-specific attributes of a contact inside one room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomMemberPayload {
    /// The contact identifier.
    pub id: String,
    /// Alias the member uses in this room.
    pub room_alias: Option<String>,
    /// Who invited the member.
    pub inviter_id: Option<String>,
    /// The member's display name.
    pub name: String,
    /// Avatar reference.
    pub avatar: Option<String>,
}

/// Filter for room search.
///
/// Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomQueryFilter {
    /// Exact room identifier.
    pub id: Option<String>,
    /// Exact room topic.
    pub topic: Option<String>,
}

impl RoomQueryFilter {
    /// Creates a filter matching rooms by topic.
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Default::default()
        }
    }

    /// Creates a filter matching a room by identifier.
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Returns true if the given payload satisfies every set field.
    pub fn matches(&self, payload: &RoomPayload) -> bool {
        self.id.as_ref().is_none_or(|id| *id == payload.id)
            && self.topic.as_ref().is_none_or(|t| *t == payload.topic)
    }
}

/// Filter for searching the members of one room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomMemberQueryFilter {
    /// Contact name.
    pub name: Option<String>,
    /// Alias inside the room.
    pub room_alias: Option<String>,
    /// Alias the bot gave the contact.
    pub contact_alias: Option<String>,
}

impl RoomMemberQueryFilter {
    /// Creates a filter matching members by contact name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Creates a filter matching members by room alias.
    pub fn room_alias(alias: impl Into<String>) -> Self {
        Self {
            room_alias: Some(alias.into()),
            ..Default::default()
        }
    }
}

// =============================================================================
// Contact
// =============================================================================

/// Contact gender as reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactGender {
    #[default]
    Unknown,
    Male,
    Female,
}

/// What kind of account a contact is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    #[default]
    Unknown,
    Individual,
    Official,
}

/// Snapshot of a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPayload {
    pub id: String,
    pub name: String,
    /// Alias the bot gave this contact.
    pub alias: Option<String>,
    pub avatar: Option<String>,
    pub gender: ContactGender,
    pub kind: ContactKind,
    /// Whether the contact is a friend of the logged-in account.
    pub friend: Option<bool>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub signature: Option<String>,
}

// =============================================================================
// Message
// =============================================================================

/// Kind of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Unknown,
    Text,
    Attachment,
    Url,
    MiniProgram,
    Contact,
    Image,
}

impl MessageKind {
    /// Returns the kind as a static string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Text => "text",
            Self::Attachment => "attachment",
            Self::Url => "url",
            Self::MiniProgram => "mini_program",
            Self::Contact => "contact",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagePayload {
    pub id: String,
    pub kind: MessageKind,
    pub text: Option<String>,
    /// Who sent the message.
    pub talker_id: Option<String>,
    /// Direct recipient, for one-to-one messages.
    pub listener_id: Option<String>,
    /// Conversation room, for group messages.
    pub room_id: Option<String>,
    pub mention_ids: Vec<String>,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// File name, for attachments.
    pub filename: Option<String>,
}

// =============================================================================
// Outbound Content
// =============================================================================

/// A shareable link card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlLinkPayload {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl UrlLinkPayload {
    /// Creates a link card with a title and a target URL.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }
}

/// A mini-program reference card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniProgramPayload {
    pub appid: Option<String>,
    pub title: Option<String>,
    pub page_path: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub username: Option<String>,
}

/// Where the bytes of a [`FileBox`] come from.
///
/// Reading or encoding the source is the puppet's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FileBoxSource {
    Url(String),
    Path(PathBuf),
    Base64(String),
    Bytes(Vec<u8>),
}

/// A file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBox {
    /// File name presented to the receiver.
    pub name: String,
    /// MIME type, if known.
    #[serde(default)]
    pub mime_type: Option<String>,
    pub source: FileBoxSource,
}

impl FileBox {
    /// Creates a file box backed by a remote URL.
    pub fn from_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            source: FileBoxSource::Url(url.into()),
        }
    }

    /// Creates a file box backed by a local path; the name is the path's file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            mime_type: None,
            source: FileBoxSource::Path(path),
        }
    }

    /// Creates a file box from in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            source: FileBoxSource::Bytes(bytes.into()),
        }
    }

    /// Sets the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}
