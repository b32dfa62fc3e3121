//! Recorded puppet calls.

use std::fmt;

/// One call received by a [`MockPuppet`](crate::MockPuppet), in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuppetCall {
    Start,
    Stop,
    RoomPayload(String),
    RoomPayloadDirty(String),
    RoomMemberPayloadDirty(String),
    RoomMemberList(String),
    RoomMemberSearch(String),
    RoomMemberPayload { room_id: String, contact_id: String },
    RoomSearch,
    RoomCreate { contact_ids: Vec<String> },
    RoomAdd { room_id: String, contact_id: String },
    RoomDel { room_id: String, contact_id: String },
    RoomQuit(String),
    RoomTopicSet { room_id: String, topic: String },
    RoomAnnounce(String),
    RoomAnnounceSet { room_id: String, text: String },
    ContactPayload(String),
    ContactPayloadDirty(String),
    MessagePayload(String),
    MessagePayloadDirty(String),
    SendText {
        conversation_id: String,
        text: String,
        mention_ids: Vec<String>,
    },
    SendFile { conversation_id: String, name: String },
    SendUrl { conversation_id: String, url: String },
    SendMiniProgram { conversation_id: String },
}

impl PuppetCall {
    /// Returns the puppet operation name, matching the `Puppet` method name.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::RoomPayload(_) => "room_payload",
            Self::RoomPayloadDirty(_) => "room_payload_dirty",
            Self::RoomMemberPayloadDirty(_) => "room_member_payload_dirty",
            Self::RoomMemberList(_) => "room_member_list",
            Self::RoomMemberSearch(_) => "room_member_search",
            Self::RoomMemberPayload { .. } => "room_member_payload",
            Self::RoomSearch => "room_search",
            Self::RoomCreate { .. } => "room_create",
            Self::RoomAdd { .. } => "room_add",
            Self::RoomDel { .. } => "room_del",
            Self::RoomQuit(_) => "room_quit",
            Self::RoomTopicSet { .. } => "room_topic_set",
            Self::RoomAnnounce(_) => "room_announce",
            Self::RoomAnnounceSet { .. } => "room_announce_set",
            Self::ContactPayload(_) => "contact_payload",
            Self::ContactPayloadDirty(_) => "contact_payload_dirty",
            Self::MessagePayload(_) => "message_payload",
            Self::MessagePayloadDirty(_) => "message_payload_dirty",
            Self::SendText { .. } => "message_send_text",
            Self::SendFile { .. } => "message_send_file",
            Self::SendUrl { .. } => "message_send_url",
            Self::SendMiniProgram { .. } => "message_send_mini_program",
        }
    }

    /// Returns the identifier the call is primarily about, if any.
    ///
    /// For room member calls this is the room id; for sends it is the
    /// conversation id.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::RoomPayload(id)
            | Self::RoomPayloadDirty(id)
            | Self::RoomMemberPayloadDirty(id)
            | Self::RoomMemberList(id)
            | Self::RoomMemberSearch(id)
            | Self::RoomQuit(id)
            | Self::RoomAnnounce(id)
            | Self::ContactPayload(id)
            | Self::ContactPayloadDirty(id)
            | Self::MessagePayload(id)
            | Self::MessagePayloadDirty(id) => Some(id),
            Self::RoomMemberPayload { room_id, .. }
            | Self::RoomAdd { room_id, .. }
            | Self::RoomDel { room_id, .. }
            | Self::RoomTopicSet { room_id, .. }
            | Self::RoomAnnounceSet { room_id, .. } => Some(room_id),
            Self::SendText {
                conversation_id, ..
            }
            | Self::SendFile {
                conversation_id, ..
            }
            | Self::SendUrl {
                conversation_id, ..
            }
            | Self::SendMiniProgram { conversation_id } => Some(conversation_id),
            Self::Start | Self::Stop | Self::RoomSearch | Self::RoomCreate { .. } => None,
        }
    }

    /// Returns true for the four message send operations.
    pub fn is_send(&self) -> bool {
        matches!(
            self,
            Self::SendText { .. }
                | Self::SendFile { .. }
                | Self::SendUrl { .. }
                | Self::SendMiniProgram { .. }
        )
    }
}

impl fmt::Display for PuppetCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(target) => write!(f, "{}({target})", self.operation()),
            None => f.write_str(self.operation()),
        }
    }
}
