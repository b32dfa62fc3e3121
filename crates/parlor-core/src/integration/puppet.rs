//! Puppet trait - the transport port.
//!
//! A puppet is the protocol adapter that actually talks to the remote
//! conversational service. Parlor treats it as a black box: every method is
//! asynchronous, keyed by opaque identifiers, and independently failable.
//!
//! # Required and optional operations
//!
//! The operations entity hydration and message dispatch depend on are
//! required. Management operations (creating rooms, changing topics, ...)
//! have default implementations returning [`PuppetError::NotSupported`], so a
//! read-only puppet only needs to implement the required set.
//!
//! # Absent results
//!
//! Payload lookups return `Ok(None)` when the remote entity does not exist.
//! Send operations return `Ok(None)` when the service accepted the message but
//! handed back no identifier to load it by.

use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::error::{PuppetError, PuppetResult};
use crate::foundation::schema::{
    ContactPayload, FileBox, MessagePayload, MiniProgramPayload, RoomMemberPayload,
    RoomMemberQueryFilter, RoomPayload, RoomQueryFilter, UrlLinkPayload,
};

/// The transport port consumed by every entity handle.
#[async_trait]
pub trait Puppet: Send + Sync + 'static {
    /// Returns a short name identifying this puppet in logs.
    fn name(&self) -> &str;

    /// Called once before the puppet is used.
    ///
    /// The default implementation does nothing.
    async fn start(&self) -> PuppetResult<()> {
        Ok(())
    }

    /// Called when the owning runtime shuts down.
    ///
    /// The default implementation does nothing.
    async fn stop(&self) -> PuppetResult<()> {
        Ok(())
    }

    // =========================================================================
    // Room
    // =========================================================================

    /// Fetches the payload of a room.
    async fn room_payload(&self, room_id: &str) -> PuppetResult<Option<RoomPayload>>;

    /// Discards any puppet-side cached copy of a room payload.
    async fn room_payload_dirty(&self, room_id: &str) -> PuppetResult<()>;

    /// Discards any puppet-side cached copy of a room's member payloads.
    async fn room_member_payload_dirty(&self, room_id: &str) -> PuppetResult<()>;

    /// Lists the member contact ids of a room.
    async fn room_member_list(&self, room_id: &str) -> PuppetResult<Vec<String>>;

    /// Lists the member contact ids of a room matching `filter`.
    async fn room_member_search(
        &self,
        room_id: &str,
        filter: &RoomMemberQueryFilter,
    ) -> PuppetResult<Vec<String>>;

    /// Fetches the member-specific payload of a contact inside a room.
    async fn room_member_payload(
        &self,
        room_id: &str,
        contact_id: &str,
    ) -> PuppetResult<Option<RoomMemberPayload>>;

    /// Lists the ids of rooms matching `filter`.
    async fn room_search(&self, filter: &RoomQueryFilter) -> PuppetResult<Vec<String>>;

    /// Creates a room with the given members and returns its id.
    async fn room_create(&self, _contact_ids: &[String], _topic: Option<&str>) -> PuppetResult<String> {
        Err(PuppetError::not_supported("room_create"))
    }

    /// Adds a contact to a room.
    async fn room_add(&self, _room_id: &str, _contact_id: &str) -> PuppetResult<()> {
        Err(PuppetError::not_supported("room_add"))
    }

    /// Removes a contact from a room.
    async fn room_del(&self, _room_id: &str, _contact_id: &str) -> PuppetResult<()> {
        Err(PuppetError::not_supported("room_del"))
    }

    /// Leaves a room.
    async fn room_quit(&self, _room_id: &str) -> PuppetResult<()> {
        Err(PuppetError::not_supported("room_quit"))
    }

    /// Changes a room topic.
    async fn room_topic_set(&self, _room_id: &str, _topic: &str) -> PuppetResult<()> {
        Err(PuppetError::not_supported("room_topic_set"))
    }

    /// Fetches a room announcement.
    async fn room_announce(&self, _room_id: &str) -> PuppetResult<String> {
        Err(PuppetError::not_supported("room_announce"))
    }

    /// Replaces a room announcement.
    async fn room_announce_set(&self, _room_id: &str, _text: &str) -> PuppetResult<()> {
        Err(PuppetError::not_supported("room_announce_set"))
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// Fetches the payload of a contact.
    async fn contact_payload(&self, contact_id: &str) -> PuppetResult<Option<ContactPayload>>;

    /// Discards any puppet-side cached copy of a contact payload.
    async fn contact_payload_dirty(&self, _contact_id: &str) -> PuppetResult<()> {
        Err(PuppetError::not_supported("contact_payload_dirty"))
    }

    // =========================================================================
    // Message
    // =========================================================================

    /// Fetches the payload of a message.
    async fn message_payload(&self, message_id: &str) -> PuppetResult<Option<MessagePayload>>;

    /// Discards any puppet-side cached copy of a message payload.
    async fn message_payload_dirty(&self, _message_id: &str) -> PuppetResult<()> {
        Err(PuppetError::not_supported("message_payload_dirty"))
    }

    /// Sends a text message, mentioning `mention_ids`, and returns the new message id.
    async fn message_send_text(
        &self,
        conversation_id: &str,
        text: &str,
        mention_ids: &[String],
    ) -> PuppetResult<Option<String>>;

    /// Sends a file attachment and returns the new message id.
    async fn message_send_file(
        &self,
        conversation_id: &str,
        file: &FileBox,
    ) -> PuppetResult<Option<String>>;

    /// Sends a link card and returns the new message id.
    async fn message_send_url(
        &self,
        conversation_id: &str,
        payload: &UrlLinkPayload,
    ) -> PuppetResult<Option<String>>;

    /// Sends a mini-program card and returns the new message id.
    async fn message_send_mini_program(
        &self,
        conversation_id: &str,
        payload: &MiniProgramPayload,
    ) -> PuppetResult<Option<String>>;
}

/// A shared Puppet trait object.
pub type BoxedPuppet = Arc<dyn Puppet>;

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnlyPuppet;

    #[async_trait]
    impl Puppet for ReadOnlyPuppet {
        fn name(&self) -> &str {
            "read-only"
        }

        async fn room_payload(&self, _room_id: &str) -> PuppetResult<Option<RoomPayload>> {
            Ok(None)
        }

        async fn room_payload_dirty(&self, _room_id: &str) -> PuppetResult<()> {
            Ok(())
        }

        async fn room_member_payload_dirty(&self, _room_id: &str) -> PuppetResult<()> {
            Ok(())
        }

        async fn room_member_list(&self, _room_id: &str) -> PuppetResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn room_member_search(
            &self,
            _room_id: &str,
            _filter: &RoomMemberQueryFilter,
        ) -> PuppetResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn room_member_payload(
            &self,
            _room_id: &str,
            _contact_id: &str,
        ) -> PuppetResult<Option<RoomMemberPayload>> {
            Ok(None)
        }

        async fn room_search(&self, _filter: &RoomQueryFilter) -> PuppetResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn contact_payload(&self, _contact_id: &str) -> PuppetResult<Option<ContactPayload>> {
            Ok(None)
        }

        async fn message_payload(&self, _message_id: &str) -> PuppetResult<Option<MessagePayload>> {
            Ok(None)
        }

        async fn message_send_text(
            &self,
            _conversation_id: &str,
            _text: &str,
            _mention_ids: &[String],
        ) -> PuppetResult<Option<String>> {
            Err(PuppetError::NotConnected)
        }

        async fn message_send_file(
            &self,
            _conversation_id: &str,
            _file: &FileBox,
        ) -> PuppetResult<Option<String>> {
            Err(PuppetError::NotConnected)
        }

        async fn message_send_url(
            &self,
            _conversation_id: &str,
            _payload: &UrlLinkPayload,
        ) -> PuppetResult<Option<String>> {
            Err(PuppetError::NotConnected)
        }

        async fn message_send_mini_program(
            &self,
            _conversation_id: &str,
            _payload: &MiniProgramPayload,
        ) -> PuppetResult<Option<String>> {
            Err(PuppetError::NotConnected)
        }
    }

    #[tokio::test]
    async fn test_optional_operations_default_to_not_supported() {
        let puppet: BoxedPuppet = Arc::new(ReadOnlyPuppet);

        assert!(puppet.start().await.is_ok());
        match puppet.room_topic_set("R1", "new").await {
            Err(PuppetError::NotSupported { operation }) => assert_eq!(operation, "room_topic_set"),
            other => panic!("expected NotSupported, got {other:?}"),
        }
        assert!(matches!(
            puppet.room_create(&[], None).await,
            Err(PuppetError::NotSupported { .. })
        ));
        assert!(puppet.stop().await.is_ok());
    }
}
