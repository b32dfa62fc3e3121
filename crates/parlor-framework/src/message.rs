//! Message handles.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::client::Accessory;
use crate::contact::Contact;
use crate::error::{ParlorError, ParlorResult};
use crate::room::Room;
use crate::sayable::Sayable;
use crate::slot::PayloadSlot;
use parlor_core::{Entity, MessageKind, MessagePayload, PuppetError};

/// A handle to a remote message.
pub struct Message {
    id: String,
    accessory: Accessory,
    slot: PayloadSlot<MessagePayload>,
}

impl Message {
    pub(crate) fn new(id: String, accessory: Accessory) -> Self {
        Self {
            id,
            accessory,
            slot: PayloadSlot::new(),
        }
    }

    /// Returns the message id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true once a payload has been loaded.
    pub fn is_ready(&self) -> bool {
        self.slot.is_set()
    }

    /// Loads the message payload.
    pub async fn ready(&self, force_sync: bool) -> ParlorResult<()> {
        if !force_sync && self.is_ready() {
            return Ok(());
        }

        let _sync = self.slot.sync().await;
        if !force_sync && self.is_ready() {
            trace!(message_id = %self.id, "Message hydrated while waiting");
            return Ok(());
        }

        let puppet = self.accessory.puppet();
        if force_sync {
            match puppet.message_payload_dirty(&self.id).await {
                Ok(()) | Err(PuppetError::NotSupported { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let Some(payload) = puppet.message_payload(&self.id).await? else {
            self.slot.clear();
            return Err(ParlorError::missing_payload(Self::KIND, &self.id));
        };

        debug!(message_id = %self.id, kind = %payload.kind, "Message payload loaded");
        self.slot.set(payload);
        Ok(())
    }

    /// Returns the loaded payload, if any.
    pub fn payload(&self) -> Option<Arc<MessagePayload>> {
        self.slot.get()
    }

    /// Returns the message kind, if hydrated.
    pub fn kind(&self) -> Option<MessageKind> {
        self.slot.get().map(|p| p.kind)
    }

    /// Returns the message text, if hydrated and textual.
    pub fn text(&self) -> Option<String> {
        self.slot.get().and_then(|p| p.text.clone())
    }

    /// Returns the ids of contacts mentioned in the message.
    pub fn mention_ids(&self) -> Vec<String> {
        self.slot
            .get()
            .map(|p| p.mention_ids.clone())
            .unwrap_or_default()
    }

    /// Returns the sender handle (unhydrated), if known.
    pub fn talker(&self) -> ParlorResult<Option<Arc<Contact>>> {
        let Some(talker_id) = self.slot.get().and_then(|p| p.talker_id.clone()) else {
            return Ok(None);
        };
        Ok(Some(self.accessory.client()?.contact(&talker_id)))
    }

    /// Returns the room handle (unhydrated) for group messages.
    pub fn room(&self) -> ParlorResult<Option<Arc<Room>>> {
        let Some(room_id) = self.slot.get().and_then(|p| p.room_id.clone()) else {
            return Ok(None);
        };
        Ok(Some(self.accessory.client()?.room(&room_id)))
    }

    /// Replies in the conversation this message came from.
    ///
    /// Group messages are answered in their room, direct messages to their
    /// talker. An unhydrated message is hydrated first, so a message the
    /// puppet does not know fails with [`ParlorError::MissingPayload`].
    /// Returns `Ok(None)` when the message has no conversation to answer in.
    pub async fn say(&self, content: impl Into<Sayable>) -> ParlorResult<Option<Arc<Message>>> {
        self.ready(false).await?;
        if let Some(room) = self.room()? {
            return room.say(content).await;
        }
        match self.talker()? {
            Some(talker) => talker.say(content).await,
            None => Ok(None),
        }
    }
}

impl Entity for Message {
    const KIND: &'static str = "message";

    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot.get() {
            Some(payload) => write!(
                f,
                "Message#{}<{}>",
                payload.kind,
                payload.text.as_deref().unwrap_or_default()
            ),
            None => write!(f, "Message<{}>", self.id),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .finish()
    }
}
