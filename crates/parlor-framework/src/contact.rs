//! Contact handles.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::client::Accessory;
use crate::error::{ParlorError, ParlorResult};
use crate::message::Message;
use crate::sayable::{Sayable, dispatch};
use crate::slot::PayloadSlot;
use parlor_core::{ContactGender, ContactPayload, Entity, PuppetError};

/// A handle to a remote contact.
pub struct Contact {
    id: String,
    accessory: Accessory,
    slot: PayloadSlot<ContactPayload>,
}

impl Contact {
    pub(crate) fn new(id: String, accessory: Accessory) -> Self {
        Self {
            id,
            accessory,
            slot: PayloadSlot::new(),
        }
    }

    /// Returns the contact id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true once a payload has been loaded.
    pub fn is_ready(&self) -> bool {
        self.slot.is_set()
    }

    /// Loads the contact payload.
    ///
    /// Without `force_sync` an already hydrated contact returns immediately.
    /// With it, the puppet-side copy is invalidated first; puppets that cannot
    /// invalidate contacts are tolerated and simply re-fetched.
    pub async fn ready(&self, force_sync: bool) -> ParlorResult<()> {
        if !force_sync && self.is_ready() {
            return Ok(());
        }

        let _sync = self.slot.sync().await;
        if !force_sync && self.is_ready() {
            trace!(contact_id = %self.id, "Contact hydrated while waiting");
            return Ok(());
        }

        let puppet = self.accessory.puppet();
        if force_sync {
            match puppet.contact_payload_dirty(&self.id).await {
                Ok(()) | Err(PuppetError::NotSupported { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let Some(payload) = puppet.contact_payload(&self.id).await? else {
            self.slot.clear();
            return Err(ParlorError::missing_payload(Self::KIND, &self.id));
        };

        debug!(contact_id = %self.id, name = %payload.name, "Contact payload loaded");
        self.slot.set(payload);
        Ok(())
    }

    /// Returns the loaded payload, if any.
    pub fn payload(&self) -> Option<Arc<ContactPayload>> {
        self.slot.get()
    }

    /// Returns the contact name, if hydrated.
    pub fn name(&self) -> Option<String> {
        self.slot.get().map(|p| p.name.clone())
    }

    /// Returns the alias the logged-in account gave this contact.
    pub fn alias(&self) -> Option<String> {
        self.slot.get().and_then(|p| p.alias.clone())
    }

    /// Returns the contact gender, if hydrated.
    pub fn gender(&self) -> Option<ContactGender> {
        self.slot.get().map(|p| p.gender)
    }

    /// Returns whether the contact is a friend, if known.
    pub fn is_friend(&self) -> Option<bool> {
        self.slot.get().and_then(|p| p.friend)
    }

    /// Sends content to this contact directly.
    ///
    /// See [`Room::say`](crate::Room::say) for the dispatch contract.
    pub async fn say(&self, content: impl Into<Sayable>) -> ParlorResult<Option<Arc<Message>>> {
        let client = self.accessory.client()?;
        dispatch(&client, &self.id, &content.into(), &[]).await
    }
}

impl Entity for Contact {
    const KIND: &'static str = "contact";

    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot.get() {
            Some(payload) => write!(f, "Contact<{}>", payload.name),
            None => write!(f, "Contact<{}>", self.id),
        }
    }
}

impl fmt::Debug for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contact")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .finish()
    }
}
