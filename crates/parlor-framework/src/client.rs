//! The client session.
//!
//! A [`Client`] owns the puppet and one identity cache per entity kind. Every
//! handle it hands out carries an [`Accessory`] pointing back at the session,
//! so handles can resolve related entities (room members, sent messages)
//! through the same caches.
//!
//! ```rust,ignore
//! use parlor_framework::Client;
//!
//! let client = Client::new(puppet);
//! let room = client.room("R1");
//! room.ready(false).await?;
//!
//! // Same identifier, same handle.
//! assert!(Arc::ptr_eq(&room, &client.room("R1")));
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{debug, info};

use crate::contact::Contact;
use crate::error::{ParlorError, ParlorResult};
use crate::message::Message;
use crate::room::Room;
use parlor_core::{BoxedPuppet, IdentityCache, Puppet, RoomQueryFilter};

/// Tunables for a client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Maximum number of room members hydrated concurrently during a room's `ready`.
    pub member_concurrency: usize,
    /// Room cache capacity (0 = unbounded).
    pub room_cache_capacity: usize,
    /// Contact cache capacity (0 = unbounded).
    pub contact_cache_capacity: usize,
    /// Message cache capacity (0 = unbounded).
    pub message_cache_capacity: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            member_concurrency: 16,
            room_cache_capacity: 0,
            contact_cache_capacity: 0,
            message_cache_capacity: 0,
        }
    }
}

pub(crate) struct ClientInner {
    puppet: BoxedPuppet,
    options: ClientOptions,
    rooms: IdentityCache<Room>,
    contacts: IdentityCache<Contact>,
    messages: IdentityCache<Message>,
}

/// A client session: the puppet plus the identity caches of every entity kind.
///
/// Cloning a `Client` is cheap and yields another reference to the same session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a session with default options.
    pub fn new(puppet: BoxedPuppet) -> Self {
        Self::with_options(puppet, ClientOptions::default())
    }

    /// Creates a session with the given options.
    pub fn with_options(puppet: BoxedPuppet, options: ClientOptions) -> Self {
        info!(
            puppet = %puppet.name(),
            member_concurrency = options.member_concurrency,
            "Created client session"
        );

        Self {
            inner: Arc::new(ClientInner {
                rooms: IdentityCache::with_capacity(options.room_cache_capacity),
                contacts: IdentityCache::with_capacity(options.contact_cache_capacity),
                messages: IdentityCache::with_capacity(options.message_cache_capacity),
                puppet,
                options,
            }),
        }
    }

    /// Returns the puppet.
    pub fn puppet(&self) -> &BoxedPuppet {
        &self.inner.puppet
    }

    /// Returns the session options.
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Returns the room handle for `id`, creating an unhydrated one on a miss.
    pub fn room(&self, id: &str) -> Arc<Room> {
        self.inner
            .rooms
            .get_or_create(id, |id| Room::new(id, self.accessory()))
    }

    /// Returns the contact handle for `id`, creating an unhydrated one on a miss.
    pub fn contact(&self, id: &str) -> Arc<Contact> {
        self.inner
            .contacts
            .get_or_create(id, |id| Contact::new(id, self.accessory()))
    }

    /// Returns the message handle for `id`, creating an unhydrated one on a miss.
    pub fn message(&self, id: &str) -> Arc<Message> {
        self.inner
            .messages
            .get_or_create(id, |id| Message::new(id, self.accessory()))
    }

    /// Returns the room cache.
    pub fn rooms(&self) -> &IdentityCache<Room> {
        &self.inner.rooms
    }

    /// Returns the contact cache.
    pub fn contacts(&self) -> &IdentityCache<Contact> {
        &self.inner.contacts
    }

    /// Returns the message cache.
    pub fn messages(&self) -> &IdentityCache<Message> {
        &self.inner.messages
    }

    /// Finds rooms matching `query`.
    ///
    /// Handles come back in puppet order and are not hydrated; call
    /// [`Room::ready`] on the ones whose payload you need.
    pub async fn find_rooms(&self, query: &RoomQueryFilter) -> ParlorResult<Vec<Arc<Room>>> {
        let ids = self.inner.puppet.room_search(query).await?;
        debug!(count = ids.len(), "Room search returned");
        Ok(ids.iter().map(|id| self.room(id)).collect())
    }

    /// Finds the first room matching `query` and hydrates it.
    pub async fn find_room(&self, query: &RoomQueryFilter) -> ParlorResult<Option<Arc<Room>>> {
        let Some(room) = self.find_rooms(query).await?.into_iter().next() else {
            return Ok(None);
        };
        room.ready(false).await?;
        Ok(Some(room))
    }

    /// Creates a room with the given members and returns it hydrated.
    pub async fn create_room(
        &self,
        contacts: &[Arc<Contact>],
        topic: Option<&str>,
    ) -> ParlorResult<Arc<Room>> {
        let contact_ids: Vec<String> = contacts.iter().map(|c| c.id().to_string()).collect();
        let room_id = self.inner.puppet.room_create(&contact_ids, topic).await?;
        info!(room_id = %room_id, members = contact_ids.len(), "Created room");

        let room = self.room(&room_id);
        room.ready(false).await?;
        Ok(room)
    }

    fn accessory(&self) -> Accessory {
        Accessory {
            puppet: Arc::clone(&self.inner.puppet),
            client: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("puppet", &self.inner.puppet.name())
            .field("rooms", &self.inner.rooms.len())
            .field("contacts", &self.inner.contacts.len())
            .field("messages", &self.inner.messages.len())
            .finish()
    }
}

/// What every entity handle carries: the puppet and a way back to its session.
///
/// The session is held weakly because the session's caches hold the handles.
#[derive(Clone)]
pub(crate) struct Accessory {
    puppet: BoxedPuppet,
    client: Weak<ClientInner>,
}

impl Accessory {
    pub(crate) fn puppet(&self) -> &dyn Puppet {
        self.puppet.as_ref()
    }

    /// Upgrades to the owning session.
    pub(crate) fn client(&self) -> ParlorResult<Client> {
        self.client
            .upgrade()
            .map(|inner| Client { inner })
            .ok_or(ParlorError::SessionClosed)
    }
}
