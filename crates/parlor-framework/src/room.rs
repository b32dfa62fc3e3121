//! Room handles.
//!
//! A [`Room`] is a group conversation. Like every entity handle it starts
//! unhydrated and loads its payload on [`ready`](Room::ready).
//!
//! # Hydration
//!
//! ```text
//! ready(force_sync)
//!   ├─ hydrated && !force_sync ──────────────▶ done (no puppet call)
//!   ├─ force_sync: room_payload_dirty ─▶ room_member_payload_dirty
//!   ├─ room_payload ── None ─────────────────▶ MissingPayload
//!   ├─ store payload
//!   ├─ room_member_list
//!   └─ Contact::ready for every member (bounded concurrency, all joined)
//!        └─ any failure ─────────────────────▶ Cascade
//! ```
//!
//! Concurrent `ready` calls on one room are serialized; a caller that waited
//! behind another hydration re-checks the fast path, so a burst of
//! non-forced calls costs a single round trip.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, trace, warn};

use crate::client::{Accessory, Client};
use crate::contact::Contact;
use crate::error::{ParlorError, ParlorResult};
use crate::message::Message;
use crate::sayable::{Sayable, dispatch};
use crate::slot::PayloadSlot;
use parlor_core::{Entity, RoomMemberQueryFilter, RoomPayload};

/// Separator placed between mentions and the text of a mentioning message.
const MENTION_SEPARATOR: char = '\u{2005}';

/// A handle to a remote room (group conversation).
pub struct Room {
    id: String,
    accessory: Accessory,
    slot: PayloadSlot<RoomPayload>,
}

impl Room {
    pub(crate) fn new(id: String, accessory: Accessory) -> Self {
        Self {
            id,
            accessory,
            slot: PayloadSlot::new(),
        }
    }

    /// Returns the room id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true once a payload has been loaded.
    ///
    /// Never blocks, even while a hydration is in flight.
    pub fn is_ready(&self) -> bool {
        self.slot.is_set()
    }

    /// Loads the room payload and hydrates every member.
    ///
    /// Without `force_sync` an already hydrated room returns immediately. With
    /// it, the puppet is told to drop its cached room and member payloads
    /// before anything is re-fetched.
    ///
    /// # Errors
    ///
    /// - [`ParlorError::Puppet`] if any puppet call fails. A room that was
    ///   already hydrated keeps its previous payload.
    /// - [`ParlorError::MissingPayload`] if the puppet has no payload; the
    ///   room is left unhydrated.
    /// - [`ParlorError::Cascade`] if any member fails to hydrate. The room's
    ///   own payload is kept in that case.
    #[instrument(level = "debug", skip(self), fields(room_id = %self.id))]
    pub async fn ready(&self, force_sync: bool) -> ParlorResult<()> {
        if !force_sync && self.is_ready() {
            return Ok(());
        }

        let _sync = self.slot.sync().await;
        if !force_sync && self.is_ready() {
            trace!("Room hydrated while waiting");
            return Ok(());
        }

        let client = self.accessory.client()?;
        let puppet = self.accessory.puppet();

        if force_sync {
            puppet.room_payload_dirty(&self.id).await?;
            puppet.room_member_payload_dirty(&self.id).await?;
        }

        // A transport error keeps the previous payload; a missing one drops it.
        let Some(payload) = puppet.room_payload(&self.id).await? else {
            self.slot.clear();
            return Err(ParlorError::missing_payload(Self::KIND, &self.id));
        };
        let payload = self.slot.set(payload);
        info!(topic = %payload.topic, "Room payload loaded");

        let member_ids = puppet.room_member_list(&self.id).await?;
        self.hydrate_members(&client, &member_ids).await
    }

    async fn hydrate_members(&self, client: &Client, member_ids: &[String]) -> ParlorResult<()> {
        let concurrency = client.options().member_concurrency.max(1);
        let members: Vec<Arc<Contact>> = member_ids.iter().map(|id| client.contact(id)).collect();
        let total = members.len();

        let failures: Vec<(String, ParlorError)> = stream::iter(members)
            .map(|member| async move {
                let result = member.ready(false).await;
                (member, result)
            })
            .buffer_unordered(concurrency)
            .filter_map(|(member, result)| async move {
                result.err().map(|e| (member.id().to_string(), e))
            })
            .collect()
            .await;

        if failures.is_empty() {
            debug!(members = total, "Room members hydrated");
            return Ok(());
        }

        warn!(
            members = total,
            failed = failures.len(),
            "Some room members failed to hydrate"
        );
        Err(ParlorError::Cascade {
            room_id: self.id.clone(),
            failures,
        })
    }

    // =========================================================================
    // Payload Accessors
    // =========================================================================

    /// Returns the loaded payload, if any.
    pub fn payload(&self) -> Option<Arc<RoomPayload>> {
        self.slot.get()
    }

    /// Returns the room topic, if hydrated.
    pub fn topic(&self) -> Option<String> {
        self.slot.get().map(|p| p.topic.clone())
    }

    /// Returns the room avatar reference, if hydrated and set.
    pub fn avatar(&self) -> Option<String> {
        self.slot.get().and_then(|p| p.avatar.clone())
    }

    /// Returns the owner id, if hydrated and known.
    pub fn owner_id(&self) -> Option<String> {
        self.slot.get().and_then(|p| p.owner_id.clone())
    }

    /// Returns the member ids recorded in the payload.
    ///
    /// This is the snapshot taken at the last hydration; use
    /// [`member_list`](Self::member_list) for a fresh list.
    pub fn member_ids(&self) -> Vec<String> {
        self.slot
            .get()
            .map(|p| p.member_ids.clone())
            .unwrap_or_default()
    }

    /// Returns the owner's handle (unhydrated), if known.
    pub fn owner(&self) -> ParlorResult<Option<Arc<Contact>>> {
        let Some(owner_id) = self.owner_id() else {
            return Ok(None);
        };
        Ok(Some(self.accessory.client()?.contact(&owner_id)))
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Lists the room members in puppet order.
    ///
    /// Always asks the puppet; the returned handles are not hydrated.
    pub async fn member_list(&self) -> ParlorResult<Vec<Arc<Contact>>> {
        let client = self.accessory.client()?;
        let ids = self.accessory.puppet().room_member_list(&self.id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(ids.iter().map(|id| client.contact(id)).collect())
    }

    /// Lists the members matching `filter`, or every member without one.
    pub async fn member_all(
        &self,
        filter: Option<&RoomMemberQueryFilter>,
    ) -> ParlorResult<Vec<Arc<Contact>>> {
        let Some(filter) = filter else {
            return self.member_list().await;
        };

        let client = self.accessory.client()?;
        let ids = self
            .accessory
            .puppet()
            .room_member_search(&self.id, filter)
            .await?;
        Ok(ids.iter().map(|id| client.contact(id)).collect())
    }

    /// Returns the first member matching `filter`.
    pub async fn member(
        &self,
        filter: &RoomMemberQueryFilter,
    ) -> ParlorResult<Option<Arc<Contact>>> {
        Ok(self.member_all(Some(filter)).await?.into_iter().next())
    }

    /// Returns the alias `contact` uses in this room.
    ///
    /// `None` if the puppet has no member payload for the pair or the alias is empty.
    pub async fn alias(&self, contact: &Contact) -> ParlorResult<Option<String>> {
        let member = self
            .accessory
            .puppet()
            .room_member_payload(&self.id, contact.id())
            .await?;
        Ok(member
            .and_then(|m| m.room_alias)
            .filter(|alias| !alias.is_empty()))
    }

    /// Returns true if `contact` is currently a member.
    pub async fn has(&self, contact: &Contact) -> ParlorResult<bool> {
        let ids = self.accessory.puppet().room_member_list(&self.id).await?;
        Ok(ids.iter().any(|id| id == contact.id()))
    }

    // =========================================================================
    // Management
    // =========================================================================

    /// Adds `contact` to the room.
    pub async fn add(&self, contact: &Contact) -> ParlorResult<()> {
        let puppet = self.accessory.puppet();
        puppet.room_add(&self.id, contact.id()).await?;
        puppet.room_member_payload_dirty(&self.id).await?;
        info!(room_id = %self.id, contact_id = %contact.id(), "Added room member");
        Ok(())
    }

    /// Removes `contact` from the room.
    pub async fn remove(&self, contact: &Contact) -> ParlorResult<()> {
        let puppet = self.accessory.puppet();
        puppet.room_del(&self.id, contact.id()).await?;
        puppet.room_member_payload_dirty(&self.id).await?;
        info!(room_id = %self.id, contact_id = %contact.id(), "Removed room member");
        Ok(())
    }

    /// Leaves the room.
    pub async fn quit(&self) -> ParlorResult<()> {
        self.accessory.puppet().room_quit(&self.id).await?;
        info!(room_id = %self.id, "Quit room");
        Ok(())
    }

    /// Changes the topic, then re-synchronizes the room.
    pub async fn set_topic(&self, topic: &str) -> ParlorResult<()> {
        self.accessory
            .puppet()
            .room_topic_set(&self.id, topic)
            .await?;
        self.ready(true).await
    }

    /// Returns the room announcement.
    pub async fn announce(&self) -> ParlorResult<String> {
        Ok(self.accessory.puppet().room_announce(&self.id).await?)
    }

    /// Replaces the room announcement.
    pub async fn set_announce(&self, text: &str) -> ParlorResult<()> {
        Ok(self
            .accessory
            .puppet()
            .room_announce_set(&self.id, text)
            .await?)
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Sends content to the room and returns the loaded message.
    ///
    /// Resolves to `Ok(None)` if the puppet accepted the content without
    /// returning a message id. If the message was sent but cannot be loaded,
    /// the load error is returned even though the room already received it.
    pub async fn say(&self, content: impl Into<Sayable>) -> ParlorResult<Option<Arc<Message>>> {
        let client = self.accessory.client()?;
        dispatch(&client, &self.id, &content.into(), &[]).await
    }

    /// Sends text that mentions `mentions`.
    ///
    /// Each mention is rendered as `@` plus the member's room alias, falling
    /// back to the contact name. Only text can carry mentions: any other
    /// content fails with [`ParlorError::UnsupportedContent`] before anything
    /// is sent. With no mentions this is the same as [`say`](Self::say).
    pub async fn say_to(
        &self,
        content: impl Into<Sayable>,
        mentions: &[Arc<Contact>],
    ) -> ParlorResult<Option<Arc<Message>>> {
        let content = content.into();
        if mentions.is_empty() {
            return self.say(content).await;
        }

        let Some(text) = content.as_text() else {
            return Err(ParlorError::unsupported(
                content.kind(),
                "only text can mention room members",
            ));
        };

        let client = self.accessory.client()?;
        let mut labels = Vec::with_capacity(mentions.len());
        for contact in mentions {
            labels.push(format!("@{}", self.mention_name(contact).await?));
        }

        let separator = MENTION_SEPARATOR.to_string();
        let text = format!("{}{separator}{text}", labels.join(&separator));
        let mention_ids: Vec<String> = mentions.iter().map(|c| c.id().to_string()).collect();

        dispatch(&client, &self.id, &Sayable::Text(text), &mention_ids).await
    }

    /// Sends a dynamically typed value.
    ///
    /// The value is converted with [`Sayable::from_any`]; types without a send
    /// route fail with [`ParlorError::UnsupportedContent`] and no puppet call
    /// is made.
    pub async fn say_any<T: Any>(&self, content: &T) -> ParlorResult<Option<Arc<Message>>> {
        let content = Sayable::from_any(content)?;
        self.say(content).await
    }

    async fn mention_name(&self, contact: &Contact) -> ParlorResult<String> {
        if let Some(alias) = self.alias(contact).await? {
            return Ok(alias);
        }
        contact.ready(false).await?;
        Ok(contact.name().unwrap_or_default())
    }
}

impl Entity for Room {
    const KIND: &'static str = "room";

    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot.get() {
            Some(payload) => write!(f, "Room<{}>", payload.topic),
            None => write!(f, "Room<{}>", self.id),
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use parlor_core::{
        ContactPayload, FileBox, MessageKind, MiniProgramPayload, PuppetError, UrlLinkPayload,
    };
    use parlor_puppet_mock::{MockPuppet, PuppetCall};
    use tokio_test::{assert_err, assert_ok};

    fn contact(id: &str, name: &str) -> ContactPayload {
        ContactPayload {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn seed(puppet: &MockPuppet) {
        puppet.insert_contact(contact("C1", "alice"));
        puppet.insert_contact(contact("C2", "bob"));
        puppet.insert_room(RoomPayload {
            id: "R1".into(),
            topic: "T".into(),
            owner_id: Some("C1".into()),
            member_ids: vec!["C1".into(), "C2".into()],
            ..Default::default()
        });
    }

    fn setup() -> (Arc<MockPuppet>, Client) {
        let puppet = Arc::new(MockPuppet::new());
        seed(&puppet);
        let client = Client::new(puppet.clone());
        (puppet, client)
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    #[tokio::test]
    async fn test_ready_hydrates_room_and_members() {
        let (puppet, client) = setup();
        let room = client.room("R1");
        assert!(!room.is_ready());

        assert_ok!(room.ready(false).await);

        assert!(room.is_ready());
        assert_eq!(room.topic().as_deref(), Some("T"));
        assert!(client.contact("C1").is_ready());
        assert!(client.contact("C2").is_ready());

        let ops = puppet.operations();
        assert_eq!(&ops[..2], &["room_payload", "room_member_list"]);
        assert_eq!(puppet.call_count("contact_payload"), 2);
    }

    #[tokio::test]
    async fn test_ready_fast_path_makes_no_calls() {
        let (puppet, client) = setup();
        let room = client.room("R1");
        room.ready(false).await.unwrap();
        puppet.clear_calls();

        room.ready(false).await.unwrap();
        assert!(puppet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_force_sync_invalidates_before_fetch() {
        for prehydrate in [false, true] {
            let (puppet, client) = setup();
            let room = client.room("R1");
            if prehydrate {
                room.ready(false).await.unwrap();
                puppet.clear_calls();
            }

            room.ready(true).await.unwrap();

            let calls = puppet.calls();
            assert_eq!(
                &calls[..3],
                &[
                    PuppetCall::RoomPayloadDirty("R1".into()),
                    PuppetCall::RoomMemberPayloadDirty("R1".into()),
                    PuppetCall::RoomPayload("R1".into()),
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_force_sync_picks_up_new_payload() {
        let (puppet, client) = setup();
        let room = client.room("R1");
        room.ready(false).await.unwrap();

        puppet.insert_room(RoomPayload {
            id: "R1".into(),
            topic: "T2".into(),
            ..Default::default()
        });
        room.ready(false).await.unwrap();
        assert_eq!(room.topic().as_deref(), Some("T"));

        room.ready(true).await.unwrap();
        assert_eq!(room.topic().as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn test_missing_payload_leaves_room_unhydrated() {
        let (puppet, client) = setup();
        let room = client.room("nope");

        let err = room.ready(false).await.unwrap_err();
        assert!(matches!(
            err,
            ParlorError::MissingPayload { kind: "room", ref id } if id == "nope"
        ));
        assert!(!room.is_ready());
        // No member fetch after a missing payload.
        assert_eq!(puppet.call_count("room_member_list"), 0);
    }

    #[tokio::test]
    async fn test_force_sync_transport_failure_keeps_payload() {
        let (puppet, client) = setup();
        let room = client.room("R1");
        room.ready(false).await.unwrap();

        puppet.fail_on("room_payload", PuppetError::Timeout);
        let err = room.ready(true).await.unwrap_err();
        assert!(matches!(err, ParlorError::Puppet(PuppetError::Timeout)));
        assert!(room.is_ready());
        assert_eq!(room.topic().as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_force_sync_missing_payload_unhydrates() {
        let (puppet, client) = setup();
        let room = client.room("R1");
        room.ready(false).await.unwrap();

        puppet.remove_room("R1");
        let err = room.ready(true).await.unwrap_err();
        assert!(matches!(err, ParlorError::MissingPayload { kind: "room", .. }));
        assert!(!room.is_ready());
    }

    #[tokio::test]
    async fn test_invalidation_failure_aborts_hydration() {
        let (puppet, client) = setup();
        puppet.fail_on("room_member_payload_dirty", PuppetError::Timeout);
        let room = client.room("R1");

        let err = room.ready(true).await.unwrap_err();
        assert!(matches!(err, ParlorError::Puppet(PuppetError::Timeout)));
        assert_eq!(puppet.call_count("room_payload"), 0);
        assert!(!room.is_ready());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_unchanged() {
        let (puppet, client) = setup();
        puppet.fail_on("room_payload", PuppetError::api(500, "boom"));

        let err = client.room("R1").ready(false).await.unwrap_err();
        match err {
            ParlorError::Puppet(PuppetError::Api { code, message }) => {
                assert_eq!(code, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected puppet error, got {other:?}"),
        }
        // Never retried.
        assert_eq!(puppet.call_count("room_payload"), 1);
    }

    #[tokio::test]
    async fn test_cascade_failure_reports_every_failed_member() {
        let (puppet, client) = setup();
        puppet.insert_room(RoomPayload {
            id: "R1".into(),
            topic: "T".into(),
            member_ids: vec!["C1".into(), "C2".into(), "C3".into()],
            ..Default::default()
        });
        puppet.fail_on_target("contact_payload", "C2", PuppetError::Timeout);

        let room = client.room("R1");
        let err = room.ready(false).await.unwrap_err();

        let mut failed = err.failed_member_ids();
        failed.sort_unstable();
        // C2 times out, C3 has no payload at all.
        assert_eq!(failed, vec!["C2", "C3"]);
        // The room itself is hydrated; every member was attempted.
        assert!(room.is_ready());
        assert!(client.contact("C1").is_ready());
        assert_eq!(puppet.call_count("contact_payload"), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ready_coalesces() {
        let puppet = Arc::new(MockPuppet::new().with_latency(Duration::from_millis(20)));
        seed(&puppet);
        let client = Client::new(puppet.clone());
        let room = client.room("R1");

        let results = futures::future::join_all((0..8).map(|_| {
            let room = Arc::clone(&room);
            async move { room.ready(false).await }
        }))
        .await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(puppet.call_count("room_payload"), 1);
        assert_eq!(puppet.call_count("room_member_list"), 1);
    }

    #[tokio::test]
    async fn test_member_cascade_respects_concurrency_limit() {
        let puppet = Arc::new(MockPuppet::new());
        seed(&puppet);
        let client = Client::with_options(
            puppet.clone(),
            crate::ClientOptions {
                member_concurrency: 1,
                ..Default::default()
            },
        );

        assert_ok!(client.room("R1").ready(false).await);
        assert!(client.contact("C1").is_ready());
        assert!(client.contact("C2").is_ready());
    }

    // =========================================================================
    // Membership
    // =========================================================================

    #[tokio::test]
    async fn test_member_list_preserves_order() {
        let (puppet, client) = setup();
        puppet.insert_room(RoomPayload {
            id: "R2".into(),
            topic: "reversed".into(),
            member_ids: vec!["C2".into(), "C1".into()],
            ..Default::default()
        });
        let members = client.room("R2").member_list().await.unwrap();

        let ids: Vec<&str> = members.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["C2", "C1"]);
        assert!(Arc::ptr_eq(&members[0], &client.contact("C2")));
    }

    #[tokio::test]
    async fn test_member_all_preserves_order() {
        let (puppet, client) = setup();
        puppet.insert_room(RoomPayload {
            id: "R2".into(),
            topic: "reversed".into(),
            member_ids: vec!["C2".into(), "C1".into()],
            ..Default::default()
        });
        let room = client.room("R2");

        let all = room.member_all(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["C2", "C1"]);

        let matched = room
            .member_all(Some(&RoomMemberQueryFilter::default()))
            .await
            .unwrap();
        let ids: Vec<&str> = matched.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["C2", "C1"]);
    }

    #[tokio::test]
    async fn test_member_list_empty() {
        let (puppet, client) = setup();
        puppet.insert_room(RoomPayload {
            id: "R0".into(),
            topic: "empty".into(),
            ..Default::default()
        });

        let members = client.room("R0").member_list().await.unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn test_member_all_with_and_without_filter() {
        let (puppet, client) = setup();
        let room = client.room("R1");

        assert_eq!(room.member_all(None).await.unwrap().len(), 2);
        assert_eq!(puppet.call_count("room_member_search"), 0);

        let bobs = room
            .member_all(Some(&RoomMemberQueryFilter::name("bob")))
            .await
            .unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id(), "C2");
        assert_eq!(puppet.call_count("room_member_search"), 1);

        let nobody = room
            .member(&RoomMemberQueryFilter::name("carol"))
            .await
            .unwrap();
        assert!(nobody.is_none());
    }

    #[tokio::test]
    async fn test_alias() {
        let (puppet, client) = setup();
        puppet.set_member_alias("R1", "C1", "boss");
        let room = client.room("R1");

        assert_eq!(
            room.alias(&client.contact("C1")).await.unwrap().as_deref(),
            Some("boss")
        );
        // Member without an alias.
        assert_eq!(room.alias(&client.contact("C2")).await.unwrap(), None);
        // Not a member: no payload at all.
        assert_eq!(room.alias(&client.contact("C9")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_has_add_remove() {
        let (puppet, client) = setup();
        puppet.insert_contact(contact("C3", "carol"));
        let room = client.room("R1");
        let carol = client.contact("C3");

        assert!(!room.has(&carol).await.unwrap());
        room.add(&carol).await.unwrap();
        assert!(room.has(&carol).await.unwrap());
        room.remove(&carol).await.unwrap();
        assert!(!room.has(&carol).await.unwrap());

        assert_eq!(puppet.call_count("room_member_payload_dirty"), 2);
    }

    #[tokio::test]
    async fn test_owner_and_topic_management() {
        let (puppet, client) = setup();
        let room = client.room("R1");
        assert!(room.owner().unwrap().is_none());

        room.ready(false).await.unwrap();
        assert_eq!(room.owner().unwrap().unwrap().id(), "C1");
        assert_eq!(room.to_string(), "Room<T>");

        room.set_topic("New").await.unwrap();
        assert_eq!(room.topic().as_deref(), Some("New"));
        assert_eq!(puppet.call_count("room_payload_dirty"), 1);

        room.set_announce("rules").await.unwrap();
        assert_eq!(room.announce().await.unwrap(), "rules");

        room.quit().await.unwrap();
        assert_eq!(puppet.call_count("room_quit"), 1);
    }

    // =========================================================================
    // Sending
    // =========================================================================

    #[tokio::test]
    async fn test_say_text_returns_hydrated_message() {
        let (puppet, client) = setup();
        puppet.push_message_id("M1");

        let message = client.room("R1").say("hello").await.unwrap().unwrap();

        assert_eq!(message.id(), "M1");
        assert!(message.is_ready());
        assert_eq!(message.text().as_deref(), Some("hello"));
        assert!(Arc::ptr_eq(&message, &client.message("M1")));
        assert_eq!(
            puppet.calls()[0],
            PuppetCall::SendText {
                conversation_id: "R1".into(),
                text: "hello".into(),
                mention_ids: Vec::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_say_routes_each_variant() {
        let (puppet, client) = setup();
        let room = client.room("R1");

        let file = room
            .say(FileBox::from_url("a.png", "https://example.com/a.png"))
            .await
            .unwrap()
            .unwrap();
        let link = room
            .say(UrlLinkPayload::new("docs", "https://example.com"))
            .await
            .unwrap()
            .unwrap();
        let program = room
            .say(MiniProgramPayload {
                title: Some("app".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(file.kind(), Some(MessageKind::Attachment));
        assert_eq!(link.kind(), Some(MessageKind::Url));
        assert_eq!(program.kind(), Some(MessageKind::MiniProgram));
        assert_eq!(
            puppet
                .calls()
                .iter()
                .filter(|c| c.is_send())
                .map(PuppetCall::operation)
                .collect::<Vec<_>>(),
            vec![
                "message_send_file",
                "message_send_url",
                "message_send_mini_program"
            ]
        );
    }

    #[tokio::test]
    async fn test_say_without_message_id_resolves_none() {
        let (puppet, client) = setup();
        puppet.set_anonymous_sends(true);

        let result = client.room("R1").say("hello").await.unwrap();
        assert!(result.is_none());
        assert!(client.messages().is_empty());
    }

    #[tokio::test]
    async fn test_sent_but_unloadable_message_reports_failure() {
        let (puppet, client) = setup();
        puppet.set_forget_sent(true);
        puppet.push_message_id("M1");

        let err = assert_err!(client.room("R1").say("hello").await);
        assert!(err.is_missing_payload());
        // The send itself went through.
        assert_eq!(puppet.call_count("message_send_text"), 1);
    }

    #[tokio::test]
    async fn test_say_any_rejects_unsupported_without_sending() {
        let (puppet, client) = setup();
        let room = client.room("R1");

        let err = room.say_any(&3.5_f64).await.unwrap_err();
        assert!(matches!(err, ParlorError::UnsupportedContent { kind: "f64", .. }));
        assert!(puppet.calls().iter().all(|c| !c.is_send()));

        puppet.push_message_id("M2");
        let message = room.say_any(&String::from("dynamic")).await.unwrap().unwrap();
        assert_eq!(message.id(), "M2");
    }

    #[tokio::test]
    async fn test_say_to_mentions_by_alias_then_name() {
        let (puppet, client) = setup();
        puppet.set_member_alias("R1", "C1", "boss");
        let room = client.room("R1");

        room.say_to("hi", &[client.contact("C1"), client.contact("C2")])
            .await
            .unwrap();

        let send = puppet
            .calls()
            .into_iter()
            .find(PuppetCall::is_send)
            .unwrap();
        assert_eq!(
            send,
            PuppetCall::SendText {
                conversation_id: "R1".into(),
                text: "@boss\u{2005}@bob\u{2005}hi".into(),
                mention_ids: vec!["C1".into(), "C2".into()],
            }
        );
    }

    #[tokio::test]
    async fn test_say_to_rejects_non_text() {
        let (puppet, client) = setup();
        let room = client.room("R1");

        let err = room
            .say_to(
                UrlLinkPayload::new("docs", "https://example.com"),
                &[client.contact("C1")],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParlorError::UnsupportedContent {
                kind: "url_link",
                ..
            }
        ));
        assert!(puppet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_say_to_without_mentions_is_plain_say() {
        let (puppet, client) = setup();
        let room = client.room("R1");

        room.say_to(UrlLinkPayload::new("docs", "https://example.com"), &[])
            .await
            .unwrap();
        assert_eq!(puppet.call_count("message_send_url"), 1);
    }
}
