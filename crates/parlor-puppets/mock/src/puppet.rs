//! In-memory [`Puppet`] implementation.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::call::PuppetCall;
use parlor_core::{
    ContactPayload, FileBox, MessageKind, MessagePayload, MiniProgramPayload, Puppet, PuppetError,
    PuppetResult, RoomMemberPayload, RoomMemberQueryFilter, RoomPayload, RoomQueryFilter,
    UrlLinkPayload,
};

/// A failure injected for one operation, optionally restricted to one target id.
#[derive(Debug, Clone)]
struct FailureRule {
    operation: &'static str,
    target: Option<String>,
    error: PuppetError,
}

#[derive(Default)]
struct MockState {
    rooms: HashMap<String, RoomPayload>,
    /// Room ids in insertion order; search results follow it.
    room_order: Vec<String>,
    /// Member payloads keyed by (room id, contact id).
    members: HashMap<(String, String), RoomMemberPayload>,
    announcements: HashMap<String, String>,
    contacts: HashMap<String, ContactPayload>,
    messages: HashMap<String, MessagePayload>,
    calls: Vec<PuppetCall>,
    failures: Vec<FailureRule>,
    /// Ids handed out by the next send calls, before falling back to UUIDs.
    next_message_ids: VecDeque<String>,
    /// When set, sends return no message id.
    anonymous_sends: bool,
    /// When set, sent messages are not stored, so they cannot be loaded.
    forget_sent: bool,
}

impl MockState {
    fn failure_for(&self, call: &PuppetCall) -> Option<PuppetError> {
        self.failures
            .iter()
            .find(|rule| {
                rule.operation == call.operation()
                    && rule
                        .target
                        .as_deref()
                        .is_none_or(|target| Some(target) == call.target())
            })
            .map(|rule| rule.error.clone())
    }
}

/// An in-memory puppet with call recording and failure injection.
///
/// Every call is appended to a log (see [`calls`](Self::calls)) before it is
/// served, including calls that fail, so tests can assert both on results
/// and on the exact sequence of transport operations.
///
/// # Example
///
/// ```rust,ignore
/// let puppet = MockPuppet::new();
/// puppet.insert_contact(ContactPayload { id: "C1".into(), name: "alice".into(), ..Default::default() });
/// puppet.insert_room(RoomPayload {
///     id: "R1".into(),
///     topic: "T".into(),
///     member_ids: vec!["C1".into()],
///     ..Default::default()
/// });
/// puppet.fail_on("room_payload", PuppetError::Timeout);
/// ```
pub struct MockPuppet {
    name: String,
    /// The account id used as talker of sent messages.
    self_id: String,
    latency: Option<Duration>,
    state: Mutex<MockState>,
}

impl MockPuppet {
    /// Creates an empty mock puppet.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            self_id: "self".to_string(),
            latency: None,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Sets the puppet name reported to logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the id of the logged-in account.
    pub fn with_self_id(mut self, id: impl Into<String>) -> Self {
        self.self_id = id.into();
        self
    }

    /// Delays every call by `latency`, so concurrent callers actually overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns the id of the logged-in account.
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    /// Stores a room payload. Its `member_ids` drive the member list.
    ///
    /// Room search returns ids in the order rooms were first inserted.
    pub fn insert_room(&self, payload: RoomPayload) {
        let mut state = self.state.lock();
        if !state.rooms.contains_key(&payload.id) {
            state.room_order.push(payload.id.clone());
        }
        state.rooms.insert(payload.id.clone(), payload);
    }

    /// Removes a stored room, so its payload loads as missing.
    pub fn remove_room(&self, id: &str) {
        let mut state = self.state.lock();
        state.rooms.remove(id);
        state.room_order.retain(|room_id| room_id != id);
    }

    /// Stores a contact payload.
    pub fn insert_contact(&self, payload: ContactPayload) {
        self.state
            .lock()
            .contacts
            .insert(payload.id.clone(), payload);
    }

    /// Stores a message payload.
    pub fn insert_message(&self, payload: MessagePayload) {
        self.state
            .lock()
            .messages
            .insert(payload.id.clone(), payload);
    }

    /// Sets the alias a contact uses in a room.
    pub fn set_member_alias(&self, room_id: &str, contact_id: &str, alias: impl Into<String>) {
        let mut state = self.state.lock();
        let name = state
            .contacts
            .get(contact_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let entry = state
            .members
            .entry((room_id.to_string(), contact_id.to_string()))
            .or_insert_with(|| RoomMemberPayload {
                id: contact_id.to_string(),
                name,
                ..Default::default()
            });
        entry.room_alias = Some(alias.into());
    }

    /// Queues the id the next send call will return.
    pub fn push_message_id(&self, id: impl Into<String>) {
        self.state.lock().next_message_ids.push_back(id.into());
    }

    /// Makes send calls succeed without returning a message id.
    pub fn set_anonymous_sends(&self, enabled: bool) {
        self.state.lock().anonymous_sends = enabled;
    }

    /// Makes sent messages unloadable: sends succeed but the payload is not stored.
    pub fn set_forget_sent(&self, enabled: bool) {
        self.state.lock().forget_sent = enabled;
    }

    /// Fails every call of `operation` with `error`.
    pub fn fail_on(&self, operation: &'static str, error: PuppetError) {
        self.state.lock().failures.push(FailureRule {
            operation,
            target: None,
            error,
        });
    }

    /// Fails calls of `operation` about `target` with `error`.
    pub fn fail_on_target(&self, operation: &'static str, target: &str, error: PuppetError) {
        self.state.lock().failures.push(FailureRule {
            operation,
            target: Some(target.to_string()),
            error,
        });
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Returns every recorded call in arrival order.
    pub fn calls(&self) -> Vec<PuppetCall> {
        self.state.lock().calls.clone()
    }

    /// Returns the recorded operation names in arrival order.
    pub fn operations(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .calls
            .iter()
            .map(PuppetCall::operation)
            .collect()
    }

    /// Returns how many times `operation` was called.
    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Returns a stored room payload.
    pub fn room(&self, id: &str) -> Option<RoomPayload> {
        self.state.lock().rooms.get(id).cloned()
    }

    /// Returns a stored message payload.
    pub fn message(&self, id: &str) -> Option<MessagePayload> {
        self.state.lock().messages.get(id).cloned()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Records the call, waits out the configured latency, then applies injected failures.
    async fn enter(&self, call: PuppetCall) -> PuppetResult<()> {
        trace!(puppet = %self.name, call = %call, "Mock puppet call");
        let failure = {
            let mut state = self.state.lock();
            let failure = state.failure_for(&call);
            state.calls.push(call);
            failure
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn record_sent(&self, conversation_id: &str, payload: MessagePayload) -> Option<String> {
        let mut state = self.state.lock();
        if state.anonymous_sends {
            return None;
        }

        let id = state
            .next_message_ids
            .pop_front()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let is_room = state.rooms.contains_key(conversation_id);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let payload = MessagePayload {
            id: id.clone(),
            talker_id: Some(self.self_id.clone()),
            room_id: is_room.then(|| conversation_id.to_string()),
            listener_id: (!is_room).then(|| conversation_id.to_string()),
            timestamp,
            ..payload
        };

        debug!(puppet = %self.name, message_id = %id, kind = %payload.kind, "Mock message sent");
        if !state.forget_sent {
            state.messages.insert(id.clone(), payload);
        }
        Some(id)
    }

    fn member_matches(
        state: &MockState,
        room_id: &str,
        contact_id: &str,
        filter: &RoomMemberQueryFilter,
    ) -> bool {
        let contact = state.contacts.get(contact_id);
        let member = state
            .members
            .get(&(room_id.to_string(), contact_id.to_string()));

        let name_ok = filter
            .name
            .as_ref()
            .is_none_or(|name| contact.is_some_and(|c| c.name == *name));
        let room_alias_ok = filter.room_alias.as_ref().is_none_or(|alias| {
            member.is_some_and(|m| m.room_alias.as_deref() == Some(alias.as_str()))
        });
        let contact_alias_ok = filter.contact_alias.as_ref().is_none_or(|alias| {
            contact.is_some_and(|c| c.alias.as_deref() == Some(alias.as_str()))
        });

        name_ok && room_alias_ok && contact_alias_ok
    }
}

impl Default for MockPuppet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Puppet for MockPuppet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PuppetResult<()> {
        self.enter(PuppetCall::Start).await
    }

    async fn stop(&self) -> PuppetResult<()> {
        self.enter(PuppetCall::Stop).await
    }

    async fn room_payload(&self, room_id: &str) -> PuppetResult<Option<RoomPayload>> {
        self.enter(PuppetCall::RoomPayload(room_id.to_string()))
            .await?;
        Ok(self.state.lock().rooms.get(room_id).cloned())
    }

    async fn room_payload_dirty(&self, room_id: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::RoomPayloadDirty(room_id.to_string()))
            .await
    }

    async fn room_member_payload_dirty(&self, room_id: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::RoomMemberPayloadDirty(room_id.to_string()))
            .await
    }

    async fn room_member_list(&self, room_id: &str) -> PuppetResult<Vec<String>> {
        self.enter(PuppetCall::RoomMemberList(room_id.to_string()))
            .await?;
        Ok(self
            .state
            .lock()
            .rooms
            .get(room_id)
            .map(|room| room.member_ids.clone())
            .unwrap_or_default())
    }

    async fn room_member_search(
        &self,
        room_id: &str,
        filter: &RoomMemberQueryFilter,
    ) -> PuppetResult<Vec<String>> {
        self.enter(PuppetCall::RoomMemberSearch(room_id.to_string()))
            .await?;
        let state = self.state.lock();
        let Some(room) = state.rooms.get(room_id) else {
            return Ok(Vec::new());
        };
        Ok(room
            .member_ids
            .iter()
            .filter(|id| Self::member_matches(&state, room_id, id, filter))
            .cloned()
            .collect())
    }

    async fn room_member_payload(
        &self,
        room_id: &str,
        contact_id: &str,
    ) -> PuppetResult<Option<RoomMemberPayload>> {
        self.enter(PuppetCall::RoomMemberPayload {
            room_id: room_id.to_string(),
            contact_id: contact_id.to_string(),
        })
        .await?;

        let state = self.state.lock();
        let key = (room_id.to_string(), contact_id.to_string());
        if let Some(member) = state.members.get(&key) {
            return Ok(Some(member.clone()));
        }

        // Members without an explicit record still have a payload, just no alias.
        let is_member = state
            .rooms
            .get(room_id)
            .is_some_and(|room| room.member_ids.iter().any(|id| id == contact_id));
        Ok(is_member.then(|| RoomMemberPayload {
            id: contact_id.to_string(),
            name: state
                .contacts
                .get(contact_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            ..Default::default()
        }))
    }

    async fn room_search(&self, filter: &RoomQueryFilter) -> PuppetResult<Vec<String>> {
        self.enter(PuppetCall::RoomSearch).await?;
        let state = self.state.lock();
        Ok(state
            .room_order
            .iter()
            .filter_map(|id| state.rooms.get(id))
            .filter(|room| filter.matches(room))
            .map(|room| room.id.clone())
            .collect())
    }

    async fn room_create(&self, contact_ids: &[String], topic: Option<&str>) -> PuppetResult<String> {
        self.enter(PuppetCall::RoomCreate {
            contact_ids: contact_ids.to_vec(),
        })
        .await?;

        let id = format!("room-{}", uuid::Uuid::new_v4());
        let mut member_ids = contact_ids.to_vec();
        if !member_ids.contains(&self.self_id) {
            member_ids.push(self.self_id.clone());
        }
        self.insert_room(RoomPayload {
            id: id.clone(),
            topic: topic.unwrap_or_default().to_string(),
            owner_id: Some(self.self_id.clone()),
            member_ids,
            ..Default::default()
        });
        Ok(id)
    }

    async fn room_add(&self, room_id: &str, contact_id: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::RoomAdd {
            room_id: room_id.to_string(),
            contact_id: contact_id.to_string(),
        })
        .await?;

        let mut state = self.state.lock();
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| PuppetError::api(404, format!("room '{room_id}' not found")))?;
        if !room.member_ids.iter().any(|id| id == contact_id) {
            room.member_ids.push(contact_id.to_string());
        }
        Ok(())
    }

    async fn room_del(&self, room_id: &str, contact_id: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::RoomDel {
            room_id: room_id.to_string(),
            contact_id: contact_id.to_string(),
        })
        .await?;

        let mut state = self.state.lock();
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| PuppetError::api(404, format!("room '{room_id}' not found")))?;
        room.member_ids.retain(|id| id != contact_id);
        Ok(())
    }

    async fn room_quit(&self, room_id: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::RoomQuit(room_id.to_string())).await?;
        let mut state = self.state.lock();
        if let Some(room) = state.rooms.get_mut(room_id) {
            let self_id = self.self_id.as_str();
            room.member_ids.retain(|id| id != self_id);
        }
        Ok(())
    }

    async fn room_topic_set(&self, room_id: &str, topic: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::RoomTopicSet {
            room_id: room_id.to_string(),
            topic: topic.to_string(),
        })
        .await?;

        let mut state = self.state.lock();
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| PuppetError::api(404, format!("room '{room_id}' not found")))?;
        room.topic = topic.to_string();
        Ok(())
    }

    async fn room_announce(&self, room_id: &str) -> PuppetResult<String> {
        self.enter(PuppetCall::RoomAnnounce(room_id.to_string()))
            .await?;
        Ok(self
            .state
            .lock()
            .announcements
            .get(room_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn room_announce_set(&self, room_id: &str, text: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::RoomAnnounceSet {
            room_id: room_id.to_string(),
            text: text.to_string(),
        })
        .await?;
        self.state
            .lock()
            .announcements
            .insert(room_id.to_string(), text.to_string());
        Ok(())
    }

    async fn contact_payload(&self, contact_id: &str) -> PuppetResult<Option<ContactPayload>> {
        self.enter(PuppetCall::ContactPayload(contact_id.to_string()))
            .await?;
        Ok(self.state.lock().contacts.get(contact_id).cloned())
    }

    async fn contact_payload_dirty(&self, contact_id: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::ContactPayloadDirty(contact_id.to_string()))
            .await
    }

    async fn message_payload(&self, message_id: &str) -> PuppetResult<Option<MessagePayload>> {
        self.enter(PuppetCall::MessagePayload(message_id.to_string()))
            .await?;
        Ok(self.state.lock().messages.get(message_id).cloned())
    }

    async fn message_payload_dirty(&self, message_id: &str) -> PuppetResult<()> {
        self.enter(PuppetCall::MessagePayloadDirty(message_id.to_string()))
            .await
    }

    async fn message_send_text(
        &self,
        conversation_id: &str,
        text: &str,
        mention_ids: &[String],
    ) -> PuppetResult<Option<String>> {
        self.enter(PuppetCall::SendText {
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
            mention_ids: mention_ids.to_vec(),
        })
        .await?;
        Ok(self.record_sent(
            conversation_id,
            MessagePayload {
                kind: MessageKind::Text,
                text: Some(text.to_string()),
                mention_ids: mention_ids.to_vec(),
                ..Default::default()
            },
        ))
    }

    async fn message_send_file(
        &self,
        conversation_id: &str,
        file: &FileBox,
    ) -> PuppetResult<Option<String>> {
        self.enter(PuppetCall::SendFile {
            conversation_id: conversation_id.to_string(),
            name: file.name.clone(),
        })
        .await?;
        Ok(self.record_sent(
            conversation_id,
            MessagePayload {
                kind: MessageKind::Attachment,
                filename: Some(file.name.clone()),
                ..Default::default()
            },
        ))
    }

    async fn message_send_url(
        &self,
        conversation_id: &str,
        payload: &UrlLinkPayload,
    ) -> PuppetResult<Option<String>> {
        self.enter(PuppetCall::SendUrl {
            conversation_id: conversation_id.to_string(),
            url: payload.url.clone(),
        })
        .await?;
        Ok(self.record_sent(
            conversation_id,
            MessagePayload {
                kind: MessageKind::Url,
                text: Some(payload.title.clone()),
                ..Default::default()
            },
        ))
    }

    async fn message_send_mini_program(
        &self,
        conversation_id: &str,
        payload: &MiniProgramPayload,
    ) -> PuppetResult<Option<String>> {
        self.enter(PuppetCall::SendMiniProgram {
            conversation_id: conversation_id.to_string(),
        })
        .await?;
        Ok(self.record_sent(
            conversation_id,
            MessagePayload {
                kind: MessageKind::MiniProgram,
                text: payload.title.clone(),
                ..Default::default()
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MockPuppet {
        let puppet = MockPuppet::new();
        puppet.insert_contact(ContactPayload {
            id: "C1".into(),
            name: "alice".into(),
            ..Default::default()
        });
        puppet.insert_contact(ContactPayload {
            id: "C2".into(),
            name: "bob".into(),
            alias: Some("bobby".into()),
            ..Default::default()
        });
        puppet.insert_room(RoomPayload {
            id: "R1".into(),
            topic: "T".into(),
            member_ids: vec!["C1".into(), "C2".into()],
            ..Default::default()
        });
        puppet
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let puppet = fixture();
        puppet.room_payload_dirty("R1").await.unwrap();
        puppet.room_payload("R1").await.unwrap();

        assert_eq!(
            puppet.calls(),
            vec![
                PuppetCall::RoomPayloadDirty("R1".into()),
                PuppetCall::RoomPayload("R1".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_rules_are_scoped_to_target() {
        let puppet = fixture();
        puppet.fail_on_target("contact_payload", "C2", PuppetError::Timeout);

        assert!(puppet.contact_payload("C1").await.unwrap().is_some());
        assert!(matches!(
            puppet.contact_payload("C2").await,
            Err(PuppetError::Timeout)
        ));
        // Failed calls are still recorded.
        assert_eq!(puppet.call_count("contact_payload"), 2);
    }

    #[tokio::test]
    async fn test_member_search_filters() {
        let puppet = fixture();
        puppet.set_member_alias("R1", "C1", "the-alice");

        let by_name = puppet
            .room_member_search("R1", &RoomMemberQueryFilter::name("bob"))
            .await
            .unwrap();
        assert_eq!(by_name, vec!["C2".to_string()]);

        let by_alias = puppet
            .room_member_search("R1", &RoomMemberQueryFilter::room_alias("the-alice"))
            .await
            .unwrap();
        assert_eq!(by_alias, vec!["C1".to_string()]);

        let by_contact_alias = puppet
            .room_member_search(
                "R1",
                &RoomMemberQueryFilter {
                    contact_alias: Some("bobby".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_contact_alias, vec!["C2".to_string()]);
    }

    #[tokio::test]
    async fn test_send_uses_queued_id_and_stores_message() {
        let puppet = fixture();
        puppet.push_message_id("M1");

        let id = puppet
            .message_send_text("R1", "hello", &[])
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("M1"));

        let stored = puppet.message("M1").unwrap();
        assert_eq!(stored.kind, MessageKind::Text);
        assert_eq!(stored.room_id.as_deref(), Some("R1"));
        assert_eq!(stored.talker_id.as_deref(), Some("self"));
    }

    #[tokio::test]
    async fn test_anonymous_sends_return_none() {
        let puppet = fixture();
        puppet.set_anonymous_sends(true);

        let id = puppet
            .message_send_url("R1", &UrlLinkPayload::new("t", "https://example.com"))
            .await
            .unwrap();
        assert!(id.is_none());
    }

    #[tokio::test]
    async fn test_room_search_follows_insertion_order() {
        let puppet = fixture();
        puppet.insert_room(RoomPayload {
            id: "R0".into(),
            topic: "T".into(),
            ..Default::default()
        });
        // Replacing a payload keeps its original position.
        puppet.insert_room(RoomPayload {
            id: "R1".into(),
            topic: "T".into(),
            ..Default::default()
        });

        let ids = puppet
            .room_search(&RoomQueryFilter::topic("T"))
            .await
            .unwrap();
        assert_eq!(ids, vec!["R1".to_string(), "R0".to_string()]);

        puppet.remove_room("R1");
        let ids = puppet
            .room_search(&RoomQueryFilter::topic("T"))
            .await
            .unwrap();
        assert_eq!(ids, vec!["R0".to_string()]);
        assert!(puppet.room_payload("R1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_calls_can_fail() {
        let puppet = fixture();
        puppet.fail_on("stop", PuppetError::NotConnected);

        puppet.start().await.unwrap();
        assert!(matches!(puppet.stop().await, Err(PuppetError::NotConnected)));
        assert_eq!(puppet.calls(), vec![PuppetCall::Start, PuppetCall::Stop]);
    }
}
