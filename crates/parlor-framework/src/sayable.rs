//! Outbound content and its dispatch.
//!
//! [`Sayable`] is the closed set of things a conversation can be sent. Each
//! variant maps to exactly one puppet send operation:
//!
//! | Variant | Puppet operation |
//! |---------|------------------|
//! | `Text` | `message_send_text` |
//! | `File` | `message_send_file` |
//! | `UrlLink` | `message_send_url` |
//! | `MiniProgram` | `message_send_mini_program` |
//!
//! The send returns a message id which is exchanged for a hydrated
//! [`Message`] through the client's message cache.

use std::any::{Any, type_name};
use std::sync::Arc;

use tracing::debug;

use crate::client::Client;
use crate::error::{ParlorError, ParlorResult};
use crate::message::Message;
use parlor_core::{FileBox, MiniProgramPayload, UrlLinkPayload};

/// Content that can be sent to a room or contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sayable {
    /// Plain text.
    Text(String),
    /// A file attachment.
    File(FileBox),
    /// A shareable link card.
    UrlLink(UrlLinkPayload),
    /// A mini-program card.
    MiniProgram(MiniProgramPayload),
}

impl Sayable {
    /// Returns the content kind as a static string.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::File(_) => "file",
            Self::UrlLink(_) => "url_link",
            Self::MiniProgram(_) => "mini_program",
        }
    }

    /// Returns the text if this is a text variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Converts a dynamically typed value into content.
    ///
    /// Accepts `String`, `&'static str`, [`FileBox`], [`UrlLinkPayload`],
    /// [`MiniProgramPayload`] and `Sayable` itself. Anything else fails with
    /// [`ParlorError::UnsupportedContent`] naming the rejected type.
    pub fn from_any<T: Any>(value: &T) -> ParlorResult<Self> {
        let value = value as &dyn Any;

        if let Some(sayable) = value.downcast_ref::<Sayable>() {
            Ok(sayable.clone())
        } else if let Some(text) = value.downcast_ref::<String>() {
            Ok(Self::Text(text.clone()))
        } else if let Some(text) = value.downcast_ref::<&'static str>() {
            Ok(Self::Text((*text).to_string()))
        } else if let Some(file) = value.downcast_ref::<FileBox>() {
            Ok(Self::File(file.clone()))
        } else if let Some(link) = value.downcast_ref::<UrlLinkPayload>() {
            Ok(Self::UrlLink(link.clone()))
        } else if let Some(program) = value.downcast_ref::<MiniProgramPayload>() {
            Ok(Self::MiniProgram(program.clone()))
        } else {
            Err(ParlorError::unsupported(
                type_name::<T>(),
                "no send route for this content type",
            ))
        }
    }
}

impl From<String> for Sayable {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Sayable {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<FileBox> for Sayable {
    fn from(file: FileBox) -> Self {
        Self::File(file)
    }
}

impl From<UrlLinkPayload> for Sayable {
    fn from(link: UrlLinkPayload) -> Self {
        Self::UrlLink(link)
    }
}

impl From<MiniProgramPayload> for Sayable {
    fn from(program: MiniProgramPayload) -> Self {
        Self::MiniProgram(program)
    }
}

/// Sends `content` to `conversation_id` and loads the resulting message.
///
/// A send that yields no message id resolves to `Ok(None)`. A message that
/// was sent but fails to hydrate returns the hydration error even though the
/// remote side already has it.
pub(crate) async fn dispatch(
    client: &Client,
    conversation_id: &str,
    content: &Sayable,
    mention_ids: &[String],
) -> ParlorResult<Option<Arc<Message>>> {
    let puppet = client.puppet();
    let message_id = match content {
        Sayable::Text(text) => {
            puppet
                .message_send_text(conversation_id, text, mention_ids)
                .await?
        }
        Sayable::File(file) => puppet.message_send_file(conversation_id, file).await?,
        Sayable::UrlLink(link) => puppet.message_send_url(conversation_id, link).await?,
        Sayable::MiniProgram(program) => {
            puppet
                .message_send_mini_program(conversation_id, program)
                .await?
        }
    };

    let Some(message_id) = message_id else {
        debug!(
            conversation_id = %conversation_id,
            kind = content.kind(),
            "Send returned no message id, nothing to load"
        );
        return Ok(None);
    };

    debug!(
        conversation_id = %conversation_id,
        message_id = %message_id,
        kind = content.kind(),
        "Message sent"
    );

    let message = client.message(&message_id);
    message.ready(false).await?;
    Ok(Some(message))
}
