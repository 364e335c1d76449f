//! Inbound message model.
//!
//! Mirrors the subset of the Telegram `Message` object the dispatcher reads:
//! `{chat: {id}, text?, caption?, photo?, reply_to_message?, media_group_id?, message_id}`.
//! Unknown fields are ignored on deserialization.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Identifier of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|source| Error::InvalidChatId {
                value: s.to_string(),
                source,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// One resolution of an uploaded photo. Telegram lists them smallest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// The message being replied to. Only its presence matters to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepliedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: i32,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<RepliedMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,
}

impl InboundMessage {
    /// A plain text message, mostly useful for tests and the load-test endpoint.
    pub fn text(chat_id: i64, message_id: i32, text: impl Into<String>) -> Self {
        Self {
            message_id,
            chat: Chat {
                id: ChatId(chat_id),
            },
            text: Some(text.into()),
            caption: None,
            photo: None,
            reply_to_message: None,
            media_group_id: None,
        }
    }

    /// A single-resolution photo message with an optional caption.
    pub fn photo(chat_id: i64, message_id: i32, file_id: impl Into<String>) -> Self {
        Self {
            message_id,
            chat: Chat {
                id: ChatId(chat_id),
            },
            text: None,
            caption: None,
            photo: Some(vec![PhotoSize {
                file_id: file_id.into(),
                width: None,
                height: None,
            }]),
            reply_to_message: None,
            media_group_id: None,
        }
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub fn in_media_group(mut self, group_id: impl Into<String>) -> Self {
        self.media_group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn replying_to(mut self, message_id: i32) -> Self {
        self.reply_to_message = Some(Box::new(RepliedMessage {
            message_id: Some(message_id),
        }));
        self
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat.id
    }

    /// Caption trimmed and lower-cased; empty when absent.
    pub fn normalized_caption(&self) -> String {
        self.caption
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_default()
    }

    pub fn is_reply(&self) -> bool {
        self.reply_to_message.is_some()
    }

    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    /// The largest available resolution (the last entry).
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo.as_deref().and_then(<[PhotoSize]>::last)
    }

    pub fn media_group(&self) -> Option<&str> {
        self.media_group_id.as_deref()
    }
}
