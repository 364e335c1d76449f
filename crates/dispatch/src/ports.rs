//! Collaborator interfaces the dispatcher drives.
//!
//! Implementations live outside the core: the Telegram transport in
//! `pixbot-telegram`, filesystem and in-memory stand-ins in [`crate::local`].

use std::{path::Path, time::Duration};

use {async_trait::async_trait, pixbot_common::ChatId};

use crate::{error::Result, prediction::PredictionRecord};

/// Outgoing text with delivery options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub text: String,
    /// Quote the message with this id.
    pub reply_to: Option<i32>,
    pub markdown: bool,
}

impl TextMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_to: None,
            markdown: false,
        }
    }

    pub fn quoting(text: impl Into<String>, message_id: i32) -> Self {
        Self {
            reply_to: Some(message_id),
            ..Self::plain(text)
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            markdown: true,
            ..Self::plain(text)
        }
    }
}

/// A file known to the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub file_id: String,
    /// Transport-relative path, e.g. `photos/file_3.jpg`.
    pub file_path: String,
}

/// Chat delivery and file retrieval.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, message: TextMessage) -> Result<()>;

    async fn send_image(&self, chat_id: ChatId, path: &Path, caption: Option<&str>) -> Result<()>;

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile>;

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>>;
}

/// Object storage. Success carries a human-readable detail string.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<String>;

    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<String>;
}

/// A received queue message and the handle used to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub body: String,
    pub receipt: String,
}

#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Returns a detail string naming the new message.
    async fn enqueue(&self, queue: &str, payload: &str) -> Result<String>;

    /// Wait up to `wait` for a message.
    async fn receive(&self, queue: &str, wait: Duration) -> Result<Option<QueueMessage>>;

    async fn ack(&self, queue: &str, receipt: &str) -> Result<()>;
}

#[async_trait]
pub trait ResultLookup: Send + Sync {
    async fn get_by_id(&self, prediction_id: &str) -> Result<PredictionRecord>;
}
