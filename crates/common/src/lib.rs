//! Shared types, error definitions, and utilities used across all pixbot crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{Chat, ChatId, InboundMessage, PhotoSize, RepliedMessage},
};
