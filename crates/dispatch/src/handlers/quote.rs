use std::sync::Arc;

use {async_trait::async_trait, pixbot_common::InboundMessage, tracing::debug};

use crate::{
    error::{Error, Result},
    handlers::{RoleHandler, Services},
    ports::TextMessage,
    role::Role,
};

/// Replies carrying exactly this text are not quoted back.
pub const QUOTE_OPT_OUT: &str = "Please don't quote me";

/// Sends the text back as a reply to the originating message.
#[derive(Clone)]
pub struct QuoteHandler {
    services: Arc<Services>,
}

impl QuoteHandler {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl RoleHandler for QuoteHandler {
    fn role(&self) -> Role {
        Role::Quote
    }

    async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        let text = msg.text.as_deref().ok_or(Error::EmptyMessage)?;
        if text == QUOTE_OPT_OUT {
            debug!(chat_id = %msg.chat_id(), "quote opt-out");
            return Ok(());
        }
        self.services
            .transport
            .send_text(msg.chat_id(), TextMessage::quoting(text, msg.message_id))
            .await
    }
}
