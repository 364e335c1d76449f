use std::sync::Arc;

use {async_trait::async_trait, pixbot_common::InboundMessage, tracing::debug};

use crate::{
    error::{Error, Result},
    handlers::{RoleHandler, Services},
    ports::TextMessage,
    role::Role,
};

/// Words that trigger the help text.
const GREETINGS: [&str; 3] = ["start", "help", "hello"];

pub const HELP_TEXT: &str = "\
Welcome to the Image Processing Bot!

Send an image with a caption naming the action to apply.

*NOTE:* Type the words and numbers out. *Concat* needs two images sent together.

Available actions:
1. *Blur* - box blur, optionally with a level (default 16)
    *example: blur 10*
2. *Contour* - highlights edges along each row
    *example: contour*
3. *Rotate* - *clockwise* or *anti-clockwise* (default *clockwise*) by *90*, *180* or *270* degrees (default *90*)
    *example: rotate anti-clockwise 180*
4. *Salt and pepper* - sprinkles random white and black pixels; the level is the fraction of pixels affected (default 0.05)
    *example: salt and pepper 0.1*
5. *Concat* - joins two images
    horizontal: *right-to-left*, *left-to-right*
    vertical: *top-to-bottom*, *bottom-to-top*
    *example: concat vertical top-to-bottom*
6. *Segment* - black and white threshold to separate objects from background
    *example: segment*
7. *Predict* - identifies objects in the image
    *example: predict*
";

/// Echo role: greets on start/help/hello, otherwise echoes the text back.
#[derive(Clone)]
pub struct PlainHandler {
    services: Arc<Services>,
}

impl PlainHandler {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl RoleHandler for PlainHandler {
    fn role(&self) -> Role {
        Role::Plain
    }

    async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        let chat_id = msg.chat_id();
        let text = msg.text.as_deref().ok_or(Error::EmptyMessage)?;
        let lowered = text.to_lowercase();

        let reply = if GREETINGS.iter().any(|g| lowered.contains(g)) {
            debug!(%chat_id, "sending help text");
            TextMessage::markdown(HELP_TEXT)
        } else {
            TextMessage::plain(format!("Your original message: {text}"))
        };
        self.services.transport.send_text(chat_id, reply).await
    }
}
