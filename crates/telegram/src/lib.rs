//! Telegram transport for pixbot.
//!
//! Long-polls the Bot API with teloxide, converts updates into
//! [`pixbot_common::InboundMessage`]s, and implements the dispatcher's
//! [`pixbot_dispatch::Transport`] port for replies and file downloads.

pub mod bot;
pub mod error;
pub mod inbound;
pub mod outbound;

pub use {
    bot::{build_bot, start_polling},
    error::{Error, Result},
    inbound::to_inbound,
    outbound::TelegramTransport,
};
