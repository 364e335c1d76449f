use std::time::Duration;

use {
    pixbot_common::InboundMessage,
    pixbot_config::TelegramConfig,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tokio::{sync::mpsc, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    error::{Error, Result},
    inbound::to_inbound,
};

/// Delay before retrying a failed `getUpdates`.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Build a bot whose HTTP timeout outlasts the long-polling timeout.
pub fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let token = config
        .token
        .as_ref()
        .ok_or_else(|| Error::message("telegram token is not configured (set TELEGRAM_TOKEN)"))?;
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + 15))
        .build()?;
    Ok(Bot::with_client(token.expose_secret(), client))
}

/// Verify the bot, clear any webhook, and spawn the long-polling loop.
///
/// Every `message` and `edited_message` update is converted and pushed into
/// `tx`. The loop ends when `cancel` fires, the receiver is dropped, or
/// another instance takes over the token.
pub async fn start_polling(
    bot: Bot,
    poll_timeout_secs: u32,
    tx: mpsc::Sender<InboundMessage>,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;
    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    Ok(tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = bot
                    .get_updates()
                    .offset(offset)
                    .timeout(poll_timeout_secs)
                    .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::EditedMessage])
                    .send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        let msg = match update.kind {
                            UpdateKind::Message(msg) | UpdateKind::EditedMessage(msg) => msg,
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                                continue;
                            },
                        };
                        match to_inbound(&msg) {
                            Ok(inbound) => {
                                if tx.send(inbound).await.is_err() {
                                    info!("inbound channel closed, telegram polling stopped");
                                    return;
                                }
                            },
                            Err(e) => {
                                error!(chat_id = msg.chat.id.0, error = %e, "failed to convert telegram message");
                            },
                        }
                    }
                },
                Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                    warn!("telegram polling disabled: another instance is already running with this token");
                    cancel.cancel();
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {},
                    }
                },
            }
        }
        info!("telegram polling stopped");
    }))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    #[test]
    fn missing_token_is_an_error() {
        let err = build_bot(&TelegramConfig::default()).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_TOKEN"));
    }

    #[test]
    fn bot_uses_configured_token() {
        let config = TelegramConfig {
            token: Some(Secret::new("123:abc".to_string())),
            ..Default::default()
        };
        assert_eq!(build_bot(&config).unwrap().token(), "123:abc");
    }
}
