//! Replies and file downloads through the Bot API.

use std::path::Path;

use {
    async_trait::async_trait,
    pixbot_common::ChatId,
    pixbot_dispatch::{RemoteFile, TextMessage, Transport},
    teloxide::{
        payloads::{SendMessageSetters, SendPhotoSetters},
        prelude::*,
        types::{InputFile, MessageId, ParseMode, ReplyParameters},
    },
    tracing::{debug, info},
};

use crate::error::{Error, Result};

/// [`Transport`] backed by a teloxide [`Bot`].
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            http: reqwest::Client::new(),
        }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// File download URL: `{api_url}/file/bot<token>/<file_path>`.
    fn file_url(&self, file_path: &str) -> Result<reqwest::Url> {
        let relative = format!("file/bot{}/{}", self.bot.token(), file_path);
        self.bot
            .api_url()
            .join(&relative)
            .map_err(|e| Error::external("invalid file url", e))
    }

    async fn fetch(&self, file_path: &str) -> Result<Vec<u8>> {
        let response = self.http.get(self.file_url(file_path)?).send().await?;
        if !response.status().is_success() {
            return Err(Error::message(format!(
                "failed to download file: HTTP {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, message: TextMessage) -> pixbot_dispatch::Result<()> {
        let mut req = self.bot.send_message(tg_chat(chat_id), message.text);
        if message.markdown {
            req = req.parse_mode(ParseMode::Markdown);
        }
        if let Some(id) = message.reply_to {
            req = req.reply_parameters(ReplyParameters::new(MessageId(id)).allow_sending_without_reply());
        }
        req.await.map_err(Error::from)?;
        debug!(%chat_id, "sent text message");
        Ok(())
    }

    async fn send_image(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> pixbot_dispatch::Result<()> {
        let mut req = self.bot.send_photo(tg_chat(chat_id), InputFile::file(path));
        if let Some(caption) = caption {
            req = req.caption(caption);
        }
        req.await.map_err(Error::from)?;
        info!(%chat_id, path = %path.display(), "sent photo");
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> pixbot_dispatch::Result<RemoteFile> {
        let file = self.bot.get_file(file_id).await.map_err(Error::from)?;
        Ok(RemoteFile {
            file_id: file_id.to_string(),
            file_path: file.path,
        })
    }

    async fn download_file(&self, file_path: &str) -> pixbot_dispatch::Result<Vec<u8>> {
        Ok(self.fetch(file_path).await?)
    }
}
