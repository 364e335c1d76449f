use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    async_trait::async_trait,
    pixbot_common::{ChatId, InboundMessage},
    pixbot_media::{Image, codec},
    tracing::{debug, info},
};

use crate::{
    command::{Command, ConcatSpec, parse_caption},
    error::{Context, Error, Result},
    handlers::{RoleHandler, Services, local_path, run_blocking},
    ports::TextMessage,
    role::Role,
    session::{Ingest, SessionBuffer},
};

pub const PROCESSING_NOTICE: &str = "Processing, please wait...";

/// Applies caption commands to photos, buffering media groups for concat.
#[derive(Clone)]
pub struct ImageProcessingHandler {
    services: Arc<Services>,
    sessions: Arc<SessionBuffer>,
}

impl ImageProcessingHandler {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            sessions: Arc::new(SessionBuffer::new()),
        }
    }

    pub fn sessions(&self) -> &SessionBuffer {
        &self.sessions
    }

    /// Fetch the largest resolution of the message's photo into the work
    /// directory. Returns the local path and the raw bytes.
    pub(crate) async fn download_photo(&self, msg: &InboundMessage) -> Result<(PathBuf, Vec<u8>)> {
        let photo = msg.largest_photo().context("message carries no photo")?;
        let transport = &self.services.transport;
        let remote = transport.get_file(&photo.file_id).await?;
        let data = transport.download_file(&remote.file_path).await?;

        let local = local_path(&self.services.settings.work_dir, &remote.file_path);
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&local, &data)
            .await
            .with_context(|| format!("saving {}", local.display()))?;
        debug!(file_id = %photo.file_id, path = %local.display(), bytes = data.len(), "photo downloaded");
        Ok((local, data))
    }

    async fn load_image(&self, msg: &InboundMessage) -> Result<Image> {
        let (path, data) = self.download_photo(msg).await?;
        let id = path.to_string_lossy().into_owned();
        run_blocking(move || Ok(Image::decode(id, &data)?)).await
    }

    /// Encode next to the source as `<stem>_filtered.png` and send it.
    async fn deliver(&self, chat_id: ChatId, image: Image) -> Result<()> {
        let out = codec::filtered_path(Path::new(image.id()));
        let png = run_blocking(move || Ok(image.encode_png()?)).await?;
        tokio::fs::write(&out, png)
            .await
            .with_context(|| format!("saving {}", out.display()))?;
        self.services.transport.send_image(chat_id, &out, None).await
    }

    async fn collect(
        &self,
        chat_id: ChatId,
        group_id: &str,
        image: Image,
        spec: Option<ConcatSpec>,
    ) -> Result<()> {
        match self.sessions.ingest(group_id, image, spec) {
            Ingest::Pending { count } => {
                debug!(%chat_id, group_id, count, "image buffered for group");
                Ok(())
            },
            Ingest::Ready(ready) => {
                info!(%chat_id, group_id, "concatenating group");
                let joined = run_blocking(move || ready.execute()).await?;
                self.deliver(chat_id, joined).await
            },
        }
    }
}

#[async_trait]
impl RoleHandler for ImageProcessingHandler {
    fn role(&self) -> Role {
        Role::ImageProcessing
    }

    async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        let chat_id = msg.chat_id();
        let group_id = msg.media_group();
        let command = parse_caption(&msg.normalized_caption(), group_id.is_some())?;
        if command.is_none() && group_id.is_none() {
            return Err(Error::MissingAction);
        }

        let image = self.load_image(msg).await?;
        self.services
            .transport
            .send_text(chat_id, TextMessage::plain(PROCESSING_NOTICE))
            .await?;

        match (command, group_id) {
            (Some(Command::Concat(spec)), Some(group_id)) => {
                self.collect(chat_id, group_id, image, Some(spec)).await
            },
            (other, Some(group_id)) => {
                if let Some(command) = other {
                    debug!(
                        %chat_id,
                        group_id,
                        action = command.action().keyword(),
                        "grouped photo joins its group, caption ignored"
                    );
                }
                self.collect(chat_id, group_id, image, None).await
            },
            (Some(command), None) => {
                info!(%chat_id, action = command.action().keyword(), "applying transform");
                let out = run_blocking(move || {
                    let mut image = image;
                    command.apply(&mut image)?;
                    Ok(image)
                })
                .await?;
                self.deliver(chat_id, out).await
            },
            (None, None) => Err(Error::MissingAction),
        }
    }
}
