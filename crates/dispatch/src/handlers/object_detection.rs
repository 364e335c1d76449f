use std::sync::Arc;

use {
    async_trait::async_trait,
    pixbot_common::InboundMessage,
    tracing::{debug, info},
};

use crate::{
    error::{Context, Error, Result},
    handlers::{ImageProcessingHandler, PROCESSING_NOTICE, RoleHandler, Services, local_path},
    ports::TextMessage,
    prediction::{IdentifyRequest, PREDICT_CAPTION, PREDICTION_RESULT_CAPTION, PredictionResult},
    role::Role,
};

const HTTP_OK: u16 = 200;

/// Sends photos off for detection and reports results. Routing only selects
/// this role for the detection captions; called directly with any other
/// caption it behaves as image processing.
#[derive(Clone)]
pub struct ObjectDetectionHandler {
    services: Arc<Services>,
    images: ImageProcessingHandler,
}

impl ObjectDetectionHandler {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            images: ImageProcessingHandler::new(Arc::clone(&services)),
            services,
        }
    }

    /// Upload the photo and enqueue an identify request for it.
    async fn predict(&self, msg: &InboundMessage) -> Result<()> {
        let chat_id = msg.chat_id();
        let (local, _) = self.images.download_photo(msg).await?;
        self.services
            .transport
            .send_text(chat_id, TextMessage::plain(PROCESSING_NOTICE))
            .await?;

        let img_name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("downloaded photo has no file name")?;
        let settings = &self.services.settings;
        let key = settings.key_for(&img_name);
        let detail = self
            .services
            .storage
            .upload(&settings.bucket, &key, &local)
            .await?;
        debug!(%chat_id, %detail, "photo uploaded");

        let payload = serde_json::to_string(&IdentifyRequest {
            chat_id: chat_id.to_string(),
            img_name,
        })?;
        let detail = self
            .services
            .queue
            .enqueue(&settings.identify_queue, &payload)
            .await?;
        info!(%chat_id, queue = %settings.identify_queue, %detail, "identify request enqueued");
        Ok(())
    }

    /// Report a finished prediction: fetch its record and original image,
    /// then send the image captioned with the per-class counts.
    pub async fn handle_result(&self, result: &PredictionResult) -> Result<()> {
        let chat_id = result.chat_id();
        let status = result.status().unwrap_or_default();
        if status != HTTP_OK {
            return Err(Error::Prediction {
                status,
                detail: result.detail(),
            });
        }
        let prediction_id = result.prediction_id().ok_or_else(|| Error::Prediction {
            status,
            detail: "result carries no prediction_id".into(),
        })?;

        let record = self.services.lookup.get_by_id(&prediction_id).await?;
        let settings = &self.services.settings;
        let local = local_path(&settings.work_dir, &record.original_img_path);
        self.services
            .storage
            .download(&settings.bucket, &record.original_img_path, &local)
            .await?;

        let summary = record.summary();
        info!(%chat_id, %prediction_id, "sending prediction result");
        self.services
            .transport
            .send_image(chat_id, &local, Some(&summary))
            .await
    }
}

#[async_trait]
impl RoleHandler for ObjectDetectionHandler {
    fn role(&self) -> Role {
        Role::ObjectDetection
    }

    async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        let caption = msg.normalized_caption();
        if caption.contains(PREDICTION_RESULT_CAPTION) {
            Err(Error::message(
                "Prediction results are sent automatically once ready.",
            ))
        } else if caption.contains(PREDICT_CAPTION) {
            self.predict(msg).await
        } else {
            self.images.handle(msg).await
        }
    }
}
