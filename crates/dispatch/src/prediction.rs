//! Object-detection wire types: the identify request, the result envelope
//! delivered on the result queue, and the stored prediction record.

use serde::{Deserialize, Serialize};

use pixbot_common::{Chat, ChatId};

pub const PREDICT_CAPTION: &str = "predict";
pub const PREDICTION_RESULT_CAPTION: &str = "prediction_result";

/// Whether a normalized caption asks for object detection.
pub fn is_prediction_caption(caption: &str) -> bool {
    caption == PREDICT_CAPTION || caption == PREDICTION_RESULT_CAPTION
}

/// Payload enqueued on the identify queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyRequest {
    #[serde(rename = "chatId")]
    pub chat_id: String,
    #[serde(rename = "imgName")]
    pub img_name: String,
}

/// Body of a message on the result queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub message: PredictionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub chat: Chat,
    #[serde(default)]
    pub caption: String,
    /// `{"prediction_id": ...}` on success, an error description otherwise.
    #[serde(default)]
    pub text: serde_json::Value,
    pub status_code: serde_json::Value,
}

impl PredictionResult {
    pub fn chat_id(&self) -> ChatId {
        self.chat.id
    }

    /// Status as a number; accepts both `200` and `"200"`.
    pub fn status(&self) -> Option<u16> {
        match &self.status_code {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn prediction_id(&self) -> Option<String> {
        match self.text.get("prediction_id")? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Human-readable form of `text`, for error reporting.
    pub fn detail(&self) -> String {
        match &self.text {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A stored prediction, as written by the detection service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    #[serde(default)]
    pub prediction_id: Option<String>,
    pub original_img_path: String,
    #[serde(default)]
    pub predicted_img_path: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub class: Option<String>,
}

impl PredictionRecord {
    /// Per-class counts in first-seen order.
    pub fn class_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for class in self.labels.iter().filter_map(|l| l.class.as_deref()) {
            match counts.iter_mut().find(|(name, _)| name == class) {
                Some((_, n)) => *n += 1,
                None => counts.push((class.to_string(), 1)),
            }
        }
        counts
    }

    /// `Detected Objects:` followed by one `Class: count` line per class.
    pub fn summary(&self) -> String {
        let mut text = String::from("Detected Objects:\n");
        for (class, count) in self.class_counts() {
            text.push_str(&format!("{}: {count}\n", capitalize(&class)));
        }
        text
    }
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
