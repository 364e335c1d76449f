//! Conversion from teloxide messages to the dispatcher's inbound model.

use {pixbot_common::InboundMessage, teloxide::types::Message};

use crate::error::Result;

/// Re-read a teloxide [`Message`] through its Bot API JSON form.
///
/// Both types follow the Bot API field names, so the fields the dispatcher
/// cares about carry over and the rest are dropped.
pub fn to_inbound(msg: &Message) -> Result<InboundMessage> {
    let value = serde_json::to_value(msg)?;
    Ok(serde_json::from_value(value)?)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, pixbot_common::ChatId, serde_json::json};

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).expect("deserialize message")
    }

    #[test]
    fn text_message() {
        let msg = message(json!({
            "message_id": 7,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "text": "hello"
        }));
        let inbound = to_inbound(&msg).unwrap();
        assert_eq!(inbound.message_id, 7);
        assert_eq!(inbound.chat_id(), ChatId(42));
        assert_eq!(inbound.text.as_deref(), Some("hello"));
        assert!(!inbound.has_photo());
        assert!(!inbound.is_reply());
    }

    #[test]
    fn grouped_photo_with_caption() {
        let msg = message(json!({
            "message_id": 8,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "media_group_id": "album-1",
            "caption": "Concat Horizontal",
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 60 },
                { "file_id": "large", "file_unique_id": "l", "width": 900, "height": 600 }
            ]
        }));
        let inbound = to_inbound(&msg).unwrap();
        assert_eq!(inbound.media_group(), Some("album-1"));
        assert_eq!(inbound.normalized_caption(), "concat horizontal");
        assert_eq!(inbound.largest_photo().unwrap().file_id, "large");
    }

    #[test]
    fn reply_is_detected() {
        let msg = message(json!({
            "message_id": 9,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "text": "quote me",
            "reply_to_message": {
                "message_id": 3,
                "date": 1,
                "chat": { "id": 42, "type": "private", "first_name": "Alice" },
                "text": "original"
            }
        }));
        assert!(to_inbound(&msg).unwrap().is_reply());
    }
}
