//! Response normalization.
//!
//! Completion back-ends answer in one of two known schema families; this
//! module probes them in a fixed, documented order and produces the one
//! canonical envelope downstream code consumes. Unrecognized payloads pass
//! through opaque: echoing the raw body is always preferred over failing
//! a request that already succeeded upstream.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// Probe order: chat-completion first, message-content second, opaque last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    ChatCompletion,
    MessageContent,
    Opaque,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedResponse {
    pub shape: ResponseShape,
    data: Value,
}

impl NormalizedResponse {
    /// The textual content, wherever the source schema put it.
    pub fn content(&self) -> Option<&str> {
        match self.shape {
            ResponseShape::ChatCompletion => chat_completion_content(&self.data),
            ResponseShape::MessageContent => message_content(&self.data),
            ResponseShape::Opaque => None,
        }
    }

    /// Writes new text into the schema's own content slot. No-op for
    /// opaque payloads, which carry no recognized text field.
    pub fn replace_content(&mut self, text: String) {
        let slot = match self.shape {
            ResponseShape::ChatCompletion => self
                .data
                .pointer_mut("/choices/0/message/content"),
            ResponseShape::MessageContent => self.data.pointer_mut("/content/0/text"),
            ResponseShape::Opaque => None,
        };
        if let Some(slot) = slot {
            *slot = Value::String(text);
        }
    }

    pub fn into_envelope(self) -> Value {
        json!({ "success": true, "data": self.data })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: Value) -> NormalizedResponse {
        let shape = if chat_completion_content(&body).is_some() {
            ResponseShape::ChatCompletion
        } else if message_content(&body).is_some() {
            ResponseShape::MessageContent
        } else {
            ResponseShape::Opaque
        };

        debug!(event_name = "pipeline.normalize.shape", shape = ?shape, "response classified");
        NormalizedResponse { shape, data: body }
    }
}

fn chat_completion_content(body: &Value) -> Option<&str> {
    body.pointer("/choices/0/message/content")?.as_str()
}

fn message_content(body: &Value) -> Option<&str> {
    body.pointer("/content/0/text")?.as_str()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ResponseNormalizer, ResponseShape};

    #[test]
    fn chat_completion_shape_is_detected_first() {
        let body = json!({"choices": [{"message": {"content": "X"}}]});
        let normalized = ResponseNormalizer::new().normalize(body);
        assert_eq!(normalized.shape, ResponseShape::ChatCompletion);
        assert_eq!(normalized.content(), Some("X"));
    }

    #[test]
    fn message_content_shape_is_detected_second() {
        let body = json!({"content": [{"type": "text", "text": "Y"}]});
        let normalized = ResponseNormalizer::new().normalize(body);
        assert_eq!(normalized.shape, ResponseShape::MessageContent);
        assert_eq!(normalized.content(), Some("Y"));
    }

    #[test]
    fn unrecognized_payloads_pass_through_opaque() {
        let body = json!({"result": "something else entirely", "code": 7});
        let normalized = ResponseNormalizer::new().normalize(body.clone());
        assert_eq!(normalized.shape, ResponseShape::Opaque);
        assert_eq!(normalized.content(), None);

        let envelope = normalized.into_envelope();
        assert_eq!(envelope["success"], true);
        assert_eq!(envelope["data"], body);
    }

    #[test]
    fn replace_content_targets_the_source_schema_slot() {
        let body = json!({"content": [{"type": "text", "text": "before"}], "model": "m"});
        let mut normalized = ResponseNormalizer::new().normalize(body);
        normalized.replace_content("after".to_string());
        assert_eq!(normalized.content(), Some("after"));

        let envelope = normalized.into_envelope();
        assert_eq!(envelope["data"]["content"][0]["text"], "after");
        assert_eq!(envelope["data"]["model"], "m");
    }

    #[test]
    fn envelope_preserves_content_regardless_of_source_shape() {
        for body in [
            json!({"choices": [{"message": {"content": "same text"}}]}),
            json!({"content": [{"text": "same text"}]}),
        ] {
            let normalized = ResponseNormalizer::new().normalize(body);
            assert_eq!(normalized.content(), Some("same text"));
            assert_eq!(normalized.into_envelope()["success"], true);
        }
    }
}
