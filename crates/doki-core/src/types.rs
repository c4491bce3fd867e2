use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation model
// =============================================================================

/// One message in a conversation, attributed to the user or the assistant.
///
/// Turns are never edited after creation; a conversation only grows by
/// appending new turns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    /// `true` when the user wrote this turn, `false` for the assistant.
    pub is_user: bool,
    /// Message text.
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            is_user: true,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            is_user: false,
            text: text.into(),
        }
    }
}

/// Ordered conversation history for a single user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub user_id: String,
    pub history: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new(user_id: impl Into<String>, history: Vec<ConversationTurn>) -> Self {
        Self {
            user_id: user_id.into(),
            history,
        }
    }
}

// =============================================================================
// Search
// =============================================================================

/// A single web search hit, ranked by its position in the backend response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    /// 1-based position in the backend's returned order.
    pub rank: usize,
}

// =============================================================================
// Request / response boundary
// =============================================================================

/// Incoming generation request.
///
/// `image_data` holds the decoded image bytes; decoding from base64 happens
/// at the transport boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub text: String,
    pub user_id: String,
    pub image_data: Option<Vec<u8>>,
}

impl GenerationRequest {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            image_data: None,
        }
    }

    pub fn with_image(mut self, image_data: Vec<u8>) -> Self {
        self.image_data = Some(image_data);
        self
    }
}

/// Successful outcome of one generation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub generated_text: String,
    pub updated_conversation_history: Vec<ConversationTurn>,
}

/// Fixed sampling parameters passed to the text-generation backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub n: u32,
    pub stop: Option<Vec<String>>,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            n: 1,
            stop: None,
            temperature: 0.5,
            top_p: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serializes_camel_case() {
        let turn = ConversationTurn::user("Hello");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"isUser":true,"text":"Hello"}"#);
    }

    #[test]
    fn test_turn_deserializes_from_wire_format() {
        let turn: ConversationTurn =
            serde_json::from_str(r#"{"isUser":false,"text":"Hi there"}"#).unwrap();
        assert_eq!(turn, ConversationTurn::assistant("Hi there"));
    }

    #[test]
    fn test_generation_result_wire_format() {
        let result = GenerationResult {
            generated_text: "Hi there".to_string(),
            updated_conversation_history: vec![
                ConversationTurn::user("Hello"),
                ConversationTurn::assistant("Hi there"),
            ],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["generatedText"], "Hi there");
        assert_eq!(value["updatedConversationHistory"][0]["isUser"], true);
        assert_eq!(value["updatedConversationHistory"][1]["text"], "Hi there");
    }

    #[test]
    fn test_default_generation_params() {
        let params = GenerationParams::default();
        assert_eq!(params.max_tokens, 150);
        assert_eq!(params.n, 1);
        assert!(params.stop.is_none());
        assert!((params.temperature - 0.5).abs() < f32::EPSILON);
        assert!((params.top_p - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_request_builder() {
        let req = GenerationRequest::new("u1", "look at this").with_image(vec![1, 2, 3]);
        assert_eq!(req.user_id, "u1");
        assert_eq!(req.text, "look at this");
        assert_eq!(req.image_data.as_deref(), Some(&[1u8, 2, 3][..]));
    }
}
