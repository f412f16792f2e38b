// Chat completion wire types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Finish reason reported for a normal, complete generation
pub const FINISH_REASON_STOP: &str = "stop";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Rendered system/user message pair for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

impl CompletionRequest {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Request body sent to `/chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

impl Choice {
    pub fn is_terminal(&self) -> bool {
        self.finish_reason.as_deref() == Some(FINISH_REASON_STOP)
    }

    pub fn content(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.content.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Usage counters as reported by the endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Token usage as it appears in log records; always fully populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub model_name: String,
}

impl TokenUsage {
    /// Zero-filled counters for the given model
    pub fn zeroed(model_name: impl Into<String>) -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            model_name: model_name.into(),
        }
    }

    pub fn from_usage(usage: Option<Usage>, model_name: impl Into<String>) -> Self {
        let usage = usage.unwrap_or_default();
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            model_name: model_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_flattens_params() {
        let mut params = Map::new();
        params.insert("temperature".into(), json!(0.1));
        let request = ChatRequest {
            model: "llama".into(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            params,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama");
        assert_eq!(value["temperature"], 0.1);
        assert_eq!(value["messages"][1]["role"], "user");
    }

    #[test]
    fn test_response_without_usage() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"finish_reason": "length", "message": {"content": "cut"}}]
        }))
        .unwrap();
        assert!(response.usage.is_none());
        assert!(!response.choices[0].is_terminal());
        assert_eq!(response.choices[0].content(), Some("cut"));

        let usage = TokenUsage::from_usage(response.usage, "llama");
        assert_eq!(usage, TokenUsage::zeroed("llama"));
    }

    #[test]
    fn test_null_finish_reason_is_not_terminal() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"finish_reason": null, "message": {"content": null}}],
            "usage": {"prompt_tokens": 4}
        }))
        .unwrap();
        assert!(!response.choices[0].is_terminal());
        assert_eq!(response.choices[0].content(), None);
        assert_eq!(response.usage.unwrap().total_tokens, 0);
    }
}
