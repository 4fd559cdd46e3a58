use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    /// Model reasoning. Anthropic requires the signature when the block is
    /// sent back in later requests.
    Reasoning {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    ToolCall {
        id: String,
        name: String,
        input: String,
    },
    ToolResult {
        tool_call_id: String,
        name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// One entry of a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub parts: Vec<ContentPart>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            parts,
            created_at: Utc::now(),
        }
    }

    pub fn new_user(text: impl Into<String>) -> Self {
        Self::with_parts(MessageRole::User, vec![ContentPart::Text { text: text.into() }])
    }

    pub fn new_assistant() -> Self {
        Self::with_parts(MessageRole::Assistant, Vec::new())
    }

    pub fn new_tool_result(results: Vec<ContentPart>) -> Self {
        Self::with_parts(MessageRole::Tool, results)
    }

    /// `(id, name, input)` of every tool call in this message.
    pub fn tool_calls(&self) -> Vec<(&str, &str, &str)> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ToolCall { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn reasoning_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Reasoning { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn append_text(&mut self, delta: &str) {
        if let Some(ContentPart::Text { text }) = self.parts.last_mut() {
            text.push_str(delta);
        } else {
            self.parts.push(ContentPart::Text {
                text: delta.to_string(),
            });
        }
    }

    pub fn append_reasoning(&mut self, delta: &str) {
        if let Some(ContentPart::Reasoning { text, .. }) = self.parts.last_mut() {
            text.push_str(delta);
        } else {
            self.parts.push(ContentPart::Reasoning {
                text: delta.to_string(),
                signature: None,
            });
        }
    }

    /// Attach a signature to the most recent reasoning part.
    pub fn set_reasoning_signature(&mut self, sig: &str) {
        let last = self.parts.iter_mut().rev().find_map(|p| match p {
            ContentPart::Reasoning { signature, .. } => Some(signature),
            _ => None,
        });
        if let Some(signature) = last {
            *signature = Some(sig.to_string());
        }
    }

    pub fn add_tool_call(&mut self, id: String, name: String, input: String) {
        self.parts.push(ContentPart::ToolCall { id, name, input });
    }
}
