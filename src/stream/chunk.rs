use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One incremental unit delivered by a model provider, or the result of a
/// tool execution fed back into the same turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Partial assistant message.
    Message {
        #[serde(default)]
        content: ChunkContent,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallDelta>,
    },
    /// Output of a finished tool call.
    Tool {
        #[serde(default = "unknown_tool")]
        name: String,
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
    },
}

fn unknown_tool() -> String {
    "unknown".into()
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Message {
            content: ChunkContent::Text(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn blocks(blocks: Vec<ContentBlock>) -> Self {
        Self::Message {
            content: ChunkContent::Blocks(blocks),
            tool_calls: Vec::new(),
        }
    }

    pub fn block(block: ContentBlock) -> Self {
        Self::blocks(vec![block])
    }

    pub fn tool_calls(tool_calls: Vec<ToolCallDelta>) -> Self {
        Self::Message {
            content: ChunkContent::default(),
            tool_calls,
        }
    }

    pub fn tool(name: impl Into<String>, content: impl Into<String>, tool_call_id: Option<String>) -> Self {
        Self::Tool {
            name: name.into(),
            content: content.into(),
            tool_call_id,
        }
    }

    /// Thinking signature carried by this chunk, if any.
    pub fn thinking_signature(&self) -> Option<&str> {
        match self {
            Self::Message {
                content: ChunkContent::Blocks(blocks),
                ..
            } => blocks.iter().find_map(|b| match b {
                ContentBlock::Thinking {
                    signature: Some(sig),
                    ..
                } if !sig.is_empty() => Some(sig.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }
}

/// Message content is either a plain string or a list of typed blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for ChunkContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    #[serde(alias = "reasoning")]
    Thinking {
        #[serde(default, alias = "reasoning")]
        thinking: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    Text {
        #[serde(default, alias = "content")]
        text: String,
    },
    /// Anthropic-style complete tool invocation.
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    /// Generic complete tool invocation.
    ToolCall {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        args: Value,
    },
    /// Raw argument text for the most recent tool invocation.
    InputJsonDelta {
        #[serde(default)]
        partial_json: String,
        #[serde(default)]
        index: Option<u32>,
    },
    /// OpenAI-style tool call fragment; `id` and `name` only on the first.
    ToolCallChunk {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        args: Option<String>,
        #[serde(default)]
        index: Option<u32>,
    },
    #[serde(other)]
    Unknown,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn thinking(thinking: impl Into<String>) -> Self {
        Self::Thinking {
            thinking: thinking.into(),
            signature: None,
        }
    }

    pub fn input_json_delta(partial_json: impl Into<String>) -> Self {
        Self::InputJsonDelta {
            partial_json: partial_json.into(),
            index: None,
        }
    }
}

/// A tool call attached to a message chunk outside its content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub args: Value,
}
