use serde::{Deserialize, Serialize};

/// A normalized streaming event.
///
/// Serialized with a `type` tag (`thinking`, `text`, `tool_call`,
/// `tool_result`, `done`, `error`) plus the variant fields. This is the
/// wire shape shared by the terminal renderer and the SSE bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Thinking {
        content: String,
    },
    Text {
        content: String,
    },
    ToolCall {
        name: String,
        args: serde_json::Value,
        id: String,
    },
    ToolResult {
        name: String,
        content: String,
        success: bool,
    },
    Done {
        response: String,
    },
    Error {
        message: String,
    },
}

impl Event {
    pub fn thinking(content: impl Into<String>) -> Self {
        Self::Thinking {
            content: content.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn tool_call(
        name: impl Into<String>,
        args: serde_json::Value,
        id: impl Into<String>,
    ) -> Self {
        Self::ToolCall {
            name: name.into(),
            args,
            id: id.into(),
        }
    }

    pub fn tool_result(name: impl Into<String>, content: impl Into<String>, success: bool) -> Self {
        Self::ToolResult {
            name: name.into(),
            content: content.into(),
            success,
        }
    }

    pub fn done(response: impl Into<String>) -> Self {
        Self::Done {
            response: response.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The value of the serialized `type` field.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thinking { .. } => "thinking",
            Self::Text { .. } => "text",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Transport label for SSE frames. Browsers reserve `error` on
    /// `EventSource`, so errors travel as `agent_error`.
    pub fn sse_label(&self) -> &'static str {
        sse_label_for(self.event_type())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

pub(crate) fn sse_label_for(event_type: &str) -> &str {
    if event_type == "error" {
        "agent_error"
    } else {
        event_type
    }
}
