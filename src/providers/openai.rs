use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::lines::DataLines;
use crate::core::config::{AppConfig, ProviderKind};
use crate::core::error::ProviderError;
use crate::core::message::*;
use crate::core::provider::*;
use crate::core::tool::ToolDefinition;
use crate::stream::{ContentBlock, StreamChunk};

/// Chat Completions provider, shared by OpenAI and DeepSeek.
pub struct OpenAiProvider {
    client: Client,
    kind: ProviderKind,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(config: &AppConfig, api_key: String) -> Self {
        Self {
            client: Client::new(),
            kind: config.provider_kind(),
            api_key,
            model: config.model_name(),
            base_url: config.base_url(),
            max_tokens: config.effective_max_tokens(),
            temperature: config.effective_temperature(),
        }
    }

    pub(crate) fn request_body(
        &self,
        messages: &[Message],
        system_prompt: &str,
        tools: &[ToolDefinition],
    ) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": convert_messages(messages, system_prompt, self.kind == ProviderKind::DeepSeek),
            "stream": true,
        });

        if !tools.is_empty() {
            body["tools"] = json!(convert_tools(tools));
        }
        body
    }
}

/// DeepSeek and `/v1`-suffixed base URLs already include the version.
pub(crate) fn completions_url(base_url: &str, kind: ProviderKind) -> String {
    let base = base_url.trim_end_matches('/');
    if kind == ProviderKind::DeepSeek || base.ends_with("/v1") {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    }
}

pub(crate) fn convert_messages(
    messages: &[Message],
    system_prompt: &str,
    with_reasoning: bool,
) -> Vec<Value> {
    let mut result = vec![json!({
        "role": "system",
        "content": system_prompt,
    })];

    for msg in messages {
        match msg.role {
            MessageRole::User => {
                let text = msg.text_content();
                if !text.is_empty() {
                    result.push(json!({
                        "role": "user",
                        "content": text,
                    }));
                }
            }
            MessageRole::Assistant => {
                let mut content_parts = Vec::new();
                let mut tool_calls = Vec::new();

                for part in &msg.parts {
                    match part {
                        ContentPart::Text { text } => {
                            content_parts.push(text.clone());
                        }
                        ContentPart::ToolCall { id, name, input } => {
                            let input_val: Value =
                                serde_json::from_str(input).unwrap_or(json!({}));
                            tool_calls.push(json!({
                                "id": id,
                                "type": "function",
                                "function": {
                                    "name": name,
                                    "arguments": input_val.to_string(),
                                }
                            }));
                        }
                        _ => {}
                    }
                }

                let mut assistant_msg = json!({"role": "assistant"});
                if !content_parts.is_empty() {
                    assistant_msg["content"] = Value::String(content_parts.join(""));
                }
                if !tool_calls.is_empty() {
                    assistant_msg["tool_calls"] = json!(tool_calls);
                }
                if with_reasoning {
                    let reasoning = msg.reasoning_content();
                    if !reasoning.is_empty() {
                        assistant_msg["reasoning_content"] = Value::String(reasoning);
                    }
                }
                result.push(assistant_msg);
            }
            MessageRole::Tool => {
                for part in &msg.parts {
                    if let ContentPart::ToolResult {
                        tool_call_id,
                        content,
                        ..
                    } = part
                    {
                        result.push(json!({
                            "role": "tool",
                            "tool_call_id": tool_call_id,
                            "content": content,
                        }));
                    }
                }
            }
        }
    }

    result
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema(),
                }
            })
        })
        .collect()
}

/// Translate one streamed `chat.completion.chunk`.
pub(crate) fn translate_chunk(json: &Value) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();
    let Some(choices) = json["choices"].as_array() else {
        return chunks;
    };

    for choice in choices {
        let delta = &choice["delta"];

        if let Some(reasoning) = delta["reasoning_content"].as_str() {
            if !reasoning.is_empty() {
                chunks.push(StreamChunk::block(ContentBlock::thinking(reasoning)));
            }
        }

        if let Some(text) = delta["content"].as_str() {
            if !text.is_empty() {
                chunks.push(StreamChunk::text(text));
            }
        }

        if let Some(tool_calls) = delta["tool_calls"].as_array() {
            for tc in tool_calls {
                let func = &tc["function"];
                // Some gateways repeat id and name as "" on every fragment.
                let non_empty = |v: &Value| {
                    v.as_str()
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };
                let block = ContentBlock::ToolCallChunk {
                    id: non_empty(&tc["id"]),
                    name: non_empty(&func["name"]),
                    args: non_empty(&func["arguments"]),
                    index: tc["index"].as_u64().map(|i| i as u32),
                };
                chunks.push(StreamChunk::block(block));
            }
        }
    }

    chunks
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn stream_response(
        &self,
        messages: &[Message],
        system_prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<ChunkStream, ProviderError> {
        let body = self.request_body(messages, system_prompt, tools);
        let url = completions_url(&self.base_url, self.kind);

        tracing::debug!(provider = %self.kind, model = %self.model, %url, "chat completions request");

        let resp = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            use tokio_stream::StreamExt;

            let mut byte_stream = Box::pin(byte_stream);
            let mut lines = DataLines::new();

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(ProviderError::Stream(e.to_string()));
                        return;
                    }
                };

                for data in lines.push(&chunk) {
                    let json: Value = match serde_json::from_str(&data) {
                        Ok(j) => j,
                        Err(_) => continue,
                    };
                    if let Some(message) = json["error"]["message"].as_str() {
                        yield Err(ProviderError::Stream(message.to_string()));
                        return;
                    }
                    for chunk in translate_chunk(&json) {
                        yield Ok(chunk);
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider_kind(&self) -> ProviderKind {
        self.kind
    }
}
