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

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    auth_token: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    thinking_budget: Option<u32>,
}

impl AnthropicProvider {
    pub fn new(config: &AppConfig) -> Self {
        let creds = &config.anthropic;
        Self {
            client: Client::new(),
            api_key: creds.api_key.clone().filter(|k| !k.is_empty()),
            auth_token: creds.auth_token.clone().filter(|k| !k.is_empty()),
            model: config.model_name(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            max_tokens: config.effective_max_tokens(),
            temperature: config.effective_temperature(),
            thinking_budget: config.thinking_active().then_some(config.thinking_budget),
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
            "system": system_prompt,
            "messages": convert_messages(messages),
            "stream": true,
            "temperature": self.temperature,
        });

        if !tools.is_empty() {
            body["tools"] = json!(convert_tools(tools));
        }
        if let Some(budget) = self.thinking_budget {
            body["thinking"] = json!({
                "type": "enabled",
                "budget_tokens": budget,
            });
        }
        body
    }
}

/// Anthropic requires alternating roles, so consecutive messages that map
/// to the same role are merged into one block list. Tool results travel as
/// user content.
pub(crate) fn convert_messages(messages: &[Message]) -> Vec<Value> {
    let mut result: Vec<(String, Vec<Value>)> = Vec::new();

    for msg in messages {
        let (role, blocks) = match msg.role {
            MessageRole::User => ("user", user_blocks(msg)),
            MessageRole::Assistant => ("assistant", assistant_blocks(msg)),
            MessageRole::Tool => ("user", tool_result_blocks(msg)),
        };
        if blocks.is_empty() {
            continue;
        }
        match result.last_mut() {
            Some((last_role, last_blocks)) if last_role == role => last_blocks.extend(blocks),
            _ => result.push((role.to_string(), blocks)),
        }
    }

    result
        .into_iter()
        .map(|(role, content)| json!({ "role": role, "content": content }))
        .collect()
}

fn user_blocks(msg: &Message) -> Vec<Value> {
    let text = msg.text_content();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![json!({ "type": "text", "text": text })]
    }
}

fn assistant_blocks(msg: &Message) -> Vec<Value> {
    let mut blocks = Vec::new();
    for part in &msg.parts {
        match part {
            // Unsigned thinking is rejected on replay.
            ContentPart::Reasoning {
                text,
                signature: Some(signature),
            } if !signature.is_empty() => {
                blocks.push(json!({
                    "type": "thinking",
                    "thinking": text,
                    "signature": signature,
                }));
            }
            ContentPart::Text { text } if !text.is_empty() => {
                blocks.push(json!({ "type": "text", "text": text }));
            }
            ContentPart::ToolCall { id, name, input } => {
                let input: Value = serde_json::from_str(input).unwrap_or_else(|_| json!({}));
                blocks.push(json!({
                    "type": "tool_use",
                    "id": id,
                    "name": name,
                    "input": input,
                }));
            }
            _ => {}
        }
    }
    blocks
}

fn tool_result_blocks(msg: &Message) -> Vec<Value> {
    msg.parts
        .iter()
        .filter_map(|part| match part {
            ContentPart::ToolResult {
                tool_call_id,
                content,
                is_error,
                ..
            } => Some(json!({
                "type": "tool_result",
                "tool_use_id": tool_call_id,
                "content": content,
                "is_error": is_error,
            })),
            _ => None,
        })
        .collect()
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema(),
            })
        })
        .collect()
}

/// Translate one Messages API stream event.
pub(crate) fn translate_event(event: &Value) -> Result<Vec<StreamChunk>, ProviderError> {
    let event_type = event["type"].as_str().unwrap_or("");

    match event_type {
        "content_block_start" => {
            let block = &event["content_block"];
            let chunk = match block["type"].as_str().unwrap_or("") {
                "text" => {
                    let text = block["text"].as_str().unwrap_or("");
                    (!text.is_empty()).then(|| StreamChunk::block(ContentBlock::text(text)))
                }
                "thinking" => {
                    let thinking = block["thinking"].as_str().unwrap_or("");
                    (!thinking.is_empty())
                        .then(|| StreamChunk::block(ContentBlock::thinking(thinking)))
                }
                "tool_use" => Some(StreamChunk::block(ContentBlock::ToolUse {
                    id: block["id"].as_str().unwrap_or_default().to_string(),
                    name: block["name"].as_str().unwrap_or_default().to_string(),
                    input: json!({}),
                })),
                _ => None,
            };
            Ok(chunk.into_iter().collect())
        }

        "content_block_delta" => {
            let delta = &event["delta"];
            let block = match delta["type"].as_str().unwrap_or("") {
                "text_delta" => delta["text"].as_str().map(ContentBlock::text),
                "thinking_delta" => delta["thinking"].as_str().map(ContentBlock::thinking),
                "signature_delta" => delta["signature"].as_str().map(|sig| ContentBlock::Thinking {
                    thinking: String::new(),
                    signature: Some(sig.to_string()),
                }),
                "input_json_delta" => delta["partial_json"]
                    .as_str()
                    .map(ContentBlock::input_json_delta),
                _ => None,
            };
            Ok(block.map(StreamChunk::block).into_iter().collect())
        }

        "error" => {
            let message = event["error"]["message"]
                .as_str()
                .unwrap_or("unknown stream error");
            Err(ProviderError::Stream(message.to_string()))
        }

        _ => Ok(Vec::new()),
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn stream_response(
        &self,
        messages: &[Message],
        system_prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<ChunkStream, ProviderError> {
        let body = self.request_body(messages, system_prompt, tools);

        let mut request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        request = match (&self.api_key, &self.auth_token) {
            (Some(key), _) => request.header("x-api-key", key),
            (None, Some(token)) => request.header("Authorization", format!("Bearer {token}")),
            (None, None) => return Err(ProviderError::MissingApiKey("ANTHROPIC_API_KEY".into())),
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "anthropic request");

        let resp = request
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
                    let event: Value = match serde_json::from_str(&data) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparsable stream line");
                            continue;
                        }
                    };
                    match translate_event(&event) {
                        Ok(chunks) => {
                            for chunk in chunks {
                                yield Ok(chunk);
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
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
        ProviderKind::Anthropic
    }
}
