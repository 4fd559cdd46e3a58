use async_trait::async_trait;
use std::pin::Pin;

use crate::core::config::ProviderKind;
use crate::core::error::ProviderError;
use crate::core::message::Message;
use crate::core::tool::ToolDefinition;
use crate::stream::StreamChunk;

pub type ChunkStream =
    Pin<Box<dyn futures_core::Stream<Item = Result<StreamChunk, ProviderError>> + Send>>;

/// A streaming chat model. Implementations translate their wire protocol
/// into `StreamChunk`s; everything downstream is vendor neutral.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn stream_response(
        &self,
        messages: &[Message],
        system_prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<ChunkStream, ProviderError>;

    fn model(&self) -> &str;

    fn provider_kind(&self) -> ProviderKind;
}
