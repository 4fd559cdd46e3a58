mod assembler;
mod chunk;
mod classifier;
pub mod display;
mod event;
mod normalizer;
mod sse;

pub use assembler::{has_content, ToolCallAssembler, ToolCallRecord};
pub use chunk::{ChunkContent, ContentBlock, StreamChunk, ToolCallDelta};
pub use classifier::{
    extract_body, is_json, is_success, ClassifiedResult, ContentClassifier, ContentType,
    FAILURE_PREFIX, SUCCESS_PREFIX,
};
pub use display::DisplayLimits;
pub use event::Event;
pub use normalizer::StreamNormalizer;
pub use sse::to_sse_frame;

#[cfg(test)]
mod tests;
