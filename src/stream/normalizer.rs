use serde_json::Value;

use super::assembler::ToolCallAssembler;
use super::chunk::{ChunkContent, ContentBlock, StreamChunk, ToolCallDelta};
use super::classifier::is_success;
use super::display::{truncate, DisplayLimits, TRUNCATION_SUFFIX};
use super::event::Event;

/// Translates provider chunks into the normalized event vocabulary.
///
/// Holds the per-turn state: the tool call assembler and the text
/// collected so far for the final `Done` event.
#[derive(Debug, Default)]
pub struct StreamNormalizer {
    assembler: ToolCallAssembler,
    full_response: String,
    error_emitted: bool,
}

impl StreamNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new turn.
    pub fn reset(&mut self) {
        self.assembler.clear();
        self.full_response.clear();
        self.error_emitted = false;
    }

    pub fn ingest(&mut self, chunk: StreamChunk) -> Vec<Event> {
        let mut events = Vec::new();
        match chunk {
            StreamChunk::Message {
                content,
                tool_calls,
            } => {
                self.ingest_content(content, &mut events);
                for call in tool_calls {
                    self.ingest_tool_call_delta(call, &mut events);
                }
            }
            StreamChunk::Tool { name, content, .. } => {
                self.ingest_tool_result(&name, &content, &mut events);
            }
        }
        events
    }

    fn ingest_content(&mut self, content: ChunkContent, events: &mut Vec<Event>) {
        match content {
            ChunkContent::Text(text) => {
                if !text.is_empty() {
                    self.push_text(text, events);
                }
            }
            ChunkContent::Blocks(blocks) => {
                for block in blocks {
                    self.ingest_block(block, events);
                }
            }
        }
    }

    fn ingest_block(&mut self, block: ContentBlock, events: &mut Vec<Event>) {
        match block {
            ContentBlock::Thinking { thinking, .. } => {
                if !thinking.is_empty() {
                    events.push(Event::thinking(thinking));
                }
            }
            ContentBlock::Text { text } => {
                if !text.is_empty() {
                    self.push_text(text, events);
                }
            }
            ContentBlock::ToolUse { id, name, input } => {
                self.announce(&id, &name, input, events);
            }
            ContentBlock::ToolCall { id, name, args } => {
                self.announce(&id, &name, args, events);
            }
            ContentBlock::InputJsonDelta { partial_json, .. } => {
                if !partial_json.is_empty() {
                    self.assembler.append_fragment(&partial_json);
                }
            }
            ContentBlock::ToolCallChunk { id, name, args, .. } => {
                if let Some(id) = id.filter(|id| !id.is_empty()) {
                    self.assembler.update(&id, name.as_deref(), None, false);
                    self.emit_if_ready(&id, events);
                }
                if let Some(args) = args.filter(|a| !a.is_empty()) {
                    self.assembler.append_fragment(&args);
                }
            }
            ContentBlock::Unknown => {}
        }
    }

    fn ingest_tool_call_delta(&mut self, call: ToolCallDelta, events: &mut Vec<Event>) {
        self.announce(&call.id, &call.name, call.args, events);
    }

    /// Register a complete tool invocation and announce it once it has a
    /// name. Arguments that are not a mapping count as empty.
    fn announce(&mut self, id: &str, name: &str, args: Value, events: &mut Vec<Event>) {
        if id.is_empty() {
            return;
        }
        let args = if args.is_object() {
            args
        } else {
            Value::Object(serde_json::Map::new())
        };
        self.assembler.update(id, Some(name), Some(args), false);
        self.emit_if_ready(id, events);
    }

    fn emit_if_ready(&mut self, id: &str, events: &mut Vec<Event>) {
        if !self.assembler.is_ready(id) {
            return;
        }
        self.assembler.mark_emitted(id);
        if let Some(record) = self.assembler.get(id) {
            events.push(Event::tool_call(
                record.name.clone(),
                record.args.clone(),
                record.id.clone(),
            ));
        }
    }

    /// Finalize arguments, re-announce every call with its authoritative
    /// arguments, then report the result.
    fn ingest_tool_result(&mut self, name: &str, raw_content: &str, events: &mut Vec<Event>) {
        self.assembler.finalize_all();

        for record in self.assembler.get_all() {
            events.push(Event::tool_call(
                record.name.clone(),
                record.args.clone(),
                record.id.clone(),
            ));
        }

        let content = truncate(raw_content, DisplayLimits::TOOL_RESULT_MAX, TRUNCATION_SUFFIX);
        let success = is_success(&content);
        events.push(Event::tool_result(name, content, success));
    }

    fn push_text(&mut self, text: String, events: &mut Vec<Event>) {
        self.full_response.push_str(&text);
        events.push(Event::text(text));
    }

    /// Signal that no more argument fragments will arrive this turn.
    pub fn finalize_tool_calls(&mut self) {
        self.assembler.finalize_all();
    }

    /// The single `Error` event for an upstream failure.
    pub fn fail(&mut self, message: impl Into<String>) -> Event {
        self.error_emitted = true;
        Event::error(message)
    }

    pub fn finish(&self) -> Event {
        Event::done(self.full_response.clone())
    }

    pub fn assembler(&self) -> &ToolCallAssembler {
        &self.assembler
    }

    pub fn full_response(&self) -> &str {
        &self.full_response
    }

    pub fn error_emitted(&self) -> bool {
        self.error_emitted
    }
}
