use serde_json::Value;
use std::collections::HashMap;

/// Accumulated state of one tool invocation within a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub args: Value,
    /// A `ToolCall` event has been produced for this id.
    pub emitted: bool,
    /// Distinguishes "no arguments" from "arguments still arriving".
    pub args_complete: bool,
    json_buffer: String,
}

impl ToolCallRecord {
    fn new(id: &str, name: &str, args: Value, args_complete: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            args,
            emitted: false,
            args_complete,
            json_buffer: String::new(),
        }
    }

    /// Argument text received so far that has not been parsed yet.
    pub fn json_buffer(&self) -> &str {
        &self.json_buffer
    }

    /// Arguments serialized for a tool invocation.
    pub fn input_json(&self) -> String {
        if self.args.is_null() {
            "{}".to_string()
        } else {
            self.args.to_string()
        }
    }
}

/// Assembles tool calls whose name and arguments arrive across several
/// partial deltas.
///
/// Fragments that carry no call id attach to the most recently created
/// record. One assembler serves exactly one in-flight turn; it has no
/// internal synchronization.
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    calls: HashMap<String, ToolCallRecord>,
    order: Vec<String>,
    last_id: Option<String>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or amend the record for `id`.
    ///
    /// A non-empty `name` or non-empty `args` replaces the stored value
    /// wholesale. `args_complete` only ever moves from false to true.
    pub fn update(&mut self, id: &str, name: Option<&str>, args: Option<Value>, args_complete: bool) {
        if let Some(record) = self.calls.get_mut(id) {
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                record.name = name.to_string();
            }
            if let Some(args) = args.filter(has_content) {
                record.args = args;
            }
            if args_complete {
                record.args_complete = true;
            }
            return;
        }

        let record = ToolCallRecord::new(
            id,
            name.unwrap_or_default(),
            args.unwrap_or_else(empty_args),
            args_complete,
        );
        self.calls.insert(id.to_string(), record);
        self.order.push(id.to_string());
        self.last_id = Some(id.to_string());
    }

    /// Append raw argument text to the most recently created record.
    /// Dropped silently when no record exists yet.
    pub fn append_fragment(&mut self, text: &str) {
        let Some(id) = self.last_id.as_deref() else {
            return;
        };
        if let Some(record) = self.calls.get_mut(id) {
            record.json_buffer.push_str(text);
        }
    }

    pub fn is_ready(&self, id: &str) -> bool {
        self.calls
            .get(id)
            .is_some_and(|r| !r.name.is_empty() && !r.emitted)
    }

    pub fn mark_emitted(&mut self, id: &str) {
        if let Some(record) = self.calls.get_mut(id) {
            record.emitted = true;
        }
    }

    /// Parse every pending argument buffer and mark all records complete.
    ///
    /// A buffer that fails to parse is discarded and the previous args are
    /// kept.
    pub fn finalize_all(&mut self) {
        for record in self.calls.values_mut() {
            if !record.json_buffer.is_empty() {
                let buffer = std::mem::take(&mut record.json_buffer);
                match serde_json::from_str::<Value>(&buffer) {
                    Ok(parsed) => record.args = parsed,
                    Err(e) => {
                        tracing::debug!(id = %record.id, error = %e, "discarding malformed tool arguments");
                    }
                }
            }
            record.args_complete = true;
        }
    }

    /// All records in first-sighting order.
    pub fn get_all(&self) -> Vec<&ToolCallRecord> {
        self.order.iter().filter_map(|id| self.calls.get(id)).collect()
    }

    pub fn get(&self, id: &str) -> Option<&ToolCallRecord> {
        self.calls.get(id)
    }

    /// Records for which no `ToolCall` event has been produced.
    pub fn get_pending(&self) -> Vec<&ToolCallRecord> {
        self.get_all().into_iter().filter(|r| !r.emitted).collect()
    }

    /// Mark every pending record emitted and return snapshots of them.
    pub fn emit_all_pending(&mut self) -> Vec<ToolCallRecord> {
        let mut emitted = Vec::new();
        for id in &self.order {
            if let Some(record) = self.calls.get_mut(id) {
                if !record.emitted {
                    record.emitted = true;
                    emitted.push(record.clone());
                }
            }
        }
        emitted
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
        self.order.clear();
        self.last_id = None;
    }
}

fn empty_args() -> Value {
    Value::Object(serde_json::Map::new())
}

/// `None`, `{}` and other empty containers count as "no arguments".
pub fn has_content(args: &Value) -> bool {
    match args {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
