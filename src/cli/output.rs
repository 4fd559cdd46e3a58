use anyhow::Result;
use serde_json::Value;
use std::collections::HashSet;
use std::io::{self, Write};
use tokio::sync::mpsc;

use crate::stream::display::{
    char_prefix, format_tool_compact, format_tree_output, status_symbol, truncate_middle,
    DisplayLimits, ToolStatus,
};
use crate::stream::{extract_body, is_success, ContentClassifier, ContentType, Event, SUCCESS_PREFIX};

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[90m";
const THINKING: &str = "\x1b[3;90m";
const RED: &str = "\x1b[31m";
const GREEN_BOLD: &str = "\x1b[32;1m";
const RED_BOLD: &str = "\x1b[31;1m";
const YELLOW_BOLD: &str = "\x1b[33;1m";
const BLUE_BOLD: &str = "\x1b[34;1m";

/// Lines shown under each tool in tree form.
const RESULT_TREE_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallView {
    pub id: String,
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResultView {
    pub name: String,
    pub content: String,
}

/// Accumulated view of one turn, folded from its events.
#[derive(Debug, Default)]
pub struct StreamState {
    pub thinking_text: String,
    pub response_text: String,
    pub tool_calls: Vec<ToolCallView>,
    pub tool_results: Vec<ToolResultView>,
    pub is_thinking: bool,
    pub is_responding: bool,
    /// A tool finished and the model has not answered yet.
    pub is_processing: bool,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state and return its type.
    pub fn handle_event(&mut self, event: &Event) -> &'static str {
        match event {
            Event::Thinking { content } => {
                self.is_thinking = true;
                self.is_responding = false;
                self.is_processing = false;
                self.thinking_text.push_str(content);
            }
            Event::Text { content } => {
                self.is_thinking = false;
                self.is_responding = true;
                self.is_processing = false;
                self.response_text.push_str(content);
            }
            Event::ToolCall { name, args, id } => {
                self.is_thinking = false;
                self.is_responding = false;
                self.is_processing = false;

                let view = ToolCallView {
                    id: id.clone(),
                    name: name.clone(),
                    args: args.clone(),
                };
                // Later events for the same id carry the final arguments.
                match self
                    .tool_calls
                    .iter_mut()
                    .find(|tc| !id.is_empty() && tc.id == *id)
                {
                    Some(existing) => *existing = view,
                    None => self.tool_calls.push(view),
                }
            }
            Event::ToolResult { name, content, .. } => {
                self.is_processing = true;
                self.tool_results.push(ToolResultView {
                    name: name.clone(),
                    content: content.clone(),
                });
            }
            Event::Done { response } => {
                self.is_processing = false;
                if self.response_text.is_empty() {
                    self.response_text = response.clone();
                }
            }
            Event::Error { message } => {
                self.is_processing = false;
                self.is_thinking = false;
                self.is_responding = false;
                self.response_text.push_str(&format!("\n\n[Error] {message}"));
            }
        }
        event.event_type()
    }

    /// Status of the i-th tool call; results pair with calls by position.
    pub fn tool_status(&self, index: usize) -> ToolStatus {
        match self.tool_results.get(index) {
            Some(result) if is_success(&result.content) => ToolStatus::Success,
            Some(_) => ToolStatus::Error,
            None if index < self.tool_calls.len() => ToolStatus::Running,
            None => ToolStatus::Pending,
        }
    }

    pub fn is_tool_executing(&self) -> bool {
        self.tool_calls.len() > self.tool_results.len()
    }
}

fn status_style(status: ToolStatus) -> &'static str {
    match status {
        ToolStatus::Success => GREEN_BOLD,
        ToolStatus::Error => RED_BOLD,
        ToolStatus::Running => YELLOW_BOLD,
        ToolStatus::Pending => DIM,
    }
}

/// Tree lines rendered under a finished tool call. `load_skill` collapses
/// to a one-line confirmation; JSON output is pretty-printed.
pub fn format_tool_result_compact(name: &str, content: &str, max_lines: usize) -> Vec<String> {
    if name.eq_ignore_ascii_case("load_skill") {
        return if is_success(content) {
            vec!["  └ Successfully loaded skill".to_string()]
        } else {
            vec![format!("  └ {}", char_prefix(content.trim(), 60))]
        };
    }

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return vec!["  └ (empty)".to_string()];
    }

    let body = match ContentClassifier::new().detect_type(trimmed) {
        ContentType::Json => pretty_json(trimmed),
        _ => trimmed.to_string(),
    };

    let lines: Vec<String> = body
        .split('\n')
        .map(|line| {
            if line.chars().count() > 80 {
                format!("{}...", char_prefix(line, 77))
            } else {
                line.to_string()
            }
        })
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

    format_tree_output(&refs, max_lines, "  ")
        .split('\n')
        .map(str::to_string)
        .collect()
}

fn pretty_json(content: &str) -> String {
    let (marker, body) = if content.starts_with(SUCCESS_PREFIX) {
        (Some(SUCCESS_PREFIX), extract_body(content))
    } else {
        (None, content)
    };
    let pretty = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string());
    match marker {
        Some(m) => format!("{m}\n{pretty}"),
        None => pretty,
    }
}

fn result_style(content: &str) -> &'static str {
    match ContentClassifier::new().detect_type(content) {
        ContentType::Error => RED,
        _ => DIM,
    }
}

/// Prints events as they arrive: thinking and tool progress on stderr,
/// response text on stdout.
pub struct LiveRenderer {
    state: StreamState,
    announced: HashSet<String>,
    show_thinking: bool,
    line_open: bool,
}

impl LiveRenderer {
    pub fn new(show_thinking: bool) -> Self {
        Self {
            state: StreamState::new(),
            announced: HashSet::new(),
            show_thinking,
            line_open: false,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn into_state(self) -> StreamState {
        self.state
    }

    fn close_line(&mut self) {
        if self.line_open {
            println!();
            eprintln!();
            self.line_open = false;
        }
    }

    pub fn handle(&mut self, event: &Event) {
        let was_thinking = self.state.is_thinking;
        let was_responding = self.state.is_responding;
        self.state.handle_event(event);

        match event {
            Event::Thinking { content } => {
                if !self.show_thinking {
                    return;
                }
                if !was_thinking {
                    self.close_line();
                    eprintln!("{BLUE_BOLD}🧠 Thinking{RESET}");
                }
                eprint!("{THINKING}{content}{RESET}");
                io::stderr().flush().ok();
                self.line_open = true;
            }
            Event::Text { content } => {
                if !was_responding {
                    self.close_line();
                }
                print!("{content}");
                io::stdout().flush().ok();
                self.line_open = true;
            }
            Event::ToolCall { id, name, .. } => {
                if self.announced.insert(id.clone()) {
                    self.close_line();
                    eprintln!(
                        "{YELLOW_BOLD}{} {name}{RESET}",
                        status_symbol(ToolStatus::Running)
                    );
                }
            }
            Event::ToolResult { name, content, .. } => {
                self.close_line();
                let index = self.state.tool_results.len() - 1;
                let status = self.state.tool_status(index);
                let compact = self
                    .state
                    .tool_calls
                    .get(index)
                    .map(|tc| format_tool_compact(&tc.name, &tc.args))
                    .unwrap_or_else(|| format!("{name}()"));
                eprintln!(
                    "{}{} {compact}{RESET}",
                    status_style(status),
                    status_symbol(status)
                );
                let style = result_style(content);
                for line in format_tool_result_compact(name, content, RESULT_TREE_LINES) {
                    eprintln!("{style}{line}{RESET}");
                }
            }
            Event::Done { .. } => {
                self.close_line();
            }
            Event::Error { message } => {
                self.close_line();
                eprintln!("{RED_BOLD}[Error]{RESET} {message}");
            }
        }
    }
}

/// Drain a turn's events through a `LiveRenderer`.
pub async fn render_stream(
    rx: &mut mpsc::Receiver<Event>,
    show_thinking: bool,
) -> Result<StreamState> {
    let mut renderer = LiveRenderer::new(show_thinking);
    while let Some(event) = rx.recv().await {
        tracing::debug!(event = event.event_type(), "render");
        renderer.handle(&event);
    }
    renderer.close_line();
    Ok(renderer.into_state())
}

/// Summary after a single request: thinking (middle elided) and every tool
/// call with its status and output tree.
pub fn render_final(state: &StreamState, show_tools: bool) {
    let mut err = io::stderr();

    if !state.thinking_text.is_empty() {
        let thinking = truncate_middle(&state.thinking_text, DisplayLimits::THINKING_FINAL);
        let _ = writeln!(err, "\n{BLUE_BOLD}🧠 Thinking{RESET}\n{DIM}{thinking}{RESET}");
    }

    if show_tools && !state.tool_calls.is_empty() {
        let _ = writeln!(err);
        for (i, tc) in state.tool_calls.iter().enumerate() {
            let status = state.tool_status(i);
            let status = if status == ToolStatus::Running {
                ToolStatus::Pending
            } else {
                status
            };
            let _ = writeln!(
                err,
                "{}{} {}{RESET}",
                status_style(status),
                status_symbol(status),
                format_tool_compact(&tc.name, &tc.args)
            );
            if let Some(result) = state.tool_results.get(i) {
                let style = result_style(&result.content);
                for line in format_tool_result_compact(&result.name, &result.content, RESULT_TREE_LINES) {
                    let _ = writeln!(err, "{style}{line}{RESET}");
                }
            }
        }
        let _ = writeln!(err);
    }
}
