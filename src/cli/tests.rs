use super::repl::{model_command, temp_command};
use super::*;
use crate::core::config::ProviderKind;
use crate::core::error::ProviderError;
use crate::core::message::Message;
use crate::core::provider::{ChunkStream, Provider};
use crate::core::tool::ToolDefinition;
use crate::stream::display::ToolStatus;
use crate::stream::{Event, StreamChunk};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

struct NullProvider;

#[async_trait]
impl Provider for NullProvider {
    async fn stream_response(
        &self,
        _messages: &[Message],
        _system_prompt: &str,
        _tools: &[ToolDefinition],
    ) -> Result<ChunkStream, ProviderError> {
        Ok(Box::pin(tokio_stream::empty::<Result<StreamChunk, ProviderError>>()))
    }

    fn model(&self) -> &str {
        "null-model"
    }

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }
}

fn agent_with(config: AppConfig, dir: &Path) -> Agent {
    Agent::new(
        config,
        Arc::new(NullProvider),
        Vec::new(),
        Arc::new(SkillLoader::new(vec![dir.join("skills")])),
        dir.to_path_buf(),
    )
}

// --- StreamState ---

#[test]
fn test_state_accumulates_text_and_thinking() {
    let mut state = StreamState::new();
    assert_eq!(state.handle_event(&Event::thinking("hmm ")), "thinking");
    state.handle_event(&Event::thinking("ok"));
    assert!(state.is_thinking);

    assert_eq!(state.handle_event(&Event::text("Hel")), "text");
    state.handle_event(&Event::text("lo"));
    assert!(state.is_responding);
    assert!(!state.is_thinking);

    assert_eq!(state.thinking_text, "hmm ok");
    assert_eq!(state.response_text, "Hello");
}

#[test]
fn test_state_replaces_tool_call_with_same_id() {
    let mut state = StreamState::new();
    state.handle_event(&Event::tool_call("bash", json!({}), "call_1"));
    assert!(state.is_tool_executing());

    state.handle_event(&Event::tool_call("bash", json!({"command": "ls"}), "call_1"));
    assert_eq!(state.tool_calls.len(), 1);
    assert_eq!(state.tool_calls[0].args, json!({"command": "ls"}));

    state.handle_event(&Event::tool_call("read_file", json!({"file_path": "a"}), "call_2"));
    assert_eq!(state.tool_calls.len(), 2);
}

#[test]
fn test_state_tool_results_pair_by_position() {
    let mut state = StreamState::new();
    state.handle_event(&Event::tool_call("bash", json!({"command": "ls"}), "c1"));
    state.handle_event(&Event::tool_call("bash", json!({"command": "false"}), "c2"));
    assert_eq!(state.tool_status(0), ToolStatus::Running);

    state.handle_event(&Event::tool_result("bash", "[OK]\n\na.txt", true));
    assert!(state.is_processing);
    assert_eq!(state.tool_status(0), ToolStatus::Success);
    assert_eq!(state.tool_status(1), ToolStatus::Running);

    state.handle_event(&Event::tool_result("bash", "[FAILED] Exit code: 1", false));
    assert_eq!(state.tool_status(1), ToolStatus::Error);
    assert_eq!(state.tool_status(2), ToolStatus::Pending);
    assert!(!state.is_tool_executing());
}

#[test]
fn test_state_error_appended() {
    let mut state = StreamState::new();
    state.handle_event(&Event::text("partial"));
    assert_eq!(state.handle_event(&Event::error("boom")), "error");
    assert_eq!(state.response_text, "partial\n\n[Error] boom");
    assert!(!state.is_responding);
}

#[test]
fn test_state_done_fills_empty_response() {
    let mut state = StreamState::new();
    state.handle_event(&Event::done("final answer"));
    assert_eq!(state.response_text, "final answer");

    let mut state = StreamState::new();
    state.handle_event(&Event::text("streamed"));
    state.handle_event(&Event::done("other"));
    assert_eq!(state.response_text, "streamed");
}

// --- compact tool results ---

#[test]
fn test_compact_load_skill() {
    let lines = format_tool_result_compact("load_skill", "[OK]\n\n# Skill\nlots of text", 10);
    assert_eq!(lines, vec!["  └ Successfully loaded skill"]);

    let lines = format_tool_result_compact("load_skill", "[FAILED] Skill 'x' not found", 10);
    assert_eq!(lines, vec!["  └ [FAILED] Skill 'x' not found"]);
}

#[test]
fn test_compact_empty() {
    assert_eq!(format_tool_result_compact("bash", "  \n", 10), vec!["  └ (empty)"]);
}

#[test]
fn test_compact_tree_with_overflow() {
    let content = (1..=15).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
    let lines = format_tool_result_compact("bash", &content, 10);
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0], "  └ line 1");
    assert_eq!(lines[1], "    line 2");
    assert_eq!(lines[10], "    ... +5 lines");
}

#[test]
fn test_compact_long_line_cut() {
    let long = "x".repeat(120);
    let lines = format_tool_result_compact("bash", &long, 10);
    assert_eq!(lines[0], format!("  └ {}...", "x".repeat(77)));
}

#[test]
fn test_compact_pretty_prints_json() {
    let lines = format_tool_result_compact("bash", "[OK]\n\n{\"a\":1}", 10);
    assert_eq!(lines[0], "  └ [OK]");
    assert_eq!(lines[1], "    {");
    assert_eq!(lines[2], "      \"a\": 1");
    assert_eq!(lines[3], "    }");
}

// --- REPL commands ---

#[test]
fn test_parse_command() {
    assert_eq!(parse_command("hello"), None);
    assert_eq!(parse_command("/exit"), Some(ReplCommand::Exit));
    assert_eq!(parse_command("/quit"), Some(ReplCommand::Exit));
    assert_eq!(parse_command("/Q"), Some(ReplCommand::Exit));
    assert_eq!(parse_command(" /skills "), Some(ReplCommand::Skills));
    assert_eq!(parse_command("/prompt"), Some(ReplCommand::Prompt));
    assert_eq!(parse_command("/temp"), Some(ReplCommand::Temp(None)));
    assert_eq!(
        parse_command("/temp 0.5"),
        Some(ReplCommand::Temp(Some("0.5".into())))
    );
    assert_eq!(
        parse_command("/model deepseek-chat deepseek"),
        Some(ReplCommand::Model {
            name: Some("deepseek-chat".into()),
            provider: Some("deepseek".into()),
        })
    );
    assert_eq!(parse_command("/help"), Some(ReplCommand::Help));
    assert_eq!(
        parse_command("/nope"),
        Some(ReplCommand::Unknown("/nope".into()))
    );
}

#[test]
fn test_temp_command() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.enable_thinking = false;
    let mut agent = agent_with(config, tmp.path());

    assert_eq!(temp_command(&mut agent, Some("abc")), "Invalid temperature value: abc");
    assert_eq!(
        temp_command(&mut agent, Some("1.5")),
        "Temperature must be between 0.0 and 1.0"
    );
    assert_eq!(temp_command(&mut agent, Some("0.2")), "Temperature set to 0.2");
    assert_eq!(temp_command(&mut agent, None), "Temperature: 0.2");
}

#[test]
fn test_temp_command_blocked_by_thinking() {
    let tmp = tempfile::tempdir().unwrap();
    let mut agent = agent_with(AppConfig::default(), tmp.path());

    let msg = temp_command(&mut agent, Some("0.5"));
    assert!(msg.starts_with("Cannot change temperature"));
    assert_eq!(agent.temperature(), 1.0);
}

#[test]
fn test_model_command() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.deepseek.api_key = Some("sk-ds".into());
    let mut agent = agent_with(config, tmp.path());

    assert_eq!(
        model_command(&mut agent, None, None, "t"),
        "Model: null-model (anthropic)"
    );
    assert!(model_command(&mut agent, Some("x"), Some("acme"), "t").starts_with("Unknown provider"));

    let msg = model_command(&mut agent, Some("deepseek-chat"), None, "t");
    assert_eq!(msg, "Switched to deepseek-chat (deepseek), thinking disabled");

    let msg = model_command(&mut agent, Some("gpt-4o"), None, "t");
    assert!(msg.starts_with("Failed to switch model"));
    assert_eq!(agent.model_name(), "deepseek-chat");
}

// --- argument parsing ---

#[test]
fn test_cli_parse_defaults() {
    let cli = Cli::try_parse_from(["skills-agent"]).unwrap();
    assert!(cli.prompt.is_none());
    assert!(!cli.interactive);
    assert!(!cli.web);
    assert_eq!(cli.output_format, OutputFormat::Text);
}

#[test]
fn test_cli_parse_flags() {
    let cli = Cli::try_parse_from([
        "skills-agent",
        "list files",
        "--no-thinking",
        "--cwd",
        "/tmp",
        "-f",
        "sse",
        "-d",
    ])
    .unwrap();
    assert_eq!(cli.prompt.as_deref(), Some("list files"));
    assert!(cli.no_thinking);
    assert!(cli.debug);
    assert_eq!(cli.working_dir, Some(PathBuf::from("/tmp")));
    assert_eq!(cli.output_format, OutputFormat::Sse);

    let cli = Cli::try_parse_from(["skills-agent", "--list-skills"]).unwrap();
    assert!(cli.list_skills);
}
