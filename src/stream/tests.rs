use super::display::*;
use super::*;
use serde_json::json;

// --- assembler ---

#[test]
fn test_ready_after_named_update() {
    let mut asm = ToolCallAssembler::new();
    assert!(!asm.is_ready("a"));

    asm.update("a", Some("bash"), None, false);
    assert!(asm.is_ready("a"));

    let record = asm.get("a").unwrap();
    assert_eq!(record.args, json!({}));
    assert!(!record.args_complete);
}

#[test]
fn test_unnamed_update_is_not_ready() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", None, Some(json!({"k": "v"})), false);
    assert!(!asm.is_ready("a"));

    asm.update("a", Some("grep"), None, false);
    assert!(asm.is_ready("a"));
}

#[test]
fn test_mark_emitted_blocks_readiness() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", Some("bash"), None, false);
    asm.mark_emitted("a");
    asm.mark_emitted("a");
    assert!(!asm.is_ready("a"));

    asm.update("a", Some("bash"), Some(json!({"command": "ls"})), false);
    assert!(!asm.is_ready("a"));
    assert!(asm.get("a").unwrap().emitted);

    asm.clear();
    asm.update("a", Some("bash"), None, false);
    assert!(asm.is_ready("a"));
}

#[test]
fn test_args_complete_is_monotonic() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", Some("bash"), None, true);
    asm.update("a", None, None, false);
    asm.update("a", Some("bash"), Some(json!({"x": 1})), false);
    assert!(asm.get("a").unwrap().args_complete);
}

#[test]
fn test_update_replaces_args_wholesale() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", Some("edit"), Some(json!({"file_path": "a.txt", "old_string": "x"})), false);
    asm.update("a", None, Some(json!({"file_path": "b.txt"})), false);
    asm.update("a", Some(""), Some(json!({})), false);

    let record = asm.get("a").unwrap();
    assert_eq!(record.name, "edit");
    assert_eq!(record.args, json!({"file_path": "b.txt"}));
}

#[test]
fn test_fragments_concatenate_on_finalize() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", Some("bash"), None, false);
    asm.append_fragment(r#"{"command": "ec"#);
    asm.append_fragment(r#"ho hi"}"#);
    assert_eq!(asm.get("a").unwrap().json_buffer(), r#"{"command": "echo hi"}"#);

    asm.finalize_all();

    let record = asm.get("a").unwrap();
    assert_eq!(record.args, json!({"command": "echo hi"}));
    assert!(record.args_complete);
    assert!(record.json_buffer().is_empty());
}

#[test]
fn test_malformed_fragment_keeps_prior_args() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", Some("bash"), Some(json!({"k": "v"})), false);
    asm.append_fragment("not json");
    asm.finalize_all();

    let record = asm.get("a").unwrap();
    assert_eq!(record.args, json!({"k": "v"}));
    assert!(record.args_complete);
    assert!(record.json_buffer().is_empty());

    // A second finalize has nothing left to retry.
    asm.finalize_all();
    assert_eq!(asm.get("a").unwrap().args, json!({"k": "v"}));
}

#[test]
fn test_fragment_without_any_call_is_dropped() {
    let mut asm = ToolCallAssembler::new();
    asm.append_fragment(r#"{"a": 1}"#);
    asm.finalize_all();
    assert!(asm.is_empty());
}

#[test]
fn test_fragments_follow_most_recently_created_call() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", Some("glob"), None, false);
    asm.append_fragment(r#"{"pattern": "*.rs"}"#);
    asm.update("b", Some("grep"), None, false);
    // Amending an older call does not redirect fragments.
    asm.update("a", Some("glob"), None, false);
    asm.append_fragment(r#"{"pattern": "fn", "path": "."}"#);
    asm.finalize_all();

    assert_eq!(asm.get("a").unwrap().args, json!({"pattern": "*.rs"}));
    assert_eq!(asm.get("b").unwrap().args, json!({"pattern": "fn", "path": "."}));
}

#[test]
fn test_finalize_marks_calls_without_fragments_complete() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", Some("list_dir"), None, false);
    asm.finalize_all();
    let record = asm.get("a").unwrap();
    assert!(record.args_complete);
    assert_eq!(record.args, json!({}));
}

#[test]
fn test_get_all_keeps_first_sighting_order() {
    let mut asm = ToolCallAssembler::new();
    for id in ["c", "a", "b"] {
        asm.update(id, Some("bash"), None, false);
    }
    asm.update("a", Some("python"), None, false);
    let ids: Vec<&str> = asm.get_all().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(asm.len(), 3);
}

#[test]
fn test_pending_and_emit_all_pending() {
    let mut asm = ToolCallAssembler::new();
    asm.update("a", Some("bash"), None, false);
    asm.update("b", Some("glob"), None, false);
    asm.mark_emitted("a");

    let pending: Vec<&str> = asm.get_pending().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(pending, vec!["b"]);

    let emitted = asm.emit_all_pending();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].id, "b");
    assert!(asm.get_pending().is_empty());
    assert!(asm.emit_all_pending().is_empty());
}

// --- classifier ---

#[test]
fn test_classify_examples() {
    let c = ContentClassifier::new();
    assert_eq!(c.classify("[OK]\n\n{\"a\":1}").content_type, ContentType::Json);
    assert_eq!(c.classify("[FAILED] exit 1").content_type, ContentType::Error);
    assert_eq!(c.classify("# Title\nbody").content_type, ContentType::Markdown);
    assert_eq!(c.classify("plain text").content_type, ContentType::Text);
    assert_eq!(c.classify("").content_type, ContentType::Text);
}

#[test]
fn test_classify_success_and_json() {
    let c = ContentClassifier::new();
    let ok = c.classify("[OK]\n\nfile1.rs\nfile2.rs");
    assert_eq!(ok.content_type, ContentType::Success);
    assert!(ok.success);

    let bare = c.classify("  [1, 2, 3]  ");
    assert_eq!(bare.content_type, ContentType::Json);
    assert!(bare.success);

    // Looks like JSON but does not parse.
    assert_eq!(c.detect_type("{\"a\": 1"), ContentType::Text);
    assert_eq!(c.detect_type("{not json} **bold**"), ContentType::Markdown);
}

#[test]
fn test_ok_marker_wins_over_error_patterns() {
    let c = ContentClassifier::new();
    let result = c.classify("[OK]\n\nTraceback (most recent call last):\n  boom");
    assert_eq!(result.content_type, ContentType::Success);
    assert!(result.success);
}

#[test]
fn test_error_patterns_before_markdown() {
    let c = ContentClassifier::new();
    let result = c.classify("## Report\nValueError: bad input");
    assert_eq!(result.content_type, ContentType::Error);
    assert!(!result.success);
    assert_eq!(c.detect_type("- **item**"), ContentType::Markdown);
    assert_eq!(c.detect_type("see ```code```"), ContentType::Markdown);
}

#[test]
fn test_classify_is_deterministic() {
    let c = ContentClassifier::new();
    let input = String::from("[OK]\n\n[{\"x\": true}]");
    let first = c.classify(&input);
    let second = c.classify(&input);
    assert_eq!(first, second);
    assert_eq!(input, "[OK]\n\n[{\"x\": true}]");
}

#[test]
fn test_is_success_examples() {
    assert!(is_success("[OK]\nok"));
    assert!(!is_success("[FAILED] x"));
    assert!(!is_success("Traceback (most recent call last):\n..."));
    assert!(is_success(""));
    assert!(is_success("   \n  "));
    assert!(!is_success("RuntimeException: nope"));
    assert!(is_success("  [OK] Error: mentioned but fine"));
}

#[test]
fn test_extract_body() {
    assert_eq!(extract_body("[OK]\n\n  body text \n"), "body text");
    assert_eq!(extract_body("[OK]\nonly one line"), "");
    assert_eq!(extract_body("[OK]"), "");
}

#[test]
fn test_content_type_strings() {
    assert_eq!(ContentType::Markdown.as_str(), "markdown");
    assert_eq!(ContentType::Json.to_string(), "json");
    let value = serde_json::to_value(ContentClassifier::new().classify("[FAILED]")).unwrap();
    assert_eq!(value, json!({"type": "error", "success": false}));
}

// --- events and SSE ---

#[test]
fn test_event_wire_shape() {
    let call = Event::tool_call("grep", json!({"pattern": "foo"}), "1");
    assert_eq!(
        serde_json::to_value(&call).unwrap(),
        json!({"type": "tool_call", "name": "grep", "args": {"pattern": "foo"}, "id": "1"})
    );

    let result = Event::tool_result("bash", "[OK]", true);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"type": "tool_result", "name": "bash", "content": "[OK]", "success": true})
    );

    assert_eq!(
        serde_json::to_value(Event::done("hi")).unwrap(),
        json!({"type": "done", "response": "hi"})
    );
    assert_eq!(
        serde_json::to_value(Event::error("boom")).unwrap(),
        json!({"type": "error", "message": "boom"})
    );
}

#[test]
fn test_sse_frame_renames_error_label_only() {
    let frame = Event::error("boom").to_sse_frame();
    assert_eq!(
        frame,
        "event: agent_error\ndata: {\"type\":\"error\",\"message\":\"boom\"}\n\n"
    );

    let frame = Event::text("你好").to_sse_frame();
    assert_eq!(frame, "event: text\ndata: {\"type\":\"text\",\"content\":\"你好\"}\n\n");

    let frame = to_sse_frame("thinking", &json!({"type": "thinking", "content": "x"}));
    assert!(frame.starts_with("event: thinking\ndata: "));
    assert!(frame.ends_with("\n\n"));
    assert_eq!(Event::done("").sse_label(), "done");
}

// --- chunk deserialization ---

#[test]
fn test_chunk_content_shapes() {
    let plain: StreamChunk =
        serde_json::from_value(json!({"kind": "message", "content": "hello"})).unwrap();
    assert_eq!(plain, StreamChunk::text("hello"));

    let blocks: StreamChunk = serde_json::from_value(json!({
        "kind": "message",
        "content": [
            {"type": "reasoning", "reasoning": "hmm"},
            {"type": "text", "content": "hi"},
            {"type": "image_url", "url": "http://x"},
            {"type": "tool_call_chunk", "id": null, "name": null, "args": "{\"a\"", "index": 0}
        ]
    }))
    .unwrap();

    let StreamChunk::Message { content: ChunkContent::Blocks(blocks), .. } = blocks else {
        panic!("expected blocks");
    };
    assert_eq!(blocks[0], ContentBlock::thinking("hmm"));
    assert_eq!(blocks[1], ContentBlock::text("hi"));
    assert_eq!(blocks[2], ContentBlock::Unknown);
    assert!(matches!(
        &blocks[3],
        ContentBlock::ToolCallChunk { id: None, args: Some(a), .. } if a == "{\"a\""
    ));
}

#[test]
fn test_thinking_signature_lookup() {
    let chunk = StreamChunk::block(ContentBlock::Thinking {
        thinking: String::new(),
        signature: Some("sig-1".into()),
    });
    assert_eq!(chunk.thinking_signature(), Some("sig-1"));
    assert_eq!(StreamChunk::text("x").thinking_signature(), None);
}

// --- normalizer ---

#[test]
fn test_end_to_end_tool_call_then_result() {
    let mut n = StreamNormalizer::new();
    let mut events = Vec::new();

    events.extend(n.ingest(StreamChunk::block(ContentBlock::ToolCallChunk {
        id: Some("1".into()),
        name: Some("grep".into()),
        args: None,
        index: Some(0),
    })));
    events.extend(n.ingest(StreamChunk::block(ContentBlock::ToolCallChunk {
        id: None,
        name: None,
        args: Some(r#"{"pattern":"foo"}"#.into()),
        index: Some(0),
    })));
    n.finalize_tool_calls();

    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], Event::ToolCall { name, id, .. } if name == "grep" && id == "1"));
    assert_eq!(n.assembler().get("1").unwrap().args, json!({"pattern": "foo"}));

    let content = "[OK]\n\nmatch1\nmatch2";
    assert!(is_success(content));

    let after = n.ingest(StreamChunk::tool("grep", content, Some("1".into())));
    assert_eq!(after.len(), 2);
    assert_eq!(after[0], Event::tool_call("grep", json!({"pattern": "foo"}), "1"));
    assert_eq!(after[1], Event::tool_result("grep", content, true));
}

#[test]
fn test_tool_use_block_announced_once() {
    let mut n = StreamNormalizer::new();
    let block = ContentBlock::ToolUse {
        id: "t1".into(),
        name: "bash".into(),
        input: json!({}),
    };
    let first = n.ingest(StreamChunk::block(block.clone()));
    let again = n.ingest(StreamChunk::block(block));
    let via_list = n.ingest(StreamChunk::tool_calls(vec![ToolCallDelta {
        id: "t1".into(),
        name: "bash".into(),
        args: json!({"command": "ls"}),
    }]));

    assert_eq!(first, vec![Event::tool_call("bash", json!({}), "t1")]);
    assert!(again.is_empty());
    assert!(via_list.is_empty());
    assert_eq!(n.assembler().get("t1").unwrap().args, json!({"command": "ls"}));
}

#[test]
fn test_input_json_delta_completes_tool_use() {
    let mut n = StreamNormalizer::new();
    n.ingest(StreamChunk::block(ContentBlock::ToolUse {
        id: "t1".into(),
        name: "read_file".into(),
        input: json!({}),
    }));
    n.ingest(StreamChunk::block(ContentBlock::input_json_delta(r#"{"file_path":"#)));
    n.ingest(StreamChunk::block(ContentBlock::input_json_delta(r#""a.txt"}"#)));

    let events = n.ingest(StreamChunk::tool("read_file", "   1| hello", Some("t1".into())));
    assert_eq!(events[0], Event::tool_call("read_file", json!({"file_path": "a.txt"}), "t1"));
    assert!(n.assembler().get("t1").unwrap().args_complete);
}

#[test]
fn test_non_mapping_args_are_treated_as_empty() {
    let mut n = StreamNormalizer::new();
    let events = n.ingest(StreamChunk::block(ContentBlock::ToolCall {
        id: "x".into(),
        name: "glob".into(),
        args: json!("*.rs"),
    }));
    assert_eq!(events, vec![Event::tool_call("glob", json!({}), "x")]);
}

#[test]
fn test_blocks_without_id_are_ignored() {
    let mut n = StreamNormalizer::new();
    let events = n.ingest(StreamChunk::block(ContentBlock::ToolUse {
        id: String::new(),
        name: "bash".into(),
        input: json!({"command": "ls"}),
    }));
    assert!(events.is_empty());
    assert!(n.assembler().is_empty());
}

#[test]
fn test_text_and_thinking_events() {
    let mut n = StreamNormalizer::new();
    let mut events = n.ingest(StreamChunk::blocks(vec![
        ContentBlock::thinking("let me see"),
        ContentBlock::thinking(""),
        ContentBlock::text("Hello"),
        ContentBlock::Unknown,
    ]));
    events.extend(n.ingest(StreamChunk::text("")));
    events.extend(n.ingest(StreamChunk::text(" world")));

    assert_eq!(
        events,
        vec![
            Event::thinking("let me see"),
            Event::text("Hello"),
            Event::text(" world"),
        ]
    );
    assert_eq!(n.finish(), Event::done("Hello world"));
}

#[test]
fn test_tool_result_truncation() {
    let mut n = StreamNormalizer::new();
    let long = "a".repeat(DisplayLimits::TOOL_RESULT_MAX + 10);
    let events = n.ingest(StreamChunk::tool("bash", long, None));
    let Event::ToolResult { content, success, .. } = &events[0] else {
        panic!("expected tool result");
    };
    assert!(content.ends_with("\n... (truncated)"));
    assert_eq!(
        content.chars().count(),
        DisplayLimits::TOOL_RESULT_MAX + "\n... (truncated)".chars().count()
    );
    assert!(*success);
}

#[test]
fn test_failed_tool_result_is_not_success() {
    let mut n = StreamNormalizer::new();
    let events = n.ingest(StreamChunk::tool("bash", "[FAILED] Exit code: 2\n\nnope", None));
    assert_eq!(
        events,
        vec![Event::tool_result("bash", "[FAILED] Exit code: 2\n\nnope", false)]
    );
}

#[test]
fn test_fail_and_reset() {
    let mut n = StreamNormalizer::new();
    n.ingest(StreamChunk::text("partial"));
    assert!(!n.error_emitted());
    assert_eq!(n.fail("connection reset"), Event::error("connection reset"));
    assert!(n.error_emitted());

    n.reset();
    assert!(!n.error_emitted());
    assert_eq!(n.full_response(), "");
    assert!(n.assembler().is_empty());
}

// --- display helpers ---

#[test]
fn test_truncate_by_chars() {
    assert_eq!(truncate("hello", 10, TRUNCATION_SUFFIX), "hello");
    assert_eq!(truncate("héllo wörld", 5, "…"), "héllo…");
    assert_eq!(truncate_middle("abcdefghij", 4), "ab\n\n... (truncated) ...\n\nij");
}

#[test]
fn test_format_tool_compact() {
    assert_eq!(format_tool_compact("bash", &json!({})), "bash()");
    assert_eq!(format_tool_compact("bash", &json!({"command": "git status"})), "Bash(git status)");

    let long_cmd = "x".repeat(60);
    assert_eq!(
        format_tool_compact("bash", &json!({"command": long_cmd})),
        format!("Bash({}...)", "x".repeat(47))
    );

    let long_path = "/very/long/directory/structure/for/testing/file.py";
    assert_eq!(
        format_tool_compact("read_file", &json!({"file_path": long_path})),
        "Read(.../testing/file.py)"
    );
    assert_eq!(format_tool_compact("edit", &json!({"file_path": "a.rs"})), "Edit(a.rs)");
    assert_eq!(format_tool_compact("grep", &json!({"pattern": "fn main"})), "Grep(fn main, .)");
    assert_eq!(format_tool_compact("list_dir", &json!({"path": "src"})), "ListDir(src)");
    assert_eq!(format_tool_compact("load_skill", &json!({"skill_name": "pdf"})), "Skill(pdf)");
    assert_eq!(
        format_tool_compact("custom", &json!({"alpha": "1", "beta": 2, "gamma": 3})),
        "custom(alpha=1, beta=2)"
    );
    assert_eq!(
        format_tool_compact("custom", &json!({"alpha": "y".repeat(30)})),
        format!("custom(alpha={}...)", "y".repeat(17))
    );
}

#[test]
fn test_has_args() {
    assert!(!has_args(&json!(null)));
    assert!(!has_args(&json!({})));
    assert!(has_args(&json!({"a": 1})));
}

#[test]
fn test_format_tree_output() {
    assert_eq!(format_tree_output(&[], 5, "  "), "");
    let lines = ["one", "two", "three"];
    assert_eq!(format_tree_output(&lines, 2, "  "), "  └ one\n    two\n    ... +1 lines");
    assert_eq!(format_tree_output(&lines[..1], 5, ""), "└ one");
}

#[test]
fn test_line_helpers() {
    assert_eq!(count_lines(""), 0);
    assert_eq!(count_lines("a\nb\n"), 2);
    assert_eq!(truncate_with_line_hint("a\nb\nc\n", 2), ("a\nb".to_string(), 1));
    assert_eq!(truncate_with_line_hint("a\nb", 5), ("a\nb".to_string(), 0));
}

#[test]
fn test_resolve_path() {
    let wd = std::path::Path::new("/work");
    assert_eq!(resolve_path("src/main.rs", wd), std::path::PathBuf::from("/work/src/main.rs"));
    assert_eq!(resolve_path("/etc/hosts", wd), std::path::PathBuf::from("/etc/hosts"));
    if let Some(home) = dirs::home_dir() {
        assert_eq!(resolve_path("~/notes.md", wd), home.join("notes.md"));
    }
}

#[test]
fn test_status_symbols() {
    assert_eq!(ToolStatus::Success.symbol(true), "●");
    assert_eq!(ToolStatus::Pending.symbol(true), "○");
    assert_eq!(ToolStatus::Running.symbol(false), "*");
    assert_eq!(ToolStatus::Error.symbol(false), "x");
}
