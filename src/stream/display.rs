use serde_json::Value;
use std::path::{Component, Path, PathBuf};

pub const TRUNCATION_SUFFIX: &str = "\n... (truncated)";

/// Length limits for rendered stream content, in characters.
pub struct DisplayLimits;

impl DisplayLimits {
    pub const THINKING_STREAM: usize = 1000;
    pub const THINKING_FINAL: usize = 2000;
    pub const ARGS_INLINE: usize = 100;
    pub const ARGS_FORMATTED: usize = 300;
    pub const TOOL_RESULT_STREAM: usize = 500;
    pub const TOOL_RESULT_FINAL: usize = 800;
    pub const TOOL_RESULT_MAX: usize = 2000;
}

/// Tool execution state shown next to each tool line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Running,
    Success,
    Error,
    Pending,
}

impl ToolStatus {
    pub fn symbol(&self, unicode: bool) -> &'static str {
        match (self, unicode) {
            (Self::Pending, true) => "○",
            (_, true) => "●",
            (Self::Running, false) => "*",
            (Self::Success, false) => "+",
            (Self::Error, false) => "x",
            (Self::Pending, false) => "-",
        }
    }
}

/// Status symbol for the current terminal, ASCII when the locale is not UTF-8.
pub fn status_symbol(status: ToolStatus) -> &'static str {
    status.symbol(terminal_supports_unicode())
}

fn terminal_supports_unicode() -> bool {
    for var in ["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                let lower = value.to_lowercase();
                return lower.contains("utf-8") || lower.contains("utf8");
            }
        }
    }
    !cfg!(windows)
}

/// Longest prefix of `s` holding at most `n` characters.
pub fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn char_suffix(s: &str, n: usize) -> &str {
    let total = s.chars().count();
    if total <= n {
        return s;
    }
    match s.char_indices().nth(total - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

pub fn truncate(content: &str, max_chars: usize, suffix: &str) -> String {
    if content.chars().count() > max_chars {
        format!("{}{}", char_prefix(content, max_chars), suffix)
    } else {
        content.to_string()
    }
}

/// Keep the head and the tail of long text, eliding the middle.
pub fn truncate_middle(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let half = max_chars / 2;
    format!(
        "{}\n\n... (truncated) ...\n\n{}",
        char_prefix(content, half),
        char_suffix(content, half)
    )
}

/// Shorten to `max` characters, marking the cut with `...`.
fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", char_prefix(s, max - 3))
    } else {
        s.to_string()
    }
}

/// An empty mapping means "no arguments" but is still a valid payload.
pub fn has_args(args: &Value) -> bool {
    match args {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Resolve a tool-supplied path: `~` expands to the home directory and
/// relative paths are joined onto `working_dir`.
pub fn resolve_path(file_path: &str, working_dir: &Path) -> PathBuf {
    let expanded = if file_path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(file_path))
    } else if let Some(rest) = file_path.strip_prefix("~/") {
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(file_path),
        }
    } else {
        PathBuf::from(file_path)
    };

    if expanded.is_absolute() {
        expanded
    } else {
        working_dir.join(expanded)
    }
}

fn arg_string(args: &Value, key: &str, default: &str) -> String {
    match args.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

fn shorten_path(path: String) -> String {
    if path.chars().count() <= 40 {
        return path;
    }
    let parts: Vec<String> = Path::new(&path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.len() > 2 {
        format!(".../{}", parts[parts.len() - 2..].join("/"))
    } else {
        path
    }
}

/// Compact one-line form of a tool invocation, e.g. `Bash(git status)`.
pub fn format_tool_compact(name: &str, args: &Value) -> String {
    if !has_args(args) {
        return format!("{name}()");
    }

    match name.to_lowercase().as_str() {
        "bash" => format!("Bash({})", ellipsize(&arg_string(args, "command", ""), 50)),
        "read" | "read_file" => format!("Read({})", shorten_path(arg_string(args, "file_path", ""))),
        "write" | "write_file" => format!("Write({})", shorten_path(arg_string(args, "file_path", ""))),
        "edit" => format!("Edit({})", shorten_path(arg_string(args, "file_path", ""))),
        "glob" => format!("Glob({})", ellipsize(&arg_string(args, "pattern", ""), 40)),
        "grep" => format!(
            "Grep({}, {})",
            ellipsize(&arg_string(args, "pattern", ""), 30),
            arg_string(args, "path", ".")
        ),
        "list_dir" => format!("ListDir({})", arg_string(args, "path", ".")),
        "load_skill" => format!("Skill({})", arg_string(args, "skill_name", "")),
        _ => {
            let params: Vec<String> = args
                .as_object()
                .map(|map| {
                    map.iter()
                        .take(2)
                        .map(|(k, v)| {
                            let v_str = match v {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            format!("{k}={}", ellipsize(&v_str, 20))
                        })
                        .collect()
                })
                .unwrap_or_default();
            format!("{name}({})", ellipsize(&params.join(", "), 50))
        }
    }
}

/// Tree-style rendering of output lines:
///
/// ```text
///   └ On branch main
///     Your branch is up to date
///     ... +16 lines
/// ```
pub fn format_tree_output(lines: &[&str], max_lines: usize, indent: &str) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let mut result: Vec<String> = lines
        .iter()
        .take(max_lines)
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 { "└" } else { " " };
            format!("{indent}{prefix} {line}")
        })
        .collect();

    if lines.len() > max_lines {
        result.push(format!("{indent}  ... +{} lines", lines.len() - max_lines));
    }

    result.join("\n")
}

pub fn count_lines(content: &str) -> usize {
    if content.is_empty() {
        return 0;
    }
    content.trim().split('\n').count()
}

/// First `max_lines` lines of the trimmed content and how many were cut.
pub fn truncate_with_line_hint(content: &str, max_lines: usize) -> (String, usize) {
    let trimmed = content.trim();
    let lines: Vec<&str> = trimmed.split('\n').collect();
    if lines.len() <= max_lines {
        return (trimmed.to_string(), 0);
    }
    (lines[..max_lines].join("\n"), lines.len() - max_lines)
}
