use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use crate::stream::display::{char_prefix, resolve_path};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const MAX_RESULTS: usize = 50;
const MAX_LINE_CHARS: usize = 100;
const SKIP_DIRS: &[&str] = &["node_modules", "__pycache__", "venv"];

pub struct GrepTool;

#[async_trait]
impl Tool for GrepTool {
    fn definition(&self) -> ToolDefinition {
        let mut params = HashMap::new();
        params.insert(
            "pattern".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "Regular expression pattern to search for".into(),
                enum_values: None,
            },
        );
        params.insert(
            "path".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "File or directory to search in (use '.' for the working directory)"
                    .into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "grep".into(),
            description: "Search file contents with a regex. Returns matching lines with file \
                paths and line numbers. Hidden directories, node_modules, __pycache__ and venv \
                are skipped."
                .into(),
            parameters: params,
            required: vec!["pattern".into(), "path".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let pattern = params["pattern"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'pattern'".into()))?
            .to_string();
        let path = params["path"].as_str().unwrap_or(".");

        let regex = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                return Ok(ToolResult::error(format!("[FAILED] Invalid regex pattern: {e}")));
            }
        };

        let search_path = resolve_path(path, &ctx.working_dir);
        let working_dir = ctx.working_dir.clone();

        let (results, files_searched) =
            tokio::task::spawn_blocking(move || search(&regex, &search_path, &working_dir))
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        if results.is_empty() {
            return Ok(ToolResult::success(format!(
                "No matches found for pattern: {pattern} (searched {files_searched} files)"
            )));
        }

        let mut output = results.join("\n");
        if results.len() >= MAX_RESULTS {
            output.push_str(&format!(
                "\n... (truncated, showing first {MAX_RESULTS} matches)"
            ));
        }
        Ok(ToolResult::success(format!("[OK]\n\n{output}")))
    }
}

fn search(regex: &Regex, search_path: &Path, working_dir: &Path) -> (Vec<String>, usize) {
    let files = if search_path.is_file() {
        vec![search_path.to_path_buf()]
    } else {
        let mut files = Vec::new();
        collect_files(search_path, &mut files);
        files
    };

    let mut results = Vec::new();
    let mut files_searched = 0;

    for file in files {
        if results.len() >= MAX_RESULTS {
            break;
        }
        let Ok(bytes) = std::fs::read(&file) else {
            continue;
        };
        files_searched += 1;
        let content = String::from_utf8_lossy(&bytes);
        let rel = file.strip_prefix(working_dir).unwrap_or(&file);

        for (i, line) in content.split('\n').enumerate() {
            if regex.is_match(line) {
                results.push(format!(
                    "{}:{}: {}",
                    rel.display(),
                    i + 1,
                    char_prefix(line.trim(), MAX_LINE_CHARS)
                ));
                if results.len() >= MAX_RESULTS {
                    break;
                }
            }
        }
    }

    (results, files_searched)
}

fn is_skipped(name: &str) -> bool {
    name.starts_with('.') || SKIP_DIRS.contains(&name)
}

/// Files under `dir` in name order, skipping hidden and vendored entries.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if is_skipped(&name) {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}
