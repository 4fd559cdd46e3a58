use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use crate::stream::display::resolve_path;
use std::collections::HashMap;

const MAX_ENTRIES: usize = 100;

pub struct ListDirTool;

fn format_size(size: u64) -> String {
    if size < 1024 {
        format!("{size}B")
    } else if size < 1024 * 1024 {
        format!("{}KB", size / 1024)
    } else {
        format!("{}MB", size / (1024 * 1024))
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn definition(&self) -> ToolDefinition {
        let mut params = HashMap::new();
        params.insert(
            "path".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "Directory path (use '.' for the working directory)".into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "list_dir".into(),
            description: "List directory contents, directories first, with file sizes.".into(),
            parameters: params,
            required: vec!["path".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).unwrap_or(serde_json::json!({}));

        let path_str = params["path"].as_str().unwrap_or(".");
        let path = resolve_path(path_str, &ctx.working_dir);

        if !path.exists() {
            return Ok(ToolResult::error(format!("[FAILED] Directory not found: {path_str}")));
        }
        if !path.is_dir() {
            return Ok(ToolResult::error(format!("[FAILED] Not a directory: {path_str}")));
        }

        let mut dir = match tokio::fs::read_dir(&path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Ok(ToolResult::error(format!("[FAILED] Permission denied: {path_str}")));
            }
            Err(e) => return Ok(ToolResult::error(format!("[FAILED] {e}"))),
        };

        // (is_dir, name, size)
        let mut entries: Vec<(bool, String, u64)> = Vec::new();
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let meta = entry.metadata().await.ok();
                    let is_dir = meta.as_ref().is_some_and(|m| m.is_dir());
                    let size = meta.as_ref().map_or(0, |m| m.len());
                    entries.push((is_dir, entry.file_name().to_string_lossy().to_string(), size));
                }
                Ok(None) => break,
                Err(e) => return Ok(ToolResult::error(format!("[FAILED] {e}"))),
            }
        }

        entries.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
        });

        let mut lines: Vec<String> = entries
            .iter()
            .take(MAX_ENTRIES)
            .map(|(is_dir, name, size)| {
                if *is_dir {
                    format!("📁 {name}/")
                } else {
                    format!("   {name} ({})", format_size(*size))
                }
            })
            .collect();
        if entries.len() > MAX_ENTRIES {
            lines.push(format!("... and {} more entries", entries.len() - MAX_ENTRIES));
        }

        Ok(ToolResult::success(format!("[OK]\n\n{}", lines.join("\n"))))
    }
}
