use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use crate::stream::display::resolve_path;
use std::collections::HashMap;

const MAX_LINES: usize = 2000;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn definition(&self) -> ToolDefinition {
        let mut params = HashMap::new();
        params.insert(
            "file_path".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "Path to the file (absolute or relative to the working directory)"
                    .into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "read_file".into(),
            description: "Read a text file with line numbers. Use to read skill documentation, \
                inspect script output files or any text file."
                .into(),
            parameters: params,
            required: vec!["file_path".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let file_path = params["file_path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'file_path'".into()))?;

        let path = resolve_path(file_path, &ctx.working_dir);
        if !path.exists() {
            return Ok(ToolResult::error(format!("[Error] File not found: {file_path}")));
        }
        if !path.is_file() {
            return Ok(ToolResult::error(format!("[Error] Not a file: {file_path}")));
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) => return Ok(ToolResult::error(format!("[Error] Failed to read file: {e}"))),
        };
        let Ok(content) = String::from_utf8(bytes) else {
            return Ok(ToolResult::error(format!(
                "[Error] Cannot read file (binary or unknown encoding): {file_path}"
            )));
        };

        let lines: Vec<&str> = content.split('\n').collect();
        let mut numbered: Vec<String> = lines
            .iter()
            .take(MAX_LINES)
            .enumerate()
            .map(|(i, line)| format!("{:4}| {line}", i + 1))
            .collect();
        if lines.len() > MAX_LINES {
            numbered.push(format!("... ({} more lines)", lines.len() - MAX_LINES));
        }

        Ok(ToolResult::success(numbered.join("\n")))
    }
}
