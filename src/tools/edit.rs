use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use crate::stream::display::resolve_path;
use std::collections::HashMap;

pub struct EditTool;

#[async_trait]
impl Tool for EditTool {
    fn definition(&self) -> ToolDefinition {
        let mut params = HashMap::new();
        params.insert(
            "file_path".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "Path to the file to edit".into(),
                enum_values: None,
            },
        );
        params.insert(
            "old_string".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "The exact text to find and replace (must be unique in the file)"
                    .into(),
                enum_values: None,
            },
        );
        params.insert(
            "new_string".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "The text to replace it with".into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "edit".into(),
            description: "Edit a file by replacing an exact string. The old_string must match \
                exactly, including whitespace and indentation, and must appear exactly once."
                .into(),
            parameters: params,
            required: vec!["file_path".into(), "old_string".into(), "new_string".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let file_path = params["file_path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'file_path'".into()))?;
        let old_string = params["old_string"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'old_string'".into()))?;
        let new_string = params["new_string"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'new_string'".into()))?;

        let path = resolve_path(file_path, &ctx.working_dir);
        if !path.exists() {
            return Ok(ToolResult::error(format!("[FAILED] File not found: {file_path}")));
        }
        if !path.is_file() {
            return Ok(ToolResult::error(format!("[FAILED] Not a file: {file_path}")));
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) => return Ok(ToolResult::error(format!("[FAILED] {e}"))),
        };
        let Ok(content) = String::from_utf8(bytes) else {
            return Ok(ToolResult::error(format!(
                "[FAILED] Cannot edit file (binary or unknown encoding): {file_path}"
            )));
        };

        let count = content.matches(old_string).count();
        if count == 0 {
            return Ok(ToolResult::error(
                "[FAILED] String not found in file. Make sure the text matches exactly \
                 including whitespace."
                    .into(),
            ));
        }
        if count > 1 {
            return Ok(ToolResult::error(format!(
                "[FAILED] String appears {count} times in file. Please provide more context \
                 to make it unique."
            )));
        }

        let new_content = content.replacen(old_string, new_string, 1);
        if let Err(e) = tokio::fs::write(&path, new_content).await {
            return Ok(ToolResult::error(format!("[FAILED] {e}")));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());
        let old_lines = old_string.split('\n').count();
        let new_lines = new_string.split('\n').count();

        Ok(ToolResult::success(format!(
            "[OK]\n\nEdited {file_name}: replaced {old_lines} lines with {new_lines} lines"
        )))
    }
}
