use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use crate::stream::display::resolve_path;
use std::collections::HashMap;

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
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
        params.insert(
            "content".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "Content to write to the file".into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "write_file".into(),
            description: "Write content to a file. Creates the file if it doesn't exist, \
                or overwrites if it does. Creates parent directories as needed."
                .into(),
            parameters: params,
            required: vec!["file_path".into(), "content".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let file_path = params["file_path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'file_path'".into()))?;
        let content = params["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'content'".into()))?;

        let path = resolve_path(file_path, &ctx.working_dir);

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(ToolResult::error(format!("[Error] Failed to write file: {e}")));
            }
        }

        match tokio::fs::write(&path, content).await {
            Ok(()) => Ok(ToolResult::success(format!(
                "[Success] File written: {}",
                path.display()
            ))),
            Err(e) => Ok(ToolResult::error(format!("[Error] Failed to write file: {e}"))),
        }
    }
}
