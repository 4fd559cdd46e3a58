use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use crate::stream::is_success;
use std::collections::HashMap;
use tokio::process::Command;
use tracing::debug;

use super::process::{run_captured, EXEC_TIMEOUT_SECS};

pub struct BashTool;

#[async_trait]
impl Tool for BashTool {
    fn definition(&self) -> ToolDefinition {
        let mut params = HashMap::new();
        params.insert(
            "command".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "The shell command to execute".into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "bash".into(),
            description: "Execute a shell command in the working directory. \
                Use for running skill scripts (e.g. `uv run path/to/script.py args`), \
                installing dependencies and file operations. Script code does not enter \
                the context, only its output does. Times out after 300 seconds."
                .into(),
            parameters: params,
            required: vec!["command".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let command = params["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'command'".into()))?;

        debug!(command, "running shell command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).current_dir(&ctx.working_dir);

        let output = run_captured(
            cmd,
            EXEC_TIMEOUT_SECS,
            "[FAILED] Command timed out after 300 seconds.",
            &ctx.cancel_token,
        )
        .await;

        if is_success(&output) {
            Ok(ToolResult::success(output))
        } else {
            Ok(ToolResult::error(output))
        }
    }
}
