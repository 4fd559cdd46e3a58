use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use crate::stream::is_success;
use std::collections::HashMap;
use tokio::process::Command;

use super::process::{run_captured, EXEC_TIMEOUT_SECS};

pub struct PythonTool;

#[async_trait]
impl Tool for PythonTool {
    fn definition(&self) -> ToolDefinition {
        let mut params = HashMap::new();
        params.insert(
            "code".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "Python code to execute".into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "python".into(),
            description: "Execute Python code in a separate process. Use for calculations, \
                data processing and quick scripts. Variables and state are not preserved \
                between calls."
                .into(),
            parameters: params,
            required: vec!["code".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let code = params["code"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'code'".into()))?;

        let script = ctx
            .working_dir
            .join(format!(".skills-agent-{}.py", uuid::Uuid::new_v4().simple()));

        if let Err(e) = tokio::fs::write(&script, code).await {
            return Ok(ToolResult::error(format!("[FAILED] {e}")));
        }

        let mut cmd = Command::new("python3");
        cmd.arg(&script).current_dir(&ctx.working_dir);

        let output = run_captured(
            cmd,
            EXEC_TIMEOUT_SECS,
            "[FAILED] Execution timed out after 300 seconds.",
            &ctx.cancel_token,
        )
        .await;

        if let Err(e) = tokio::fs::remove_file(&script).await {
            tracing::debug!(path = %script.display(), error = %e, "could not remove temp script");
        }

        if is_success(&output) {
            Ok(ToolResult::success(output))
        } else {
            Ok(ToolResult::error(output))
        }
    }
}
