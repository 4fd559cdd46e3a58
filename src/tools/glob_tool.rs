use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use std::collections::HashMap;
use std::path::PathBuf;

const MAX_RESULTS: usize = 100;

pub struct GlobTool;

#[async_trait]
impl Tool for GlobTool {
    fn definition(&self) -> ToolDefinition {
        let mut params = HashMap::new();
        params.insert(
            "pattern".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "Glob pattern (e.g. '**/*.py', 'src/**/*.ts', '*.md')".into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "glob".into(),
            description: "Find files matching a glob pattern relative to the working directory. \
                Returns sorted paths."
                .into(),
            parameters: params,
            required: vec!["pattern".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let pattern = params["pattern"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'pattern'".into()))?;

        let full_pattern = ctx.working_dir.join(pattern).to_string_lossy().to_string();
        let paths = match glob::glob(&full_pattern) {
            Ok(paths) => paths,
            Err(e) => return Ok(ToolResult::error(format!("[FAILED] {e}"))),
        };

        let mut matches: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
        matches.sort();

        if matches.is_empty() {
            return Ok(ToolResult::success(format!(
                "No files matching pattern: {pattern}"
            )));
        }

        let mut lines: Vec<String> = matches
            .iter()
            .take(MAX_RESULTS)
            .map(|p| {
                p.strip_prefix(&ctx.working_dir)
                    .unwrap_or(p)
                    .display()
                    .to_string()
            })
            .collect();
        if matches.len() > MAX_RESULTS {
            lines.push(format!("... and {} more files", matches.len() - MAX_RESULTS));
        }

        Ok(ToolResult::success(format!("[OK]\n\n{}", lines.join("\n"))))
    }
}
