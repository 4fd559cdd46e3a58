use async_trait::async_trait;
use crate::core::error::ToolError;
use crate::core::tool::*;
use std::collections::HashMap;

/// Level 2 of progressive disclosure: hand the model a skill's full
/// instructions plus the paths it needs to run the bundled scripts.
pub struct LoadSkillTool;

#[async_trait]
impl Tool for LoadSkillTool {
    fn definition(&self) -> ToolDefinition {
        let mut params = HashMap::new();
        params.insert(
            "skill_name".into(),
            ParamSchema {
                param_type: "string".into(),
                description: "Name of the skill to load (e.g. 'news-extractor')".into(),
                enum_values: None,
            },
        );

        ToolDefinition {
            name: "load_skill".into(),
            description: "Load a skill's detailed instructions from its SKILL.md. Use this when \
                the user's request matches a skill's description from the available skills \
                list. The instructions may tell you to run scripts via the bash tool."
                .into(),
            parameters: params,
            required: vec!["skill_name".into()],
        }
    }

    async fn run(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: serde_json::Value =
            serde_json::from_str(&call.input).map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        let skill_name = params["skill_name"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'skill_name'".into()))?;

        let Some(skill) = ctx.skill_loader.load_skill(skill_name) else {
            let available: Vec<String> = ctx
                .skill_loader
                .scan_skills()
                .into_iter()
                .map(|s| s.name)
                .collect();
            let message = if available.is_empty() {
                format!("Skill '{skill_name}' not found. No skills are currently available.")
            } else {
                format!(
                    "Skill '{skill_name}' not found. Available skills: {}",
                    available.join(", ")
                )
            };
            return Ok(ToolResult::error(message));
        };

        let skill_path = skill.metadata.skill_path.display().to_string();
        let scripts_dir = skill.metadata.skill_path.join("scripts").display().to_string();

        let content = format!(
            "# Skill: {skill_name}\n\n\
             ## Instructions\n\n\
             {}\n\n\
             ## Skill Path Info\n\n\
             - **Skill Directory**: `{skill_path}`\n\
             - **Scripts Directory**: `{scripts_dir}`\n\n\
             **Important**: When running scripts, use absolute paths like:\n\
             ```bash\n\
             uv run {scripts_dir}/script_name.py [args]\n\
             ```\n\n",
            skill.instructions
        );

        Ok(ToolResult::success(content))
    }
}
