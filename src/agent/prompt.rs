use crate::skills::SkillLoader;

/// Assemble the system prompt: base instructions followed by the level-one
/// skill metadata.
pub fn build_system_prompt(skill_loader: &SkillLoader) -> String {
    skill_loader.build_system_prompt(BASE_PROMPT)
}

/// Context switch marker inserted into a thread when the acting model
/// changes.
pub fn context_switch_note(old_model: &str, new_model: &str) -> String {
    format!(
        "[System Note] Context Switch: The acting model has changed from {old_model} to {new_model}. \
         The conversation segment immediately preceding this note was generated by {old_model}."
    )
}

pub const BASE_PROMPT: &str = r#"You are a helpful coding assistant with access to specialized skills.

Your capabilities include:
- Loading and using specialized skills for specific tasks
- Executing bash commands and scripts
- Reading and writing files
- Following skill instructions to complete complex tasks

When a user request matches a skill's description, use the load_skill tool to get detailed instructions before proceeding.

Note: The user may switch models during the conversation. System markers like "[System Note] Context Switch..." indicate these transitions. Each marker defines the boundary of the conversation segment generated by the preceding model. Be aware that different segments may reflect different model capabilities or behaviors."#;
