mod loader;

pub use loader::{
    extract_instructions, parse_skill_metadata, SkillContent, SkillLoader, SkillMetadata,
    DEFAULT_BASE_PROMPT, SKILL_FILE,
};

#[cfg(test)]
mod tests;
