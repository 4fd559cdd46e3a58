use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use tracing::{debug, warn};

use crate::core::error::SkillError;

pub const SKILL_FILE: &str = "SKILL.md";
pub const DEFAULT_BASE_PROMPT: &str = "You are a helpful coding assistant.";

static FRONT_MATTER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n").ok());
static BODY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)^---\s*\n.*?\n---\s*\n(.*)$").ok());

/// Level 1: what the model sees in the system prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    /// Directory holding `SKILL.md`.
    pub skill_path: PathBuf,
}

impl SkillMetadata {
    pub fn to_prompt_line(&self) -> String {
        format!("- **{}**: {}", self.name, self.description)
    }
}

/// Level 2: full instructions, loaded on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillContent {
    pub metadata: SkillMetadata,
    pub instructions: String,
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Discovers skill bundles (`<root>/<skill>/SKILL.md`) and loads their
/// instructions.
///
/// Roots are searched in order and the first bundle to claim a name wins.
/// Scripts and reference documents inside a bundle are never read here;
/// the model discovers them from the instructions.
#[derive(Debug)]
pub struct SkillLoader {
    skill_paths: Vec<PathBuf>,
    cache: RwLock<HashMap<String, SkillMetadata>>,
}

impl SkillLoader {
    pub fn new(skill_paths: Vec<PathBuf>) -> Self {
        Self {
            skill_paths,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Project roots first, then the user's home.
    pub fn default_paths(cwd: &Path, home: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = vec![
            cwd.join(".claude").join("skills"),
            cwd.join(".agents").join("skills"),
        ];
        if let Some(home) = home {
            paths.push(home.join(".agents").join("skills"));
            paths.push(home.join(".claude").join("skills"));
        }
        paths
    }

    /// Loader over `paths`, or the standard locations when empty.
    pub fn with_defaults(paths: Vec<PathBuf>, cwd: &Path) -> Self {
        if paths.is_empty() {
            Self::new(Self::default_paths(cwd, dirs::home_dir().as_deref()))
        } else {
            Self::new(paths)
        }
    }

    pub fn skill_paths(&self) -> &[PathBuf] {
        &self.skill_paths
    }

    pub fn scan_skills(&self) -> Vec<SkillMetadata> {
        let mut skills = Vec::new();
        let mut seen = HashSet::new();

        for base in &self.skill_paths {
            let mut dirs: Vec<PathBuf> = match std::fs::read_dir(base) {
                Ok(entries) => entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.is_dir())
                    .collect(),
                Err(_) => continue,
            };
            dirs.sort();

            for dir in dirs {
                let skill_md = dir.join(SKILL_FILE);
                if !skill_md.is_file() {
                    continue;
                }
                match parse_skill_metadata(&skill_md) {
                    Ok(Some(meta)) => {
                        if seen.insert(meta.name.clone()) {
                            skills.push(meta);
                        }
                    }
                    Ok(None) => debug!(path = %skill_md.display(), "skipping skill without front-matter name"),
                    Err(e) => warn!(error = %e, "skipping unreadable skill"),
                }
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        for meta in &skills {
            cache.insert(meta.name.clone(), meta.clone());
        }
        debug!(count = skills.len(), "skills discovered");
        skills
    }

    fn cached(&self, name: &str) -> Option<SkillMetadata> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Instructions of the named skill, rescanning once on a cache miss.
    pub fn load_skill(&self, name: &str) -> Option<SkillContent> {
        let metadata = match self.cached(name) {
            Some(meta) => meta,
            None => {
                self.scan_skills();
                self.cached(name)?
            }
        };

        let skill_md = metadata.skill_path.join(SKILL_FILE);
        let content = match std::fs::read_to_string(&skill_md) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %skill_md.display(), error = %e, "cannot read skill");
                return None;
            }
        };

        Some(SkillContent {
            metadata,
            instructions: extract_instructions(&content),
        })
    }

    /// `base` (or the default prompt) followed by the skills section.
    pub fn build_system_prompt(&self, base: &str) -> String {
        let skills = self.scan_skills();

        let section = if skills.is_empty() {
            "## Skills\n\nNo skills currently available.\n".to_string()
        } else {
            let mut s = String::from("## Available Skills\n\n");
            s.push_str("You have access to the following specialized skills:\n\n");
            for skill in &skills {
                s.push_str(&skill.to_prompt_line());
                s.push('\n');
            }
            s.push('\n');
            s.push_str("### How to Use Skills\n\n");
            s.push_str("1. **Discover**: Review the skills list above\n");
            s.push_str("2. **Load**: When a user request matches a skill's description, ");
            s.push_str("use `load_skill(skill_name)` to get detailed instructions\n");
            s.push_str("3. **Execute**: Follow the skill's instructions, which may include ");
            s.push_str("running scripts via `bash`\n\n");
            s.push_str("**Important**: Only load a skill when it's relevant to the user's request. ");
            s.push_str("Script code never enters the context - only their output does.\n");
            s
        };

        let base = if base.is_empty() { DEFAULT_BASE_PROMPT } else { base };
        format!("{base}\n\n{section}")
    }
}

/// Metadata from the YAML front-matter of a `SKILL.md`. `Ok(None)` when
/// the file has no front-matter or no name.
pub fn parse_skill_metadata(skill_md: &Path) -> Result<Option<SkillMetadata>, SkillError> {
    let content = std::fs::read_to_string(skill_md)?;

    let Some(caps) = FRONT_MATTER.as_ref().and_then(|re| re.captures(&content)) else {
        return Ok(None);
    };
    let yaml = caps.get(1).map_or("", |m| m.as_str());

    let front: FrontMatter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml_ng::from_str(yaml).map_err(|e| SkillError::InvalidFrontMatter {
            path: skill_md.display().to_string(),
            message: e.to_string(),
        })?
    };

    let name = front.name.unwrap_or_default();
    if name.is_empty() {
        return Ok(None);
    }

    Ok(Some(SkillMetadata {
        name,
        description: front.description.unwrap_or_default(),
        skill_path: skill_md
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    }))
}

/// Body after the front-matter, trimmed; the whole file when there is none.
pub fn extract_instructions(content: &str) -> String {
    match BODY.as_ref().and_then(|re| re.captures(content)) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
        None => content.to_string(),
    }
}
