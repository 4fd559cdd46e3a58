use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::error::ConfigError;

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_MAX_TOKENS: u32 = 16_000;
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_THINKING_BUDGET: u32 = 10_000;

/// DeepSeek rejects larger completion budgets.
const DEEPSEEK_MAX_TOKENS: u32 = 65_535;

const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];

/// Model vendor the agent talks to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    DeepSeek,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
            Self::OpenAi => "openai",
        }
    }

    /// Prefix of the `<PREFIX>_API_KEY` / `<PREFIX>_BASE_URL` variables.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC",
            Self::DeepSeek => "DEEPSEEK",
            Self::OpenAi => "OPENAI",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => DEFAULT_MODEL,
            Self::DeepSeek => "deepseek-reasoner",
            Self::OpenAi => "o1-preview",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::DeepSeek => "https://api.deepseek.com",
            Self::OpenAi => "https://api.openai.com",
        }
    }

    /// Guess the vendor from a model name.
    pub fn infer_from_model(model: &str) -> Option<Self> {
        let model = model.to_lowercase();
        if model.contains("claude") {
            Some(Self::Anthropic)
        } else if model.contains("deepseek") {
            Some(Self::DeepSeek)
        } else if model.contains("gpt") || model.contains("o1-") {
            Some(Self::OpenAi)
        } else {
            None
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "deepseek" => Ok(Self::DeepSeek),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::Invalid(format!("unknown provider: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCredentials {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Bearer token alternative to `api_key` (Anthropic only).
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
            || self.auth_token.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_web_host() -> String {
    "0.0.0.0".into()
}

fn default_web_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Comma separated origins; blank entries are dropped and an all-blank
/// value falls back to the defaults.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if origins.is_empty() {
        default_cors_origins()
    } else {
        origins
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Resolved by `load_config`; `None` only before resolution.
    #[serde(default)]
    pub provider: Option<ProviderKind>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub anthropic: ProviderCredentials,

    #[serde(default)]
    pub deepseek: ProviderCredentials,

    #[serde(default)]
    pub openai: ProviderCredentials,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_true")]
    pub enable_thinking: bool,

    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,

    /// Skill search roots; empty means the standard locations.
    #[serde(default)]
    pub skill_paths: Vec<PathBuf>,

    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub debug: bool,
}

fn default_working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_true() -> bool {
    true
}

fn default_thinking_budget() -> u32 {
    DEFAULT_THINKING_BUDGET
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            provider: None,
            model: None,
            anthropic: ProviderCredentials::default(),
            deepseek: ProviderCredentials::default(),
            openai: ProviderCredentials::default(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            enable_thinking: true,
            thinking_budget: default_thinking_budget(),
            skill_paths: Vec::new(),
            web: WebConfig::default(),
            debug: false,
        }
    }
}

pub fn load_config(working_dir: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let wd = working_dir.unwrap_or_else(default_working_dir);

    let mut config = AppConfig::default();
    config.working_dir = wd.clone();

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("skills-agent").join("config.json");
        if global_path.exists() {
            merge_config(&mut config, read_config_file(&global_path)?);
        }
    }

    let local_path = wd.join("skills-agent.json");
    if local_path.exists() {
        merge_config(&mut config, read_config_file(&local_path)?);
    }

    apply_env(&mut config, |key| {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    });
    resolve_provider(&mut config, |key| {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    });

    tracing::debug!(
        provider = %config.provider_kind(),
        model = %config.model_name(),
        "configuration loaded"
    );
    Ok(config)
}

fn read_config_file(path: &std::path::Path) -> Result<AppConfig, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::File(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))
}

fn merge_credentials(base: &mut ProviderCredentials, overlay: ProviderCredentials) {
    if overlay.api_key.is_some() {
        base.api_key = overlay.api_key;
    }
    if overlay.auth_token.is_some() {
        base.auth_token = overlay.auth_token;
    }
    if overlay.base_url.is_some() {
        base.base_url = overlay.base_url;
    }
}

fn merge_config(base: &mut AppConfig, overlay: AppConfig) {
    if overlay.provider.is_some() {
        base.provider = overlay.provider;
    }
    if overlay.model.is_some() {
        base.model = overlay.model;
    }
    merge_credentials(&mut base.anthropic, overlay.anthropic);
    merge_credentials(&mut base.deepseek, overlay.deepseek);
    merge_credentials(&mut base.openai, overlay.openai);
    if overlay.max_tokens != default_max_tokens() {
        base.max_tokens = overlay.max_tokens;
    }
    if overlay.temperature != default_temperature() {
        base.temperature = overlay.temperature;
    }
    if !overlay.enable_thinking {
        base.enable_thinking = false;
    }
    if overlay.thinking_budget != default_thinking_budget() {
        base.thinking_budget = overlay.thinking_budget;
    }
    if !overlay.skill_paths.is_empty() {
        base.skill_paths = overlay.skill_paths;
    }
    if overlay.web.host != default_web_host() {
        base.web.host = overlay.web.host;
    }
    if overlay.web.port != default_web_port() {
        base.web.port = overlay.web.port;
    }
    if overlay.web.cors_origins != default_cors_origins() {
        base.web.cors_origins = overlay.web.cors_origins;
    }
    if overlay.debug {
        base.debug = true;
    }
}

/// Apply environment overrides. `env` returns non-empty values only.
pub fn apply_env(config: &mut AppConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(key) = env("ANTHROPIC_API_KEY") {
        config.anthropic.api_key = Some(key);
    }
    if let Some(token) = env("ANTHROPIC_AUTH_TOKEN") {
        config.anthropic.auth_token = Some(token);
    }
    for (creds, kind) in [
        (&mut config.anthropic, ProviderKind::Anthropic),
        (&mut config.deepseek, ProviderKind::DeepSeek),
        (&mut config.openai, ProviderKind::OpenAi),
    ] {
        if kind != ProviderKind::Anthropic {
            if let Some(key) = env(&format!("{}_API_KEY", kind.env_prefix())) {
                creds.api_key = Some(key);
            }
        }
        if let Some(url) = env(&format!("{}_BASE_URL", kind.env_prefix())) {
            creds.base_url = Some(url);
        }
    }

    if let Some(max) = env("MAX_TOKENS") {
        match max.trim().parse() {
            Ok(v) => config.max_tokens = v,
            Err(_) => tracing::warn!(value = %max, "ignoring invalid MAX_TOKENS"),
        }
    }
    if let Some(temp) = env("DEFAULT_TEMPERATURE") {
        match temp.trim().parse() {
            Ok(v) => config.temperature = v,
            Err(_) => tracing::warn!(value = %temp, "ignoring invalid DEFAULT_TEMPERATURE"),
        }
    }
    if env("NO_THINKING").is_some_and(|v| v.trim().eq_ignore_ascii_case("true")) {
        config.enable_thinking = false;
    }
    if env("SKILLS_DEBUG").is_some_and(|v| is_truthy(&v)) {
        config.debug = true;
    }

    if let Some(host) = env("SKILLS_WEB_HOST") {
        config.web.host = host;
    }
    if let Some(port) = env("SKILLS_WEB_PORT") {
        match port.trim().parse() {
            Ok(v) => config.web.port = v,
            Err(_) => tracing::warn!(value = %port, "ignoring invalid SKILLS_WEB_PORT"),
        }
    }
    if let Some(origins) = env("SKILLS_WEB_CORS_ORIGINS") {
        config.web.cors_origins = parse_cors_origins(&origins);
    }
}

/// Settle provider and model from `LLM_PROVIDER`, `LLM_MODEL` and the
/// legacy `CLAUDE_MODEL`, falling back to whichever vendor has a key.
pub fn resolve_provider(config: &mut AppConfig, env: impl Fn(&str) -> Option<String>) {
    let mut provider = match env("LLM_PROVIDER") {
        Some(raw) => match raw.parse::<ProviderKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring LLM_PROVIDER");
                None
            }
        },
        None => config.provider,
    };

    let mut model = env("LLM_MODEL").or_else(|| config.model.clone());
    if model.is_none() && matches!(provider, None | Some(ProviderKind::Anthropic)) {
        model = env("CLAUDE_MODEL");
    }

    if provider.is_none() {
        provider = model.as_deref().and_then(ProviderKind::infer_from_model);
    }

    let provider = provider.unwrap_or_else(|| {
        if config.anthropic.has_key() {
            ProviderKind::Anthropic
        } else if config.deepseek.has_key() {
            ProviderKind::DeepSeek
        } else if config.openai.has_key() {
            ProviderKind::OpenAi
        } else {
            ProviderKind::Anthropic
        }
    });

    config.model = Some(model.unwrap_or_else(|| provider.default_model().to_string()));
    config.provider = Some(provider);
}

pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

impl AppConfig {
    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.unwrap_or(ProviderKind::Anthropic)
    }

    pub fn model_name(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider_kind().default_model().to_string())
    }

    pub fn credentials(&self, kind: ProviderKind) -> &ProviderCredentials {
        match kind {
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::DeepSeek => &self.deepseek,
            ProviderKind::OpenAi => &self.openai,
        }
    }

    /// API key for the active provider.
    pub fn api_key(&self) -> Option<&str> {
        let creds = self.credentials(self.provider_kind());
        creds
            .api_key
            .as_deref()
            .or(creds.auth_token.as_deref())
            .filter(|k| !k.is_empty())
    }

    pub fn base_url(&self) -> String {
        let kind = self.provider_kind();
        self.credentials(kind)
            .base_url
            .clone()
            .unwrap_or_else(|| kind.default_base_url().to_string())
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key().is_some()
    }

    /// Anthropic vendor or a Claude model behind another gateway.
    pub fn is_anthropic(&self) -> bool {
        self.provider_kind() == ProviderKind::Anthropic
            || self.model_name().to_lowercase().contains("claude")
    }

    /// Extended thinking is only requested from Anthropic.
    pub fn thinking_active(&self) -> bool {
        self.enable_thinking && self.provider_kind() == ProviderKind::Anthropic
    }

    /// Thinking requires temperature 1.0 on Claude models.
    pub fn effective_temperature(&self) -> f32 {
        if self.enable_thinking && self.is_anthropic() {
            1.0
        } else {
            self.temperature
        }
    }

    pub fn effective_max_tokens(&self) -> u32 {
        if self.model_name().to_lowercase().contains("deepseek") {
            self.max_tokens.min(DEEPSEEK_MAX_TOKENS)
        } else {
            self.max_tokens
        }
    }
}
