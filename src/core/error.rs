use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillsError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Skill error: {0}")]
    Skill(#[from] SkillError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Missing API key for provider: {0}")]
    MissingApiKey(String),
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid front-matter in {path}: {message}")]
    InvalidFrontMatter { path: String, message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    File(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
