use serde::Serialize;

pub const SUCCESS_PREFIX: &str = "[OK]";
pub const FAILURE_PREFIX: &str = "[FAILED]";

const ERROR_PATTERNS: &[&str] = &["Traceback (most recent call last)", "Exception:", "Error:"];
const MARKDOWN_PATTERNS: &[&str] = &["```", "**", "##", "- **"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Success,
    Error,
    Json,
    Markdown,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassifiedResult {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub success: bool,
}

/// Classifies finished tool output for rendering.
///
/// The `[OK]` / `[FAILED]` markers win over any heuristic. An `[OK]` body
/// is only re-checked for JSON, so an `[OK]` result that happens to
/// contain a traceback is still a success.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentClassifier;

impl ContentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, content: &str) -> ClassifiedResult {
        ClassifiedResult {
            content_type: self.detect_type(content),
            success: self.is_success(content),
        }
    }

    pub fn detect_type(&self, content: &str) -> ContentType {
        let content = content.trim();

        if content.starts_with(SUCCESS_PREFIX) {
            if is_json(extract_body(content)) {
                return ContentType::Json;
            }
            return ContentType::Success;
        }

        if content.starts_with(FAILURE_PREFIX) {
            return ContentType::Error;
        }

        if is_json(content) {
            return ContentType::Json;
        }

        if contains_error_pattern(content) {
            return ContentType::Error;
        }

        if content.starts_with('#') || MARKDOWN_PATTERNS.iter().any(|p| content.contains(p)) {
            return ContentType::Markdown;
        }

        ContentType::Text
    }

    pub fn is_success(&self, content: &str) -> bool {
        is_success(content)
    }
}

/// Success unless a failure marker or an error pattern says otherwise.
pub fn is_success(content: &str) -> bool {
    let content = content.trim();
    if content.starts_with(SUCCESS_PREFIX) {
        return true;
    }
    if content.starts_with(FAILURE_PREFIX) {
        return false;
    }
    !contains_error_pattern(content)
}

/// A trimmed string delimited by `{}` or `[]` that parses as JSON.
pub fn is_json(content: &str) -> bool {
    let content = content.trim();
    if content.is_empty() {
        return false;
    }
    let delimited = (content.starts_with('{') && content.ends_with('}'))
        || (content.starts_with('[') && content.ends_with(']'));
    delimited && serde_json::from_str::<serde_json::Value>(content).is_ok()
}

/// The text after the marker line and its blank separator line.
pub fn extract_body(content: &str) -> &str {
    let mut parts = content.splitn(3, '\n');
    parts.next();
    parts.next();
    parts.next().map(str::trim).unwrap_or("")
}

fn contains_error_pattern(content: &str) -> bool {
    ERROR_PATTERNS.iter().any(|p| content.contains(p))
}
