use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::agent::prompt::{build_system_prompt, context_switch_note};
use crate::core::config::{AppConfig, ProviderKind};
use crate::core::error::{SkillsError, ToolError};
use crate::core::message::*;
use crate::core::provider::Provider;
use crate::core::tool::*;
use crate::providers::create_provider;
use crate::skills::{SkillLoader, SkillMetadata};
use crate::stream::display::truncate;
use crate::stream::{Event, StreamChunk, StreamNormalizer, ToolCallRecord};

/// Tool output longer than this is cut before it goes back to the model.
const MAX_TOOL_RESULT_CHARS: usize = 30_000;

/// Result recorded for a call that never ran because the turn was cancelled.
const CANCELLED_RESULT: &str = "[FAILED] Cancelled";

type ThreadStore = Arc<Mutex<HashMap<String, Vec<Message>>>>;

/// A running turn. `events` ends after the final `Done` or `Error`.
pub struct TurnHandle {
    pub events: mpsc::Receiver<Event>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<Result<String, SkillsError>>,
}

pub struct Agent {
    config: AppConfig,
    provider: Arc<dyn Provider>,
    tools: Vec<Arc<dyn Tool>>,
    skill_loader: Arc<SkillLoader>,
    working_dir: PathBuf,
    system_prompt: String,
    threads: ThreadStore,
    default_thinking: bool,
    default_temperature: f32,
}

impl Agent {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn Provider>,
        tools: Vec<Arc<dyn Tool>>,
        skill_loader: Arc<SkillLoader>,
        working_dir: PathBuf,
    ) -> Self {
        let system_prompt = build_system_prompt(&skill_loader);
        Self {
            default_thinking: config.enable_thinking,
            default_temperature: config.temperature,
            config,
            provider,
            tools,
            skill_loader,
            working_dir,
            system_prompt,
            threads: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Build an agent with the configured provider, the standard skill
    /// locations and every tool.
    pub fn from_config(config: AppConfig) -> Result<Self, SkillsError> {
        let provider = create_provider(&config)?;
        let working_dir = config.working_dir.clone();
        let skill_loader = Arc::new(SkillLoader::with_defaults(
            config.skill_paths.clone(),
            &working_dir,
        ));
        Ok(Self::new(
            config,
            provider,
            crate::tools::create_all_tools(),
            skill_loader,
            working_dir,
        ))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.provider.model()
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.provider_kind()
    }

    pub fn thinking_enabled(&self) -> bool {
        self.config.thinking_active()
    }

    pub fn temperature(&self) -> f32 {
        self.config.effective_temperature()
    }

    pub fn get_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn get_discovered_skills(&self) -> Vec<SkillMetadata> {
        self.skill_loader.scan_skills()
    }

    /// Snapshot of a thread's history.
    pub fn history(&self, thread_id: &str) -> Vec<Message> {
        lock_threads(&self.threads)
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns false when extended thinking pins the temperature to 1.0.
    pub fn set_temperature(&mut self, temperature: f32) -> bool {
        if self.config.enable_thinking && self.config.is_anthropic() {
            return false;
        }
        self.config.temperature = temperature;
        self.rebuild_provider();
        true
    }

    /// Swap the acting model and leave a context switch note in the thread.
    ///
    /// Thinking is re-enabled for Anthropic models when it was on at
    /// startup and always disabled for other vendors.
    pub fn switch_model(
        &mut self,
        model: &str,
        provider: Option<ProviderKind>,
        thread_id: &str,
    ) -> Result<(), SkillsError> {
        let old_model = self.model_name().to_string();
        let previous = self.config.clone();

        let kind = provider
            .or_else(|| ProviderKind::infer_from_model(model))
            .unwrap_or_else(|| self.config.provider_kind());
        self.config.provider = Some(kind);
        self.config.model = Some(model.to_string());

        if self.config.is_anthropic() {
            self.config.enable_thinking = self.default_thinking;
        } else {
            if self.config.enable_thinking {
                tracing::warn!(model, "disabling extended thinking for non-Claude model");
            }
            self.config.enable_thinking = false;
        }
        self.config.temperature = self.default_temperature;

        match create_provider(&self.config) {
            Ok(p) => self.provider = p,
            Err(e) => {
                self.config = previous;
                return Err(e.into());
            }
        }

        tracing::info!(
            from = %old_model,
            to = %model,
            provider = %kind,
            thinking = self.config.thinking_active(),
            temperature = self.config.effective_temperature(),
            "model switched"
        );

        let note = context_switch_note(&old_model, self.model_name());
        lock_threads(&self.threads)
            .entry(thread_id.to_string())
            .or_default()
            .push(Message::new_user(note));
        Ok(())
    }

    fn rebuild_provider(&mut self) {
        match create_provider(&self.config) {
            Ok(p) => self.provider = p,
            Err(e) => tracing::warn!(error = %e, "keeping current provider"),
        }
    }

    /// Start a turn on `thread_id`. Events arrive on the returned channel
    /// while the task runs; the task resolves to the full response text.
    pub fn run(&self, message: impl Into<String>, thread_id: &str) -> TurnHandle {
        let (tx, rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();

        let turn = Turn {
            provider: Arc::clone(&self.provider),
            tools: self.tools.clone(),
            skill_loader: Arc::clone(&self.skill_loader),
            working_dir: self.working_dir.clone(),
            system_prompt: self.system_prompt.clone(),
            threads: Arc::clone(&self.threads),
            thread_id: thread_id.to_string(),
            tx,
            cancel: cancel.clone(),
        };
        let message = message.into();

        let task = tokio::spawn(async move {
            let mut normalizer = StreamNormalizer::new();
            let result = turn.run(message, &mut normalizer).await;

            if let Err(e) = &result {
                if !matches!(e, SkillsError::Cancelled) && !normalizer.error_emitted() {
                    let event = normalizer.fail(e.to_string());
                    let _ = turn.tx.send(event).await;
                }
            }
            result
        });

        TurnHandle {
            events: rx,
            cancel,
            task,
        }
    }
}

fn lock_threads(
    threads: &Mutex<HashMap<String, Vec<Message>>>,
) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Message>>> {
    threads.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Everything one spawned turn needs.
struct Turn {
    provider: Arc<dyn Provider>,
    tools: Vec<Arc<dyn Tool>>,
    skill_loader: Arc<SkillLoader>,
    working_dir: PathBuf,
    system_prompt: String,
    threads: ThreadStore,
    thread_id: String,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

impl Turn {
    async fn run(
        &self,
        message: String,
        normalizer: &mut StreamNormalizer,
    ) -> Result<String, SkillsError> {
        let tool_defs: Vec<ToolDefinition> = self.tools.iter().map(|t| t.definition()).collect();
        self.push_history(Message::new_user(message));
        normalizer.reset();

        let mut executed: HashSet<String> = HashSet::new();
        let mut round = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                return Err(SkillsError::Cancelled);
            }
            round += 1;

            let messages = self.snapshot();
            tracing::debug!(round, messages = messages.len(), "requesting model response");
            let mut stream = self
                .provider
                .stream_response(&messages, &self.system_prompt, &tool_defs)
                .await?;

            let mut assistant = Message::new_assistant();
            loop {
                let next = tokio::select! {
                    _ = self.cancel.cancelled() => return Err(SkillsError::Cancelled),
                    next = stream.next() => next,
                };
                let Some(chunk) = next else { break };
                let chunk = chunk?;
                tracing::debug!(?chunk, "stream chunk");

                let signature = chunk.thinking_signature().map(str::to_string);
                for event in normalizer.ingest(chunk) {
                    match &event {
                        Event::Thinking { content } => assistant.append_reasoning(content),
                        Event::Text { content } => assistant.append_text(content),
                        _ => {}
                    }
                    self.emit(event).await;
                }
                if let Some(sig) = signature {
                    assistant.set_reasoning_signature(&sig);
                }
            }

            normalizer.finalize_tool_calls();
            let pending: Vec<ToolCallRecord> = normalizer
                .assembler()
                .get_all()
                .into_iter()
                .filter(|r| !executed.contains(&r.id))
                .cloned()
                .collect();

            for record in &pending {
                assistant.add_tool_call(record.id.clone(), record.name.clone(), record.input_json());
            }
            if !assistant.is_empty() {
                self.push_history(assistant);
            }

            if pending.is_empty() {
                break;
            }

            // Every call in the assistant message gets a result, cancelled or not.
            let mut results = Vec::with_capacity(pending.len());
            let mut cancelled = false;
            for record in pending {
                if cancelled || self.cancel.is_cancelled() {
                    cancelled = true;
                    results.push(ContentPart::ToolResult {
                        tool_call_id: record.id,
                        name: record.name,
                        content: CANCELLED_RESULT.to_string(),
                        is_error: true,
                    });
                    continue;
                }
                executed.insert(record.id.clone());

                let content = self.execute(&record).await;
                let chunk = StreamChunk::tool(&record.name, content.clone(), Some(record.id.clone()));
                for event in normalizer.ingest(chunk) {
                    self.emit(event).await;
                }

                let is_error = !crate::stream::is_success(&content);
                results.push(ContentPart::ToolResult {
                    tool_call_id: record.id,
                    name: record.name,
                    content: truncate(&content, MAX_TOOL_RESULT_CHARS, "\n\n... [truncated]"),
                    is_error,
                });
            }
            self.push_history(Message::new_tool_result(results));
            if cancelled {
                return Err(SkillsError::Cancelled);
            }
        }

        let done = normalizer.finish();
        self.emit(done).await;
        Ok(normalizer.full_response().to_string())
    }

    /// Run one tool call. Invocation errors come back as `[FAILED]` text so
    /// the model can react to them.
    async fn execute(&self, record: &ToolCallRecord) -> String {
        let Some(tool) = self
            .tools
            .iter()
            .find(|t| t.definition().name == record.name)
        else {
            return format!("[FAILED] {}", ToolError::NotFound(record.name.clone()));
        };

        let ctx = ToolContext {
            working_dir: self.working_dir.clone(),
            skill_loader: Arc::clone(&self.skill_loader),
            cancel_token: self.cancel.clone(),
        };
        let call = ToolCall {
            id: record.id.clone(),
            name: record.name.clone(),
            input: record.input_json(),
        };

        tracing::debug!(tool = %call.name, id = %call.id, input = %call.input, "executing tool");
        match tool.run(&call, &ctx).await {
            Ok(result) => result.content,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool invocation failed");
                format!("[FAILED] {e}")
            }
        }
    }

    async fn emit(&self, event: Event) {
        tracing::debug!(event = event.event_type(), "emit");
        let _ = self.tx.send(event).await;
    }

    fn push_history(&self, message: Message) {
        lock_threads(&self.threads)
            .entry(self.thread_id.clone())
            .or_default()
            .push(message);
    }

    fn snapshot(&self) -> Vec<Message> {
        lock_threads(&self.threads)
            .get(&self.thread_id)
            .cloned()
            .unwrap_or_default()
    }
}
