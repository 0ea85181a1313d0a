use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::feedback_parser::{parse_feedback, FeedbackResult};
use super::llm_provider::{GatewayError, GenerationParams, LlmGateway};
use super::prompt::{self, Level};
use super::vocabulary_parser::{parse_vocabulary, VocabularyEntry, VocabularyParseError};

const FEEDBACK_TEMPERATURE: f32 = 0.7;
const FEEDBACK_MAX_TOKENS: u32 = 1000;
const TASK_TEMPERATURE: f32 = 0.9;
const TASK_MAX_TOKENS: u32 = 300;
const VOCABULARY_TEMPERATURE: f32 = 0.7;
const VOCABULARY_MAX_TOKENS: u32 = 1200;

const TASK_LABEL: &str = "TASK:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoachError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("parse error: {0}")]
    Parse(#[from] VocabularyParseError),
}

/// Glue between prompt rendering, the gateway and the reply parsers.
#[derive(Clone)]
pub struct WritingCoach {
    gateway: Arc<dyn LlmGateway>,
}

impl WritingCoach {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &dyn LlmGateway {
        self.gateway.as_ref()
    }

    pub async fn feedback(
        &self,
        text: &str,
        level: Level,
        context: Option<&str>,
    ) -> Result<FeedbackResult, CoachError> {
        let start = Instant::now();
        let prompt = prompt::build_feedback_prompt(text, level, context);
        let raw = self
            .generate(&prompt, level, FEEDBACK_TEMPERATURE, FEEDBACK_MAX_TOKENS)
            .await?;
        let result = parse_feedback(&raw);

        info!(
            level = level.as_str(),
            changes = result.changes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "feedback generated"
        );
        Ok(result)
    }

    pub async fn daily_task(&self, level: Level, context: Option<&str>) -> Result<String, CoachError> {
        let prompt = prompt::build_daily_task_prompt(level, context);
        let raw = self
            .generate(&prompt, level, TASK_TEMPERATURE, TASK_MAX_TOKENS)
            .await?;

        let task = clean_task(&raw);
        if task.is_empty() {
            let excerpt: String = raw.chars().take(150).collect();
            warn!(raw = %excerpt, "LLM reply contained no daily task");
            return Err(GatewayError::Generation("empty daily task".to_string()).into());
        }
        Ok(task)
    }

    pub async fn vocabulary(
        &self,
        level: Level,
        topic: Option<&str>,
        count: usize,
    ) -> Result<Vec<VocabularyEntry>, CoachError> {
        let prompt = prompt::build_vocabulary_prompt(level, topic, count);
        let raw = self
            .generate(&prompt, level, VOCABULARY_TEMPERATURE, VOCABULARY_MAX_TOKENS)
            .await?;

        let entries = parse_vocabulary(&raw)?;
        debug!(requested = count, parsed = entries.len(), "vocabulary parsed");
        Ok(entries)
    }

    async fn generate(
        &self,
        prompt: &str,
        level: Level,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, GatewayError> {
        let params = GenerationParams {
            temperature,
            max_output_tokens,
            system: Some(prompt::system_instruction(level)),
        };
        self.gateway.generate(prompt, &params).await
    }
}

/// Trims the reply and removes a `TASK:` label or wrapping quotes.
fn clean_task(raw: &str) -> String {
    let mut task = raw.trim();
    if let Some(rest) = task.strip_prefix(TASK_LABEL) {
        task = rest.trim();
    }
    if task.len() >= 2 && task.starts_with('"') && task.ends_with('"') {
        task = task[1..task.len() - 1].trim();
    }
    task.to_string()
}
