//! Bounded concurrent drafting against an answer source
//!
//! The pool runs one unit of work per question: at most `concurrency`
//! units in flight, questions taken in fixed-size chunks with a pause
//! between chunks so a shared backend gets breathing room. A unit never
//! takes the batch down with it; timeouts and source errors fail open
//! into a blank proposal carrying a Low-confidence marker.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::IntakeResult;
use crate::review::Proposal;
use crate::types::{Confidence, QuestionRecord};

/// A drafted answer for one question
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub answer: String,
    pub confidence: Confidence,
    pub provenance: String,
}

/// Why a source could not produce a draft.
///
/// Only `RateLimited` is retried; everything else is taken at face value
/// and fails the unit open.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("{0}")]
    Failed(String),
}

impl SourceError {
    /// Classify a raw backend message. Rate-limit replies often embed the
    /// server's own wait hint ("Try again in 12 seconds"), which beats
    /// exponential guessing when present.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("rate limit") || lower.contains("rate_limit") || message.contains("429") {
            SourceError::RateLimited {
                retry_after: retry_after_hint(message),
            }
        } else {
            SourceError::Failed(message.to_string())
        }
    }
}

fn retry_after_hint(message: &str) -> Option<Duration> {
    let pattern = Regex::new(r"Try again in\s*([0-9]+)\s*seconds").ok()?;
    let seconds = pattern.captures(message)?.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_secs(seconds))
}

/// Something that can draft an answer for a question
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn draft(&self, question: &QuestionRecord) -> Result<Draft, SourceError>;

    /// Best-effort teardown once the batch is done; implementations
    /// swallow their own errors
    async fn close(&self) {}
}

/// Backoff schedule for rate-limited units
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based). A server-provided
    /// hint overrides the exponential schedule but not the floor or the
    /// jitter; the floor keeps hammering impossible even on a zero hint.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let base = match retry_after {
            Some(hint) => hint,
            None => {
                let shift = attempt.saturating_sub(1).min(16);
                let exponential = self.base_delay_ms.saturating_mul(1 << shift);
                Duration::from_millis(exponential.min(self.max_delay_ms))
            }
        };
        let jitter = Duration::from_millis(fastrand::u64(0..=self.jitter_ms));
        base.max(Duration::from_millis(500)) + jitter
    }
}

/// Pool shape and per-unit limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Units in flight at once
    pub concurrency: usize,
    /// Questions taken per chunk
    pub chunk_size: usize,
    /// Pause between chunks, in milliseconds
    pub chunk_pause_ms: u64,
    /// Hard ceiling per unit in seconds, retries included
    pub unit_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            chunk_size: 5,
            chunk_pause_ms: 2_000,
            unit_timeout_secs: 60,
            retry: RetryPolicy::default(),
        }
    }
}

impl BatchConfig {
    /// Load overrides from a YAML file; absent keys keep their defaults,
    /// unknown keys are rejected
    pub fn load<P: AsRef<Path>>(path: P) -> IntakeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BatchConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }

    pub fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_timeout_secs)
    }
}

/// Draft an answer for every question, one proposal per question in the
/// input order. Never errors: every failure mode lands in the proposal's
/// provenance marker instead.
pub async fn run_batch(
    source: Arc<dyn AnswerSource>,
    questions: &[QuestionRecord],
    config: &BatchConfig,
) -> Vec<Proposal> {
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut slots: Vec<Option<Proposal>> = vec![None; questions.len()];

    let chunks: Vec<&[QuestionRecord]> = questions.chunks(config.chunk_size.max(1)).collect();
    let mut base_index = 0;
    for (chunk_no, chunk) in chunks.iter().enumerate() {
        debug!(
            "drafting chunk {}/{} ({} question(s))",
            chunk_no + 1,
            chunks.len(),
            chunk.len()
        );

        let mut handles = Vec::with_capacity(chunk.len());
        for (offset, question) in chunk.iter().enumerate() {
            let source = Arc::clone(&source);
            let semaphore = Arc::clone(&semaphore);
            let question = question.clone();
            let retry = config.retry.clone();
            let unit_timeout = config.unit_timeout();
            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return fail_open(&question, "error: worker pool closed"),
                };
                draft_unit(source.as_ref(), &question, &retry, unit_timeout).await
            });
            handles.push((base_index + offset, handle));
        }

        for (index, handle) in handles {
            let proposal = match handle.await {
                Ok(proposal) => proposal,
                Err(_) => fail_open(&questions[index], "error: task failed"),
            };
            slots[index] = Some(proposal);
        }

        base_index += chunk.len();
        let pause = config.chunk_pause();
        if chunk_no + 1 < chunks.len() && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    source.close().await;
    slots.into_iter().flatten().collect()
}

async fn draft_unit(
    source: &dyn AnswerSource,
    question: &QuestionRecord,
    retry: &RetryPolicy,
    unit_timeout: Duration,
) -> Proposal {
    match tokio::time::timeout(unit_timeout, draft_with_retry(source, question, retry)).await {
        Ok(Ok(draft)) => Proposal {
            sheet_name: question.sheet_name.clone(),
            row_index: question.row_index,
            column_index: question.column_index,
            question_text: question.question_text.clone(),
            answer: draft.answer,
            confidence: draft.confidence,
            provenance: draft.provenance,
        },
        Ok(Err(err)) => {
            let marker = format!("error: {}", truncate_chars(&err.to_string(), 50));
            fail_open(question, &marker)
        }
        Err(_) => {
            warn!(
                "sheet '{}' row {}: unit timed out after {:?}",
                question.sheet_name, question.row_index, unit_timeout
            );
            fail_open(question, "timeout")
        }
    }
}

async fn draft_with_retry(
    source: &dyn AnswerSource,
    question: &QuestionRecord,
    policy: &RetryPolicy,
) -> Result<Draft, SourceError> {
    let mut attempt = 0;
    loop {
        match source.draft(question).await {
            Ok(draft) => return Ok(draft),
            Err(SourceError::RateLimited { retry_after }) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(SourceError::RateLimited { retry_after });
                }
                let delay = policy.delay_for(attempt, retry_after);
                warn!(
                    "sheet '{}' row {}: rate limited, retry {}/{} in {:?}",
                    question.sheet_name,
                    question.row_index,
                    attempt,
                    policy.max_attempts - 1,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn fail_open(question: &QuestionRecord, provenance: &str) -> Proposal {
    Proposal {
        sheet_name: question.sheet_name.clone(),
        row_index: question.row_index,
        column_index: question.column_index,
        question_text: question.question_text.clone(),
        answer: String::new(),
        confidence: Confidence::Low,
        provenance: provenance.to_string(),
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
