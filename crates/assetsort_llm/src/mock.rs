//! Scripted completion client for deterministic tests
//!
//! Answers are queued and consumed in order; once the queue is empty every
//! call answers `""`. Every prompt is recorded so tests can assert on how
//! often (and with what) the backend was consulted.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{CompletionClient, LlmError};

/// Completion client with canned answers
#[derive(Default)]
pub struct ScriptedClient {
    answers: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    /// Client that always answers `""` and only counts calls
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that answers with `answers` in order, then `""`
    pub fn with_answers<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for answer in answers {
            client.push_answer(answer);
        }
        client
    }

    /// Queue one answer
    pub fn push_answer(&self, answer: impl Into<String>) {
        lock(&self.answers).push_back(Ok(answer.into()));
    }

    /// Queue one transport failure
    pub fn push_failure(&self, error: LlmError) {
        lock(&self.answers).push_back(Err(error));
    }

    /// Number of completion requests received so far
    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// All prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn try_complete(&self, prompt: &str) -> Result<String, LlmError> {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.answers)
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
