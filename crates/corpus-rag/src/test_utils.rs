//! Test doubles for the provider traits

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::generation::Prompt;
use crate::providers::{EmbeddingProvider, LlmProvider};

/// Deterministic bag-of-words embedder that counts how many texts it embedded
pub struct CountingEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(64)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }

    /// Texts embedded so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bucket(&self, word: &str) -> usize {
        // FNV-1a
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut vector = vec![0.0; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(&word.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    fn model(&self) -> &str {
        "counting-embedder"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// LLM that replies with a fixed text and records the prompts it saw
pub struct ScriptedLlm {
    reply: String,
    delay: Option<Duration>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Wait this long before replying
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        self.prompts.lock().push(prompt.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// LLM whose every call fails
pub struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn generate(&self, _prompt: &Prompt) -> Result<String> {
        Err(Error::generation("model 'missing' not found"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "missing"
    }
}
