//! Query pipeline: retrieve, assemble, invoke, sanitize

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{PromptBuilder, ResponseSanitizer};
use crate::providers::LlmProvider;
use crate::retrieval::{Retriever, VectorIndex};
use crate::types::Answer;

/// Answers questions against a ready index
pub struct QueryOrchestrator {
    retriever: Retriever,
    llm: Arc<dyn LlmProvider>,
    sanitizer: ResponseSanitizer,
    generation_timeout: Duration,
}

impl QueryOrchestrator {
    /// Create an orchestrator over an initialized index
    pub fn new(index: Arc<VectorIndex>, llm: Arc<dyn LlmProvider>, config: &RagConfig) -> Self {
        Self {
            retriever: Retriever::new(index, config.retrieval.default_k),
            llm,
            sanitizer: ResponseSanitizer::default(),
            generation_timeout: Duration::from_secs(config.generation.timeout_secs),
        }
    }

    /// Replace the answer sanitizer
    pub fn with_sanitizer(mut self, sanitizer: ResponseSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Bound a single generation call
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer a question. Never fails: retrieval and generation errors come
    /// back as an `Error: ...` answer with no sources.
    pub async fn answer(&self, query: &str, k: Option<usize>) -> Answer {
        let start = Instant::now();
        tracing::info!("Query: \"{}\"", query);

        match self.run(query, k).await {
            Ok(answer) => {
                tracing::info!(
                    "Answered in {}ms from {} chunks",
                    start.elapsed().as_millis(),
                    answer.sources.len()
                );
                answer
            }
            Err(e) => {
                tracing::error!("Query failed after {}ms: {}", start.elapsed().as_millis(), e);
                Answer::from_error(&e)
            }
        }
    }

    async fn run(&self, query: &str, k: Option<usize>) -> Result<Answer> {
        let retrieved = self.retriever.retrieve(query, k).await?;

        let prompt = PromptBuilder::build(query, &retrieved);

        let raw = tokio::time::timeout(self.generation_timeout, self.llm.generate(&prompt))
            .await
            .map_err(|_| {
                Error::generation(format!(
                    "{} did not answer within {}s",
                    self.llm.model(),
                    self.generation_timeout.as_secs_f32()
                ))
            })??;

        let text = self.sanitizer.clean(&raw);
        tracing::debug!("Sanitized answer: {} -> {} chars", raw.len(), text.len());

        Ok(Answer::new(text, retrieved.sources()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::{CorpusLoader, RecursiveTextSplitter};
    use crate::test_utils::{CountingEmbedder, FailingLlm, ScriptedLlm};
    use std::fs;

    async fn ready_index(dir: &std::path::Path) -> Arc<VectorIndex> {
        let docs = dir.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("leave.txt"), "vacation leave is twenty days per year").unwrap();
        fs::write(docs.join("it.txt"), "laptops are replaced every three years").unwrap();
        fs::write(docs.join("office.txt"), "the office opens at nine").unwrap();

        let index = VectorIndex::new(dir.join("index"), Arc::new(CountingEmbedder::new()));
        index
            .initialize(&CorpusLoader::new(docs), &RecursiveTextSplitter::new(200, 20))
            .await
            .unwrap();
        Arc::new(index)
    }

    #[tokio::test]
    async fn test_answer_is_sanitized_with_sources() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlm::new("<think>look at leave.txt</think>\nTwenty days."));
        let orchestrator = QueryOrchestrator::new(ready_index(dir.path()).await, llm.clone(), &RagConfig::default());

        let answer = orchestrator.answer("vacation leave days per year", Some(2)).await;

        assert_eq!(answer.text, "Twenty days.");
        assert_eq!(answer.sources.len(), 2);
        assert!(answer.sources[0].ends_with("leave.txt"));

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("vacation leave is twenty days per year"));
        assert!(prompts[0].user.contains("Question: vacation leave days per year"));
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_error_answer() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            QueryOrchestrator::new(ready_index(dir.path()).await, Arc::new(FailingLlm), &RagConfig::default());

        let answer = orchestrator.answer("when does the office open", None).await;

        assert!(answer.text.starts_with("Error:"));
        assert!(answer.text.contains("not found"));
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn test_unready_index_becomes_error_answer() {
        let index = Arc::new(VectorIndex::new("unused", Arc::new(CountingEmbedder::new())));
        let orchestrator = QueryOrchestrator::new(index, Arc::new(ScriptedLlm::new("unused")), &RagConfig::default());

        let answer = orchestrator.answer("anything", None).await;

        assert!(answer.is_error());
        assert!(answer.text.contains("not ready"));
    }

    #[tokio::test]
    async fn test_slow_generation_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlm::new("too late").with_delay(Duration::from_secs(5)));
        let orchestrator = QueryOrchestrator::new(ready_index(dir.path()).await, llm, &RagConfig::default())
            .with_generation_timeout(Duration::from_millis(50));

        let answer = orchestrator.answer("when does the office open", None).await;

        assert!(answer.is_error());
        assert!(answer.text.contains("did not answer"));
    }

    #[tokio::test]
    async fn test_default_k_bounds_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.retrieval.default_k = 1;
        let orchestrator =
            QueryOrchestrator::new(ready_index(dir.path()).await, Arc::new(ScriptedLlm::new("Nine.")), &config);

        let answer = orchestrator.answer("when does the office open", None).await;

        assert_eq!(answer.text, "Nine.");
        assert_eq!(answer.sources.len(), 1);
        assert!(answer.sources[0].ends_with("office.txt"));
    }
}
