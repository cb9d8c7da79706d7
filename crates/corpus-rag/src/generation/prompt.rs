//! Prompt templates for RAG generation

use serde::{Deserialize, Serialize};

use crate::retrieval::RetrievalResult;

/// Fixed policy sent as the system message of every query
pub const SYSTEM_POLICY: &str = r#"You are a helpful assistant for internal company documentation.
Answer questions based ONLY on the provided context from company documents.

IMPORTANT RULES:
- Provide direct answers only
- Do NOT include any thinking, reasoning process, or meta-commentary
- Do NOT include markup or reasoning tags such as </think>
- Do NOT say things like "I'll organize" or "Let me explain"
- If the context does not contain the answer, say so
- Answer concisely and professionally"#;

/// A two-part instruction for a chat model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// System policy segment
    pub system: String,
    /// User segment: retrieved context followed by the question
    pub user: String,
}

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from retrieved chunks, most relevant first
    pub fn build_context(retrieved: &RetrievalResult) -> String {
        retrieved
            .hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the full RAG prompt
    pub fn build(question: &str, retrieved: &RetrievalResult) -> Prompt {
        Prompt {
            system: SYSTEM_POLICY.to_string(),
            user: Self::build_user_segment(question, &Self::build_context(retrieved)),
        }
    }

    fn build_user_segment(question: &str, context: &str) -> String {
        format!(
            r#"Context from company documents:
{context}

Question: {question}

Answer:"#,
            context = context,
            question = question
        )
    }
}
