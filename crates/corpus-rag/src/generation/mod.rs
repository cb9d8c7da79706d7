//! Prompt assembly and answer post-processing

pub mod prompt;
pub mod sanitizer;

pub use prompt::{Prompt, PromptBuilder, SYSTEM_POLICY};
pub use sanitizer::{sanitize, ResponseSanitizer, SanitizeRule};
