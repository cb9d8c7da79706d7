//! Post-processing of raw model output
//!
//! Reasoning models tend to emit their chain of thought ahead of the answer,
//! closed by a tag such as `</think>`, or to open with bullets like
//! "- Let me explain". The sanitizer runs an ordered list of rules over the
//! raw text. The first rule that produces a result wins, and when no rule
//! applies the trimmed input is returned as is.

use once_cell::sync::Lazy;
use regex::Regex;

/// A single cleaning rule. `None` means the rule does not apply.
pub type SanitizeRule = fn(&str) -> Option<String>;

/// End-of-reasoning markers, optionally wrapped in backticks
static REASONING_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)`?</(?:thinking|think|text|reasoning)>`?").expect("valid marker regex")
});

/// Bullet lines that narrate what the model is about to do
static META_BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[-*]\s*(?:I should|I'll|I’ll|I can|Let me)").expect("valid meta regex")
});

/// Rule-based cleaner for generated answers
#[derive(Clone)]
pub struct ResponseSanitizer {
    rules: Vec<SanitizeRule>,
}

impl Default for ResponseSanitizer {
    fn default() -> Self {
        Self {
            rules: vec![
                strip_reasoning_markers as SanitizeRule,
                skip_leading_meta_commentary,
            ],
        }
    }
}

impl ResponseSanitizer {
    /// Sanitizer with a custom rule list, evaluated in order
    pub fn with_rules(rules: Vec<SanitizeRule>) -> Self {
        Self { rules }
    }

    /// Append a rule after the existing ones
    pub fn push_rule(mut self, rule: SanitizeRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Clean raw model output. Empty input is returned unchanged.
    pub fn clean(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        self.rules
            .iter()
            .find_map(|rule| rule(raw))
            .unwrap_or_else(|| raw.trim().to_string())
    }
}

/// Clean optional model output with the default rules
pub fn sanitize(raw: Option<&str>) -> Option<String> {
    raw.map(|text| ResponseSanitizer::default().clean(text))
}

/// Drop everything up to and including the last reasoning marker.
///
/// The match with the largest end offset wins, whichever marker it is. The
/// remainder is returned even when empty: the model closed its reasoning and
/// said nothing after it.
pub fn strip_reasoning_markers(text: &str) -> Option<String> {
    REASONING_MARKER
        .find_iter(text)
        .map(|m| m.end())
        .max()
        .map(|end| text[end..].trim().to_string())
}

/// Skip empty lines and meta-commentary bullets until the first substantive
/// line, then keep everything from there on verbatim.
///
/// A real answer whose first bullet starts with one of the trigger phrases is
/// dropped as well; the heuristic cannot tell the two apart.
pub fn skip_leading_meta_commentary(text: &str) -> Option<String> {
    let mut lines = text.split('\n');

    let first = lines.find(|line| !line.trim().is_empty() && !META_BULLET.is_match(line))?;

    let kept = std::iter::once(first).chain(lines).collect::<Vec<_>>().join("\n");
    let kept = kept.trim();

    if kept.is_empty() {
        None
    } else {
        Some(kept.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(text: &str) -> String {
        ResponseSanitizer::default().clean(text)
    }

    #[test]
    fn test_quoted_marker_is_stripped() {
        assert_eq!(clean("some text `</think>` ANSWER HERE"), "ANSWER HERE");
    }

    #[test]
    fn test_every_marker_is_recognized() {
        for marker in ["</think>", "</thinking>", "</text>", "</reasoning>"] {
            let bare = format!("draft notes {marker} The answer.");
            assert_eq!(clean(&bare), "The answer.", "bare {marker}");

            let quoted = format!("draft notes `{marker}` The answer.");
            assert_eq!(clean(&quoted), "The answer.", "quoted {marker}");

            let upper = format!("draft{}\n The answer. ", marker.to_uppercase());
            assert_eq!(clean(&upper), "The answer.", "uppercase {marker}");
        }
    }

    #[test]
    fn test_marker_next_to_multibyte_text() {
        assert_eq!(clean("é</think>ü"), "ü");
        assert_eq!(clean("réflexion</thinking>Réponse : oui"), "Réponse : oui");
    }

    #[test]
    fn test_crlf_meta_bullets_are_skipped() {
        assert_eq!(clean("- I should x\r\n- Let me y\r\nReal\r\n"), "Real");
        assert_eq!(
            clean("* I'll summarize\r\nFirst line\r\nSecond line"),
            "First line\r\nSecond line"
        );
    }

    #[test]
    fn test_last_marker_wins_across_patterns() {
        let raw = "<think>plan</think> draft </reasoning>\n\nFinal answer.";
        assert_eq!(clean(raw), "Final answer.");

        let raw = "a </REASONING> b </Think> The office opens at 9.";
        assert_eq!(clean(raw), "The office opens at 9.");
    }

    #[test]
    fn test_marker_with_nothing_after_yields_empty() {
        assert_eq!(clean("all reasoning, no answer</think>   "), "");
    }

    #[test]
    fn test_leading_meta_bullets_are_skipped() {
        assert_eq!(
            clean("- I should explain\nActual answer line\n- I should note"),
            "Actual answer line\n- I should note"
        );
    }

    #[test]
    fn test_blank_lines_before_answer_are_skipped() {
        assert_eq!(
            clean("* Let me organize this\n\n* I'll be brief\n\nVacation is 20 days.\n\nAsk HR for details."),
            "Vacation is 20 days.\n\nAsk HR for details."
        );
    }

    #[test]
    fn test_non_meta_bullet_starts_answer() {
        assert_eq!(
            clean("- I can summarize\n- Badge access: lobby\n- I should add parking"),
            "- Badge access: lobby\n- I should add parking"
        );
    }

    #[test]
    fn test_only_meta_commentary_falls_back_to_trimmed_input() {
        let raw = "\n- I should think\n- Let me see\n";
        assert_eq!(skip_leading_meta_commentary(raw), None);
        assert_eq!(clean(raw), "- I should think\n- Let me see");
    }

    #[test]
    fn test_empty_and_missing_input_unchanged() {
        assert_eq!(sanitize(None), None);
        assert_eq!(sanitize(Some("")), Some(String::new()));
    }

    #[test]
    fn test_idempotent_on_clean_text() {
        for raw in [
            "Plain answer.",
            "  padded answer with\n\nparagraphs  ",
            "- a bullet answer\n- another",
            "I should mention this is not a bullet.",
        ] {
            let once = clean(raw);
            assert_eq!(clean(&once), once);
        }
    }

    #[test]
    fn test_custom_rules_run_in_order() {
        fn shout(text: &str) -> Option<String> {
            Some(text.trim().to_uppercase())
        }
        let sanitizer = ResponseSanitizer::with_rules(vec![strip_reasoning_markers as SanitizeRule]).push_rule(shout);
        assert_eq!(sanitizer.clean("x</think>quiet"), "quiet");
        assert_eq!(sanitizer.clean(" quiet "), "QUIET");
    }

    #[test]
    fn test_no_rules_returns_trimmed_input() {
        assert_eq!(ResponseSanitizer::with_rules(Vec::new()).clean("  hi  "), "hi");
    }
}
