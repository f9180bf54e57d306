//! Extraction of a structured verdict from the model's free-text reply.
//!
//! The model is asked for a `Verdict:` line followed by a `Reasoning:` block
//! but is not guaranteed to comply, so both rules fall back to defaults
//! instead of failing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

pub const DEFAULT_REASONING: &str = "No detailed reasoning provided.";

static VERDICT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Verdict:\s*(Real|AI-Generated|Inconclusive)").expect("valid verdict regex")
});

static REASONING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)Reasoning:\s*(.*)").expect("valid reasoning regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verdict {
    Real,
    #[serde(rename = "AI-Generated")]
    AiGenerated,
    #[default]
    Inconclusive,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "Real",
            Verdict::AiGenerated => "AI-Generated",
            Verdict::Inconclusive => "Inconclusive",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        [Verdict::Real, Verdict::AiGenerated, Verdict::Inconclusive]
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus reasoning, as produced by [`parse_analysis_response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    verdict: Verdict,
    reasoning: String,
}

impl AnalysisResult {
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }
}

/// First `Verdict: <label>` match, or `Inconclusive`.
pub fn parse_verdict(text: &str) -> Verdict {
    VERDICT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Verdict::from_label(m.as_str()))
        .unwrap_or_else(|| {
            tracing::debug!("No verdict line in model reply, defaulting to Inconclusive");
            Verdict::Inconclusive
        })
}

/// Everything after the first `Reasoning:` marker, trimmed, or the default text.
pub fn parse_reasoning(text: &str) -> String {
    REASONING_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            tracing::debug!("No reasoning block in model reply, using default");
            DEFAULT_REASONING.to_string()
        })
}

pub fn parse_analysis_response(text: &str) -> AnalysisResult {
    AnalysisResult {
        verdict: parse_verdict(text),
        reasoning: parse_reasoning(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_well_formed_reply() {
        let result = parse_analysis_response("Verdict: Real\nReasoning: Looks natural.");
        assert_eq!(result.verdict(), Verdict::Real);
        assert_eq!(result.reasoning(), "Looks natural.");
    }

    #[test]
    fn test_verdict_is_case_insensitive_and_canonicalized() {
        assert_eq!(parse_verdict("verdict: ai-generated"), Verdict::AiGenerated);
        assert_eq!(parse_verdict("VERDICT:INCONCLUSIVE"), Verdict::Inconclusive);
        assert_eq!(parse_verdict("**Verdict:**  Real"), Verdict::Inconclusive);
        assert_eq!(parse_verdict("Verdict:   Real"), Verdict::Real);
    }

    #[test]
    fn test_missing_verdict_defaults_to_inconclusive() {
        let result = parse_analysis_response("Reasoning: The shadows disagree.");
        assert_eq!(result.verdict(), Verdict::Inconclusive);
        assert_eq!(result.reasoning(), "The shadows disagree.");
    }

    #[test]
    fn test_unknown_verdict_label_defaults_to_inconclusive() {
        assert_eq!(parse_verdict("Verdict: Fake"), Verdict::Inconclusive);
    }

    #[test]
    fn test_missing_reasoning_uses_default() {
        let result = parse_analysis_response("Verdict: AI-Generated");
        assert_eq!(result.verdict(), Verdict::AiGenerated);
        assert_eq!(result.reasoning(), DEFAULT_REASONING);
    }

    #[test]
    fn test_blank_reasoning_uses_default() {
        assert_eq!(parse_reasoning("Verdict: Real\nReasoning:   \n"), DEFAULT_REASONING);
    }

    #[test]
    fn test_reasoning_spans_multiple_lines() {
        let text = "Verdict: AI-Generated\nReasoning:\n- Warped earrings\n- Smeared text in background\n";
        assert_eq!(
            parse_reasoning(text),
            "- Warped earrings\n- Smeared text in background"
        );
    }

    #[test]
    fn test_empty_and_garbage_input_is_total() {
        for input in ["", "   ", "I cannot help with that.", "Verdict:", "Reasoning:"] {
            let result = parse_analysis_response(input);
            assert_eq!(result.verdict(), Verdict::Inconclusive);
            assert!(!result.reasoning().is_empty());
        }
    }

    #[test]
    fn test_serializes_with_display_labels() {
        let result = parse_analysis_response("Verdict: AI-Generated\nReasoning: Artifacts around eyes.");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "verdict": "AI-Generated",
                "reasoning": "Artifacts around eyes."
            })
        );
    }
}
