//! Verdict adjudication against retrieved evidence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vf_core::domain::Verdict;

use crate::llm::Llm;
use crate::salvage::{first_json_object_where, strip_think_blocks, ParseOutcome};

mod prompts;

pub use prompts::verification_prompt;

pub const DEFAULT_REASONING: &str = "Unable to determine.";

/// How the verdict was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    Parsed,
    KeywordFallback,
    CallFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verdict: Verdict,
    /// Never empty.
    pub reasoning: String,
    pub source: VerdictSource,
}

#[derive(Clone)]
pub struct Verifier {
    llm: Arc<dyn Llm>,
    model: String,
}

impl Verifier {
    pub fn new(llm: Arc<dyn Llm>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Never fails: a failed model call becomes `Unverifiable` with the error as reasoning.
    pub fn verify(&self, claim: &str, evidence: &[String]) -> VerificationResult {
        let prompt = verification_prompt(claim, evidence);
        let response = match self.llm.generate(&self.model, &prompt) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "verification call failed; returning Unverifiable");
                return VerificationResult {
                    verdict: Verdict::Unverifiable,
                    reasoning: format!("Error during verification: {e}"),
                    source: VerdictSource::CallFailed,
                };
            }
        };

        let result = match parse_verdict(&response) {
            ParseOutcome::Parsed((verdict, reasoning)) => VerificationResult {
                verdict,
                reasoning,
                source: VerdictSource::Parsed,
            },
            ParseOutcome::Fallback(raw) => {
                tracing::warn!("no verdict object in model output; scanning for keywords");
                VerificationResult {
                    verdict: keyword_verdict(&raw),
                    reasoning: raw_or_default(raw),
                    source: VerdictSource::KeywordFallback,
                }
            }
        };
        tracing::info!(
            verdict = %result.verdict,
            source = ?result.source,
            evidence = evidence.len(),
            "verified claim"
        );
        result
    }
}

/// Reads the first JSON object carrying a `verdict` or `reasoning` key, ignoring
/// `<think>` blocks. `Fallback` holds the untouched response.
pub fn parse_verdict(response: &str) -> ParseOutcome<(Verdict, String)> {
    let visible = strip_think_blocks(response);
    let found: Option<Map<String, Value>> = first_json_object_where(&visible, |m: &Map<String, Value>| {
        m.contains_key("verdict") || m.contains_key("reasoning")
    });

    let Some(obj) = found else {
        return ParseOutcome::Fallback(response.to_string());
    };

    let verdict = match obj.get("verdict") {
        Some(Value::String(s)) => Verdict::from_label(s).unwrap_or(Verdict::Unverifiable),
        Some(Value::Bool(true)) => Verdict::True,
        Some(Value::Bool(false)) => Verdict::False,
        _ => Verdict::Unverifiable,
    };
    let reasoning = match obj.get("reasoning") {
        Some(Value::String(s)) => non_empty_or_default(s),
        _ => DEFAULT_REASONING.to_string(),
    };
    ParseOutcome::Parsed((verdict, reasoning))
}

/// `true` without `false` is True, any `false` is False, otherwise Unverifiable.
pub fn keyword_verdict(raw: &str) -> Verdict {
    let lower = raw.to_lowercase();
    if lower.contains("true") && !lower.contains("false") {
        Verdict::True
    } else if lower.contains("false") {
        Verdict::False
    } else {
        Verdict::Unverifiable
    }
}

/// The response exactly as returned, unless it is blank.
fn raw_or_default(raw: String) -> String {
    if raw.trim().is_empty() {
        DEFAULT_REASONING.to_string()
    } else {
        raw
    }
}

fn non_empty_or_default(s: &str) -> String {
    let t = s.trim();
    if t.is_empty() {
        DEFAULT_REASONING.to_string()
    } else {
        t.to_string()
    }
}
