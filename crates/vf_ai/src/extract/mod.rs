use std::sync::Arc;

use crate::llm::Llm;
use crate::salvage::{first_json_array, ParseOutcome};

mod prompts;

#[derive(Clone)]
pub struct ClaimExtractor {
    llm: Arc<dyn Llm>,
    model: String,
}

impl ClaimExtractor {
    pub fn new(llm: Arc<dyn Llm>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Atomic claims in model order; never empty. Falls back to `[text]`.
    pub fn extract(&self, text: &str) -> Vec<String> {
        claims_or_input(self.extract_detailed(text))
    }

    /// Like [`extract`](Self::extract), but tells a parsed claim list apart from the
    /// fallback. `Fallback` carries the original input, which becomes the only claim.
    pub fn extract_detailed(&self, text: &str) -> ParseOutcome<Vec<String>> {
        let prompt = prompts::extraction_prompt(text);
        let response = match self.llm.generate(&self.model, &prompt) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "claim extraction call failed; using input as the claim");
                return ParseOutcome::Fallback(text.to_string());
            }
        };

        match parse_claims(&response) {
            Some(claims) => {
                tracing::info!(claims = claims.len(), "extracted claims");
                ParseOutcome::Parsed(claims)
            }
            None => {
                tracing::warn!("could not parse claims from model output; using input as the claim");
                ParseOutcome::Fallback(text.to_string())
            }
        }
    }
}

pub fn claims_or_input(outcome: ParseOutcome<Vec<String>>) -> Vec<String> {
    match outcome {
        ParseOutcome::Parsed(claims) => claims,
        ParseOutcome::Fallback(input) => vec![input],
    }
}

/// Non-empty trimmed claims from the first JSON string array in `response`.
/// `None` when there is no such array or it holds no usable claim.
pub fn parse_claims(response: &str) -> Option<Vec<String>> {
    let raw: Vec<String> = first_json_array(response)?;
    let claims = raw
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>();
    if claims.is_empty() {
        None
    } else {
        Some(claims)
    }
}
