use serde::{Deserialize, Serialize};
use std::fmt;

/// A statement from the verified corpus, as authored.
///
/// Notes:
/// - `id` is unique within a corpus; the store keys each fact as `fact_<id>`.
/// - `date` is kept as authored. Non-ISO dates surface as ingest warnings rather than being guessed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifiedFact {
    pub id: String,
    pub statement: String,
    pub source: String,
    pub date: String,
    pub category: String,
}

impl VerifiedFact {
    pub fn store_key(&self) -> String {
        format!("fact_{}", self.id)
    }

    pub fn metadata(&self) -> FactMetadata {
        FactMetadata {
            source: self.source.clone(),
            date: self.date.clone(),
            category: self.category.clone(),
        }
    }
}

/// Provenance stored next to each indexed statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FactMetadata {
    pub source: String,
    pub date: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedFact {
    pub fact: VerifiedFact,
    pub embedding: Vec<f32>,
}

/// Final classification of a claim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Verdict {
    True,
    False,
    Unverifiable,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "True",
            Verdict::False => "False",
            Verdict::Unverifiable => "Unverifiable",
        }
    }

    /// Case-insensitive mapping of a model-supplied label. Surrounding punctuation and
    /// whitespace are ignored; anything else is `None`.
    pub fn from_label(raw: &str) -> Option<Self> {
        let label = raw
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_lowercase();
        match label.as_str() {
            "true" => Some(Verdict::True),
            "false" => Some(Verdict::False),
            "unverifiable" => Some(Verdict::Unverifiable),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
