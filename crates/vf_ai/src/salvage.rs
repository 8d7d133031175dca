//! Recovering structured values from free-form model output.
//!
//! Models wrap JSON in prose, code fences and reasoning blocks. Parsing is two-stage: find
//! the first balanced JSON-shaped span that decodes to the wanted shape, otherwise hand the
//! raw text back as [`ParseOutcome::Fallback`] for a heuristic reading.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Upper bound on candidate spans tried per response.
const MAX_CANDIDATES: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParseOutcome<T> {
    Parsed(T),
    Fallback(String),
}

impl<T> ParseOutcome<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }
}

/// Kind-only view of a [`ParseOutcome`], for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseKind {
    Parsed,
    Fallback,
}

impl<T> From<&ParseOutcome<T>> for ParseKind {
    fn from(o: &ParseOutcome<T>) -> Self {
        match o {
            ParseOutcome::Parsed(_) => ParseKind::Parsed,
            ParseOutcome::Fallback(_) => ParseKind::Fallback,
        }
    }
}

/// First `[...]` span in `text` that decodes as `T`.
pub fn first_json_array<T: DeserializeOwned>(text: &str) -> Option<T> {
    first_decodable(text, b'[', b']')
}

/// First `{...}` span in `text` that decodes as `T`.
pub fn first_json_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    first_json_object_where(text, |_: &T| true)
}

/// First `{...}` span in `text` that decodes as `T` and satisfies `accept`.
pub fn first_json_object_where<T, F>(text: &str, accept: F) -> Option<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    first_decodable_where(text, b'{', b'}', accept)
}

fn first_decodable<T: DeserializeOwned>(text: &str, open: u8, close: u8) -> Option<T> {
    first_decodable_where(text, open, close, |_: &T| true)
}

fn first_decodable_where<T, F>(text: &str, open: u8, close: u8, accept: F) -> Option<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == open)
        .take(MAX_CANDIDATES)
        .filter_map(|(start, _)| balanced_end(bytes, start, open, close).map(|end| &text[start..=end]))
        .filter_map(|span| serde_json::from_str::<T>(span).ok())
        .find(|v| accept(v))
}

/// Index of the bracket closing the one at `start`, skipping brackets inside JSON strings.
fn balanced_end(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes `<think>...</think>` reasoning blocks. An unterminated block swallows the rest.
pub fn strip_think_blocks(text: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(OPEN) {
        out.push_str(&rest[..pos]);
        match rest[pos + OPEN.len()..].find(CLOSE) {
            Some(end) => rest = &rest[pos + OPEN.len() + end + CLOSE.len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}
