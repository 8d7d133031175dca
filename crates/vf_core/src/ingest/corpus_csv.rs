use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::format_description;
use time::Date;

use crate::domain::{ValidationWarning, VerifiedFact};
use crate::error::AppError;

pub const REQUIRED_COLUMNS: [&str; 5] = ["id", "statement", "source", "date", "category"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusLoad {
    /// Facts in file order; this is the insertion order into the store.
    pub facts: Vec<VerifiedFact>,
    pub warnings: Vec<ValidationWarning>,
}

struct ColumnIndex {
    id: usize,
    statement: usize,
    source: usize,
    date: usize,
    category: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, AppError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|&&c| find(c).is_none())
            .copied()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(AppError::new(
                "CORPUS_HEADERS_MISSING",
                "Corpus CSV is missing required columns",
            )
            .with_details(format!("missing={}", missing.join(","))));
        }
        // All present after the check above.
        let at = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            id: at("id"),
            statement: at("statement"),
            source: at("source"),
            date: at("date"),
            category: at("category"),
        })
    }
}

fn cell(row: &csv::StringRecord, idx: usize) -> String {
    row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn check_date(row_idx: usize, raw: &str, warnings: &mut Vec<ValidationWarning>) {
    if raw.is_empty() {
        warnings.push(
            ValidationWarning::new("CORPUS_DATE_MISSING", "Fact has no date")
                .with_details(format!("row={row_idx}")),
        );
        return;
    }
    let Ok(items) = format_description::parse("[year]-[month]-[day]") else {
        return;
    };
    if Date::parse(raw, &items).is_err() {
        warnings.push(
            ValidationWarning::new(
                "CORPUS_DATE_RAW_KEPT",
                "Fact date is not YYYY-MM-DD; stored as authored",
            )
            .with_details(format!("row={row_idx}; value={raw}")),
        );
    }
}

/// Parse corpus CSV text with columns `id,statement,source,date,category`.
///
/// Column order is free and extra columns are ignored. Rows with an empty `id` or
/// `statement`, and duplicate ids, are hard errors: the store key is derived from `id`.
pub fn parse_corpus_csv(csv_text: &str) -> Result<CorpusLoad, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = rdr.headers().map_err(|e| {
        AppError::new("CORPUS_READ_FAILED", "Failed to read corpus CSV headers")
            .with_details(e.to_string())
    })?;
    let cols = ColumnIndex::resolve(headers)?;

    let mut facts = Vec::new();
    let mut warnings = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (i, result) in rdr.records().enumerate() {
        // 1-based data row number, header excluded.
        let row_idx = i + 1;
        let row = result.map_err(|e| {
            AppError::new("CORPUS_READ_FAILED", "Failed to parse corpus CSV row")
                .with_details(format!("row={row_idx}; err={e}"))
        })?;

        let id = cell(&row, cols.id);
        let statement = cell(&row, cols.statement);
        if id.is_empty() {
            return Err(AppError::new("CORPUS_ROW_INVALID", "Corpus row has an empty id")
                .with_details(format!("row={row_idx}")));
        }
        if statement.is_empty() {
            return Err(
                AppError::new("CORPUS_ROW_INVALID", "Corpus row has an empty statement")
                    .with_details(format!("row={row_idx}; id={id}")),
            );
        }
        if !seen.insert(id.clone()) {
            return Err(AppError::new("CORPUS_DUPLICATE_ID", "Corpus id is not unique")
                .with_details(format!("row={row_idx}; id={id}")));
        }

        let date = cell(&row, cols.date);
        check_date(row_idx, &date, &mut warnings);

        facts.push(VerifiedFact {
            id,
            statement,
            source: cell(&row, cols.source),
            date,
            category: cell(&row, cols.category),
        });
    }

    if facts.is_empty() {
        return Err(AppError::new("CORPUS_EMPTY", "Corpus CSV has no fact rows"));
    }

    tracing::info!(facts = facts.len(), warnings = warnings.len(), "parsed corpus");
    Ok(CorpusLoad { facts, warnings })
}

pub fn load_corpus_file(path: &Path) -> Result<CorpusLoad, AppError> {
    tracing::info!(path = %path.display(), "loading corpus");
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::new("CORPUS_READ_FAILED", "Failed to read corpus file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    parse_corpus_csv(&text)
}
