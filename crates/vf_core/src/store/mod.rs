//! Durable, append-only store of embedded verified statements.
//!
//! One SQLite file may hold several named collections. A collection's embedding model and
//! vector dimension are fixed when it is first populated and checked on every query.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::db;
use crate::domain::{EmbeddedFact, FactMetadata};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub embedding_model: String,
    pub dims: usize,
    pub corpus_sha256: String,
    pub created_at: String,
    pub document_count: usize,
}

/// Outcome of [`FactStore::bulk_insert`]. `inserted == 0` with a non-zero
/// `document_count` means the collection was already populated and nothing was written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkInsertSummary {
    pub inserted: usize,
    pub document_count: usize,
}

impl BulkInsertSummary {
    pub fn skipped(&self) -> bool {
        self.inserted == 0 && self.document_count > 0
    }
}

/// A nearest-neighbour hit, nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreMatch {
    pub fact_key: String,
    pub fact_id: String,
    pub document: String,
    pub distance: f64,
    pub metadata: FactMetadata,
}

/// Handle to one collection. Holds no connection, so it is cheap to clone and safe to
/// share across threads; every call opens its own connection.
#[derive(Debug, Clone)]
pub struct FactStore {
    path: PathBuf,
    collection: String,
    busy_timeout: Duration,
}

impl FactStore {
    /// Open or create the store file and apply migrations.
    pub fn open(path: &Path, collection: &str, busy_timeout: Duration) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                unavailable("Failed to create store directory")
                    .with_details(format!("path={}; err={}", parent.display(), e))
            })?;
        }
        let mut conn = db::open(path, busy_timeout).map_err(into_unavailable)?;
        db::migrate(&mut conn).map_err(into_unavailable)?;

        tracing::debug!(path = %path.display(), collection, "fact store opened");
        Ok(Self {
            path: path.to_path_buf(),
            collection: collection.to_string(),
            busy_timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::open(&config.store_path, &config.collection_name, config.store_timeout)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, AppError> {
        let conn = db::open_existing(&self.path, self.busy_timeout).map_err(into_unavailable)?;
        let has_schema: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name='facts'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| unavailable("Failed to inspect store schema").with_details(e.to_string()))?;
        if has_schema.is_none() {
            return Err(unavailable("Fact store schema is not initialized")
                .with_details(format!("path={}", self.path.display())));
        }
        Ok(conn)
    }

    pub fn count(&self) -> Result<usize, AppError> {
        let conn = self.connect()?;
        count_in(&conn, &self.collection)
    }

    pub fn info(&self) -> Result<Option<CollectionInfo>, AppError> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT name, embedding_model, dims, corpus_sha256, created_at FROM collections WHERE name = ?1",
                [&self.collection],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| query_failed("Failed to read collection info", e))?;

        let Some((name, embedding_model, dims, corpus_sha256, created_at)) = row else {
            return Ok(None);
        };
        Ok(Some(CollectionInfo {
            name,
            embedding_model,
            dims: dims.max(0) as usize,
            corpus_sha256,
            created_at,
            document_count: count_in(&conn, &self.collection)?,
        }))
    }

    /// Fails with `STORE_PROVIDER_MISMATCH` when the collection was built by a different
    /// embedding model (or dimension) than the one supplied. An empty collection accepts any.
    pub fn ensure_provider(&self, embedding_model: &str, dims: Option<usize>) -> Result<(), AppError> {
        let Some(info) = self.info()? else {
            return Ok(());
        };
        if info.embedding_model != embedding_model {
            return Err(AppError::new(
                "STORE_PROVIDER_MISMATCH",
                "Collection was embedded with a different model",
            )
            .with_details(format!(
                "collection={}; stored_model={}; active_model={}",
                info.name, info.embedding_model, embedding_model
            )));
        }
        if let Some(d) = dims {
            if d != info.dims {
                return Err(AppError::new(
                    "STORE_PROVIDER_MISMATCH",
                    "Embedding dimension differs from the collection",
                )
                .with_details(format!(
                    "collection={}; stored_dims={}; active_dims={}",
                    info.name, info.dims, d
                )));
            }
        }
        Ok(())
    }

    /// Insert all records unless the collection already holds any, in which case nothing is
    /// written and the existing count is returned.
    pub fn bulk_insert(
        &self,
        embedding_model: &str,
        records: &[EmbeddedFact],
    ) -> Result<BulkInsertSummary, AppError> {
        let mut conn = self.connect()?;

        // Write lock held from here: the populated check and the insert are one step.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| write_failed("Failed to start insert transaction", e))?;

        let existing = count_in(&tx, &self.collection)?;
        if existing > 0 {
            tracing::info!(
                collection = %self.collection,
                existing,
                "collection already populated; skipping insert"
            );
            return Ok(BulkInsertSummary {
                inserted: 0,
                document_count: existing,
            });
        }
        if records.is_empty() {
            return Ok(BulkInsertSummary {
                inserted: 0,
                document_count: 0,
            });
        }

        let dims = check_dims(records)?;
        let corpus_sha256 = corpus_digest(records);
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| write_failed("Failed to format creation time", e))?;

        tx.execute(
            r#"INSERT INTO collections(name, embedding_model, dims, corpus_sha256, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(name) DO UPDATE SET
                 embedding_model = excluded.embedding_model,
                 dims = excluded.dims,
                 corpus_sha256 = excluded.corpus_sha256,
                 created_at = excluded.created_at"#,
            params![self.collection, embedding_model, dims as i64, corpus_sha256, created_at],
        )
        .map_err(|e| write_failed("Failed to register collection", e))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"INSERT INTO facts(collection, fact_key, fact_id, statement, embedding, source, date, category, ordinal)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                )
                .map_err(|e| write_failed("Failed to prepare fact insert", e))?;

            for (ordinal, rec) in records.iter().enumerate() {
                let embedding = serde_json::to_string(&rec.embedding)
                    .map_err(|e| write_failed("Failed to encode embedding", e))?;
                stmt.execute(params![
                    self.collection,
                    rec.fact.store_key(),
                    rec.fact.id,
                    rec.fact.statement,
                    embedding,
                    rec.fact.source,
                    rec.fact.date,
                    rec.fact.category,
                    ordinal as i64,
                ])
                .map_err(|e| {
                    AppError::new("STORE_WRITE_FAILED", "Failed to insert fact")
                        .with_details(format!("fact_key={}; err={}", rec.fact.store_key(), e))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| write_failed("Failed to commit fact insert", e))?;

        tracing::info!(
            collection = %self.collection,
            inserted = records.len(),
            dims,
            embedding_model,
            "stored embedded facts"
        );
        Ok(BulkInsertSummary {
            inserted: records.len(),
            document_count: records.len(),
        })
    }

    /// Up to `k` nearest facts by Euclidean distance, ascending. Equal distances keep
    /// insertion order. An empty or unknown collection yields no matches. Non-finite query
    /// components are rejected with `STORE_QUERY_FAILED`.
    pub fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<StoreMatch>, AppError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(AppError::new("STORE_QUERY_FAILED", "Query embedding has non-finite values")
                .with_details(format!("dims={}", embedding.len())));
        }
        let conn = self.connect()?;

        let dims: Option<i64> = conn
            .query_row(
                "SELECT dims FROM collections WHERE name = ?1",
                [&self.collection],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| query_failed("Failed to read collection dims", e))?;
        let Some(dims) = dims else {
            return Ok(Vec::new());
        };
        if dims as usize != embedding.len() {
            return Err(AppError::new(
                "STORE_PROVIDER_MISMATCH",
                "Query embedding dims do not match collection dims",
            )
            .with_details(format!("collection_dims={dims}; query_dims={}", embedding.len())));
        }

        let mut stmt = conn
            .prepare(
                r#"SELECT fact_key, fact_id, statement, embedding, source, date, category
                   FROM facts WHERE collection = ?1 ORDER BY ordinal ASC"#,
            )
            .map_err(|e| query_failed("Failed to prepare nearest-neighbour scan", e))?;
        let rows = stmt
            .query_map([&self.collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    FactMetadata {
                        source: row.get(4)?,
                        date: row.get(5)?,
                        category: row.get(6)?,
                    },
                ))
            })
            .map_err(|e| query_failed("Failed to scan facts", e))?;

        let mut hits: Vec<StoreMatch> = Vec::new();
        for row in rows {
            let (fact_key, fact_id, document, raw_embedding, metadata) =
                row.map_err(|e| query_failed("Failed to read fact row", e))?;
            let vector: Vec<f32> = serde_json::from_str(&raw_embedding).map_err(|e| {
                AppError::new("STORE_QUERY_FAILED", "Failed to decode stored embedding")
                    .with_details(format!("fact_key={fact_key}; err={e}"))
            })?;
            if vector.len() != embedding.len() {
                return Err(AppError::new("STORE_QUERY_FAILED", "Stored vector dims mismatch")
                    .with_details(format!(
                        "fact_key={fact_key}; expected={}; got={}",
                        embedding.len(),
                        vector.len()
                    )));
            }
            hits.push(StoreMatch {
                fact_key,
                fact_id,
                document,
                distance: l2_distance(embedding, &vector),
                metadata,
            });
        }

        // Stable: ties keep ordinal order.
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Euclidean distance, accumulated in `f64`.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

fn count_in(conn: &Connection, collection: &str) -> Result<usize, AppError> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM facts WHERE collection = ?1",
            [collection],
            |row| row.get(0),
        )
        .map_err(|e| query_failed("Failed to count facts", e))?;
    Ok(n.max(0) as usize)
}

fn check_dims(records: &[EmbeddedFact]) -> Result<usize, AppError> {
    let dims = records.first().map(|r| r.embedding.len()).unwrap_or(0);
    if dims == 0 {
        return Err(AppError::new("STORE_WRITE_FAILED", "Embeddings must not be empty"));
    }
    for rec in records {
        if rec.embedding.len() != dims {
            return Err(AppError::new(
                "STORE_WRITE_FAILED",
                "Embedding dimension mismatch across records",
            )
            .with_details(format!(
                "expected={dims}; got={}; fact_id={}",
                rec.embedding.len(),
                rec.fact.id
            )));
        }
        if rec.embedding.iter().any(|x| !x.is_finite()) {
            return Err(AppError::new("STORE_WRITE_FAILED", "Embedding has non-finite values")
                .with_details(format!("fact_id={}", rec.fact.id)));
        }
    }
    Ok(dims)
}

fn corpus_digest(records: &[EmbeddedFact]) -> String {
    let mut hasher = Sha256::new();
    for rec in records {
        let f = &rec.fact;
        hasher.update(
            format!(
                "{}\t{}\t{}\t{}\t{}\n",
                f.id, f.statement, f.source, f.date, f.category
            )
            .as_bytes(),
        );
    }
    hex::encode(hasher.finalize())
}

fn unavailable(message: &str) -> AppError {
    AppError::new("STORE_UNAVAILABLE", message).with_retryable(true)
}

fn into_unavailable(e: AppError) -> AppError {
    let details = match e.details {
        Some(d) => format!("{}; {}", e.message, d),
        None => e.message,
    };
    unavailable("Fact store is unavailable").with_details(details)
}

fn write_failed(message: &str, e: impl std::fmt::Display) -> AppError {
    AppError::new("STORE_WRITE_FAILED", message).with_details(e.to_string())
}

fn query_failed(message: &str, e: impl std::fmt::Display) -> AppError {
    AppError::new("STORE_QUERY_FAILED", message).with_details(e.to_string())
}
