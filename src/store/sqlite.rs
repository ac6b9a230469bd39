// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed vector store.
//!
//! Records live in a single `chunks` table keyed by `(collection, id)`;
//! metadata is stored as JSON text and filtered with `json_extract`.
//! Vectors are little-endian `f32` blobs and nearest neighbors are found by
//! brute-force distance computation over the (filtered) collection.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::backend::{DistanceMetric, QueryMatch, VectorRecord, VectorStore};
use super::filter::MetadataFilter;
use crate::chunk::ChunkRecord;
use crate::errors::{Error, Result};

const SCHEMA_VERSION: &str = "1";

/// Vector store persisted in a SQLite database file.
pub struct SqliteVectorStore {
    conn: Connection,
    path: Option<PathBuf>,
    collection: String,
    metric: DistanceMetric,
}

impl SqliteVectorStore {
    /// Opens or creates the store at `path`.
    ///
    /// The metric is recorded when the collection is first created; reopening
    /// the collection with a different metric fails.
    pub fn open<P: AsRef<Path>>(path: P, collection: &str, metric: DistanceMetric) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let store = Self::init(conn, Some(path), collection, metric)?;
        debug!(path = ?store.path, collection, metric = %metric, "opened chunk store");
        Ok(store)
    }

    /// Store that lives only as long as the value.
    pub fn open_in_memory(collection: &str, metric: DistanceMetric) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None, collection, metric)
    }

    fn init(
        conn: Connection,
        path: Option<PathBuf>,
        collection: &str,
        metric: DistanceMetric,
    ) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL,
                UNIQUE(collection, id)
            );
            "#,
        )?;

        let store = Self {
            conn,
            path,
            collection: collection.to_string(),
            metric,
        };
        store.set_meta_if_absent("schema_version", SCHEMA_VERSION)?;

        let metric_key = format!("metric:{}", collection);
        match store.get_meta(&metric_key)? {
            None => store.set_meta(&metric_key, metric.as_str())?,
            Some(recorded) if recorded == metric.as_str() => {}
            Some(recorded) => {
                return Err(Error::Store(format!(
                    "collection '{}' was created with the {} metric, not {}",
                    collection, recorded, metric
                )))
            }
        }

        Ok(store)
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Gets metadata value by key.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Sets metadata value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO meta (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn set_meta_if_absent(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Collection predicate plus one `json_extract` equality per condition.
    fn where_clause(&self, filter: Option<&MetadataFilter>) -> (String, Vec<SqlValue>) {
        let mut sql = String::from("collection = ?");
        let mut values = vec![SqlValue::Text(self.collection.clone())];
        if let Some(filter) = filter {
            for (key, value) in filter.conditions() {
                sql.push_str(" AND json_extract(metadata, ?) = ?");
                values.push(SqlValue::Text(json_path(key)));
                values.push(sql_value(value));
            }
        }
        (sql, values)
    }

    fn load_records(&self, sql: &str, values: Vec<SqlValue>) -> Result<Vec<ChunkRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, content, metadata)| {
                Ok(ChunkRecord {
                    id,
                    content,
                    metadata: serde_json::from_str(&metadata)?,
                })
            })
            .collect()
    }
}

impl VectorStore for SqliteVectorStore {
    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn upsert(&mut self, records: &[VectorRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO chunks (collection, id, content, metadata, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(collection, id) DO UPDATE SET
                    content = excluded.content,
                    metadata = excluded.metadata,
                    embedding = excluded.embedding
                "#,
            )?;
            for record in records {
                stmt.execute(params![
                    self.collection,
                    record.id,
                    record.content,
                    serde_json::to_string(&record.metadata)?,
                    embedding_to_blob(&record.embedding),
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let (clause, values) = self.where_clause(filter);
        let sql = format!(
            "SELECT id, content, metadata, embedding FROM chunks WHERE {} ORDER BY seq",
            clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut matches = Vec::with_capacity(rows.len());
        for (id, content, metadata, blob) in rows {
            let embedding = blob_to_embedding(&blob);
            if embedding.len() != vector.len() {
                return Err(Error::Store(format!(
                    "dimension mismatch for {}: stored {}, query {}",
                    id,
                    embedding.len(),
                    vector.len()
                )));
            }
            matches.push(QueryMatch {
                distance: self.metric.distance(vector, &embedding),
                metadata: serde_json::from_str::<Map<String, Value>>(&metadata)?,
                id,
                content,
            });
        }

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        Ok(matches)
    }

    fn delete(&mut self, filter: &MetadataFilter) -> Result<usize> {
        if filter.is_empty() {
            return Err(Error::Store(
                "refusing to delete with an empty filter; use reset instead".to_string(),
            ));
        }
        let (clause, values) = self.where_clause(Some(filter));
        let deleted = self.conn.execute(
            &format!("DELETE FROM chunks WHERE {}", clause),
            params_from_iter(values),
        )?;
        Ok(deleted)
    }

    fn delete_ids(&mut self, ids: &[String]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM chunks WHERE collection = ?1 AND id = ?2")?;
            for id in ids {
                deleted += stmt.execute(params![self.collection, id])?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    fn get(&self, ids: &[String]) -> Result<Vec<ChunkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT content, metadata FROM chunks WHERE collection = ?1 AND id = ?2",
        )?;
        let mut records = Vec::new();
        for id in ids {
            let row = stmt
                .query_row(params![self.collection, id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .optional()?;
            if let Some((content, metadata)) = row {
                records.push(ChunkRecord {
                    id: id.clone(),
                    content,
                    metadata: serde_json::from_str(&metadata)?,
                });
            }
        }
        Ok(records)
    }

    fn scan(
        &self,
        filter: Option<&MetadataFilter>,
        limit: Option<usize>,
    ) -> Result<Vec<ChunkRecord>> {
        let (clause, mut values) = self.where_clause(filter);
        let sql = format!(
            "SELECT id, content, metadata FROM chunks WHERE {} ORDER BY seq LIMIT ?",
            clause
        );
        values.push(SqlValue::Integer(
            limit.map(|l| l.min(i64::MAX as usize) as i64).unwrap_or(-1),
        ));
        self.load_records(&sql, values)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn reset(&mut self) -> Result<()> {
        self.conn.execute(
            "DELETE FROM chunks WHERE collection = ?1",
            params![self.collection],
        )?;
        Ok(())
    }
}

/// JSON path addressing a top-level key, quoted so any key is accepted.
fn json_path(key: &str) -> String {
    format!("$.\"{}\"", key.replace('"', "\\\""))
}

/// `json_extract` yields integers for JSON booleans.
fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::Null => SqlValue::Null,
        other => SqlValue::Text(other.to_string()),
    }
}

/// Converts an embedding vector to a compact blob.
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Converts a blob back to an embedding vector.
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
