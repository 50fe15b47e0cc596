//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs and scored in Rust.
//! Rows carry an autoincrement sequence so ties rank in insertion order.

use super::{rank, CollectionSummary, Record, SearchResult, SourceSummary, VectorStore};
use crate::error::{ColloquyError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS records (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        collection TEXT NOT NULL,
        source TEXT NOT NULL,
        page INTEGER,
        chunk_order INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
    CREATE INDEX IF NOT EXISTS idx_records_source ON records(collection, source);
"#;

const RECORD_COLUMNS: &str =
    "id, collection, source, page, chunk_order, content, embedding, indexed_at";

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ColloquyError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn insert_records(tx: &Transaction<'_>, records: &[Record]) -> Result<()> {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            RECORD_COLUMNS
        ))?;
        for record in records {
            stmt.execute(params![
                record.id.to_string(),
                record.collection,
                record.source,
                record.page,
                record.chunk_order,
                record.content,
                Self::embedding_to_bytes(&record.embedding),
                record.indexed_at.to_rfc3339(),
            ])?;
        }
        Ok(())
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<Record> {
        let id: String = row.get(0)?;
        let embedding: Vec<u8> = row.get(6)?;
        let indexed_at: String = row.get(7)?;

        Ok(Record {
            id: uuid::Uuid::parse_str(&id).unwrap_or_default(),
            collection: row.get(1)?,
            source: row.get(2)?,
            page: row.get(3)?,
            chunk_order: row.get(4)?,
            content: row.get(5)?,
            embedding: Self::bytes_to_embedding(&embedding),
            indexed_at: parse_timestamp(&indexed_at),
        })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn append(&self, records: &[Record]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        Self::insert_records(&tx, records)?;
        tx.commit()?;
        info!("Appended {} records", records.len());
        Ok(records.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM records WHERE collection = ?1 ORDER BY seq",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![collection], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let results = rank(records, query_embedding, limit, min_score);
        debug!("Found {} matching records", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn collections(&self) -> Result<Vec<CollectionSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT collection, COUNT(*), COUNT(DISTINCT source)
            FROM records
            GROUP BY collection
            ORDER BY collection
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let record_count: i64 = row.get(1)?;
            let source_count: i64 = row.get(2)?;
            Ok(CollectionSummary {
                name: row.get(0)?,
                record_count: record_count as usize,
                source_count: source_count as usize,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    #[instrument(skip(self))]
    async fn sources(&self, collection: &str) -> Result<Vec<SourceSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT source, COUNT(*), MAX(indexed_at) AS latest
            FROM records
            WHERE collection = ?1
            GROUP BY source
            ORDER BY latest DESC
            "#,
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            let record_count: i64 = row.get(1)?;
            let indexed_at: String = row.get(2)?;
            Ok(SourceSummary {
                collection: collection.to_string(),
                source: row.get(0)?,
                record_count: record_count as usize,
                indexed_at: parse_timestamp(&indexed_at),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn has_source(&self, collection: &str, source: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1 AND source = ?2",
            params![collection, source],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn delete_source(&self, collection: &str, source: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM records WHERE collection = ?1 AND source = ?2",
            params![collection, source],
        )?;

        info!("Deleted {} records for {} in {}", deleted, source, collection);
        Ok(deleted)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn replace_source(
        &self,
        collection: &str,
        source: &str,
        records: &[Record],
    ) -> Result<(usize, usize)> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let deleted = tx.execute(
            "DELETE FROM records WHERE collection = ?1 AND source = ?2",
            params![collection, source],
        )?;
        Self::insert_records(&tx, records)?;
        tx.commit()?;

        info!(
            "Replaced {} records with {} for {} in {}",
            deleted,
            records.len(),
            source,
            collection
        );
        Ok((deleted, records.len()))
    }
}
