//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{rank, CollectionSummary, Record, SearchResult, SourceSummary, VectorStore};
use crate::error::{ColloquyError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store. Records are kept in insertion order.
pub struct MemoryVectorStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Record>>> {
        self.records
            .read()
            .map_err(|e| ColloquyError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Record>>> {
        self.records
            .write()
            .map_err(|e| ColloquyError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn append(&self, records: &[Record]) -> Result<usize> {
        self.write()?.extend_from_slice(records);
        Ok(records.len())
    }

    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let records = self.read()?;
        let candidates = records
            .iter()
            .filter(|r| r.collection == collection)
            .cloned();
        Ok(rank(candidates, query_embedding, limit, min_score))
    }

    async fn collections(&self) -> Result<Vec<CollectionSummary>> {
        let records = self.read()?;
        let mut grouped: BTreeMap<&str, (usize, Vec<&str>)> = BTreeMap::new();
        for record in records.iter() {
            let entry = grouped.entry(record.collection.as_str()).or_default();
            entry.0 += 1;
            if !entry.1.contains(&record.source.as_str()) {
                entry.1.push(record.source.as_str());
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(name, (record_count, sources))| CollectionSummary {
                name: name.to_string(),
                record_count,
                source_count: sources.len(),
            })
            .collect())
    }

    async fn sources(&self, collection: &str) -> Result<Vec<SourceSummary>> {
        let records = self.read()?;
        let mut summaries: Vec<SourceSummary> = Vec::new();
        for record in records.iter().filter(|r| r.collection == collection) {
            match summaries.iter_mut().find(|s| s.source == record.source) {
                Some(summary) => {
                    summary.record_count += 1;
                    summary.indexed_at = summary.indexed_at.max(record.indexed_at);
                }
                None => summaries.push(SourceSummary {
                    collection: collection.to_string(),
                    source: record.source.clone(),
                    record_count: 1,
                    indexed_at: record.indexed_at,
                }),
            }
        }
        summaries.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        Ok(summaries)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self
            .read()?
            .iter()
            .filter(|r| r.collection == collection)
            .count())
    }

    async fn has_source(&self, collection: &str, source: &str) -> Result<bool> {
        Ok(self
            .read()?
            .iter()
            .any(|r| r.collection == collection && r.source == source))
    }

    async fn delete_source(&self, collection: &str, source: &str) -> Result<usize> {
        let mut records = self.write()?;
        let initial_len = records.len();
        records.retain(|r| !(r.collection == collection && r.source == source));
        Ok(initial_len - records.len())
    }

    async fn replace_source(
        &self,
        collection: &str,
        source: &str,
        records: &[Record],
    ) -> Result<(usize, usize)> {
        let mut stored = self.write()?;
        let initial_len = stored.len();
        stored.retain(|r| !(r.collection == collection && r.source == source));
        let deleted = initial_len - stored.len();
        stored.extend_from_slice(records);
        Ok((deleted, records.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::tests::record;

    #[tokio::test]
    async fn test_memory_store_collections_are_separate() {
        let store = MemoryVectorStore::new();
        store
            .append(&[
                record("resumes", "a.pdf", 0, vec![1.0, 0.0]),
                record("resumes", "b.pdf", 0, vec![0.0, 1.0]),
                record("papers", "c.pdf", 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.count("resumes").await.unwrap(), 2);
        assert_eq!(store.count("papers").await.unwrap(), 1);

        let results = store.search("papers", &[1.0, 0.0], 3, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.source, "c.pdf");

        let collections = store.collections().await.unwrap();
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].name, "papers");
        assert_eq!(collections[1].source_count, 2);
    }

    #[tokio::test]
    async fn test_memory_store_append_duplicates_and_delete() {
        let store = MemoryVectorStore::new();
        let batch = vec![
            record("c", "a.pdf", 0, vec![1.0, 0.0]),
            record("c", "a.pdf", 1, vec![0.5, 0.5]),
        ];
        store.append(&batch).await.unwrap();
        store.append(&batch).await.unwrap();

        assert_eq!(store.count("c").await.unwrap(), 4);
        let sources = store.sources("c").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].record_count, 4);

        assert!(store.has_source("c", "a.pdf").await.unwrap());
        assert_eq!(store.delete_source("c", "a.pdf").await.unwrap(), 4);
        assert!(!store.has_source("c", "a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_replace_source_keeps_other_sources() {
        let store = MemoryVectorStore::new();
        store
            .append(&[
                record("c", "a.pdf", 0, vec![1.0, 0.0]),
                record("c", "a.pdf", 1, vec![1.0, 0.0]),
                record("c", "b.pdf", 0, vec![0.0, 1.0]),
                record("other", "a.pdf", 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let (deleted, inserted) = store
            .replace_source("c", "a.pdf", &[record("c", "a.pdf", 0, vec![0.5, 0.5])])
            .await
            .unwrap();

        assert_eq!((deleted, inserted), (2, 1));
        assert_eq!(store.count("c").await.unwrap(), 2);
        assert_eq!(store.count("other").await.unwrap(), 1);
    }
}
