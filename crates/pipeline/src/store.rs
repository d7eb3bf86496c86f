//! Vector store client.
//!
//! The store holds pre-chunked, pre-embedded document passages grouped
//! into named collections; the pipeline only reads from it. The SQLite
//! implementation keeps embeddings as f32 little-endian BLOBs and scores
//! candidates with a cosine-similarity scan. Scans run under
//! `spawn_blocking` so an async worker is never pinned on I/O.

use std::path::Path;
use std::sync::{Arc, Mutex};

use aeroqa_core::{QaError, QaResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// A passage as persisted in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Stable document identifier
    pub id: String,

    /// Passage text
    pub content: String,

    /// Open metadata mapping (page, source, and anything else upstream
    /// ingestion attached)
    pub metadata: serde_json::Value,
}

/// Trait for vector store backends.
///
/// `similarity_search` returns candidates ordered by descending
/// similarity; ties keep the store's insertion order.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Nearest-neighbor search against the store's collection.
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> QaResult<Vec<(StoredDocument, f32)>>;

    /// Check that the store is reachable and the collection exists.
    async fn ping(&self) -> QaResult<()>;
}

/// SQLite-backed vector store bound to one named collection.
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

impl SqliteVectorStore {
    /// Open (or create) the store database and bind to a collection.
    ///
    /// Opening does not register the collection; reads against a
    /// collection nothing ever seeded fail with `RetrievalFailure`.
    pub fn open(db_path: &Path, collection: impl Into<String>) -> QaResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    QaError::RetrievalFailure(format!("Failed to create store directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| {
            QaError::RetrievalFailure(format!("Failed to open vector store: {}", e))
        })?;

        Self::from_connection(conn, collection)
    }

    /// Open an in-memory store (tests and ephemeral tooling).
    pub fn open_in_memory(collection: impl Into<String>) -> QaResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            QaError::RetrievalFailure(format!("Failed to open in-memory store: {}", e))
        })?;
        Self::from_connection(conn, collection)
    }

    fn from_connection(conn: Connection, collection: impl Into<String>) -> QaResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT,
                FOREIGN KEY (collection) REFERENCES collections(name)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            "#,
        )
        .map_err(|e| QaError::RetrievalFailure(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.into(),
        })
    }

    /// The collection this handle reads from.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Register the bound collection so reads and writes are accepted.
    pub fn ensure_collection(&self) -> QaResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO collections (name) VALUES (?1)",
            params![self.collection],
        )
        .map_err(|e| QaError::RetrievalFailure(format!("Failed to register collection: {}", e)))?;
        Ok(())
    }

    /// Insert or replace a document with its embedding.
    ///
    /// This is the seeding surface; corpus ingestion itself happens
    /// upstream of this service.
    pub fn upsert_document(&self, document: &StoredDocument, embedding: &[f32]) -> QaResult<()> {
        let metadata_json = serde_json::to_string(&document.metadata)?;
        let embedding_bytes = embedding_to_bytes(embedding);

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO documents (id, collection, content, embedding, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                document.id,
                self.collection,
                document.content,
                embedding_bytes,
                metadata_json,
            ],
        )
        .map_err(|e| QaError::RetrievalFailure(format!("Failed to insert document: {}", e)))?;

        Ok(())
    }

    /// Number of documents in the bound collection.
    pub fn document_count(&self) -> QaResult<u64> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![self.collection],
            |row| row.get::<_, i64>(0).map(|v| v as u64),
        )
        .map_err(|e| QaError::RetrievalFailure(format!("Failed to count documents: {}", e)))
    }

    fn lock(&self) -> QaResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| QaError::RetrievalFailure("Vector store lock poisoned".to_string()))
    }

    /// Blocking similarity scan; runs inside `spawn_blocking`.
    fn search_blocking(
        conn: &Connection,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> QaResult<Vec<(StoredDocument, f32)>> {
        let collection_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM collections WHERE name = ?1)",
                params![collection],
                |row| row.get(0),
            )
            .map_err(|e| QaError::RetrievalFailure(format!("Failed to check collection: {}", e)))?;

        if !collection_exists {
            return Err(QaError::RetrievalFailure(format!(
                "Collection '{}' does not exist",
                collection
            )));
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, content, embedding, metadata FROM documents
                 WHERE collection = ?1 ORDER BY rowid",
            )
            .map_err(|e| QaError::RetrievalFailure(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![collection], |row| {
                let embedding_bytes: Vec<u8> = row.get(2)?;
                let metadata_json: Option<String> = row.get(3)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    embedding_bytes,
                    metadata_json,
                ))
            })
            .map_err(|e| QaError::RetrievalFailure(format!("Failed to query documents: {}", e)))?;

        let mut results: Vec<(StoredDocument, f32)> = Vec::new();
        for row in rows {
            let (id, content, embedding_bytes, metadata_json) = row.map_err(|e| {
                QaError::RetrievalFailure(format!("Failed to read document row: {}", e))
            })?;

            let embedding = bytes_to_embedding(&embedding_bytes)?;
            let metadata = match metadata_json {
                Some(json) => serde_json::from_str(&json)?,
                None => serde_json::Value::Object(Default::default()),
            };

            let score = cosine_similarity(query_embedding, &embedding);
            results.push((StoredDocument { id, content, metadata }, score));
        }

        // Stable sort keeps insertion order for equal scores
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        tracing::debug!(
            "Similarity search returned {} candidates (limit {})",
            results.len(),
            limit
        );

        Ok(results)
    }
}

#[async_trait::async_trait]
impl VectorStore for SqliteVectorStore {
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> QaResult<Vec<(StoredDocument, f32)>> {
        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();
        let embedding = query_embedding.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| QaError::RetrievalFailure("Vector store lock poisoned".to_string()))?;
            Self::search_blocking(&conn, &collection, &embedding, limit)
        })
        .await
        .map_err(|e| QaError::RetrievalFailure(format!("Store task failed: {}", e)))?
    }

    async fn ping(&self) -> QaResult<()> {
        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| QaError::RetrievalFailure("Vector store lock poisoned".to_string()))?;
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM collections WHERE name = ?1)",
                    params![collection],
                    |row| row.get(0),
                )
                .map_err(|e| QaError::RetrievalFailure(format!("Store probe failed: {}", e)))?;
            if !exists {
                return Err(QaError::RetrievalFailure(format!(
                    "Collection '{}' does not exist",
                    collection
                )));
            }
            Ok(())
        })
        .await
        .map_err(|e| QaError::RetrievalFailure(format!("Store task failed: {}", e)))?
    }
}

/// Cosine similarity clamped to [0, 1].
///
/// Embeddings are unit-normalized upstream; negative cosine means
/// "not similar at all" for ranking purposes, so it clamps to zero
/// rather than leaking negative scores into the response.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Convert an embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert stored bytes back into an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> QaResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(QaError::RetrievalFailure(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, content: &str, metadata: serde_json::Value) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            content: content.to_string(),
            metadata,
        }
    }

    fn seeded_store() -> SqliteVectorStore {
        let store = SqliteVectorStore::open_in_memory("airline_docs").unwrap();
        store.ensure_collection().unwrap();

        // Hand-crafted unit vectors give exact cosine scores against
        // the query [1, 0, 0, 0].
        store
            .upsert_document(
                &doc("a", "emergency exits", serde_json::json!({"page": 1})),
                &[1.0, 0.0, 0.0, 0.0],
            )
            .unwrap();
        store
            .upsert_document(
                &doc("b", "crew rest rules", serde_json::json!({"page": 2})),
                &[0.8, 0.6, 0.0, 0.0],
            )
            .unwrap();
        store
            .upsert_document(
                &doc("c", "catering standards", serde_json::json!({})),
                &[0.0, 1.0, 0.0, 0.0],
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_search_orders_by_descending_score() {
        let store = seeded_store();
        let results = store
            .similarity_search(&[1.0, 0.0, 0.0, 0.0], 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.id, "a");
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0.id, "b");
        assert!((results[1].1 - 0.8).abs() < 1e-6);
        assert_eq!(results[2].0.id, "c");
        assert!(results[2].1.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let store = seeded_store();
        let results = store
            .similarity_search(&[1.0, 0.0, 0.0, 0.0], 2)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = SqliteVectorStore::open_in_memory("ties").unwrap();
        store.ensure_collection().unwrap();
        store
            .upsert_document(&doc("first", "x", serde_json::json!({})), &[0.0, 1.0])
            .unwrap();
        store
            .upsert_document(&doc("second", "y", serde_json::json!({})), &[0.0, 1.0])
            .unwrap();

        let results = store.similarity_search(&[0.0, 1.0], 10).await.unwrap();
        assert_eq!(results[0].0.id, "first");
        assert_eq!(results[1].0.id, "second");
    }

    #[tokio::test]
    async fn test_missing_collection_is_a_failure() {
        let store = SqliteVectorStore::open_in_memory("never_seeded").unwrap();
        let err = store.similarity_search(&[1.0, 0.0], 5).await.unwrap_err();
        assert_eq!(err.kind(), "retrieval_failure");

        let err = store.ping().await.unwrap_err();
        assert_eq!(err.kind(), "retrieval_failure");
    }

    #[tokio::test]
    async fn test_ping_after_seeding() {
        let store = seeded_store();
        assert!(store.ping().await.is_ok());
        assert_eq!(store.document_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_file_backed_store_persists_across_handles() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        let store = SqliteVectorStore::open(temp_file.path(), "airline_docs").unwrap();
        store.ensure_collection().unwrap();
        store
            .upsert_document(
                &doc("a", "emergency exits", serde_json::json!({"page": 1})),
                &[1.0, 0.0],
            )
            .unwrap();
        drop(store);

        let reopened = SqliteVectorStore::open(temp_file.path(), "airline_docs").unwrap();
        let results = reopened.similarity_search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "a");
    }

    #[test]
    fn test_embedding_roundtrip() {
        let embedding = vec![0.25f32, -1.5, 3.75, 0.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);
    }

    #[test]
    fn test_invalid_embedding_bytes() {
        assert!(bytes_to_embedding(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_cosine_similarity_clamps_negative() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
