//! Flat vector store
//!
//! Holds chunk embeddings and their metadata as two position-aligned
//! sequences, persists them to a pair of sibling artifacts, and answers
//! nearest-neighbor queries by exact cosine similarity (dot product over
//! unit-normalized vectors). Rebuilds replace the index wholesale; there is
//! no incremental update.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ChunkingConfig;
use crate::embedding::{l2_normalize, EmbeddingError, EmbeddingProvider};
use crate::loader::{load_documents, Chunk};

/// Raw little-endian f32 rows, shape (N, dimension)
const EMBEDDINGS_FILE: &str = "embeddings.f32";
/// JSON array of {path, page, text}, one object per row
const META_FILE: &str = "meta.json";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    #[error("Index metadata error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    #[error("Corrupt embeddings artifact: {0}")]
    Corrupt(String),

    #[error("Index artifacts misaligned: {rows} embedding rows vs {entries} metadata entries")]
    Misaligned { rows: usize, entries: usize },

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// A chunk returned from search, augmented with its cosine similarity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub path: PathBuf,
    pub page: Option<u32>,
    pub text: String,
    pub score: f32,
}

/// Flat vector index over document chunks
///
/// Invariant: `embeddings.len() == meta.len()`, every stored vector is unit
/// L2 norm, and position `i` of both sequences refers to the same chunk.
pub struct VectorStore {
    index_dir: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    embeddings: Vec<Vec<f32>>,
    meta: Vec<Chunk>,
}

impl VectorStore {
    /// Open a store rooted at `index_dir`, loading persisted artifacts if
    /// both are present, otherwise starting empty.
    pub fn open(
        index_dir: impl Into<PathBuf>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, IndexError> {
        let index_dir = index_dir.into();
        std::fs::create_dir_all(&index_dir).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to create index directory: {:?}", index_dir),
        })?;

        let mut store = Self {
            index_dir,
            embedder,
            embeddings: Vec::new(),
            meta: Vec::new(),
        };
        store.reload()?;
        Ok(store)
    }

    fn embeddings_path(&self) -> PathBuf {
        self.index_dir.join(EMBEDDINGS_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.index_dir.join(META_FILE)
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// Re-derive the full index from the documents under `src_dir`, replace
    /// the in-memory state, and persist it. An empty document set produces a
    /// valid, empty, persisted index.
    pub fn rebuild(&mut self, src_dir: &Path, chunking: &ChunkingConfig) -> Result<usize, IndexError> {
        let chunks = load_documents(src_dir, chunking);

        let mut embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            self.embedder.embed_batch(&texts)?
        };
        for vector in &mut embeddings {
            l2_normalize(vector);
        }

        self.embeddings = embeddings;
        self.meta = chunks;
        self.persist()?;

        tracing::info!(
            "Rebuilt index: {} chunks from {:?} persisted to {:?}",
            self.meta.len(),
            src_dir,
            self.index_dir
        );
        Ok(self.meta.len())
    }

    /// Discard in-memory state and reload from the persisted artifacts if
    /// both exist, else initialize empty.
    pub fn reload(&mut self) -> Result<(), IndexError> {
        let emb_path = self.embeddings_path();
        let meta_path = self.meta_path();

        if !emb_path.exists() || !meta_path.exists() {
            self.embeddings = Vec::new();
            self.meta = Vec::new();
            return Ok(());
        }

        let meta_raw = std::fs::read_to_string(&meta_path).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to read metadata: {:?}", meta_path),
        })?;
        let meta: Vec<Chunk> = serde_json::from_str(&meta_raw).map_err(|e| IndexError::Json {
            source: e,
            context: format!("Failed to parse metadata: {:?}", meta_path),
        })?;

        let embeddings = self.read_embeddings(&emb_path)?;

        // Never trust either artifact until both agree on N
        if embeddings.len() != meta.len() {
            return Err(IndexError::Misaligned {
                rows: embeddings.len(),
                entries: meta.len(),
            });
        }

        self.embeddings = embeddings;
        self.meta = meta;
        Ok(())
    }

    fn read_embeddings(&self, path: &Path) -> Result<Vec<Vec<f32>>, IndexError> {
        let bytes = std::fs::read(path).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to read embeddings: {:?}", path),
        })?;

        let dimension = self.embedder.dimension();
        let row_bytes = dimension * 4;
        if row_bytes == 0 || bytes.len() % row_bytes != 0 {
            return Err(IndexError::Corrupt(format!(
                "{:?} holds {} bytes, not a multiple of {} ({}D f32 rows)",
                path,
                bytes.len(),
                row_bytes,
                dimension
            )));
        }

        let rows = bytes.len() / row_bytes;
        let mut embeddings = Vec::with_capacity(rows);
        for row in bytes.chunks_exact(row_bytes) {
            let vector: Vec<f32> = row
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            embeddings.push(vector);
        }
        Ok(embeddings)
    }

    /// Write both artifacts, replacing any previous index on disk
    fn persist(&self) -> Result<(), IndexError> {
        std::fs::create_dir_all(&self.index_dir).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to create index directory: {:?}", self.index_dir),
        })?;

        let dimension = self.embedder.dimension();
        let mut bytes = Vec::with_capacity(self.embeddings.len() * dimension * 4);
        for vector in &self.embeddings {
            for value in vector {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        let emb_path = self.embeddings_path();
        std::fs::write(&emb_path, bytes).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to write embeddings: {:?}", emb_path),
        })?;

        let meta_path = self.meta_path();
        let meta_json = serde_json::to_string_pretty(&self.meta).map_err(|e| IndexError::Json {
            source: e,
            context: "Failed to serialize metadata".to_string(),
        })?;
        std::fs::write(&meta_path, meta_json).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to write metadata: {:?}", meta_path),
        })?;

        Ok(())
    }

    /// Exact nearest-neighbor search by cosine similarity
    ///
    /// Returns up to `top_k` chunks in descending score order; ties keep the
    /// original insertion order. An empty index returns an empty list. Pure
    /// read: never mutates the index.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<Source>, IndexError> {
        if self.embeddings.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut query_vector = self.embedder.embed(query)?;
        l2_normalize(&mut query_vector);

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let dot: f32 = row.iter().zip(&query_vector).map(|(a, b)| a * b).sum();
                (i, dot)
            })
            .collect();
        // sort_by is stable, so equal scores preserve insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let chunk = &self.meta[i];
                Source {
                    path: chunk.path.clone(),
                    page: chunk.page,
                    text: chunk.text.clone(),
                    score,
                }
            })
            .collect())
    }

    /// Read-only view of the indexed metadata (test and diagnostics hook)
    pub fn metadata(&self) -> &[Chunk] {
        &self.meta
    }

    /// Read-only view of the stored vectors (test and diagnostics hook)
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.embeddings
    }
}
