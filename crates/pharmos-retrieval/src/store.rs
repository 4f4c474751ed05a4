//! Document store and retrieval contract

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

/// Sentinel returned by `query` when nothing has been ingested. This is an
/// informative result, not an error.
pub const NO_DOCUMENTS_MESSAGE: &str = "No internal documents uploaded.";

const TOP_K: usize = 3;
const MIN_TOKEN_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to read document {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document {0} contains no ingestible text")]
    EmptyDocument(String),
}

/// Contract consumed by the orchestration core.
///
/// `setup` and `ingest` are invoked by the front-end/bootstrap layer; the
/// dispatcher calls only `query`.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Idempotent; safe to call once before any ingest/query.
    async fn setup(&self) -> Result<(), RetrievalError>;

    /// Ingest one document, returning the number of chunks indexed.
    async fn ingest(&self, path: &Path) -> Result<usize, RetrievalError>;

    /// Retrieve passages relevant to `text`. Returns the no-documents
    /// sentinel when no index exists rather than failing.
    async fn query(&self, text: &str) -> String;
}

/// In-memory keyword-overlap index over paragraph chunks.
pub struct MemoryKnowledgeBase {
    chunks: RwLock<Vec<String>>,
}

impl MemoryKnowledgeBase {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Index raw text directly, bypassing the filesystem. Used by tests and
    /// by callers that already hold document content.
    pub async fn ingest_text(&self, text: &str) -> usize {
        let new_chunks = split_chunks(text);
        let count = new_chunks.len();
        self.chunks.write().await.extend(new_chunks);
        count
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

impl Default for MemoryKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeBase for MemoryKnowledgeBase {
    async fn setup(&self) -> Result<(), RetrievalError> {
        // Nothing to provision for the in-memory store.
        Ok(())
    }

    async fn ingest(&self, path: &Path) -> Result<usize, RetrievalError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RetrievalError::Read {
                path: path.display().to_string(),
                source,
            })?;

        let count = self.ingest_text(&content).await;
        if count == 0 {
            return Err(RetrievalError::EmptyDocument(path.display().to_string()));
        }

        tracing::info!(path = %path.display(), chunks = count, "document ingested");
        Ok(count)
    }

    async fn query(&self, text: &str) -> String {
        let chunks = self.chunks.read().await;
        if chunks.is_empty() {
            return NO_DOCUMENTS_MESSAGE.to_string();
        }

        let query_tokens = tokenize(text);
        let mut scored: Vec<(usize, &String)> = chunks
            .iter()
            .map(|chunk| (overlap_score(&query_tokens, chunk), chunk))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if scored.is_empty() {
            // Fall back to the leading chunks so the caller still sees what
            // the documents contain.
            return chunks
                .iter()
                .take(TOP_K)
                .cloned()
                .collect::<Vec<_>>()
                .join("\n");
        }

        scored
            .into_iter()
            .take(TOP_K)
            .map(|(_, chunk)| chunk.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn split_chunks(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(|t| t.to_lowercase())
        .collect()
}

fn overlap_score(query_tokens: &[String], chunk: &str) -> usize {
    let chunk_tokens: std::collections::HashSet<String> =
        tokenize(chunk).into_iter().collect();
    query_tokens
        .iter()
        .filter(|t| chunk_tokens.contains(*t))
        .count()
}
