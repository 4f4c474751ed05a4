//! Internal knowledge retrieval for the Pharmos pipeline.
//!
//! The orchestration core consumes only the `setup` / `ingest` / `query`
//! contract; ranking internals are deliberately simple. The store is an
//! explicit service object constructed by the front-end and passed into the
//! dispatcher, never ambient process state.

mod store;

pub use store::{KnowledgeBase, MemoryKnowledgeBase, RetrievalError, NO_DOCUMENTS_MESSAGE};
