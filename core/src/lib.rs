//! In-memory full-text search with TF-IDF ranking.
//!
//! Documents are split into words, interned into term ids and recorded in a
//! forward index (document -> term frequencies) and an inverted index
//! (term -> document frequencies). Queries are ranked by TF-IDF relevance and
//! support minus terms that exclude any document containing them.
//!
//! Every read and removal operation comes in a sequential and a parallel
//! flavour selected by [`ExecutionPolicy`]; both produce the same results.

pub mod concurrent_map;
pub mod dedup;
pub mod duration;
pub mod error;
pub mod index;
pub mod options;
pub mod process_queries;
pub mod request_queue;
pub mod server;
pub mod tokenizer;

pub use concurrent_map::{Access, ConcurrentMap, ShardKey};
pub use dedup::remove_duplicates;
pub use duration::LogDuration;
pub use error::{Result, SearchError};
pub use index::{Document, DocumentId, DocumentStatus, ExecutionPolicy, TermId};
pub use options::SearchOptions;
pub use process_queries::{process_queries, process_queries_joined};
pub use request_queue::RequestQueue;
pub use server::SearchServer;
