use crate::index::DocumentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid document id {0}: ids must be non-negative")]
    InvalidDocumentId(DocumentId),

    #[error("document id {0} is already present")]
    DuplicateDocumentId(DocumentId),

    #[error("word {0:?} contains control characters")]
    InvalidWord(String),

    #[error("query word {0:?} is invalid")]
    InvalidQueryWord(String),

    #[error("stop word {0:?} is invalid")]
    InvalidStopWord(String),

    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    #[error("invalid search options: {0}")]
    Options(#[from] serde_json::Error),
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
