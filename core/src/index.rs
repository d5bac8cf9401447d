use serde::{Deserialize, Serialize};
use std::fmt;

pub type DocumentId = i32;
pub type TermId = u32;

/// Lifecycle state attached to every stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Active,
    Irrelevant,
    Banned,
    Removed,
}

/// Selects how a read or removal is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    /// Work items (query terms, document terms) are spread over the rayon pool.
    Parallel,
}

/// A ranked search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub relevance: f64, // summed tf * idf over matched plus terms
    pub rating: i32,
}

impl Document {
    pub fn new(id: DocumentId, relevance: f64, rating: i32) -> Self {
        Self { id, relevance, rating }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ document_id = {}, relevance = {}, rating = {} }}",
            self.id, self.relevance, self.rating
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_display_matches_listing_format() {
        let doc = Document::new(3, 0.5, -2);
        assert_eq!(doc.to_string(), "{ document_id = 3, relevance = 0.5, rating = -2 }");
    }

    #[test]
    fn status_uses_lowercase_names() {
        let json = serde_json::to_string(&DocumentStatus::Banned).unwrap();
        assert_eq!(json, "\"banned\"");
        let parsed: DocumentStatus = serde_json::from_str("\"irrelevant\"").unwrap();
        assert_eq!(parsed, DocumentStatus::Irrelevant);
    }
}
