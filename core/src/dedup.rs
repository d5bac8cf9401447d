use crate::index::DocumentId;
use crate::server::SearchServer;
use std::collections::{BTreeSet, HashSet};
use tracing::info;

/// Removes documents whose set of distinct words equals that of a document
/// with a lower id. Returns the removed ids in ascending order.
///
/// Must not run concurrently with other mutations of `server`.
pub fn remove_duplicates(server: &mut SearchServer) -> Vec<DocumentId> {
    let mut document_ids: Vec<DocumentId> = server.document_ids().collect();
    document_ids.sort_unstable();

    let mut duplicates = Vec::new();
    {
        let mut seen: HashSet<BTreeSet<&str>> = HashSet::new();
        for &document_id in &document_ids {
            let words: BTreeSet<&str> = server.get_word_frequencies(document_id).into_keys().collect();
            if !seen.insert(words) {
                duplicates.push(document_id);
            }
        }
    }

    for &document_id in &duplicates {
        info!(document_id, "found duplicate document");
        server.remove_document(document_id);
    }
    duplicates
}
