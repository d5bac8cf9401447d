//! The search engine: document store, forward and inverted indexes, query
//! parsing and TF-IDF ranking.
//!
//! Term text is interned once into a dictionary; both indexes refer to terms
//! by [`TermId`], and the inverted index is a dense vector addressed by it.

use crate::concurrent_map::ConcurrentMap;
use crate::error::{Result, SearchError};
use crate::index::{Document, DocumentId, DocumentStatus, ExecutionPolicy, TermId};
use crate::options::SearchOptions;
use crate::tokenizer::{is_valid_word, make_stop_words, split_into_words};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

#[derive(Debug)]
struct DocumentData {
    rating: i32,
    status: DocumentStatus,
    content: String,
}

#[derive(Debug, Default)]
struct Query<'q> {
    plus_words: Vec<&'q str>,
    minus_words: Vec<&'q str>,
}

struct QueryWord<'q> {
    text: &'q str,
    is_minus: bool,
    is_stop: bool,
}

pub struct SearchServer {
    options: SearchOptions,
    stop_words: BTreeSet<String>,
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    /// Indexed by term id. A term whose documents were all removed keeps an
    /// empty bucket and is treated as absent.
    word_to_document_freqs: Vec<BTreeMap<DocumentId, f64>>,
    document_to_word_freqs: HashMap<DocumentId, BTreeMap<TermId, f64>>,
    documents: HashMap<DocumentId, DocumentData>,
    document_ids: Vec<DocumentId>,
}

impl SearchServer {
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_options(stop_words, SearchOptions::default())
    }

    /// Builds an engine whose stop words are the space separated words of `text`.
    pub fn from_stop_words_text(text: &str) -> Result<Self> {
        Self::new(split_into_words(text))
    }

    pub fn with_options<I, S>(stop_words: I, options: SearchOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = make_stop_words(stop_words)?;
        Ok(Self {
            options: options.with_shard_count(options.shard_count),
            stop_words,
            dictionary: HashMap::new(),
            terms: Vec::new(),
            word_to_document_freqs: Vec::new(),
            document_to_word_freqs: HashMap::new(),
            documents: HashMap::new(),
            document_ids: Vec::new(),
        })
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn stop_words(&self) -> impl Iterator<Item = &str> + '_ {
        self.stop_words.iter().map(String::as_str)
    }

    pub fn add_document(
        &mut self,
        document_id: DocumentId,
        document: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if document_id < 0 {
            return Err(SearchError::InvalidDocumentId(document_id));
        }
        if self.documents.contains_key(&document_id) {
            return Err(SearchError::DuplicateDocumentId(document_id));
        }

        // Validation happens here, before anything is written.
        let words = self.split_into_words_no_stop(document)?;

        let inv_word_count = 1.0 / words.len() as f64;
        let mut word_freqs: BTreeMap<TermId, f64> = BTreeMap::new();
        for word in &words {
            let term = self.intern(word);
            *self.word_to_document_freqs[term as usize]
                .entry(document_id)
                .or_insert(0.0) += inv_word_count;
            *word_freqs.entry(term).or_insert(0.0) += inv_word_count;
        }

        self.document_to_word_freqs.insert(document_id, word_freqs);
        self.documents.insert(
            document_id,
            DocumentData {
                rating: compute_average_rating(ratings),
                status,
                content: document.to_owned(),
            },
        );
        self.document_ids.push(document_id);
        debug!(document_id, words = words.len(), ?status, "added document");
        Ok(())
    }

    /// Top documents with status [`DocumentStatus::Active`], sequentially.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Active)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_with_status(ExecutionPolicy::Sequential, raw_query, status)
    }

    pub fn find_top_documents_by<F>(&self, raw_query: &str, predicate: F) -> Result<Vec<Document>>
    where
        F: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, predicate)
    }

    pub fn find_top_documents_with_status(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_with(policy, raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    /// Ranks every document accepted by `predicate` against `raw_query`.
    ///
    /// Results are ordered by relevance, descending. Documents whose
    /// relevance differs by less than `relevance_epsilon` are ordered by
    /// rating, descending, then by id. At most `max_results` are returned.
    pub fn find_top_documents_with<F>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: F,
    ) -> Result<Vec<Document>>
    where
        F: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = self.parse_query(raw_query, true)?;
        let matched = self.find_all_documents(policy, &query, &predicate);
        let mut ranked = sort_by_relevance(matched, self.options.relevance_epsilon);
        ranked.truncate(self.options.max_results);
        Ok(ranked)
    }

    pub fn match_document(
        &self,
        raw_query: &str,
        document_id: DocumentId,
    ) -> Result<(Vec<&str>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, document_id)
    }

    /// Plus words of `raw_query` present in the document, sorted and
    /// deduplicated, together with the document status. The word list is
    /// empty when the document holds any minus word.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        document_id: DocumentId,
    ) -> Result<(Vec<&str>, DocumentStatus)> {
        let query = self.parse_query(raw_query, policy == ExecutionPolicy::Sequential)?;
        let status = self
            .documents
            .get(&document_id)
            .map(|data| data.status)
            .ok_or(SearchError::DocumentNotFound(document_id))?;

        match policy {
            ExecutionPolicy::Sequential => {
                if query
                    .minus_words
                    .iter()
                    .any(|word| self.document_term(word, document_id).is_some())
                {
                    return Ok((Vec::new(), status));
                }
                let matched = query
                    .plus_words
                    .iter()
                    .filter_map(|word| self.document_term(word, document_id))
                    .collect();
                Ok((matched, status))
            }
            ExecutionPolicy::Parallel => {
                if query
                    .minus_words
                    .par_iter()
                    .any(|word| self.document_term(word, document_id).is_some())
                {
                    return Ok((Vec::new(), status));
                }
                let mut matched: Vec<&str> = query
                    .plus_words
                    .par_iter()
                    .filter_map(|word| self.document_term(word, document_id))
                    .collect();
                matched.par_sort_unstable();
                matched.dedup();
                Ok((matched, status))
            }
        }
    }

    pub fn remove_document(&mut self, document_id: DocumentId) {
        self.remove_document_with(ExecutionPolicy::Sequential, document_id);
    }

    /// Removes the document from the store and both indexes. Unknown ids
    /// are ignored.
    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, document_id: DocumentId) {
        if self.documents.remove(&document_id).is_none() {
            debug!(document_id, "remove requested for unknown document");
            return;
        }
        // The forward entry is taken out first; the inverted cleanup below
        // only works from this owned copy.
        let word_freqs = self
            .document_to_word_freqs
            .remove(&document_id)
            .unwrap_or_default();

        match policy {
            ExecutionPolicy::Sequential => {
                for &term in word_freqs.keys() {
                    if let Some(bucket) = self.word_to_document_freqs.get_mut(term as usize) {
                        bucket.remove(&document_id);
                    }
                }
            }
            ExecutionPolicy::Parallel => {
                let buckets = select_disjoint_mut(
                    &mut self.word_to_document_freqs,
                    word_freqs.keys().map(|&term| term as usize),
                );
                buckets.into_par_iter().for_each(|bucket| {
                    bucket.remove(&document_id);
                });
            }
        }

        self.document_ids.retain(|&id| id != document_id);
        debug!(document_id, words = word_freqs.len(), ?policy, "removed document");
    }

    /// Term frequencies of a document; empty when the id is unknown.
    pub fn get_word_frequencies(&self, document_id: DocumentId) -> BTreeMap<&str, f64> {
        self.document_to_word_freqs
            .get(&document_id)
            .map(|freqs| {
                freqs
                    .iter()
                    .map(|(&term, &freq)| (self.terms[term as usize].as_str(), freq))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Live document ids in insertion order.
    pub fn document_ids(&self) -> std::iter::Copied<std::slice::Iter<'_, DocumentId>> {
        self.document_ids.iter().copied()
    }

    pub fn contains_document(&self, document_id: DocumentId) -> bool {
        self.documents.contains_key(&document_id)
    }

    pub fn document_text(&self, document_id: DocumentId) -> Option<&str> {
        self.documents.get(&document_id).map(|data| data.content.as_str())
    }

    pub fn document_status(&self, document_id: DocumentId) -> Option<DocumentStatus> {
        self.documents.get(&document_id).map(|data| data.status)
    }

    pub fn document_rating(&self, document_id: DocumentId) -> Option<i32> {
        self.documents.get(&document_id).map(|data| data.rating)
    }

    fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    fn split_into_words_no_stop<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_owned()));
            }
            if !self.is_stop_word(word) {
                words.push(word);
            }
        }
        Ok(words)
    }

    fn intern(&mut self, word: &str) -> TermId {
        if let Some(&term) = self.dictionary.get(word) {
            return term;
        }
        let term = self.terms.len() as TermId;
        self.dictionary.insert(word.to_owned(), term);
        self.terms.push(word.to_owned());
        self.word_to_document_freqs.push(BTreeMap::new());
        term
    }

    /// Documents holding `word`, or `None` if no live document does.
    fn postings(&self, word: &str) -> Option<&BTreeMap<DocumentId, f64>> {
        let term = *self.dictionary.get(word)?;
        self.word_to_document_freqs
            .get(term as usize)
            .filter(|bucket| !bucket.is_empty())
    }

    /// The interned text of `word` if the document holds it.
    fn document_term(&self, word: &str, document_id: DocumentId) -> Option<&str> {
        let term = *self.dictionary.get(word)?;
        self.word_to_document_freqs
            .get(term as usize)?
            .contains_key(&document_id)
            .then(|| self.terms[term as usize].as_str())
    }

    fn parse_query_word<'q>(&self, raw: &'q str) -> Result<QueryWord<'q>> {
        let (text, is_minus) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if text.is_empty() || text.starts_with('-') || !is_valid_word(text) {
            return Err(SearchError::InvalidQueryWord(raw.to_owned()));
        }
        Ok(QueryWord {
            text,
            is_minus,
            is_stop: self.is_stop_word(text),
        })
    }

    fn parse_query<'q>(&self, text: &'q str, dedup: bool) -> Result<Query<'q>> {
        let mut query = Query::default();
        for word in split_into_words(text) {
            let query_word = self.parse_query_word(word)?;
            if query_word.is_stop {
                continue;
            }
            if query_word.is_minus {
                query.minus_words.push(query_word.text);
            } else {
                query.plus_words.push(query_word.text);
            }
        }

        if dedup {
            query.plus_words.sort_unstable();
            query.plus_words.dedup();
            query.minus_words.sort_unstable();
            query.minus_words.dedup();
        }
        trace!(plus = ?query.plus_words, minus = ?query.minus_words, "parsed query");
        Ok(query)
    }

    fn inverse_document_freq(&self, documents_with_word: usize) -> f64 {
        (self.document_count() as f64 / documents_with_word as f64).ln()
    }

    fn accepts<F>(&self, document_id: DocumentId, predicate: &F) -> bool
    where
        F: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        self.documents
            .get(&document_id)
            .is_some_and(|data| predicate(document_id, data.status, data.rating))
    }

    fn find_all_documents<F>(
        &self,
        policy: ExecutionPolicy,
        query: &Query<'_>,
        predicate: &F,
    ) -> Vec<Document>
    where
        F: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let document_to_relevance = match policy {
            ExecutionPolicy::Sequential => self.relevance_sequential(query, predicate),
            ExecutionPolicy::Parallel => self.relevance_parallel(query, predicate),
        };

        document_to_relevance
            .into_iter()
            .filter_map(|(document_id, relevance)| {
                let rating = self.documents.get(&document_id)?.rating;
                Some(Document::new(document_id, relevance, rating))
            })
            .collect()
    }

    fn relevance_sequential<F>(&self, query: &Query<'_>, predicate: &F) -> BTreeMap<DocumentId, f64>
    where
        F: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let mut document_to_relevance: BTreeMap<DocumentId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.postings(word) else {
                continue;
            };
            let inverse_document_freq = self.inverse_document_freq(postings.len());
            for (&document_id, &term_freq) in postings {
                if self.accepts(document_id, predicate) {
                    *document_to_relevance.entry(document_id).or_insert(0.0) +=
                        term_freq * inverse_document_freq;
                }
            }
        }

        for word in &query.minus_words {
            let Some(postings) = self.postings(word) else {
                continue;
            };
            for document_id in postings.keys() {
                document_to_relevance.remove(document_id);
            }
        }
        document_to_relevance
    }

    fn relevance_parallel<F>(&self, query: &Query<'_>, predicate: &F) -> BTreeMap<DocumentId, f64>
    where
        F: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let document_to_relevance: ConcurrentMap<DocumentId, f64> =
            ConcurrentMap::new(self.options.shard_count);

        query.plus_words.par_iter().for_each(|word| {
            let Some(postings) = self.postings(word) else {
                return;
            };
            let inverse_document_freq = self.inverse_document_freq(postings.len());
            for (&document_id, &term_freq) in postings {
                if self.accepts(document_id, predicate) {
                    *document_to_relevance.access(document_id) += term_freq * inverse_document_freq;
                }
            }
        });

        let excluded: HashSet<DocumentId> = query
            .minus_words
            .par_iter()
            .filter_map(|word| self.postings(word))
            .flat_map_iter(|postings| postings.keys().copied())
            .collect();

        let mut merged = document_to_relevance.drain_to_map();
        merged.retain(|document_id, _| !excluded.contains(document_id));
        merged
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocumentId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, DocumentId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.document_ids()
    }
}

/// Truncating integer mean; zero for no ratings.
pub fn compute_average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    (sum / ratings.len() as i64) as i32
}

/// Orders by relevance descending. Runs of documents within `epsilon` of the
/// first document of the run are reordered by rating descending, then id.
pub fn sort_by_relevance(mut documents: Vec<Document>, epsilon: f64) -> Vec<Document> {
    documents.sort_by(|lhs, rhs| {
        rhs.relevance
            .total_cmp(&lhs.relevance)
            .then_with(|| lhs.id.cmp(&rhs.id))
    });

    let mut start = 0;
    while start < documents.len() {
        let head = documents[start].relevance;
        let end = documents[start..]
            .iter()
            .position(|doc| (head - doc.relevance).abs() >= epsilon)
            .map_or(documents.len(), |offset| start + offset);
        documents[start..end].sort_by(|lhs, rhs| {
            rhs.rating.cmp(&lhs.rating).then_with(|| lhs.id.cmp(&rhs.id))
        });
        start = end;
    }
    documents
}

/// Mutable references to the elements at `indices`, which must be strictly
/// increasing. Indices out of order or out of bounds are skipped.
fn select_disjoint_mut<T>(slice: &mut [T], indices: impl IntoIterator<Item = usize>) -> Vec<&mut T> {
    let mut selected = Vec::new();
    let mut rest = slice;
    let mut offset = 0;
    for index in indices {
        let Some(skip) = index.checked_sub(offset) else {
            continue;
        };
        if skip >= rest.len() {
            break;
        }
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip);
        let Some((item, tail)) = tail.split_first_mut() else {
            break;
        };
        selected.push(item);
        rest = tail;
        offset = index + 1;
    }
    selected
}
