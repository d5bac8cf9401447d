use crate::error::Result;
use crate::index::{Document, DocumentId, DocumentStatus};
use crate::server::SearchServer;
use std::collections::VecDeque;

/// Requests kept in the window: one day of one-per-minute requests.
pub const MIN_IN_DAY: usize = 1440;

/// Runs queries against a server and counts how many of the most recent
/// [`MIN_IN_DAY`] requests came back empty.
pub struct RequestQueue<'a> {
    server: &'a SearchServer,
    requests: VecDeque<bool>, // true when the result was empty
    no_result_requests: usize,
    window: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(server: &'a SearchServer) -> Self {
        Self::with_window(server, MIN_IN_DAY)
    }

    pub fn with_window(server: &'a SearchServer, window: usize) -> Self {
        Self {
            server,
            requests: VecDeque::with_capacity(window),
            no_result_requests: 0,
            window: window.max(1),
        }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by_status(raw_query, DocumentStatus::Active)
    }

    pub fn add_find_request_by_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.add_find_request_by(raw_query, move |_, document_status, _| document_status == status)
    }

    pub fn add_find_request_by<F>(&mut self, raw_query: &str, predicate: F) -> Result<Vec<Document>>
    where
        F: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let result = self.server.find_top_documents_by(raw_query, predicate)?;
        self.record(result.is_empty());
        Ok(result)
    }

    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    fn record(&mut self, empty: bool) {
        if self.requests.len() == self.window && self.requests.pop_front() == Some(true) {
            self.no_result_requests -= 1;
        }
        self.requests.push_back(empty);
        if empty {
            self.no_result_requests += 1;
        }
    }
}
