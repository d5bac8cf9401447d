use search_core::{
    process_queries, process_queries_joined, remove_duplicates, DocumentStatus, RequestQueue,
    SearchError, SearchServer,
};

fn server() -> SearchServer {
    let mut server = SearchServer::new(["and", "with"]).unwrap();
    let docs = [
        "funny pet and nasty rat",
        "funny pet with curly hair",
        "funny pet and not very nasty rat",
        "pet with rat and rat and rat",
        "nasty rat with curly hair",
    ];
    for (id, text) in docs.iter().enumerate() {
        server
            .add_document(id as i32 + 1, text, DocumentStatus::Active, &[1, 2])
            .unwrap();
    }
    server
}

#[test]
fn process_queries_preserves_query_order() {
    let server = server();
    let queries = ["nasty rat -not", "not very funny nasty pet", "curly hair"];
    let results = process_queries(&server, &queries).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].len(), 3);
    assert_eq!(results[1].len(), 5);
    assert_eq!(results[2].len(), 2);
    for (query, result) in queries.iter().zip(&results) {
        let expected = server.find_top_documents(query).unwrap();
        assert_eq!(
            result.iter().map(|d| d.id).collect::<Vec<_>>(),
            expected.iter().map(|d| d.id).collect::<Vec<_>>()
        );
        for (got, want) in result.iter().zip(&expected) {
            assert!((got.relevance - want.relevance).abs() < 1e-6);
        }
    }
}

#[test]
fn joined_results_keep_per_query_grouping() {
    let mut server = SearchServer::new(["the"]).unwrap();
    server.add_document(0, "the cat", DocumentStatus::Active, &[]).unwrap();
    server.add_document(1, "the dog", DocumentStatus::Active, &[]).unwrap();

    let queries = vec!["cat".to_string(), "dog".to_string()];
    let joined = process_queries_joined(&server, &queries).unwrap();
    assert_eq!(joined.iter().map(|d| d.id).collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn empty_batch_yields_nothing() {
    let server = server();
    let queries: [&str; 0] = [];
    assert!(process_queries(&server, &queries).unwrap().is_empty());
    assert!(process_queries_joined(&server, &queries).unwrap().is_empty());
}

#[test]
fn malformed_query_fails_the_batch() {
    let server = server();
    let result = process_queries(&server, &["curly", "--hair"]);
    assert!(matches!(result, Err(SearchError::InvalidQueryWord(_))));
}

#[test]
fn duplicates_with_same_word_set_are_removed() {
    let mut server = SearchServer::new(["and"]).unwrap();
    server.add_document(0, "a b", DocumentStatus::Active, &[]).unwrap();
    server.add_document(1, "b a", DocumentStatus::Active, &[]).unwrap();
    server.add_document(2, "a b c", DocumentStatus::Active, &[]).unwrap();

    assert_eq!(remove_duplicates(&mut server), vec![1]);
    assert_eq!(server.document_ids().collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn request_queue_counts_over_server() {
    let server = server();
    let mut queue = RequestQueue::new(&server);
    queue.add_find_request("curly hair").unwrap();
    queue.add_find_request("sparrow").unwrap();
    queue
        .add_find_request_by("rat", |id, _, _| id > 100)
        .unwrap();
    assert_eq!(queue.no_result_requests(), 2);
}
