mod common;

use common::{closed_port, StubServer};
use ir_ingest::upload::{Document, HttpBackend, NewCorpus, NewDataset, QRel, Query};
use ir_ingest_core::contract::Backend;
use serde_json::json;

fn local_backend(server: &StubServer) -> HttpBackend {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpBackend::with_client(client, server.base_url())
}

#[tokio::test]
async fn test_create_corpus_posts_name_and_language() {
    let server = StubServer::start(200);
    let client = local_backend(&server);

    client
        .create_corpus(NewCorpus {
            name: "msmarco",
            language: "English",
        })
        .await
        .expect("create_corpus should succeed");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/create_corpus");
    assert!(requests[0].query.is_empty());
    assert_eq!(
        requests[0].body,
        json!({"name": "msmarco", "language": "English"})
    );
}

#[tokio::test]
async fn test_add_documents_sends_array_with_corpus_param() {
    let server = StubServer::start(200);
    let client = local_backend(&server);
    let docs = vec![
        Document {
            id: "d1".into(),
            title: Some("First".into()),
            text: "one".into(),
        },
        Document {
            id: "d2".into(),
            title: None,
            text: "two".into(),
        },
    ];

    client.add_documents("msmarco", &docs).await.unwrap();

    let req = &server.requests()[0];
    assert_eq!(req.path, "/add_documents");
    assert_eq!(req.param("corpus_name"), Some("msmarco"));
    assert_eq!(
        req.body,
        json!([
            {"id": "d1", "title": "First", "text": "one"},
            {"id": "d2", "title": null, "text": "two"}
        ])
    );
}

#[tokio::test]
async fn test_dataset_queries_and_qrels_requests() {
    let server = StubServer::start(200);
    let client = local_backend(&server);

    client
        .create_dataset(NewDataset {
            name: "dev",
            corpus_name: "msmarco",
            min_relevance: 2,
        })
        .await
        .unwrap();
    client
        .add_queries(
            "msmarco",
            "dev",
            &[Query {
                id: "q1".into(),
                text: "what".into(),
                description: None,
            }],
        )
        .await
        .unwrap();
    client
        .add_qrels(
            "msmarco",
            "dev",
            &[QRel {
                query_id: "q1".into(),
                document_id: "d1".into(),
                relevance: 0,
            }],
        )
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(
        server.paths(),
        vec!["/create_dataset", "/add_queries", "/add_qrels"]
    );
    assert_eq!(
        requests[0].body,
        json!({"name": "dev", "corpus_name": "msmarco", "min_relevance": 2})
    );
    for req in &requests[1..] {
        assert_eq!(req.param("corpus_name"), Some("msmarco"));
        assert_eq!(req.param("dataset_name"), Some("dev"));
    }
    assert_eq!(
        requests[1].body,
        json!([{"id": "q1", "text": "what", "description": null}])
    );
    assert_eq!(
        requests[2].body,
        json!([{"query_id": "q1", "document_id": "d1", "relevance": 0}])
    );
}

#[tokio::test]
async fn test_error_status_is_not_a_failure() {
    let server = StubServer::start(409);
    let client = local_backend(&server);

    let result = client
        .create_corpus(NewCorpus {
            name: "exists",
            language: "English",
        })
        .await;

    assert!(
        result.is_ok(),
        "response status must not be inspected: {:?}",
        result.err()
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_an_error() {
    let client = HttpBackend::with_client(
        reqwest::Client::builder().no_proxy().build().unwrap(),
        format!("http://127.0.0.1:{}", closed_port()),
    );

    let result = client.add_documents("msmarco", &[]).await;

    assert!(result.is_err(), "connection refused should surface as an error");
}

#[tokio::test]
async fn test_reserved_characters_in_names_are_encoded() {
    let server = StubServer::start(200);
    let client = local_backend(&server);
    let corpus = "trec covid & co/2020 50%+";
    let dataset = "dev?split=1 #a";

    client.add_queries(corpus, dataset, &[]).await.unwrap();

    let req = &server.requests()[0];
    assert_eq!(req.path, "/add_queries");
    assert_eq!(req.query.len(), 2);
    assert_eq!(req.param("corpus_name"), Some(corpus));
    assert_eq!(req.param("dataset_name"), Some(dataset));
    assert_eq!(req.body, json!([]));
}
