mod helpers;

use cytomine::errors::{ModelError, SaveError};
use cytomine::*;
use fake::faker::lorem::en::Word;
use fake::Fake;
use helpers::{Method, MockTransport};
use rstest::*;
use serde_json::{json, Value};

// ========================================
//                 FIXTURES
// ========================================

/// 47 terms named `t0` to `t46`.
#[fixture]
fn terms() -> TermCollection {
    let mut terms = TermCollection::new();
    terms
        .extend((0..47).map(|i| Term::new(format!("t{}", i), ModelId(1), "#000000")))
        .unwrap();
    terms
}

fn names(terms: &TermCollection) -> Vec<String> {
    terms
        .iter()
        .filter_map(|t| t.fields.name.clone())
        .collect()
}

fn expected_names(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("t{}", i)).collect()
}

/// Fails the request of the chunk starting with the term named `first`.
fn failing_on(first: &'static str) -> MockTransport {
    MockTransport::new(move |request| {
        let body = request.body.clone().unwrap_or(Value::Null);
        if body[0]["name"] == json!(first) {
            Err(helpers::server_error("chunk rejected"))
        } else {
            Ok(json!({"collection": body}))
        }
    })
}

fn chunk_sizes(transport: &MockTransport) -> Vec<usize> {
    let mut sizes: Vec<usize> = transport
        .requests()
        .iter()
        .filter_map(|r| r.body.as_ref().and_then(Value::as_array).map(Vec::len))
        .collect();
    sizes.sort_unstable();
    sizes
}

// ========================================
//                 TESTS
// ========================================

#[rstest]
#[tokio::test]
async fn test_chunked_save(terms: TermCollection) {
    let transport = MockTransport::ok();
    terms
        .save(&transport, SaveOptions { chunk: Some(15), n_workers: 2 })
        .await
        .unwrap();
    let requests = transport.requests();
    assert!(requests
        .iter()
        .all(|r| r.method == Method::Post && r.uri == "term.json"));
    assert_eq!(chunk_sizes(&transport), [2, 15, 15, 15]);
}

#[rstest]
#[tokio::test]
async fn test_partial_failure(terms: TermCollection) {
    let transport = failing_on("t30");
    let result = terms.save(&transport, SaveOptions::default()).await;
    let Err(SaveError::Partial(partial)) = result else {
        panic!("expected a partial upload")
    };
    assert_eq!(partial.causes.len(), 1);
    assert!(matches!(partial.causes[0], ModelError::Transport(_)));
    assert_eq!(names(&partial.failed), expected_names(30..45));
    let created: Vec<String> = expected_names(0..30)
        .into_iter()
        .chain(expected_names(45..47))
        .collect();
    assert_eq!(names(&partial.created), created);
    assert_eq!(chunk_sizes(&transport), [2, 15, 15, 15]);
}

#[rstest]
#[tokio::test]
async fn test_retry_failed_items(terms: TermCollection) {
    let result = terms.save(&failing_on("t0"), SaveOptions::default()).await;
    let Err(SaveError::Partial(partial)) = result else {
        panic!("expected a partial upload")
    };
    let transport = MockTransport::ok();
    partial
        .failed
        .save(&transport, SaveOptions::default())
        .await
        .unwrap();
    assert_eq!(chunk_sizes(&transport), [15]);
}

#[rstest]
#[tokio::test]
async fn test_unchunked_save(terms: TermCollection) {
    let transport = MockTransport::ok();
    terms
        .save(&transport, SaveOptions { chunk: None, n_workers: 0 })
        .await
        .unwrap();
    assert_eq!(chunk_sizes(&transport), [47]);
}

#[rstest]
#[tokio::test]
async fn test_zero_chunk_is_invalid(terms: TermCollection) {
    let transport = MockTransport::ok();
    let result = terms
        .save(&transport, SaveOptions { chunk: Some(0), n_workers: 0 })
        .await;
    assert!(matches!(
        result,
        Err(SaveError::Model(ModelError::InvalidChunkSize(Some(0))))
    ));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_read_only_collection() {
    let transport = MockTransport::ok();
    let mut projects = ProjectCollection::new();
    projects.push(Project::new(Word().fake::<String>(), None)).unwrap();
    let result = projects.save(&transport, SaveOptions::default()).await;
    assert!(matches!(
        result,
        Err(SaveError::Model(ModelError::NotImplemented(_)))
    ));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_save_with_settings() {
    let transport = MockTransport::ok();
    let settings = Settings {
        host: None,
        upload: UploadSettings {
            chunk: Some(4),
            n_workers: 1,
        },
    };
    let mut tags = TagCollection::new();
    tags.extend((0..9).map(|_| Tag::new(Word().fake::<String>())))
        .unwrap();
    tags.save(&transport, settings.save_options()).await.unwrap();
    assert_eq!(chunk_sizes(&transport), [1, 4, 4]);
    // a single worker sends the chunks in order
    let firsts: Vec<Value> = transport
        .requests()
        .iter()
        .map(|r| r.body.as_ref().unwrap()[0]["name"].clone())
        .collect();
    let expected: Vec<Value> = [0, 4, 8]
        .iter()
        .map(|&i| json!(tags[i].fields.name))
        .collect();
    assert_eq!(firsts, expected);
}
