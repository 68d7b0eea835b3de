mod helpers;

use cytomine::errors::ModelError;
use cytomine::query::QueryValue;
use cytomine::*;
use helpers::{Method, MockTransport};
use rstest::*;
use serde_json::json;

fn query_u64(request: &helpers::Request, key: &str) -> Option<u64> {
    match request.query.get(key) {
        Some(QueryValue::U64(value)) => Some(*value),
        _ => None,
    }
}

// ========================================
//                 FETCHING
// ========================================

#[tokio::test]
async fn test_fetch_all_pages() {
    let transport = MockTransport::paged(25);
    let mut terms = TermCollection::new().with_filter("ontology", 4);
    terms.fetch(&transport, Some(10)).await.unwrap();

    // the last partial page is not counted
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.uri == "ontology/4/term.json"));
    assert_eq!(query_u64(&requests[0], "offset"), Some(0));
    assert_eq!(query_u64(&requests[1], "offset"), Some(10));
    assert_eq!(terms.len(), 20);
    assert_eq!(terms.total(), 25);
    assert_eq!(terms.total_pages(), Some(2));
    let ids: Vec<u64> = terms.iter().filter_map(|t| t.id()).map(|id| id.0).collect();
    assert_eq!(ids, (0..20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_fetch_single_page() {
    let transport = MockTransport::paged(7);
    let mut ontologies = OntologyCollection::new();
    ontologies.fetch(&transport, None).await.unwrap();
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].uri, "ontology.json");
    assert_eq!(query_u64(&requests[0], "max"), Some(0));
    assert_eq!(ontologies.len(), 7);
    assert_eq!(ontologies.total_pages(), Some(1));
}

#[tokio::test]
async fn test_fetch_page_with_odd_element() {
    let transport = MockTransport::new(|_| {
        Ok(json!({"size": 3, "collection": [
            {"id": 1, "magnification": 40.0},
            {"id": 2, "magnification": "40"},
            {"id": 3}
        ]}))
    });
    let mut images = ImageInstanceCollection::new().with_filter("project", 5);
    images.fetch(&transport, None).await.unwrap();
    assert_eq!(images.len(), 3);
    assert_eq!(images[0].magnification, Some(40.0));
    assert_eq!(images[1].id(), Some(ModelId(2)));
    assert_eq!(images[1].magnification, None);
}

#[tokio::test]
async fn test_fetch_empty() {
    let transport = MockTransport::paged(0);
    let mut users = UserCollection::new();
    users.fetch(&transport, Some(10)).await.unwrap();
    assert_eq!(transport.requests().len(), 1);
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_next_then_previous_page() {
    let transport = MockTransport::paged(25);
    let mut projects = ProjectCollection::new().with_max(10);
    projects.fetch_next_page(&transport, false).await.unwrap();
    assert_eq!(projects.offset, 0);
    projects.fetch_next_page(&transport, false).await.unwrap();
    assert_eq!(projects.offset, 10);
    projects.fetch_next_page(&transport, false).await.unwrap();
    assert_eq!(projects.offset, 20);
    assert_eq!(projects.len(), 5);
    projects.fetch_previous_page(&transport).await.unwrap();
    assert_eq!(projects.offset, 10);
    assert_eq!(projects[0].id(), Some(ModelId(10)));
    projects.fetch_previous_page(&transport).await.unwrap();
    projects.fetch_previous_page(&transport).await.unwrap();
    assert_eq!(projects.offset, 0);
}

#[tokio::test]
async fn test_next_page_past_the_end() {
    let transport = MockTransport::paged(25);
    let mut projects = ProjectCollection::new()
        .with_offset(u32::MAX)
        .with_max(10);
    projects.fetch_next_page(&transport, false).await.unwrap();
    assert_eq!(projects.offset, 0);
    assert_eq!(projects.total(), 25);

    projects.offset = u32::MAX;
    projects.fetch_next_page(&transport, false).await.unwrap();
    assert_eq!(projects.offset, 25);
    assert!(projects.is_empty());
    assert_eq!(query_u64(&transport.requests()[1], "offset"), Some(25));
}

#[tokio::test]
async fn test_filter_required_sends_nothing() {
    let transport = MockTransport::paged(3);
    let mut images = ImageInstanceCollection::new();
    let result = images.fetch(&transport, None).await;
    assert!(matches!(result, Err(ModelError::FilterRequired(_))));
    assert!(transport.requests().is_empty());

    images
        .fetch_with_filter(&transport, "project", 12, None)
        .await
        .unwrap();
    assert_eq!(transport.requests()[0].uri, "project/12/imageinstance.json");
    assert_eq!(images.len(), 3);
}

#[tokio::test]
async fn test_too_many_filters_sends_nothing() {
    let transport = MockTransport::paged(3);
    let mut terms = TermCollection::new()
        .with_filter("project", 1)
        .with_filter("ontology", 2);
    let result = terms.fetch(&transport, None).await;
    assert!(matches!(result, Err(ModelError::TooManyFilters(2))));
    assert!(transport.requests().is_empty());
}

#[rstest]
#[case(false, "project/3/user.json")]
#[case(true, "project/3/admin.json")]
#[tokio::test]
async fn test_project_managers(#[case] admin: bool, #[case] uri: &str) {
    let transport = MockTransport::paged(2);
    let mut users = UserCollection::new()
        .with_filter("project", 3)
        .with_parameter("admin", admin);
    users.fetch(&transport, None).await.unwrap();
    let requests = transport.requests();
    assert_eq!(requests[0].uri, uri);
    assert_eq!(requests[0].query.get("admin"), Some(&QueryValue::Bool(admin)));
}

// ========================================
//                 SEQUENCE
// ========================================

#[test]
fn test_wrong_kind_is_rejected() {
    let mut models = Collection::with_prototype(GenericModel::new("term"), Listing::new("term"));
    models.push(GenericModel::new("term")).unwrap();

    let result = models.push(GenericModel::new("project"));
    assert!(matches!(result, Err(ModelError::WrongKind { .. })));
    let result = models.extend([GenericModel::new("term"), GenericModel::new("project")]);
    assert!(matches!(result, Err(ModelError::WrongKind { .. })));
    let result = models.insert(0, GenericModel::new("user"));
    assert!(matches!(result, Err(ModelError::WrongKind { .. })));
    assert_eq!(models.len(), 1);
}

#[test]
fn test_sequence_operations() {
    let mut terms = TermCollection::new();
    for name in ["a", "b", "c"] {
        terms
            .push(Term::new(name, ModelId(1), "#000000"))
            .unwrap();
    }
    let removed = terms.remove(1).unwrap();
    assert_eq!(removed.fields.name.as_deref(), Some("b"));
    assert!(matches!(
        terms.remove(5),
        Err(ModelError::IndexOutOfBounds { index: 5, len: 2 })
    ));
    terms.insert(2, Term::new("d", ModelId(1), "#000000")).unwrap();
    let names: Vec<&str> = terms
        .iter()
        .filter_map(|t| t.fields.name.as_deref())
        .collect();
    assert_eq!(names, ["a", "c", "d"]);

    let found = terms.find_by_attribute("name", &json!("c")).unwrap();
    assert_eq!(found.fields.name.as_deref(), Some("c"));
    assert!(terms.find_by_attribute("color", &json!("#FFFFFF")).is_none());
}

#[test]
fn test_append_requires_same_kind() {
    let mut terms = TermCollection::new();
    terms.push(Term::default()).unwrap();
    let more = terms.clone();
    let all = terms.concat(&more).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(terms.len(), 1);

    let mut generic = Collection::with_prototype(GenericModel::new("term"), Listing::new("term"));
    let other = Collection::with_prototype(GenericModel::new("project"), Listing::new("project"));
    assert!(matches!(
        generic.append(other),
        Err(ModelError::KindMismatch)
    ));
}

#[test]
fn test_filter_keeps_listing() {
    let mut terms = TermCollection::new().with_filter("ontology", 4);
    terms.push(Term::new("a", ModelId(4), "#FF0000")).unwrap();
    terms.push(Term::new("b", ModelId(4), "#00FF00")).unwrap();
    let red = terms.filter(|t| t.color.as_deref() == Some("#FF0000"));
    assert_eq!(red.len(), 1);
    assert_eq!(red.uri().unwrap(), "ontology/4/term.json");
}

#[tokio::test]
async fn test_display() {
    let transport = MockTransport::paged(3);
    let mut terms = TermCollection::new().with_filter("project", 1);
    terms.fetch(&transport, None).await.unwrap();
    assert_eq!(terms.to_string(), "[term collection] 3 objects");
    assert_eq!(transport.requests()[0].method, Method::Get);
}
