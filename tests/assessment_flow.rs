//! End-to-end assessment flows over the in-memory backend.

use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as Json, json};
use time::format_description::well_known::Rfc3339;

use game_assessment_store::config::CollectionLayout;
use game_assessment_store::dao::document::{Document, FieldValue};
use game_assessment_store::dao::document_store::DocumentStore;
use game_assessment_store::dao::document_store::memory::MemoryDocumentStore;
use game_assessment_store::error::ServiceError;
use game_assessment_store::services::AssessmentService;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn setup() -> (MemoryDocumentStore, AssessmentService) {
    init_logging();
    let store = MemoryDocumentStore::new();
    let service = AssessmentService::new(Arc::new(store.clone()), CollectionLayout::new());
    (store, service)
}

fn quiz_payload() -> JsonMap<String, Json> {
    match json!({
        "title": "Photosynthesis quiz",
        "questions": [
            {"prompt": "What do plants absorb?", "answer": "CO2"},
            {"prompt": "What pigment drives it?", "answer": "chlorophyll"},
        ],
    }) {
        Json::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Seed an assessment directly through the store, bypassing the service's
/// server-assigned timestamp so tests can control ordering.
async fn seed_assessment(
    store: &MemoryDocumentStore,
    id: &str,
    generated_at: time::OffsetDateTime,
    approved: bool,
) {
    let mut doc = Document::new();
    doc.set("courseId", FieldValue::Text("c-1".into()));
    doc.set("moduleId", FieldValue::Text("m-1".into()));
    doc.set("generatedAt", FieldValue::Timestamp(generated_at));
    doc.set("approvedByAdmin", FieldValue::Boolean(approved));
    let path = CollectionLayout::new().assessment_document("c-1", "m-1", id);
    store.merge(path, doc).await.expect("seeds");
}

#[tokio::test]
async fn create_then_get_starts_unapproved_with_a_parseable_timestamp() {
    let (_store, service) = setup();

    let id = service
        .save_generated_assessment("c-1", "m-1", quiz_payload())
        .await
        .expect("saves");

    let assessment = service
        .get_assessment("c-1", "m-1", &id)
        .await
        .expect("fetches")
        .expect("exists");

    assert_eq!(assessment.id, id);
    assert_eq!(assessment.course_id, "c-1");
    assert_eq!(assessment.module_id, "m-1");
    assert!(!assessment.approved_by_admin);
    assert_eq!(
        assessment.payload.get("title"),
        Some(&json!("Photosynthesis quiz"))
    );
    let parsed = time::OffsetDateTime::parse(&assessment.generated_at, &Rfc3339)
        .expect("generatedAt parses");
    assert!(parsed > time::OffsetDateTime::UNIX_EPOCH);
}

#[tokio::test]
async fn managed_fields_win_over_colliding_payload_keys() {
    let (_store, service) = setup();

    let mut payload = quiz_payload();
    payload.insert("approvedByAdmin".into(), json!(true));
    payload.insert("courseId".into(), json!("spoofed"));

    let id = service
        .save_generated_assessment("c-1", "m-1", payload)
        .await
        .expect("saves");
    let assessment = service
        .get_assessment("c-1", "m-1", &id)
        .await
        .expect("fetches")
        .expect("exists");

    assert!(!assessment.approved_by_admin);
    assert_eq!(assessment.course_id, "c-1");
}

#[tokio::test]
async fn create_with_empty_module_id_rejects_before_any_store_call() {
    let (store, service) = setup();

    let err = service
        .save_generated_assessment("c-1", "", quiz_payload())
        .await
        .expect_err("must reject");

    assert!(matches!(err, ServiceError::InvalidArgument(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn get_of_a_missing_assessment_is_none_not_an_error() {
    let (_store, service) = setup();
    let found = service
        .get_assessment("c-1", "m-1", "does-not-exist")
        .await
        .expect("no error");
    assert!(found.is_none());
}

#[tokio::test]
async fn get_rejects_empty_identifiers() {
    let (_store, service) = setup();
    for (course, module, assessment) in [("", "m-1", "a-1"), ("c-1", "", "a-1"), ("c-1", "m-1", "")]
    {
        let err = service
            .get_assessment(course, module, assessment)
            .await
            .expect_err("must reject");
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }
}

#[tokio::test]
async fn student_listing_hides_unapproved_assessments() {
    let (store, service) = setup();
    let t0 = time::macros::datetime!(2024-01-01 0:00 UTC);
    seed_assessment(&store, "approved-1", t0, true).await;
    seed_assessment(&store, "pending-1", t0 + time::Duration::hours(1), false).await;
    seed_assessment(&store, "approved-2", t0 + time::Duration::hours(2), true).await;

    let student_view = service
        .list_for_module("c-1", "m-1", false)
        .await
        .expect("lists");
    assert!(student_view.iter().all(|a| a.approved_by_admin));
    assert_eq!(student_view.len(), 2);

    let admin_view = service
        .list_for_module("c-1", "m-1", true)
        .await
        .expect("lists");
    assert_eq!(admin_view.len(), 3);
}

#[tokio::test]
async fn listing_orders_newest_first() {
    let (store, service) = setup();
    let t0 = time::macros::datetime!(2024-01-01 0:00 UTC);
    seed_assessment(&store, "oldest", t0, true).await;
    seed_assessment(&store, "newest", t0 + time::Duration::days(2), true).await;
    seed_assessment(&store, "middle", t0 + time::Duration::days(1), true).await;

    let listed = service
        .list_for_module("c-1", "m-1", true)
        .await
        .expect("lists");
    let ids: Vec<&str> = listed.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["newest", "middle", "oldest"]);
    for pair in listed.windows(2) {
        assert!(pair[0].generated_at >= pair[1].generated_at);
    }
}

#[tokio::test]
async fn approval_toggle_leaves_every_other_field_untouched() {
    let (_store, service) = setup();

    let id = service
        .save_generated_assessment("c-1", "m-1", quiz_payload())
        .await
        .expect("saves");
    let before = service
        .get_assessment("c-1", "m-1", &id)
        .await
        .expect("fetches")
        .expect("exists");

    service
        .set_approval("c-1", "m-1", &id, true)
        .await
        .expect("approves");
    let approved = service
        .get_assessment("c-1", "m-1", &id)
        .await
        .expect("fetches")
        .expect("exists");
    assert!(approved.approved_by_admin);

    service
        .set_approval("c-1", "m-1", &id, false)
        .await
        .expect("unapproves");
    let after = service
        .get_assessment("c-1", "m-1", &id)
        .await
        .expect("fetches")
        .expect("exists");

    assert!(!after.approved_by_admin);
    assert_eq!(after.payload, before.payload);
    assert_eq!(after.generated_at, before.generated_at);
    assert_eq!(after.course_id, before.course_id);
    assert_eq!(after.module_id, before.module_id);
}

#[tokio::test]
async fn deleting_a_missing_assessment_succeeds() {
    let (_store, service) = setup();
    service
        .delete_assessment("c-1", "m-1", "never-existed")
        .await
        .expect("idempotent delete");
}

#[tokio::test]
async fn delete_removes_the_assessment_for_subsequent_reads() {
    let (_store, service) = setup();
    let id = service
        .save_generated_assessment("c-1", "m-1", quiz_payload())
        .await
        .expect("saves");

    service
        .delete_assessment("c-1", "m-1", &id)
        .await
        .expect("deletes");

    let found = service
        .get_assessment("c-1", "m-1", &id)
        .await
        .expect("no error");
    assert!(found.is_none());
}
