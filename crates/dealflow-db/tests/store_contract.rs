//! Store, publisher and event-sink contract tests.
//!
//! Exercises `FlowService` only through the collaborator traits, the way the
//! filter pipeline and admission see it:
//! - Service: construction with and without trail
//! - Store: find-or-create, classification, signal links, tag cache
//! - Publisher: feed entry for a reviewed company
//! - Event sink: trail file and events table

use dealflow_core::capabilities::{EventSink, ProjectStore, Publisher, StoreError};
use dealflow_core::entities::{NewSignalLink, ProjectCreate};
use dealflow_core::enums::{EventName, ProductLine, ProjectStatus, ProjectType, TagAttr};
use dealflow_core::events::EventCollector;
use dealflow_core::project::ProjectData;
use dealflow_core::signals::YearMonth;
use dealflow_db::service::FlowService;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

async fn test_service() -> FlowService {
    FlowService::new_local(":memory:", None).await.unwrap()
}

fn create(title: &str, website: &str) -> ProjectCreate {
    let data = ProjectData::default().with_title(title).with_website(website);
    ProjectCreate::validate(&data, ProjectType::Startup).unwrap()
}

async fn admit_once<S: ProjectStore>(
    store: &S,
    fund_id: i64,
    create: &ProjectCreate,
) -> Result<(i64, bool), StoreError> {
    let (project, _) = store.find_or_create_project(create).await?;
    store
        .set_classification(project.id, ProductLine::Startup, true)
        .await?;
    let linked = store
        .add_signal_link(&NewSignalLink {
            fund_id,
            project_id: project.id,
            timeframe: YearMonth { year: 2024, month: 5 },
            source: None,
        })
        .await?;
    Ok((project.id, linked))
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[tokio::test]
async fn service_new_local() {
    let svc = test_service().await;
    assert!(!svc.trail().is_enabled());

    let dir = TempDir::new().unwrap();
    let svc = FlowService::new_local(":memory:", Some(dir.path().join("trail")))
        .await
        .unwrap();
    assert!(svc.trail().is_enabled());
    assert!(dir.path().join("trail").is_dir());
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_admission_is_idempotent() {
    let svc = test_service().await;
    let fund = svc.upsert_fund("Fund A", Some("Robotics")).await.unwrap();
    let payload = create("Acme Robotics", "acmerobotics.io");

    let (first_id, first_linked) = admit_once(&svc, fund.id, &payload).await.unwrap();
    let (second_id, second_linked) = admit_once(&svc, fund.id, &payload).await.unwrap();

    assert_eq!(first_id, second_id);
    assert!(first_linked);
    assert!(!second_linked);
    assert_eq!(
        ProjectStore::project_fund_ids(&svc, first_id).await.unwrap(),
        vec![fund.id]
    );
}

#[tokio::test]
async fn tag_cache_roundtrips_through_trait() {
    let svc = test_service().await;
    let (project, _) = ProjectStore::find_or_create_project(&svc, &create("Acme", "acme.io"))
        .await
        .unwrap();
    let tags = vec!["AI".to_string(), "ROBOTICS".to_string()];
    ProjectStore::replace_project_tags(&svc, project.id, TagAttr::Industries, &tags, "llm")
        .await
        .unwrap();
    assert_eq!(
        ProjectStore::project_tags(&svc, project.id, TagAttr::Industries, "llm")
            .await
            .unwrap(),
        tags
    );
}

#[tokio::test]
async fn missing_records_are_none() {
    let svc = test_service().await;
    assert!(ProjectStore::get_fund(&svc, 1).await.unwrap().is_none());
    assert!(ProjectStore::get_investor(&svc, 1).await.unwrap().is_none());
    assert!(ProjectStore::get_project(&svc, 1).await.unwrap().is_none());
    assert!(
        ProjectStore::find_project_by_website(&svc, "https://nowhere.io")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn signal_link_for_unknown_fund_is_backend_error() {
    let svc = test_service().await;
    let (project, _) = ProjectStore::find_or_create_project(&svc, &create("Acme", "acme.io"))
        .await
        .unwrap();
    let err = ProjectStore::add_signal_link(
        &svc,
        &NewSignalLink {
            fund_id: 404,
            project_id: project.id,
            timeframe: YearMonth { year: 2024, month: 1 },
            source: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_reviewed_company() {
    let svc = test_service().await;
    let (project, _) = ProjectStore::find_or_create_project(&svc, &create("Acme", "acme.io"))
        .await
        .unwrap();
    svc.set_status(project.id, ProjectStatus::Review).await.unwrap();

    svc.publish(project.id).await.unwrap();
    let entry = svc.get_feed_entry(project.uuid).await.unwrap().unwrap();
    assert_eq!(entry.website, "https://acme.io");
    assert_eq!(entry.title, "Acme");
}

// ---------------------------------------------------------------------------
// Event sink
// ---------------------------------------------------------------------------

#[tokio::test]
async fn record_writes_trail_and_table() {
    let dir = TempDir::new().unwrap();
    let svc = FlowService::new_local(":memory:", Some(dir.path().to_path_buf()))
        .await
        .unwrap();

    let mut collector = EventCollector::new();
    let rejected = collector.event(EventName::ProjectRejected).project(3);
    collector.push(rejected);
    svc.record(&collector.drain()).await.unwrap();

    let from_trail = svc.trail().read_group(collector.group_id).unwrap();
    let from_table = svc.events_for_group(collector.group_id).await.unwrap();
    assert_eq!(from_trail.len(), 1);
    assert_eq!(from_trail, from_table);
}
