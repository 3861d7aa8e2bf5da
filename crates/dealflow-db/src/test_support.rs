//! Shared test utilities for dealflow-db unit tests.

use dealflow_core::entities::{Fund, ProjectCreate, TrackedProject};
use dealflow_core::enums::ProjectType;
use dealflow_core::project::ProjectData;

use crate::FlowDb;
use crate::service::FlowService;
use crate::trail::writer::TrailWriter;

/// In-memory service with the trail disabled.
pub async fn test_service() -> FlowService {
    let db = FlowDb::open_local(":memory:").await.unwrap();
    FlowService::from_db(db, TrailWriter::disabled())
}

/// In-memory service with the trail writing to `trail_dir`.
pub async fn test_service_with_trail(trail_dir: std::path::PathBuf) -> FlowService {
    let db = FlowDb::open_local(":memory:").await.unwrap();
    FlowService::from_db(db, TrailWriter::new(trail_dir).unwrap())
}

pub async fn seed_fund(svc: &FlowService, name: &str, thesis: Option<&str>) -> Fund {
    svc.upsert_fund(name, thesis).await.unwrap()
}

pub fn acme_create(website: &str) -> ProjectCreate {
    let data = ProjectData::default()
        .with_title("Acme Robotics")
        .with_website(website)
        .with_description("Warehouse robots for mid-size distributors")
        .with_team_size(12);
    ProjectCreate::validate(&data, ProjectType::Startup).unwrap()
}

pub async fn seed_project(svc: &FlowService, website: &str) -> TrackedProject {
    let (project, existed) = svc.find_or_create_project(&acme_create(website)).await.unwrap();
    assert!(!existed);
    project
}
