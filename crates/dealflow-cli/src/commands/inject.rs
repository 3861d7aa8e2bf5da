use dealflow_core::capabilities::EventSink;
use dealflow_core::events::EventCollector;
use dealflow_core::project::ProjectData;
use dealflow_core::signals::{FundId, ProjectSource};
use dealflow_filter::{Admission, AdmissionRequest};
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InjectArgs;
use crate::context::AppContext;
use crate::input::read_json;
use crate::output::output;
use crate::progress::Progress;

/// Handle `dealflow inject`.
///
/// The event group is flushed whether or not the company is admitted, so
/// `dealflow events <group_id>` explains a rejection too.
pub async fn handle(args: &InjectArgs, ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let project: ProjectData = read_json(&args.file)?;
    let source: Option<ProjectSource> = args.source.as_deref().map(read_json).transpose()?;
    let signals = args.funds.iter().map(|&id| FundId { id }).collect::<Vec<_>>();

    let mut events = EventCollector::new();
    let progress = Progress::spinner("admitting", flags.quiet);
    let result = Admission::new(&ctx.service, &ctx.completion, &ctx.service, &ctx.pipelines)
        .inject_project(
            AdmissionRequest {
                signals: &signals,
                project_data: &project,
                source: source.as_ref(),
                line: args.line,
            },
            &mut events,
        )
        .await;
    progress.finish_clear();

    if let Err(error) = ctx.service.record(&events.events).await {
        tracing::warn!(group_id = %events.group_id, %error, "failed to record admission events");
    }

    let admitted = result.map_err(|error| {
        anyhow::Error::new(error).context(format!("admission failed (events group {})", events.group_id))
    })?;
    output(
        &json!({
            "group_id": events.group_id,
            "project_id": admitted.project.id,
            "created": admitted.created,
            "signals_added": admitted.signals_added,
            "new_links": admitted.new_links,
            "published": admitted.published,
            "status": admitted.project.status,
        }),
        flags.format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use dealflow_config::FlowConfig;
    use dealflow_core::enums::{EventName, ProductLine};
    use std::io::Write;
    use uuid::Uuid;

    fn flags() -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Raw,
            limit: None,
            quiet: true,
            database: None,
        }
    }

    #[tokio::test]
    async fn failed_admission_still_records_events() {
        let trail = tempfile::tempdir().unwrap();
        let mut config = FlowConfig::default();
        config.events.trail_dir = trail.path().to_string_lossy().into_owned();
        let mut ctx = AppContext::init(config, Some(":memory:")).await.unwrap();
        let fund = ctx.service.upsert_fund("Northwind", Some("Robotics")).await.unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"title": "Acme Robotics", "website": "https://acmerobotics.io",
                "about": "Acme builds autonomous warehouse robots for distributors.",
                "analytics": {{"team_size": 12, "founded": 2020}}}}"#
        )
        .unwrap();
        let args = InjectArgs {
            file: file.path().to_path_buf(),
            funds: vec![fund.id],
            line: ProductLine::Startup,
            source: None,
        };

        // No API key: the is-startup gate cannot be evaluated.
        let err = handle(&args, &mut ctx, &flags()).await.unwrap_err();
        assert!(format!("{err:#}").contains("admission failed"));

        let files = std::fs::read_dir(trail.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect::<Vec<_>>();
        assert_eq!(files.len(), 1);
        let group_id: Uuid = files[0].file_stem().unwrap().to_str().unwrap().parse().unwrap();

        let events = ctx.service.events_for_group(group_id).await.unwrap();
        assert_eq!(events.last().unwrap().event_name, EventName::UnexpectedFilterFailure);
        assert_eq!(ctx.service.trail().read_group(group_id).unwrap().len(), events.len());
    }
}
