use anyhow::Context;
use dealflow_core::enums::TagAttr;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ProjectCommands;
use crate::context::AppContext;
use crate::output::output;

/// Data source of tags written by the industry tagging step.
const LLM_TAG_SOURCE: &str = dealflow_filter::preprocess::LLM_TAG_SOURCE;

/// Handle `dealflow project`.
pub async fn handle(
    action: &ProjectCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let service = &ctx.service;
    match action {
        ProjectCommands::List { status } => {
            let projects = service.list_projects(*status, flags.limit_or(50)).await?;
            output(&projects, flags.format)
        }
        ProjectCommands::Get { id } => {
            let project = service
                .get_project(*id)
                .await?
                .with_context(|| format!("project {id} not found"))?;
            let details = json!({
                "project": project,
                "signal_links": service.signal_links_for_project(*id).await?,
                "industries": service.project_tags(*id, TagAttr::Industries, LLM_TAG_SOURCE).await?,
                "linkedin_profile": service.profile_for_project(*id).await?,
            });
            output(&details, flags.format)
        }
        ProjectCommands::Status { id, status } => {
            service.set_status(*id, *status).await?;
            tracing::info!(project_id = id, status = %status, "project status set");
            let project = service
                .get_project(*id)
                .await?
                .with_context(|| format!("project {id} not found"))?;
            output(&project, flags.format)
        }
        ProjectCommands::Publish { id } => {
            let entry = service.publish_project(*id).await?;
            output(&entry, flags.format)
        }
        ProjectCommands::Remove { id } => {
            service.remove_project(*id).await?;
            output(&json!({ "removed": id }), flags.format)
        }
        ProjectCommands::Events { id } => {
            output(&service.events_for_project(*id).await?, flags.format)
        }
    }
}
