use anyhow::Context;
use dealflow_db::trail::replayer::TrailReplayer;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ReplayArgs;
use crate::context::{AppContext, trail_dir};
use crate::output::output;

/// Handle `dealflow replay`.
pub async fn handle(args: &ReplayArgs, ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let dir = args
        .trail_dir
        .clone()
        .or_else(|| trail_dir(&ctx.config))
        .context("no trail directory: pass --trail-dir or set events.trail_dir")?;
    if !dir.is_dir() {
        anyhow::bail!("trail directory {} does not exist", dir.display());
    }

    let report = TrailReplayer::rebuild_events(&mut ctx.service, &dir)
        .await
        .with_context(|| format!("failed to replay {}", dir.display()))?;
    output(
        &json!({
            "trail_dir": dir,
            "trail_files": report.trail_files,
            "events_replayed": report.events_replayed,
        }),
        flags.format,
    )
}
