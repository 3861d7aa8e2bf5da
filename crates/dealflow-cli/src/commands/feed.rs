use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `dealflow feed`.
pub async fn handle(ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let entries = ctx.service.list_feed(flags.limit_or(50)).await?;
    output(&entries, flags.format)
}
