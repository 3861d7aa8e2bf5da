use anyhow::bail;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::EventsArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `dealflow events`.
pub async fn handle(args: &EventsArgs, ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let events = if args.trail {
        if !ctx.service.trail().is_enabled() {
            bail!("the event trail is disabled (events.trail_dir is empty)");
        }
        ctx.service.trail().read_group(args.group_id)?
    } else {
        ctx.service.events_for_group(args.group_id).await?
    };

    if events.is_empty() {
        bail!("no events recorded for group {}", args.group_id);
    }
    output(&events, flags.format)
}
