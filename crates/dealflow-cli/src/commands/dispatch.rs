use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Fund { action } => commands::fund::handle(&action, ctx, flags).await,
        Commands::Investor { action } => commands::investor::handle(&action, ctx, flags).await,
        Commands::Project { action } => commands::project::handle(&action, ctx, flags).await,
        Commands::Filter(args) => commands::filter::handle(&args, ctx, flags).await,
        Commands::Inject(args) => commands::inject::handle(&args, ctx, flags).await,
        Commands::Batch(args) => commands::batch::handle(&args, ctx, flags).await,
        Commands::Events(args) => commands::events::handle(&args, ctx, flags).await,
        Commands::Feed => commands::feed::handle(ctx, flags).await,
        Commands::Replay(args) => commands::replay::handle(&args, ctx, flags).await,
    }
}
