use anyhow::{Context, bail};
use dealflow_core::project::ProjectData;
use dealflow_core::signals::FundId;
use dealflow_filter::{FilterContext, FilterEnv, PipelineOutcome, apply_filters};
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::FilterArgs;
use crate::context::AppContext;
use crate::input::read_json;
use crate::output::output;
use crate::progress::Progress;

/// Handle `dealflow filter`.
pub async fn handle(args: &FilterArgs, ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let project: ProjectData = read_json(&args.file)?;
    let context = match (args.pipeline.needs_signal(), args.fund) {
        (true, Some(id)) => {
            ctx.service
                .get_fund(id)
                .await?
                .with_context(|| format!("fund {id} not found"))?;
            FilterContext::for_signal(FundId { id })
        }
        (true, None) => bail!("{} needs --fund", args.pipeline),
        (false, Some(_)) => bail!("{} does not take --fund", args.pipeline),
        (false, None) => FilterContext::new(),
    };

    let progress = Progress::spinner(&format!("running {}", args.pipeline), flags.quiet);
    let outcome = apply_filters(
        FilterEnv::new(&ctx.service, &ctx.completion),
        ctx.pipelines.get(args.pipeline),
        &project,
        context,
    )
    .await;
    progress.finish_clear();

    match outcome? {
        PipelineOutcome::Completed(result) => output(&result, flags.format),
        PipelineOutcome::PreconditionFailed(failure) => output(
            &json!({ "passed": false, "precondition_failed": failure }),
            flags.format,
        ),
    }
}
