use dealflow_filter::{AdmissionJob, JobReport, JobStatus, Worker};
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::BatchArgs;
use crate::context::AppContext;
use crate::input::read_jsonl;
use crate::output::output;
use crate::progress::Progress;

/// Handle `dealflow batch`.
pub async fn handle(args: &BatchArgs, ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let jobs: Vec<AdmissionJob> = read_jsonl(&args.file)?;
    let max_attempts = args.max_attempts.unwrap_or(ctx.config.worker.max_attempts);
    tracing::info!(jobs = jobs.len(), max_attempts, file = %args.file.display(), "batch loaded");

    let progress = Progress::bar(jobs.len() as u64, "admitting", flags.quiet);
    let worker = Worker::new(
        &ctx.service,
        &ctx.completion,
        &ctx.service,
        &ctx.service,
        &ctx.pipelines,
        max_attempts,
    );

    let mut reports: Vec<JobReport> = Vec::new();
    let summary = worker
        .run_batch(jobs, |report| {
            if report.status != JobStatus::Requeued {
                progress.inc(1);
            }
            if let Some(website) = &report.website {
                progress.set_message(website);
            }
            reports.push(report.clone());
        })
        .await;
    progress.finish_clear();

    output(&json!({ "summary": summary, "jobs": reports }), flags.format)
}
