use anyhow::Context;
use serde_json::Value;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::FundCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `dealflow fund`.
pub async fn handle(
    action: &FundCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        FundCommands::Upsert { name, thesis } => {
            let fund = ctx.service.upsert_fund(name, thesis.as_deref()).await?;
            tracing::info!(fund_id = fund.id, name = %fund.name, "fund upserted");
            output(&fund, flags.format)
        }
        FundCommands::List => output(&ctx.service.list_funds().await?, flags.format),
        FundCommands::Get { name } => {
            let fund = ctx
                .service
                .get_fund_by_name(name)
                .await?
                .with_context(|| format!("fund '{name}' not found"))?;
            output(&fund, flags.format)
        }
        FundCommands::Set { name, attr, value } => {
            let fund = ctx
                .service
                .get_fund_by_name(name)
                .await?
                .with_context(|| format!("fund '{name}' not found"))?;
            let fund = ctx
                .service
                .set_fund_attr(fund.id, *attr, parse_attr_value(value))
                .await?;
            output(&fund, flags.format)
        }
    }
}

/// JSON when it parses, the raw text otherwise.
fn parse_attr_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
