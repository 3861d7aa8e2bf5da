use anyhow::{Context, bail};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::InvestorCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `dealflow investor`.
pub async fn handle(
    action: &InvestorCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        InvestorCommands::Upsert {
            name,
            linkedin,
            funds,
        } => {
            for fund_id in funds {
                if ctx.service.get_fund(*fund_id).await?.is_none() {
                    bail!("fund {fund_id} not found");
                }
            }
            let investor = ctx
                .service
                .upsert_investor(name, linkedin.as_deref(), funds)
                .await?;
            tracing::info!(investor_id = investor.id, funds = funds.len(), "investor upserted");
            output(&investor, flags.format)
        }
        InvestorCommands::Get { id } => {
            let investor = ctx
                .service
                .get_investor(*id)
                .await?
                .with_context(|| format!("investor {id} not found"))?;
            output(&investor, flags.format)
        }
    }
}
