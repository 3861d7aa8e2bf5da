//! Signal links: one row per (fund, company, year, month).

use dealflow_core::entities::{NewSignalLink, SignalLink};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_optional_json, to_json};
use crate::service::FlowService;

fn row_to_link(row: &libsql::Row) -> Result<SignalLink, DatabaseError> {
    let year = row.get::<i64>(3)?;
    let month = row.get::<i64>(4)?;
    let source = get_opt_string(row, 5)?;
    Ok(SignalLink {
        id: row.get::<i64>(0)?,
        fund_id: row.get::<i64>(1)?,
        project_id: row.get::<i64>(2)?,
        year: i32::try_from(year)
            .map_err(|e| DatabaseError::Query(format!("Invalid signal year {year}: {e}")))?,
        month: u32::try_from(month)
            .map_err(|e| DatabaseError::Query(format!("Invalid signal month {month}: {e}")))?,
        source: parse_optional_json(source.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl FlowService {
    /// Insert unless the fund already signalled this company in the same
    /// month. Returns `true` when a row was inserted.
    pub async fn add_signal_link(&self, link: &NewSignalLink) -> Result<bool, DatabaseError> {
        let source = link.source.as_ref().map(to_json).transpose()?;
        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT INTO signal_links (fund_id, project_id, year, month, source)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(fund_id, project_id, year, month) DO NOTHING",
                libsql::params![
                    link.fund_id,
                    link.project_id,
                    i64::from(link.timeframe.year),
                    i64::from(link.timeframe.month),
                    source
                ],
            )
            .await?;
        Ok(inserted == 1)
    }

    /// Funds that have signalled this company at any time.
    pub async fn project_fund_ids(&self, project_id: i64) -> Result<Vec<i64>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT DISTINCT fund_id FROM signal_links WHERE project_id = ?1 ORDER BY fund_id",
                [project_id],
            )
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row.get::<i64>(0)?);
        }
        Ok(results)
    }

    pub async fn signal_links_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<SignalLink>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, fund_id, project_id, year, month, source, created_at
                 FROM signal_links WHERE project_id = ?1 ORDER BY year, month, fund_id",
                [project_id],
            )
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_link(&row)?);
        }
        Ok(results)
    }
}
