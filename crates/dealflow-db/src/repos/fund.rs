//! Fund repository: upsert by name, lookups and enumerated attributes.

use std::collections::BTreeMap;

use dealflow_core::entities::{Fund, FundAttr};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_json, to_json};
use crate::service::FlowService;

const FUND_COLUMNS: &str = "id, uuid, name, thesis, attributes";

fn row_to_fund(row: &libsql::Row) -> Result<Fund, DatabaseError> {
    let uuid = row.get::<String>(1)?;
    let attributes: BTreeMap<FundAttr, Value> = parse_json(&row.get::<String>(4)?)?;
    Ok(Fund {
        id: row.get::<i64>(0)?,
        uuid: Uuid::parse_str(&uuid)
            .map_err(|e| DatabaseError::Query(format!("Invalid fund uuid '{uuid}': {e}")))?,
        name: row.get::<String>(2)?,
        thesis: get_opt_string(row, 3)?,
        attributes,
    })
}

impl FlowService {
    /// Create a fund or update the thesis of the fund with this name.
    pub async fn upsert_fund(&self, name: &str, thesis: Option<&str>) -> Result<Fund, DatabaseError> {
        let uuid = Uuid::new_v4().to_string();
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "INSERT INTO funds (uuid, name, thesis) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET thesis = excluded.thesis, updated_at = datetime('now')
                     RETURNING {FUND_COLUMNS}"
                ),
                libsql::params![uuid, name.trim(), thesis],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let fund = row_to_fund(&row)?;
        tracing::debug!(fund_id = fund.id, name = %fund.name, "fund upserted");
        Ok(fund)
    }

    pub async fn get_fund(&self, id: i64) -> Result<Option<Fund>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {FUND_COLUMNS} FROM funds WHERE id = ?1"), [id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_fund(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_fund_by_name(&self, name: &str) -> Result<Option<Fund>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {FUND_COLUMNS} FROM funds WHERE name = ?1"), [name])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_fund(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_funds(&self) -> Result<Vec<Fund>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {FUND_COLUMNS} FROM funds ORDER BY name"), ())
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_fund(&row)?);
        }
        Ok(results)
    }

    /// Set one attribute of a fund. `Value::Null` removes it.
    pub async fn set_fund_attr(
        &self,
        fund_id: i64,
        attr: FundAttr,
        value: Value,
    ) -> Result<Fund, DatabaseError> {
        let mut fund = self
            .get_fund(fund_id)
            .await?
            .ok_or_else(|| DatabaseError::InvalidState(format!("fund {fund_id} not found")))?;
        fund.set_attr(attr, value);
        self.db()
            .conn()
            .execute(
                "UPDATE funds SET attributes = ?2, updated_at = datetime('now') WHERE id = ?1",
                libsql::params![fund_id, to_json(&fund.attributes)?],
            )
            .await?;
        Ok(fund)
    }
}
