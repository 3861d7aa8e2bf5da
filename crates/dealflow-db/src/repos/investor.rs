//! Investor repository and investor-to-fund membership.

use dealflow_core::entities::Investor;

use crate::error::DatabaseError;
use crate::helpers::get_opt_string;
use crate::service::FlowService;

impl FlowService {
    /// Create an investor (or update the one with this LinkedIn URL) and
    /// attach it to `fund_ids`.
    pub async fn upsert_investor(
        &self,
        name: &str,
        linkedin_url: Option<&str>,
        fund_ids: &[i64],
    ) -> Result<Investor, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "INSERT INTO investors (name, linkedin_url) VALUES (?1, ?2)
                 ON CONFLICT(linkedin_url) DO UPDATE SET name = excluded.name
                 RETURNING id",
                libsql::params![name.trim(), linkedin_url],
            )
            .await?;
        let id = rows
            .next()
            .await?
            .ok_or(DatabaseError::NoResult)?
            .get::<i64>(0)?;

        for fund_id in fund_ids {
            self.link_investor_fund(id, *fund_id).await?;
        }

        self.get_investor(id).await?.ok_or(DatabaseError::NoResult)
    }

    pub async fn link_investor_fund(&self, investor_id: i64, fund_id: i64) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT OR IGNORE INTO investor_funds (investor_id, fund_id) VALUES (?1, ?2)",
                libsql::params![investor_id, fund_id],
            )
            .await?;
        Ok(())
    }

    pub async fn get_investor(&self, id: i64) -> Result<Option<Investor>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id, name, linkedin_url FROM investors WHERE id = ?1", [id])
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let mut investor = Investor {
            id: row.get::<i64>(0)?,
            name: row.get::<String>(1)?,
            linkedin_url: get_opt_string(&row, 2)?,
            fund_ids: Vec::new(),
        };

        let mut fund_rows = self
            .db()
            .conn()
            .query(
                "SELECT fund_id FROM investor_funds WHERE investor_id = ?1 ORDER BY fund_id",
                [id],
            )
            .await?;
        while let Some(row) = fund_rows.next().await? {
            investor.fund_ids.push(row.get::<i64>(0)?);
        }
        Ok(Some(investor))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{seed_fund, test_service};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn investor_carries_fund_ids() {
        let svc = test_service().await;
        let a = seed_fund(&svc, "Fund A", Some("Robotics")).await;
        let b = seed_fund(&svc, "Fund B", Some("Climate")).await;

        let investor = svc
            .upsert_investor("Jane Doe", Some("https://www.linkedin.com/in/jane"), &[b.id, a.id])
            .await
            .unwrap();
        assert_eq!(investor.fund_ids, vec![a.id, b.id]);

        let again = svc
            .upsert_investor("Jane D.", Some("https://www.linkedin.com/in/jane"), &[a.id])
            .await
            .unwrap();
        assert_eq!(again.id, investor.id);
        assert_eq!(again.name, "Jane D.");
        assert_eq!(again.fund_ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn investors_without_linkedin_are_distinct() {
        let svc = test_service().await;
        let first = svc.upsert_investor("Anon", None, &[]).await.unwrap();
        let second = svc.upsert_investor("Anon", None, &[]).await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.fund_ids.is_empty());
    }
}
