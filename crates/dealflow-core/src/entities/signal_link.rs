use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::signals::YearMonth;

/// A fund's interest in a company, bucketed by month.
///
/// `(fund_id, project_id, year, month)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SignalLink {
    pub id: i64,
    pub fund_id: i64,
    pub project_id: i64,
    pub year: i32,
    pub month: u32,
    /// Provenance of the signal (the serialized project source).
    pub source: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`SignalLink`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewSignalLink {
    pub fund_id: i64,
    pub project_id: i64,
    pub timeframe: YearMonth,
    pub source: Option<Value>,
}
