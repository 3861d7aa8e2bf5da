use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Optional descriptive attributes a fund can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FundAttr {
    Website,
    LinkedinUrl,
    Stages,
    Regions,
    TicketSize,
}

impl FundAttr {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::LinkedinUrl => "linkedin_url",
            Self::Stages => "stages",
            Self::Regions => "regions",
            Self::TicketSize => "ticket_size",
        }
    }
}

/// A venture fund with an investment thesis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Fund {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub thesis: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<FundAttr, Value>,
}

impl Fund {
    #[must_use]
    pub fn get_attr(&self, attr: FundAttr) -> Option<&Value> {
        self.attributes.get(&attr)
    }

    /// Set an attribute; `Value::Null` removes it.
    pub fn set_attr(&mut self, attr: FundAttr, value: Value) {
        if value.is_null() {
            self.attributes.remove(&attr);
        } else {
            self.attributes.insert(attr, value);
        }
    }

    /// Thesis text when present and non-blank.
    #[must_use]
    pub fn thesis(&self) -> Option<&str> {
        self.thesis.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// An individual investor; signals from investors resolve through their funds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Investor {
    pub id: i64,
    pub name: String,
    pub linkedin_url: Option<String>,
    pub fund_ids: Vec<i64>,
}
