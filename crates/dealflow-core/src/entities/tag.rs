use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::TagAttr;

/// A cached tag on a tracked company, e.g. an LLM-derived industry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectTag {
    pub project_id: i64,
    pub attr: TagAttr,
    pub tag_name: String,
    /// Who produced the tag: `llm`, `linkedin`, `manual`.
    pub data_source: String,
}
