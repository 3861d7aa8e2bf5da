//! JSON and JSONL input files.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Read one JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Read every line of a JSONL file. A bad line fails the whole read with
/// its line number.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let lines = serde_jsonlines::json_lines::<T, _>(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    lines
        .enumerate()
        .map(|(index, item)| {
            item.with_context(|| format!("{}:{}: invalid job", path.display(), index + 1))
        })
        .collect()
}
