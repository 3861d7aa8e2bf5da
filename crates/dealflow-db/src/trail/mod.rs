//! JSONL event trail writer and replayer.
//!
//! Every admission attempt's events are appended to `{trail_dir}/{group_id}.jsonl`.
//! The `events` table can be rebuilt from these files.

pub mod replayer;
pub mod writer;
