//! Repository modules implementing the persistence operations for all
//! dealflow entities.
//!
//! Each module adds methods to `FlowService` via `impl FlowService` blocks.

pub mod event;
pub mod feed;
pub mod fund;
pub mod investor;
pub mod profile;
pub mod project;
pub mod signal_link;
pub mod tag;
