//! # dealflow-core
//!
//! Core types shared across all dealflow crates:
//! - Normalized company data with tri-state fields and field extractors
//! - Filter configuration and evaluation records
//! - Signal identity and provenance schemas
//! - Entity structs for persisted records
//! - Status and event-name enums
//! - Admission events and the per-attempt event collector
//! - Collaborator traits (store, completion, publishing, event sink)
//! - URL normalization helpers

pub mod capabilities;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod events;
pub mod filters;
pub mod project;
pub mod signals;
pub mod urls;
