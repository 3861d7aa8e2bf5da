//! Entity structs for persisted dealflow records.
//!
//! Each entity maps to a table in the libSQL database (see
//! `dealflow-db/migrations/001_initial.sql`). All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema` for JSON roundtrip and schema validation.

mod feed;
mod fund;
mod profile;
mod project;
mod signal_link;
mod tag;

pub use feed::{FeedEntry, SocialEntry};
pub use fund::{Fund, FundAttr, Investor};
pub use profile::LinkedinProfile;
pub use project::{Analytics, ProjectCreate, TrackedProject, ValidationIssue};
pub use signal_link::{NewSignalLink, SignalLink};
pub use tag::ProjectTag;
