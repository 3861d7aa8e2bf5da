//! # dealflow-filter
//!
//! Filter pipelines and signal admission for dealflow.
//!
//! - [`filters`]: range, regex, tags, LLM and combined filters. A "no" is a
//!   [`FilterResult`](dealflow_core::filters::FilterResult) with
//!   `passed = false`, never an error.
//! - [`preprocess`]: steps that derive prompt context (company description,
//!   fund thesis, industry tags) or fail with a precondition.
//! - [`pipeline`]: the short-circuiting executor, [`pipeline::apply_filters`].
//! - [`named`]: the five pipelines admission runs.
//! - [`admission`]: the admission state machine, [`admission::Admission`].
//! - [`worker`]: sequential batch driver with per-job retries.
//!
//! Everything here is generic over the collaborator traits in
//! [`dealflow_core::capabilities`]; `dealflow-db` and `dealflow-llm` provide
//! the production implementations.

pub mod admission;
pub mod context;
pub mod error;
pub mod filters;
pub mod named;
pub mod pipeline;
pub mod preprocess;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use admission::{Admission, AdmissionRequest, Admitted};
pub use context::{FilterContext, FilterEnv};
pub use error::{AdmissionError, FilterError, PreconditionFailure};
pub use named::{PipelineName, Pipelines};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineStep, apply_filters};
pub use worker::{AdmissionJob, BatchReport, JobReport, JobStatus, Worker};
