//! Admission: turn one candidate company plus fund signals into a tracked
//! company with signal links, or into a recorded rejection.
//!
//! Every attempt writes its events into the caller's [`EventCollector`]. A
//! failing attempt still leaves exactly one failure event describing why.

use chrono::Utc;
use dealflow_core::capabilities::{CompletionClient, ProjectStore, Publisher, StoreError};
use dealflow_core::entities::{LinkedinProfile, NewSignalLink, ProjectCreate, TrackedProject};
use dealflow_core::enums::{EventName, ProductLine, ProjectStatus};
use dealflow_core::events::EventCollector;
use dealflow_core::filters::FilterResult;
use dealflow_core::project::ProjectData;
use dealflow_core::signals::{FundId, ProjectSource, YearMonth};
use dealflow_core::urls::url_root;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::context::{FilterContext, FilterEnv};
use crate::error::AdmissionError;
use crate::named::Pipelines;
use crate::pipeline::{Pipeline, PipelineOutcome, apply_filters};

/// Input of one admission attempt.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionRequest<'a> {
    /// Candidate funds, evaluated in order.
    pub signals: &'a [FundId],
    pub project_data: &'a ProjectData,
    pub source: Option<&'a ProjectSource>,
    pub line: ProductLine,
}

/// Result of a successful admission.
#[derive(Debug, Clone, PartialEq)]
pub struct Admitted {
    pub project: TrackedProject,
    pub created: bool,
    /// Funds whose signal was accepted, historic ones included.
    pub signals_added: Vec<FundId>,
    /// Signal links actually inserted by this attempt.
    pub new_links: usize,
    pub published: bool,
}

/// Admission state machine over the store, completion and publishing
/// capabilities.
pub struct Admission<'a, S, C, P> {
    store: &'a S,
    completion: &'a C,
    publisher: &'a P,
    pipelines: &'a Pipelines,
}

impl<'a, S, C, P> Admission<'a, S, C, P>
where
    S: ProjectStore + Sync,
    C: CompletionClient + Sync,
    P: Publisher + Sync,
{
    pub const fn new(store: &'a S, completion: &'a C, publisher: &'a P, pipelines: &'a Pipelines) -> Self {
        Self {
            store,
            completion,
            publisher,
            pipelines,
        }
    }

    const fn env(&self) -> FilterEnv<'a, S, C> {
        FilterEnv::new(self.store, self.completion)
    }

    /// Admit a company for `request.line`.
    ///
    /// On failure, one event naming the cause is pushed to `events` before
    /// the error is returned.
    ///
    /// # Errors
    ///
    /// Any [`AdmissionError`]; see its variants for the failure taxonomy.
    pub async fn inject_project(
        &self,
        request: AdmissionRequest<'_>,
        events: &mut EventCollector,
    ) -> Result<Admitted, AdmissionError> {
        match self.admit(request, events).await {
            Ok(admitted) => Ok(admitted),
            Err(err) => {
                record_failure(&err, request.project_data, events);
                info!(group = %events.group_id, error = %err, "admission failed");
                Err(err)
            }
        }
    }

    async fn admit(
        &self,
        request: AdmissionRequest<'_>,
        events: &mut EventCollector,
    ) -> Result<Admitted, AdmissionError> {
        let AdmissionRequest {
            signals,
            project_data,
            source,
            line,
        } = request;

        let profile = match source {
            Some(source) => Some(self.resolve_profile(source, project_data).await?),
            None => None,
        };

        let create = ProjectCreate::validate(project_data, line.project_type()).map_err(|issues| {
            AdmissionError::Validation {
                issues,
                project_data: serde_json::to_value(project_data).unwrap_or(Value::Null),
            }
        })?;

        let (mut project, existed) = self.store.find_or_create_project(&create).await?;
        if let Some(profile) = &profile {
            self.store.link_profile(profile.id, project.id).await?;
        }
        if existed {
            project.apply_update(project_data);
            self.store.save_project(&project).await?;
        }
        debug!(project_id = project.id, existed, website = ?project.website, "company resolved");

        if project.classification(line) == Some(false) {
            return Err(AdmissionError::Rejected {
                project_id: project.id,
                line,
            });
        }

        let historic = if existed {
            self.store.project_fund_ids(project.id).await?
        } else {
            Vec::new()
        };

        let passed = match line {
            ProductLine::Startup => {
                self.startup_gates(&project, project_data, events).await?;
                self.match_signals(&self.pipelines.signal, &project, project_data, signals, &historic, events)
                    .await?
            }
            ProductLine::B2b => {
                self.b2b_gate(&project, project_data, events).await?;
                self.match_signals(
                    &self.pipelines.b2b_signal,
                    &project,
                    project_data,
                    signals,
                    &historic,
                    events,
                )
                .await?
            }
        };

        let timeframe = YearMonth::of(
            source
                .and_then(ProjectSource::picked_up_date)
                .unwrap_or_else(Utc::now),
        );
        let provenance = source.and_then(|s| serde_json::to_value(s).ok());
        let mut new_links = 0;
        for fund in &passed {
            if self.store.get_fund(fund.id).await?.is_none() {
                return Err(StoreError::NotFound {
                    entity: "fund",
                    id: fund.id.to_string(),
                }
                .into());
            }
            let link = NewSignalLink {
                fund_id: fund.id,
                project_id: project.id,
                timeframe,
                source: provenance.clone(),
            };
            if self.store.add_signal_link(&link).await? {
                new_links += 1;
            }
        }

        if !project.status.is_terminal() {
            project.status = ProjectStatus::Review;
        }
        project.set_classification(line, true);
        self.store.save_project(&project).await?;

        let published = match self.publisher.publish(project.id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(project_id = project.id, error = %err, "project failed to publish");
                events.push(
                    events
                        .event(EventName::PublishFailed)
                        .project(project.id)
                        .details(err.to_string()),
                );
                false
            }
        };

        let name = if existed {
            EventName::ProjectUpdated
        } else {
            EventName::ProjectCreated
        };
        info!(
            project_id = project.id,
            website = ?project.website,
            signals = passed.len(),
            new_links,
            "{name}"
        );
        events.push(
            events.event(name).project(project.id).payload(json!({
                "project_data": project_data,
                "signal_added": passed,
            })),
        );

        Ok(Admitted {
            project,
            created: !existed,
            signals_added: passed,
            new_links,
            published,
        })
    }

    /// Upsert the source profile and refuse to re-point it at another website.
    async fn resolve_profile(
        &self,
        source: &ProjectSource,
        project_data: &ProjectData,
    ) -> Result<LinkedinProfile, AdmissionError> {
        let ProjectSource::Linkedin(linkedin) = source;
        let profile = self
            .store
            .upsert_linkedin_profile(&linkedin.company_url, &linkedin.linkedin_details)
            .await?;

        let Some(parent_id) = profile.tracked_project_id else {
            return Ok(profile);
        };
        let Some(parent) = self.store.get_project(parent_id).await? else {
            return Ok(profile);
        };
        match (parent.website.as_deref(), project_data.website()) {
            (None, _) => {
                warn!(
                    profile = %profile.linkedin_url,
                    parent_id,
                    "profile is linked to a company without a website"
                );
            }
            (Some(existing), Some(incoming)) if url_root(existing) != url_root(incoming) => {
                return Err(AdmissionError::Duplicate {
                    linkedin_url: profile.linkedin_url.clone(),
                    existing_project_id: parent_id,
                    existing_website: existing.to_string(),
                    website: incoming.to_string(),
                });
            }
            _ => {}
        }
        Ok(profile)
    }

    async fn startup_gates(
        &self,
        project: &TrackedProject,
        project_data: &ProjectData,
        events: &mut EventCollector,
    ) -> Result<(), AdmissionError> {
        if project.is_startup == Some(true) {
            events.push(
                events
                    .event(EventName::FilterIsStartupPassedHistoric)
                    .project(project.id)
                    .project_data(serde_json::to_value(project).unwrap_or(Value::Null)),
            );
        } else {
            let result = self
                .gate(&self.pipelines.is_startup, project, project_data, ProductLine::Startup)
                .await
                .map_err(|failed| failed.into_error(EventName::FilterIsStartupFailed))?;
            events.push(
                events
                    .event(EventName::FilterIsStartupPassed)
                    .project(project.id)
                    .filters(vec![result]),
            );
        }

        let result = self
            .gate(&self.pipelines.company, project, project_data, ProductLine::Startup)
            .await
            .map_err(|failed| failed.into_error(EventName::CompanyFilterFailed))?;
        events.push(
            events
                .event(EventName::CompanyFilterPassed)
                .project(project.id)
                .filters(vec![result]),
        );
        Ok(())
    }

    async fn b2b_gate(
        &self,
        project: &TrackedProject,
        project_data: &ProjectData,
        events: &mut EventCollector,
    ) -> Result<(), AdmissionError> {
        let result = self
            .gate(&self.pipelines.b2b_company, project, project_data, ProductLine::B2b)
            .await
            .map_err(|failed| failed.into_error(EventName::FilterIsValidCompetitorFailed))?;
        events.push(
            events
                .event(EventName::FilterIsValidCompetitorPassed)
                .project(project.id)
                .filters(vec![result]),
        );
        Ok(())
    }

    /// Run a company-level gate; a "no" marks the company rejected for `line`.
    async fn gate(
        &self,
        pipeline: &Pipeline,
        project: &TrackedProject,
        project_data: &ProjectData,
        line: ProductLine,
    ) -> Result<FilterResult, GateFailure> {
        let outcome = apply_filters(self.env(), pipeline, project_data, FilterContext::new())
            .await
            .map_err(|err| GateFailure::Error(err.into()))?;
        match outcome {
            PipelineOutcome::Completed(result) if result.passed => Ok(result),
            PipelineOutcome::Completed(result) => {
                info!(project_id = project.id, pipeline = %pipeline.id, %line, "company rejected");
                self.store
                    .set_classification(project.id, line, false)
                    .await
                    .map_err(|err| GateFailure::Error(err.into()))?;
                Err(GateFailure::Rejected {
                    project_id: project.id,
                    result: Box::new(result),
                })
            }
            PipelineOutcome::PreconditionFailed(failure) => {
                Err(GateFailure::Error(AdmissionError::Precondition {
                    project_id: project.id,
                    failure,
                }))
            }
        }
    }

    /// Evaluate every signal in order; returns the funds that passed.
    async fn match_signals(
        &self,
        pipeline: &Pipeline,
        project: &TrackedProject,
        project_data: &ProjectData,
        signals: &[FundId],
        historic: &[i64],
        events: &mut EventCollector,
    ) -> Result<Vec<FundId>, AdmissionError> {
        let mut passed = Vec::new();
        let mut results = Vec::new();

        for signal in signals {
            if historic.contains(&signal.id) {
                events.push(
                    events
                        .event(EventName::FilterSignalPassedHistoric)
                        .project(project.id)
                        .project_data(serde_json::to_value(project).unwrap_or(Value::Null)),
                );
                passed.push(*signal);
                continue;
            }

            let context = FilterContext::for_signal(*signal);
            match apply_filters(self.env(), pipeline, project_data, context).await? {
                PipelineOutcome::Completed(result) => {
                    let name = if result.passed {
                        passed.push(*signal);
                        EventName::FilterSignalPassed
                    } else {
                        EventName::FilterSignalFailed
                    };
                    debug!(project_id = project.id, fund_id = signal.id, %name, "signal evaluated");
                    events.push(
                        events
                            .event(name)
                            .project(project.id)
                            .filters(vec![result.clone()]),
                    );
                    results.push(result);
                }
                PipelineOutcome::PreconditionFailed(failure) => {
                    warn!(
                        project_id = project.id,
                        fund_id = signal.id,
                        reason = %failure.reason,
                        "signal skipped"
                    );
                    events.push(
                        events
                            .event(EventName::FilterPrerequisitesFailed)
                            .project(project.id)
                            .details(failure.reason.clone())
                            .payload(failure.inputs),
                    );
                }
            }
        }

        if passed.is_empty() {
            return Err(AdmissionError::NoSignalMatched {
                project_id: project.id,
                results,
            });
        }
        Ok(passed)
    }
}

/// A company-level gate that did not pass.
enum GateFailure {
    Rejected {
        project_id: i64,
        result: Box<FilterResult>,
    },
    Error(AdmissionError),
}

impl GateFailure {
    fn into_error(self, gate: EventName) -> AdmissionError {
        match self {
            Self::Rejected { project_id, result } => AdmissionError::GateFailed {
                project_id,
                gate,
                result,
            },
            Self::Error(err) => err,
        }
    }
}

/// Push the one event describing why an attempt failed.
fn record_failure(err: &AdmissionError, project_data: &ProjectData, events: &mut EventCollector) {
    let data = || serde_json::to_value(project_data).unwrap_or(Value::Null);
    let event = match err {
        AdmissionError::Validation {
            issues,
            project_data,
        } => events.event(EventName::ValidationFailed).payload(json!({
            "project_data": project_data,
            "errors": issues,
        })),
        AdmissionError::Duplicate {
            existing_project_id,
            ..
        } => events
            .event(EventName::DuplicateProject)
            .project(*existing_project_id)
            .details(err.to_string())
            .project_data(data()),
        AdmissionError::Rejected { project_id, line } => events
            .event(EventName::ProjectRejected)
            .project(*project_id)
            .details(format!(
                "company with website {:?} was previously classified as not {line}",
                project_data.website().unwrap_or_default()
            ))
            .payload(json!({ "project_data": data() })),
        AdmissionError::GateFailed {
            project_id,
            gate,
            result,
        } => events
            .event(*gate)
            .project(*project_id)
            .filters(vec![(**result).clone()]),
        AdmissionError::Precondition {
            project_id,
            failure,
        } => events
            .event(EventName::FilterPrerequisitesFailed)
            .project(*project_id)
            .details(failure.reason.clone())
            .payload(failure.inputs.clone()),
        AdmissionError::NoSignalMatched {
            project_id,
            results,
        } => events
            .event(EventName::NoSignalMatched)
            .project(*project_id)
            .details("no signal matched against any of the funds' theses")
            .filters(results.clone()),
        AdmissionError::Filter(_) | AdmissionError::Store(_) => {
            let mut event = events
                .event(EventName::UnexpectedFilterFailure)
                .details(err.to_string())
                .project_data(data());
            event.project_id = err.project_id();
            event
        }
    };
    events.push(event);
}
