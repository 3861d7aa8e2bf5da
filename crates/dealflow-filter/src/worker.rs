//! Batch admission driver.
//!
//! Jobs run one at a time. Each attempt gets its own event group, flushed to
//! the sink when the attempt ends. Retryable failures go to the back of the
//! queue until the job has used up its attempts.

use std::collections::VecDeque;

use dealflow_core::capabilities::{
    CompletionClient, EventSink, ProjectStore, Publisher, StoreError,
};
use dealflow_core::entities::ValidationIssue;
use dealflow_core::enums::{EventName, ProductLine};
use dealflow_core::events::EventCollector;
use dealflow_core::project::ProjectData;
use dealflow_core::signals::{FundId, InvestingEntity, LinkedinCompanyDetails, ProjectSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::admission::{Admission, AdmissionRequest};
use crate::error::AdmissionError;
use crate::named::Pipelines;

/// One queued admission, as read from a JSONL batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionJob {
    pub source: ProjectSource,
    /// Overrides the data derived from the source's LinkedIn record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_data: Option<ProjectData>,
    /// Fund signals added to the ones resolved from the source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<FundId>,
    pub line: ProductLine,
    #[serde(default)]
    pub attempts: u32,
}

impl AdmissionJob {
    #[must_use]
    pub fn project_data(&self) -> ProjectData {
        match (&self.project_data, &self.source) {
            (Some(data), _) => data.clone(),
            (None, ProjectSource::Linkedin(source)) => project_data_from_linkedin(&source.linkedin_details),
        }
    }
}

/// Map a scraped LinkedIn company onto [`ProjectData`]. Only present values
/// are set, so an update never clears stored fields.
#[must_use]
pub fn project_data_from_linkedin(details: &LinkedinCompanyDetails) -> ProjectData {
    let set = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Some(v.to_string()))
    };

    let mut data = ProjectData::default().with_title(details.title.trim());
    if let Some(website) = details.website.as_deref().filter(|w| !w.trim().is_empty()) {
        data = data.with_website(website);
    }
    data.logo = set(&details.logo);
    data.description = set(&details.about);
    data.crunchbase_url = set(&details.crunchbase_url);
    data.category = set(&details.category);
    data.industry = set(&details.industry);
    data.specialities = set(&details.specialities);
    data.analytics.location = set(&details.headquarters);
    data.analytics.founded = details.founded_year.map(Some);
    data.analytics.team_size = details.approx_team_size().map(Some);
    data
}

/// Final state of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Admitted,
    /// Failed for good: rejection, validation, no match.
    Failed,
    /// Failed with a retryable error and was queued again.
    Requeued,
    /// Retryable failure on the last allowed attempt.
    GaveUp,
}

/// Outcome of one attempt, handed to the batch callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub group_id: Uuid,
    pub attempt: u32,
    pub status: JobStatus,
    pub website: Option<String>,
    pub project_id: Option<i64>,
    pub error: Option<String>,
}

/// Totals of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub admitted: usize,
    pub failed: usize,
    pub gave_up: usize,
    pub retries: usize,
}

impl BatchReport {
    fn count(&mut self, status: JobStatus) {
        match status {
            JobStatus::Admitted => self.admitted += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Requeued => self.retries += 1,
            JobStatus::GaveUp => self.gave_up += 1,
        }
    }
}

pub struct Worker<'a, S, C, P, E> {
    store: &'a S,
    admission: Admission<'a, S, C, P>,
    sink: &'a E,
    max_attempts: u32,
}

impl<'a, S, C, P, E> Worker<'a, S, C, P, E>
where
    S: ProjectStore + Sync,
    C: CompletionClient + Sync,
    P: Publisher + Sync,
    E: EventSink + Sync,
{
    pub fn new(
        store: &'a S,
        completion: &'a C,
        publisher: &'a P,
        sink: &'a E,
        pipelines: &'a Pipelines,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            admission: Admission::new(store, completion, publisher, pipelines),
            sink,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Fund signals of a job: explicit ones first, then the source signal.
    /// Investor signals expand to the investor's funds.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the source names an unknown investor.
    pub async fn resolve_signals(&self, job: &AdmissionJob) -> Result<Vec<FundId>, StoreError> {
        let mut funds = job.signals.clone();
        let ProjectSource::Linkedin(source) = &job.source;
        if let Some(signal) = &source.signal {
            match signal.investing_entity() {
                InvestingEntity::Fund(fund) => funds.push(fund),
                InvestingEntity::Investor(investor) => {
                    let found = self.store.get_investor(investor.id).await?.ok_or_else(|| {
                        StoreError::NotFound {
                            entity: "investor",
                            id: investor.id.to_string(),
                        }
                    })?;
                    funds.extend(found.fund_ids.into_iter().map(|id| FundId { id }));
                }
            }
        }
        let mut seen = Vec::with_capacity(funds.len());
        funds.retain(|fund| {
            if seen.contains(&fund.id) {
                false
            } else {
                seen.push(fund.id);
                true
            }
        });
        Ok(funds)
    }

    /// Run one attempt of `job` and flush its events.
    pub async fn run_job(&self, job: &AdmissionJob) -> JobReport {
        let mut events = EventCollector::new();
        let attempt = job.attempts + 1;
        let project_data = job.project_data();
        let website = project_data.website().map(str::to_string);
        debug!(group = %events.group_id, attempt, website = ?website, "running admission job");

        let result = self.attempt(job, &project_data, &mut events).await;
        let report = match result {
            Ok(project_id) => JobReport {
                group_id: events.group_id,
                attempt,
                status: JobStatus::Admitted,
                website,
                project_id: Some(project_id),
                error: None,
            },
            Err(err) => {
                let status = match (err.is_retryable(), attempt < self.max_attempts) {
                    (false, _) => JobStatus::Failed,
                    (true, true) => JobStatus::Requeued,
                    (true, false) => JobStatus::GaveUp,
                };
                JobReport {
                    group_id: events.group_id,
                    attempt,
                    status,
                    website,
                    project_id: err.project_id(),
                    error: Some(err.to_string()),
                }
            }
        };

        let flushed = events.drain();
        if let Err(err) = self.sink.record(&flushed).await {
            warn!(group = %report.group_id, error = %err, "failed to record admission events");
        }
        report
    }

    async fn attempt(
        &self,
        job: &AdmissionJob,
        project_data: &ProjectData,
        events: &mut EventCollector,
    ) -> Result<i64, AdmissionError> {
        let source = match normalize_source(&job.source) {
            Ok(source) => source,
            Err(reason) => {
                events.push(
                    events
                        .event(EventName::ValidationFailed)
                        .details(reason.clone())
                        .payload(serde_json::to_value(&job.source).unwrap_or_default()),
                );
                return Err(AdmissionError::Validation {
                    issues: vec![ValidationIssue {
                        field: "source".to_string(),
                        message: reason,
                    }],
                    project_data: serde_json::to_value(project_data).unwrap_or_default(),
                });
            }
        };

        let signals = match self.resolve_signals(job).await {
            Ok(signals) => signals,
            Err(err) => {
                events.push(
                    events
                        .event(EventName::UnexpectedFilterFailure)
                        .details(err.to_string()),
                );
                return Err(err.into());
            }
        };

        let admitted = self
            .admission
            .inject_project(
                AdmissionRequest {
                    signals: &signals,
                    project_data,
                    source: Some(&source),
                    line: job.line,
                },
                events,
            )
            .await?;
        Ok(admitted.project.id)
    }

    /// Run every job, re-queueing retryable failures behind the rest.
    /// `on_done` sees every attempt.
    pub async fn run_batch<I, F>(&self, jobs: I, mut on_done: F) -> BatchReport
    where
        I: IntoIterator<Item = AdmissionJob>,
        F: FnMut(&JobReport),
    {
        let mut queue: VecDeque<AdmissionJob> = jobs.into_iter().collect();
        let mut report = BatchReport::default();
        info!(jobs = queue.len(), max_attempts = self.max_attempts, "starting admission batch");

        while let Some(mut job) = queue.pop_front() {
            let outcome = self.run_job(&job).await;
            report.count(outcome.status);
            if outcome.status == JobStatus::Requeued {
                job.attempts += 1;
                queue.push_back(job);
            }
            on_done(&outcome);
        }

        info!(
            admitted = report.admitted,
            failed = report.failed,
            gave_up = report.gave_up,
            retries = report.retries,
            "admission batch finished"
        );
        report
    }
}

fn normalize_source(source: &ProjectSource) -> Result<ProjectSource, String> {
    match source {
        ProjectSource::Linkedin(linkedin) => linkedin
            .clone()
            .normalized()
            .map(ProjectSource::Linkedin)
            .map_err(|err| err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubCompletion, test_service};
    use dealflow_config::FilterAssets;
    use dealflow_core::capabilities::CompletionError;
    use dealflow_core::signals::{InvestorId, LinkedinPostSignal, LinkedinSource, Signal};
    use dealflow_db::service::FlowService;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn details() -> LinkedinCompanyDetails {
        LinkedinCompanyDetails {
            linkedin_url: "linkedin.com/company/acme-robotics".to_string(),
            title: "Acme Robotics".to_string(),
            about: Some("Acme builds autonomous warehouse robots for mid-size distributors.".into()),
            website: Some("https://www.AcmeRobotics.io/".into()),
            headquarters: Some("Austin, Texas, USA".into()),
            founded_year: Some(2020),
            company_size: Some("11-50 employees".into()),
            ..LinkedinCompanyDetails::default()
        }
    }

    fn job(investor: i64) -> AdmissionJob {
        AdmissionJob {
            source: ProjectSource::Linkedin(LinkedinSource {
                signal: Some(Signal::Linkedin(LinkedinPostSignal {
                    investing_entity: InvestorId { id: investor },
                    post_id: 1,
                    leader_id: 2,
                    picked_up_date: chrono::Utc::now(),
                })),
                company_url: "https://linkedin.com/company/acme-robotics/".to_string(),
                linkedin_details: details(),
            }),
            project_data: None,
            signals: Vec::new(),
            line: ProductLine::Startup,
            attempts: 0,
        }
    }

    async fn seeded() -> (FlowService, i64, i64) {
        let store = test_service().await;
        let fund = store.upsert_fund("Northwind", Some("Warehouse automation")).await.unwrap();
        let investor = store
            .upsert_investor("Dana Scout", Some("https://www.linkedin.com/in/dana"), &[fund.id])
            .await
            .unwrap();
        (store, fund.id, investor.id)
    }

    #[test]
    fn linkedin_details_map_to_project_data() {
        let data = project_data_from_linkedin(&details());
        assert_eq!(data.title(), Some("Acme Robotics"));
        assert_eq!(data.website(), Some("https://acmerobotics.io"));
        assert_eq!(data.analytics.team_size, Some(Some(30)));
        assert_eq!(data.analytics.founded, Some(Some(2020)));
        assert_eq!(data.logo, None);
    }

    #[test]
    fn job_reads_from_jsonl_line() {
        let job: AdmissionJob = serde_json::from_value(json!({
            "source": {
                "source_type": "linkedin",
                "company_url": "https://www.linkedin.com/company/acme-robotics",
                "linkedin_details": {
                    "linkedin_url": "https://www.linkedin.com/company/acme-robotics",
                    "title": "Acme Robotics"
                }
            },
            "line": "startup"
        }))
        .unwrap();
        assert_eq!(job.attempts, 0);
        assert!(job.signals.is_empty());
    }

    #[tokio::test]
    async fn investor_signal_expands_to_funds() {
        let (store, fund, investor) = seeded().await;
        let completion = StubCompletion::answering("true");
        let pipelines = Pipelines::from_assets(&FilterAssets::builtin(), 30, "m").unwrap();
        let worker = Worker::new(&store, &completion, &store, &store, &pipelines, 3);

        let mut explicit = job(investor);
        explicit.signals = vec![FundId { id: fund }];
        let funds = worker.resolve_signals(&explicit).await.unwrap();
        assert_eq!(funds, vec![FundId { id: fund }]);

        let unknown = worker.resolve_signals(&job(999)).await.unwrap_err();
        assert!(matches!(unknown, StoreError::NotFound { entity: "investor", .. }));
    }

    #[tokio::test]
    async fn batch_admits_and_flushes_events() {
        let (store, _, investor) = seeded().await;
        let completion = StubCompletion::answering("true");
        let pipelines = Pipelines::from_assets(&FilterAssets::builtin(), 30, "m").unwrap();
        let worker = Worker::new(&store, &completion, &store, &store, &pipelines, 3);

        let mut reports = Vec::new();
        let report = worker
            .run_batch(vec![job(investor)], |r| reports.push(r.clone()))
            .await;

        assert_eq!(report.admitted, 1);
        assert_eq!(reports[0].status, JobStatus::Admitted);
        let events = store.events_for_group(reports[0].group_id).await.unwrap();
        assert_eq!(events.last().unwrap().event_name, EventName::ProjectCreated);
    }

    #[tokio::test]
    async fn retryable_failures_are_requeued_until_exhausted() {
        let (store, _, investor) = seeded().await;
        let completion = StubCompletion::with(|_| Err(CompletionError::Transport("reset".into())));
        let pipelines = Pipelines::from_assets(&FilterAssets::builtin(), 30, "m").unwrap();
        let worker = Worker::new(&store, &completion, &store, &store, &pipelines, 2);

        let attempts = AtomicUsize::new(0);
        let report = worker
            .run_batch(vec![job(investor)], |_| {
                attempts.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(report.retries, 1);
        assert_eq!(report.gave_up, 1);
        assert_eq!(completion.calls(), 2);
    }

    #[tokio::test]
    async fn one_bad_job_does_not_stop_the_batch() {
        let (store, _, investor) = seeded().await;
        let completion = StubCompletion::answering("true");
        let pipelines = Pipelines::from_assets(&FilterAssets::builtin(), 30, "m").unwrap();
        let worker = Worker::new(&store, &completion, &store, &store, &pipelines, 3);

        let mut broken = job(investor);
        let ProjectSource::Linkedin(source) = &mut broken.source;
        source.company_url = "https://example.com/acme".to_string();

        let report = worker.run_batch(vec![broken, job(investor)], |_| {}).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.admitted, 1);
    }
}
