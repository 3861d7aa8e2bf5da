//! Shared fixtures for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use dealflow_core::capabilities::{CompletionClient, CompletionError};
use dealflow_core::project::ProjectData;
use dealflow_db::service::FlowService;

type Responder = Box<dyn Fn(&str) -> Result<String, CompletionError> + Send + Sync>;

/// Completion stub that counts calls and records prompts.
pub struct StubCompletion {
    responder: Responder,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    pub fn with(responder: impl Fn(&str) -> Result<String, CompletionError> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::with(move |_| Ok(answer.clone()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl CompletionClient for StubCompletion {
    async fn complete(&self, prompt: &str, _model: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

pub async fn test_service() -> FlowService {
    FlowService::new_local(":memory:", None).await.unwrap()
}

/// A company with enough description for the description preprocessor.
pub fn acme() -> ProjectData {
    ProjectData::default()
        .with_title("Acme Robotics")
        .with_website("https://acmerobotics.io")
        .with_about("Acme builds autonomous warehouse robots for mid-size distributors.")
        .with_team_size(12)
        .with_founded(2020)
        .with_location("Austin, Texas, USA")
}
