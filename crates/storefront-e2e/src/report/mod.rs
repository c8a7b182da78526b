// Report sink - Allure results writer
//
// A `Report` collects labels, steps and attachments for one test case and
// writes them as `<uuid>-result.json` into the results directory when the
// case finishes. Attachments are written immediately as
// `<uuid>-attachment.<ext>` files next to it.
//
// All methods take `&self` so a report can be shared by the case harness,
// the evidence helper and the test body at the same time.

pub mod model;

pub use model::{Attachment, Label, MediaType, Stage, Status, StatusDetails, StepResult, TestResult};

use crate::error::{Error, Result};
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Final outcome handed to [`Report::finish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub message: Option<String>,
}

impl Outcome {
    pub fn passed() -> Self {
        Self {
            status: Status::Passed,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            message: Some(message.into()),
        }
    }

    pub fn broken(message: impl Into<String>) -> Self {
        Self {
            status: Status::Broken,
            message: Some(message.into()),
        }
    }

    /// Outcome of a body that returned an error: browser or HTTP transport
    /// trouble is `broken`, anything else `failed`.
    pub fn from_error(error: &Error) -> Self {
        if error.is_infrastructure() {
            Self::broken(error.to_string())
        } else {
            Self::failed(error.to_string())
        }
    }

    /// Outcome of a body that panicked, keeping the assertion message.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::failed(panic_message(payload))
    }
}

/// Message carried by a panic payload (`assert!` produces `String` or `&str`)
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked with a non-string payload".to_string()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

struct ReportState {
    result: TestResult,
    /// Open steps, innermost last
    open_steps: Vec<StepResult>,
}

impl ReportState {
    fn push_attachment(&mut self, attachment: Attachment) {
        match self.open_steps.last_mut() {
            Some(step) => step.attachments.push(attachment),
            None => self.result.attachments.push(attachment),
        }
    }

    fn close_step(&mut self, status: Status, message: Option<String>) {
        let Some(mut step) = self.open_steps.pop() else {
            return;
        };
        step.status = Some(status);
        step.status_details = message.map(|message| StatusDetails {
            message: Some(message),
            trace: None,
        });
        step.stage = Stage::Finished;
        step.stop = Some(now_millis());
        match self.open_steps.last_mut() {
            Some(parent) => parent.steps.push(step),
            None => self.result.steps.push(step),
        }
    }
}

/// Allure record for a single test case.
pub struct Report {
    dir: PathBuf,
    state: Mutex<ReportState>,
}

impl Report {
    /// Starts a record named `name`, to be written into `dir`.
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        let uuid = Uuid::new_v4().to_string();
        let result = TestResult {
            uuid,
            history_id: name.to_string(),
            name: name.to_string(),
            full_name: name.to_string(),
            status: None,
            status_details: None,
            stage: Stage::Running,
            start: now_millis(),
            stop: None,
            labels: vec![
                Label {
                    name: "language".to_string(),
                    value: "rust".to_string(),
                },
                Label {
                    name: "framework".to_string(),
                    value: "playwright-rs".to_string(),
                },
            ],
            steps: Vec::new(),
            attachments: Vec::new(),
        };

        Self {
            dir: dir.into(),
            state: Mutex::new(ReportState {
                result,
                open_steps: Vec::new(),
            }),
        }
    }

    /// Adds an arbitrary label
    pub fn label(&self, name: &str, value: &str) {
        self.state.lock().result.labels.push(Label {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn feature(&self, value: &str) {
        self.label("feature", value);
    }

    pub fn story(&self, value: &str) {
        self.label("story", value);
    }

    pub fn tag(&self, value: &str) {
        self.label("tag", value);
    }

    /// Runs `action` as a named step.
    ///
    /// Attachments made while the step runs belong to it. The step is closed
    /// as passed, failed or broken; a panic inside it is re-raised after the
    /// step is recorded as failed.
    pub async fn step<T, Fut>(&self, name: &str, action: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        tracing::debug!(step = name, "Step started");
        self.state
            .lock()
            .open_steps
            .push(StepResult::started(name, now_millis()));

        match AssertUnwindSafe(action).catch_unwind().await {
            Ok(Ok(value)) => {
                self.state.lock().close_step(Status::Passed, None);
                Ok(value)
            }
            Ok(Err(e)) => {
                let outcome = Outcome::from_error(&e);
                self.state.lock().close_step(outcome.status, outcome.message);
                Err(e)
            }
            Err(panic) => {
                self.state
                    .lock()
                    .close_step(Status::Failed, Some(panic_message(panic.as_ref())));
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// Writes `bytes` as an attachment of the current step (or the case).
    pub async fn attach_bytes(&self, name: &str, media_type: MediaType, bytes: &[u8]) -> Result<()> {
        let source = attachment_file_name(media_type);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&source), bytes).await?;
        self.record_attachment(name, media_type, source);
        Ok(())
    }

    /// Attaches a text snippet
    pub async fn attach_text(&self, name: &str, text: &str) -> Result<()> {
        self.attach_bytes(name, MediaType::Text, text.as_bytes()).await
    }

    /// Copies a file on disk (e.g. a recording) into the results directory.
    pub async fn attach_file(&self, name: &str, media_type: MediaType, path: &Path) -> Result<()> {
        let source = attachment_file_name(media_type);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::copy(path, self.dir.join(&source)).await?;
        self.record_attachment(name, media_type, source);
        Ok(())
    }

    fn record_attachment(&self, name: &str, media_type: MediaType, source: String) {
        tracing::debug!(name, source = %source, "Attachment recorded");
        self.state.lock().push_attachment(Attachment {
            name: name.to_string(),
            source,
            media_type: media_type.mime().to_string(),
        });
    }

    /// Copy of the record as it stands
    pub fn snapshot(&self) -> TestResult {
        self.state.lock().result.clone()
    }

    /// Closes any step still open, stamps the outcome and writes the result file.
    ///
    /// Returns the path of the written `<uuid>-result.json`.
    pub async fn finish(&self, outcome: Outcome) -> Result<PathBuf> {
        let result = {
            let mut state = self.state.lock();
            while !state.open_steps.is_empty() {
                state.close_step(outcome.status, None);
            }
            state.result.status = Some(outcome.status);
            state.result.status_details = outcome.message.map(|message| StatusDetails {
                message: Some(message),
                trace: None,
            });
            state.result.stage = Stage::Finished;
            state.result.stop = Some(now_millis());
            state.result.clone()
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}-result.json", result.uuid));
        tokio::fs::write(&path, serde_json::to_vec_pretty(&result)?).await?;

        tracing::debug!(
            name = %result.name,
            status = ?outcome.status,
            path = %path.display(),
            "Report written"
        );
        Ok(path)
    }
}

fn attachment_file_name(media_type: MediaType) -> String {
    format!("{}-attachment.{}", Uuid::new_v4(), media_type.extension())
}
