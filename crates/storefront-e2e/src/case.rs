// Case harnesses - one report per check, one session per UI check
//
// `ui_case` is the fixture every UI check goes through: it opens a session,
// hands the body a `UiCase`, closes the session whatever happened, attaches
// the recording and writes the Allure result. `api_case` does the same for
// API checks, minus the browser.

use crate::api::{ApiResponse, ReqresClient};
use crate::config::SuiteConfig;
use crate::error::Result;
use crate::evidence::Evidence;
use crate::pages::{InventoryPage, LoginPage};
use crate::report::{MediaType, Outcome, Report};
use crate::session::{Session, Teardown};
use futures_util::FutureExt;
use playwright_rs::Page;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;

/// Report metadata for a check.
#[derive(Debug, Clone)]
pub struct CaseMeta {
    pub name: String,
    pub feature: Option<String>,
    pub story: Option<String>,
    pub tags: Vec<String>,
    /// Attachment name of the session recording
    pub video_name: String,
}

impl CaseMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            video_name: format!("Video_{name}"),
            name,
            feature: None,
            story: None,
            tags: Vec::new(),
        }
    }

    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn story(mut self, story: impl Into<String>) -> Self {
        self.story = Some(story.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the attachment name of the recording
    pub fn video(mut self, name: impl Into<String>) -> Self {
        self.video_name = name.into();
        self
    }

    fn start_report(&self, dir: &Path) -> Report {
        let report = Report::new(dir, &self.name);
        if let Some(feature) = &self.feature {
            report.feature(feature);
        }
        if let Some(story) = &self.story {
            report.story(story);
        }
        for tag in &self.tags {
            report.tag(tag);
        }
        report
    }
}

/// What a UI check body gets to work with.
pub struct UiCase<'a> {
    session: &'a Session,
    report: &'a Report,
    config: &'a SuiteConfig,
}

impl<'a> UiCase<'a> {
    pub fn page(&self) -> &'a Page {
        self.session.page()
    }

    pub fn report(&self) -> &'a Report {
        self.report
    }

    pub fn evidence(&self) -> Evidence<'a> {
        Evidence::new(self.session.page(), self.report)
    }

    /// Login page object bound to the configured storefront
    pub fn login_page(&self) -> LoginPage<'a> {
        LoginPage::new(self.session.page(), self.config.storefront_url.as_str())
    }

    pub fn inventory_page(&self) -> InventoryPage<'a> {
        InventoryPage::new(self.session.page())
    }

    /// Runs `action` as a named report step
    pub async fn step<T, Fut>(&self, name: &str, action: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.report.step(name, action).await
    }
}

/// Runs a UI check in its own browser session.
///
/// The session is closed on every exit path. Its recording is attached as
/// WEBM whether the body passed, failed or panicked; then the result file is
/// written and the body's panic, if any, is resumed unchanged.
///
/// # Errors
///
/// Launch failures, body errors, and teardown problems (including a missing
/// recording) after an otherwise passing body.
pub async fn ui_case<F, T>(config: &SuiteConfig, meta: CaseMeta, body: F) -> Result<T>
where
    F: AsyncFnOnce(&UiCase<'_>) -> Result<T>,
{
    let report = meta.start_report(&config.results_dir);
    let report_ref = &report;
    tracing::info!(case = %meta.name, "UI case started");

    let run = Session::run(config, async move |session: &Session| -> Result<T> {
        let case = UiCase {
            session,
            report: report_ref,
            config,
        };
        body(&case).await
    })
    .await;

    let finished = match run {
        Ok(finished) => finished,
        Err(e) => {
            // Nothing ran, so there is nothing to attach
            if let Err(write_err) = report.finish(Outcome::broken(e.to_string())).await {
                tracing::warn!("Failed to write report for {}: {}", meta.name, write_err);
            }
            return Err(e);
        }
    };

    let video = attach_recording(&report, &meta, &finished.teardown).await;

    let outcome = match &finished.outcome {
        Err(panic) => Outcome::from_panic(panic.as_ref()),
        Ok(Err(e)) => Outcome::from_error(e),
        Ok(Ok(_)) => match (&finished.teardown.closed, &finished.teardown.video, &video) {
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => Outcome::broken(e.to_string()),
            _ => Outcome::passed(),
        },
    };
    tracing::info!(case = %meta.name, status = ?outcome.status, "UI case finished");

    let written = report.finish(outcome).await;
    if let Err(e) = &written {
        tracing::warn!("Failed to write report for {}: {}", meta.name, e);
    }

    let value = finished.into_result()?;
    video?;
    written?;
    Ok(value)
}

/// Attaches the session recording whenever one was found, even if closing
/// the session reported an error.
async fn attach_recording(report: &Report, meta: &CaseMeta, teardown: &Teardown) -> Result<()> {
    match &teardown.video {
        Ok(path) => report.attach_file(&meta.video_name, MediaType::Webm, path).await,
        Err(e) => {
            tracing::warn!("No recording to attach for {}: {}", meta.name, e);
            Ok(())
        }
    }
}

/// What an API check body gets to work with.
pub struct ApiCase<'a> {
    client: &'a ReqresClient,
    report: &'a Report,
}

impl<'a> ApiCase<'a> {
    pub fn client(&self) -> &'a ReqresClient {
        self.client
    }

    pub fn report(&self) -> &'a Report {
        self.report
    }

    /// Runs `action` as a named report step
    pub async fn step<T, Fut>(&self, name: &str, action: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.report.step(name, action).await
    }

    /// Attaches status and body of `response` as text evidence
    pub async fn record(&self, name: &str, response: &ApiResponse) -> Result<()> {
        let body = serde_json::to_string_pretty(&response.body)?;
        self.report
            .attach_text(name, &format!("HTTP {}\n\n{}", response.status, body))
            .await
    }
}

/// Runs an API check and writes its Allure result.
///
/// A panic in the body is recorded as `failed` and resumed unchanged.
pub async fn api_case<F, T>(config: &SuiteConfig, meta: CaseMeta, body: F) -> Result<T>
where
    F: AsyncFnOnce(&ApiCase<'_>) -> Result<T>,
{
    let report = meta.start_report(&config.results_dir);
    let client = match ReqresClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            if let Err(write_err) = report.finish(Outcome::broken(e.to_string())).await {
                tracing::warn!("Failed to write report for {}: {}", meta.name, write_err);
            }
            return Err(e);
        }
    };

    let case = ApiCase {
        client: &client,
        report: &report,
    };
    let outcome = AssertUnwindSafe(body(&case)).catch_unwind().await;

    let status = match &outcome {
        Err(panic) => Outcome::from_panic(panic.as_ref()),
        Ok(Err(e)) => Outcome::from_error(e),
        Ok(Ok(_)) => Outcome::passed(),
    };
    let written = report.finish(status).await;
    if let Err(e) = &written {
        tracing::warn!("Failed to write report for {}: {}", meta.name, e);
    }

    match outcome {
        Err(panic) => std::panic::resume_unwind(panic),
        Ok(result) => {
            let value = result?;
            written?;
            Ok(value)
        }
    }
}
