// Evidence capture around checks
//
// Every UI check runs through `Evidence::verify`: the page is photographed
// after the check, under one name when it held and another when it did not.
// A failing check (panic or error) is handed back to the caller untouched
// once the screenshot is attached.

use crate::error::Result;
use crate::report::{MediaType, Report};
use futures_util::FutureExt;
use playwright_rs::Page;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Screenshot-taking wrapper over a page and the report it attaches to.
#[derive(Clone, Copy)]
pub struct Evidence<'a> {
    page: &'a Page,
    report: &'a Report,
}

impl<'a> Evidence<'a> {
    pub fn new(page: &'a Page, report: &'a Report) -> Self {
        Self { page, report }
    }

    /// Captures the page and attaches it as a PNG named `name`.
    pub async fn screenshot(&self, name: &str) -> Result<()> {
        let png = self.page.screenshot(None).await?;
        self.report.attach_bytes(name, MediaType::Png, &png).await
    }

    /// Attaches a text snippet, e.g. the error banner or the cart count.
    pub async fn text(&self, name: &str, text: &str) -> Result<()> {
        self.report.attach_text(name, text).await
    }

    /// Runs `check` and attaches a screenshot named `on_pass` or `on_fail`.
    ///
    /// If `check` panics the failure screenshot is attached and the original
    /// panic is resumed unchanged; if it returns an error the error is
    /// returned after the screenshot. A screenshot that cannot be taken on
    /// the failure path is logged and never replaces the original failure.
    pub async fn verify<T, Fut>(&self, on_pass: &str, on_fail: &str, check: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match AssertUnwindSafe(check).catch_unwind().await {
            Ok(Ok(value)) => {
                self.screenshot(on_pass).await?;
                Ok(value)
            }
            Ok(Err(e)) => {
                self.capture_failure(on_fail).await;
                Err(e)
            }
            Err(panic) => {
                self.capture_failure(on_fail).await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn capture_failure(&self, name: &str) {
        if let Err(e) = self.screenshot(name).await {
            tracing::warn!(name, "Could not capture failure screenshot: {}", e);
        }
    }
}
