// Session fixture - one browser, one context, one page per test
//
// A session is opened at the start of a check and closed exactly once at the
// end, whatever the body did. Each session records video into its own
// subdirectory of the configured video root so the recording can be found
// again after the context closes.

use crate::config::SuiteConfig;
use crate::error::{Error, Result};
use futures_util::FutureExt;
use playwright_rs::{Browser, BrowserContext, BrowserContextOptions, Page, Playwright, RecordVideo};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Sessions opened and not yet closed, across the whole process
static LIVE_SESSIONS: AtomicUsize = AtomicUsize::new(0);

/// Number of sessions currently open in this process.
///
/// Returns to its previous value once every session opened since has been
/// closed, on success and panic paths alike.
pub fn live_sessions() -> usize {
    LIVE_SESSIONS.load(Ordering::SeqCst)
}

/// What a closed session leaves behind on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionArtifacts {
    /// The `.webm` recording of the session's page
    pub video: PathBuf,
}

/// What closing a session produced.
///
/// The close result and the recording are kept apart: a driver that fails to
/// shut down after the recording was flushed still leaves a usable video.
#[derive(Debug)]
pub struct Teardown {
    /// First error from closing page, context, browser or driver
    pub closed: Result<()>,
    /// The `.webm` recording, looked up after the close steps
    pub video: Result<PathBuf>,
}

impl Teardown {
    /// Folds both results into one. A close error wins over a missing video.
    pub fn into_result(self) -> Result<SessionArtifacts> {
        self.closed?;
        Ok(SessionArtifacts { video: self.video? })
    }
}

/// Result of running a body inside a session.
///
/// Carries the body's outcome (including a captured panic) separately from
/// the teardown, so callers can attach the recording before re-raising.
pub struct Finished<T> {
    /// Body result, or the panic payload if the body panicked
    pub outcome: std::thread::Result<Result<T>>,
    /// Close result and recording of the session
    pub teardown: Teardown,
}

impl<T> Finished<T> {
    /// Re-raises a body panic unchanged, otherwise returns the body's value.
    ///
    /// A body error takes precedence over a teardown error.
    pub fn into_result(self) -> Result<T> {
        match self.outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(Err(e)) => Err(e),
            Ok(Ok(value)) => {
                self.teardown.into_result()?;
                Ok(value)
            }
        }
    }
}

/// A live browser session.
pub struct Session {
    playwright: Playwright,
    browser: Browser,
    context: BrowserContext,
    page: Page,
    video_dir: PathBuf,
    headless: bool,
    closed: bool,
}

impl Session {
    /// Launches Chromium and opens a recording context with one page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Launch`] if the driver, browser, context or page
    /// cannot be created. Anything created before the failure is torn down.
    pub async fn open(config: &SuiteConfig) -> Result<Self> {
        let headless = config.headless.resolve()?;
        let video_dir =
            std::path::absolute(config.video_dir.join(Uuid::new_v4().simple().to_string()))?;
        tokio::fs::create_dir_all(&video_dir).await?;

        tracing::debug!(headless, video_dir = %video_dir.display(), "Opening browser session");

        let playwright = Playwright::launch().await.map_err(Error::Launch)?;

        let browser = match playwright
            .chromium()
            .launch_with_options(config.launch_options(headless))
            .await
        {
            Ok(browser) => browser,
            Err(e) => {
                log_cleanup(playwright.shutdown().await, "driver");
                return Err(Error::Launch(e));
            }
        };

        let options = BrowserContextOptions::builder()
            .record_video(RecordVideo {
                dir: video_dir.to_string_lossy().into_owned(),
                size: None,
            })
            .build();

        let context = match browser.new_context_with_options(options).await {
            Ok(context) => context,
            Err(e) => {
                log_cleanup(browser.close().await, "browser");
                log_cleanup(playwright.shutdown().await, "driver");
                return Err(Error::Launch(e));
            }
        };

        let page = match context.new_page().await {
            Ok(page) => page,
            Err(e) => {
                log_cleanup(context.close().await, "context");
                log_cleanup(browser.close().await, "browser");
                log_cleanup(playwright.shutdown().await, "driver");
                return Err(Error::Launch(e));
            }
        };

        let live = LIVE_SESSIONS.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(live, "Browser session ready");

        Ok(Self {
            playwright,
            browser,
            context,
            page,
            video_dir,
            headless,
            closed: false,
        })
    }

    /// The page every page object of this session drives.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Whether the browser was launched headless.
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Closes page, context, browser and driver, then locates the recording.
    ///
    /// Every step is attempted even if an earlier one fails; the first error
    /// is returned. The page is closed first so the recording is flushed
    /// before the context goes away.
    pub async fn close(self) -> Result<SessionArtifacts> {
        self.teardown().await.into_result()
    }

    async fn teardown(mut self) -> Teardown {
        let mut first_error: Option<Error> = None;
        let mut keep = |result: playwright_rs::Result<()>, what: &str| {
            if let Err(e) = result {
                tracing::warn!("Failed to close {}: {}", what, e);
                first_error.get_or_insert(Error::Browser(e));
            }
        };

        keep(self.page.close().await, "page");
        keep(self.context.close().await, "context");
        keep(self.browser.close().await, "browser");
        keep(self.playwright.shutdown().await, "driver");

        self.closed = true;
        let live = LIVE_SESSIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(live, "Browser session closed");

        Teardown {
            closed: first_error.map_or(Ok(()), Err),
            video: find_video(&self.video_dir).await,
        }
    }

    /// Runs `body` against a fresh session and always closes it afterwards.
    ///
    /// A panic in the body is caught, the session is closed, and the payload
    /// is handed back in [`Finished::outcome`] for the caller to re-raise.
    ///
    /// # Errors
    ///
    /// Only setup failures are returned here; body and teardown results are
    /// inside [`Finished`].
    pub async fn run<F, T>(config: &SuiteConfig, body: F) -> Result<Finished<T>>
    where
        F: AsyncFnOnce(&Session) -> Result<T>,
    {
        let session = Session::open(config).await?;
        let outcome = AssertUnwindSafe(body(&session)).catch_unwind().await;
        let teardown = session.teardown().await;
        Ok(Finished { outcome, teardown })
    }

    /// Runs `body` against a fresh session, closing it on every exit path.
    ///
    /// Panics from the body are re-raised unchanged after teardown.
    pub async fn scope<F, T>(config: &SuiteConfig, body: F) -> Result<T>
    where
        F: AsyncFnOnce(&Session) -> Result<T>,
    {
        Self::run(config, body).await?.into_result()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                video_dir = %self.video_dir.display(),
                "Browser session dropped without close(); browser process may leak"
            );
        }
    }
}

/// Reports a failed release of a half-opened session; the launch error is
/// what the caller sees.
fn log_cleanup(result: playwright_rs::Result<()>, what: &str) {
    if let Err(e) = result {
        tracing::warn!("Failed to close {} after setup error: {}", what, e);
    }
}

/// Finds the recording Playwright wrote into a session directory.
pub(crate) async fn find_video(dir: &Path) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut videos = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "webm") {
            videos.push(path);
        }
    }
    videos.sort();
    videos.into_iter().next().ok_or_else(|| Error::MissingVideo {
        dir: dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_video_picks_webm() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("3f2a.webm"), b"webm").await.unwrap();

        let video = find_video(dir.path()).await.unwrap();
        assert_eq!(video, dir.path().join("3f2a.webm"));
    }

    #[tokio::test]
    async fn test_find_video_reports_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_video(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::MissingVideo { .. }));
    }

    #[test]
    fn test_finished_prefers_body_error() {
        let finished: Finished<()> = Finished {
            outcome: Ok(Err(Error::Config {
                key: "body".to_string(),
                message: "failed first".to_string(),
            })),
            teardown: Teardown {
                closed: Ok(()),
                video: Err(Error::MissingVideo {
                    dir: PathBuf::from("v"),
                }),
            },
        };
        match finished.into_result() {
            Err(Error::Config { key, .. }) => assert_eq!(key, "body"),
            other => panic!("expected body error, got {other:?}"),
        }
    }

    #[test]
    fn test_finished_surfaces_teardown_error_after_success() {
        let finished = Finished {
            outcome: Ok(Ok(7)),
            teardown: Teardown {
                closed: Ok(()),
                video: Err(Error::MissingVideo {
                    dir: PathBuf::from("v"),
                }),
            },
        };
        assert!(matches!(
            finished.into_result(),
            Err(Error::MissingVideo { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "original assertion")]
    fn test_finished_reraises_panic_unchanged() {
        let payload = std::panic::catch_unwind(|| -> i32 { panic!("original assertion") }).unwrap_err();
        let finished: Finished<()> = Finished {
            outcome: Err(payload),
            teardown: Teardown {
                closed: Ok(()),
                video: Ok(PathBuf::from("v.webm")),
            },
        };
        let _ = finished.into_result();
    }

    #[test]
    fn test_teardown_keeps_video_when_driver_shutdown_fails() {
        let teardown = Teardown {
            closed: Err(Error::Browser(playwright_rs::Error::Timeout(
                "driver did not exit".to_string(),
            ))),
            video: Ok(PathBuf::from("abc/rec.webm")),
        };

        // The recording stays reachable next to the close error
        assert_eq!(
            teardown.video.as_deref().ok(),
            Some(Path::new("abc/rec.webm"))
        );
        assert!(matches!(teardown.into_result(), Err(Error::Browser(_))));
    }

    #[test]
    fn test_teardown_into_result_with_clean_close() {
        let teardown = Teardown {
            closed: Ok(()),
            video: Ok(PathBuf::from("abc/rec.webm")),
        };
        assert_eq!(
            teardown.into_result().unwrap(),
            SessionArtifacts {
                video: PathBuf::from("abc/rec.webm")
            }
        );
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_setup_cleanup_failure_is_logged() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            log_cleanup(Ok(()), "context");
            log_cleanup(
                Err(playwright_rs::Error::Timeout("browser hung".to_string())),
                "browser",
            );
        });

        let logs = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("Failed to close browser after setup error"), "{logs}");
        assert!(logs.contains("browser hung"), "{logs}");
        assert!(!logs.contains("close context"), "{logs}");
    }
}
