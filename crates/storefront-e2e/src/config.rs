// Suite configuration
//
// Everything the checks need to know about their targets comes from the
// environment, with defaults pointing at the public saucedemo storefront and
// the reqres API. Setters follow the same consuming-builder shape as
// `playwright_rs::LaunchOptions`.

use crate::error::{Error, Result};
use playwright_rs::LaunchOptions;
use std::path::PathBuf;
use url::Url;

/// Default storefront entry page
pub const DEFAULT_STOREFRONT_URL: &str = "https://www.saucedemo.com/";

/// Default reqres API base (no trailing slash)
pub const DEFAULT_API_BASE_URL: &str = "https://reqres.in/api";

/// Free-tier key accepted by reqres.in
pub const DEFAULT_API_KEY: &str = "reqres-free-v1";

/// Root directory for per-session video recordings
pub const DEFAULT_VIDEO_DIR: &str = "tests/videos";

/// Directory the Allure CLI reads results from
pub const DEFAULT_RESULTS_DIR: &str = "allure-results";

/// Arguments that keep Chromium alive on CI runners without user namespaces or a GPU
const HEADLESS_ARGS: [&str; 2] = ["--no-sandbox", "--disable-gpu"];

/// How the session fixture decides between a visible and a headless browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeadlessPolicy {
    /// `HEADLESS` if set, otherwise headless exactly when `CI=true`
    #[default]
    FromEnvironment,
    /// Always headless
    Headless,
    /// Always show the browser window
    Headed,
}

impl HeadlessPolicy {
    /// Resolves the policy against the process environment.
    pub fn resolve(self) -> Result<bool> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    pub(crate) fn resolve_with<F>(self, lookup: F) -> Result<bool>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            HeadlessPolicy::Headless => Ok(true),
            HeadlessPolicy::Headed => Ok(false),
            HeadlessPolicy::FromEnvironment => {
                if let Some(value) = lookup("HEADLESS") {
                    return parse_flag("HEADLESS", &value);
                }
                // GitHub Actions sets CI=true; anything else counts as a workstation
                Ok(lookup("CI").as_deref() == Some("true"))
            }
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::Config {
        key: key.to_string(),
        message: format!("'{value}' is not a valid URL: {e}"),
    })
}

/// Targets, credentials and output locations for a test run.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Headless/headed decision for every session
    pub headless: HeadlessPolicy,
    /// Entry page of the storefront under test
    pub storefront_url: Url,
    /// Base URL of the reqres API
    pub api_base_url: Url,
    /// Value sent in the `x-api-key` header
    pub api_key: String,
    /// Root under which each session records into its own subdirectory
    pub video_dir: PathBuf,
    /// Allure results directory
    pub results_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            headless: HeadlessPolicy::default(),
            storefront_url: Url::parse(DEFAULT_STOREFRONT_URL)
                .expect("default storefront URL is valid"),
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API URL is valid"),
            api_key: DEFAULT_API_KEY.to_string(),
            video_dir: PathBuf::from(DEFAULT_VIDEO_DIR),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
        }
    }
}

impl SuiteConfig {
    /// Reads `SAUCEDEMO_URL`, `REQRES_BASE_URL`, `REQRES_API_KEY`,
    /// `E2E_VIDEO_DIR` and `ALLURE_RESULTS_DIR`, falling back to the defaults.
    ///
    /// The headless decision is deferred to session setup.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("SAUCEDEMO_URL") {
            config.storefront_url = parse_url("SAUCEDEMO_URL", &value)?;
        }
        if let Some(value) = lookup("REQRES_BASE_URL") {
            config.api_base_url = parse_url("REQRES_BASE_URL", &value)?;
        }
        if let Some(value) = lookup("REQRES_API_KEY") {
            config.api_key = value;
        }
        if let Some(value) = lookup("E2E_VIDEO_DIR") {
            config.video_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("ALLURE_RESULTS_DIR") {
            config.results_dir = PathBuf::from(value);
        }

        Ok(config)
    }

    /// Sets the headless policy
    pub fn headless(mut self, policy: HeadlessPolicy) -> Self {
        self.headless = policy;
        self
    }

    /// Sets the storefront entry URL
    pub fn storefront_url(mut self, url: Url) -> Self {
        self.storefront_url = url;
        self
    }

    /// Sets the API base URL
    pub fn api_base_url(mut self, url: Url) -> Self {
        self.api_base_url = url;
        self
    }

    /// Sets the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Sets the video root directory
    pub fn video_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.video_dir = dir.into();
        self
    }

    /// Sets the Allure results directory
    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Chromium launch options for a resolved headless decision.
    ///
    /// Headless runs drop the sandbox and GPU, which CI containers usually lack.
    pub fn launch_options(&self, headless: bool) -> LaunchOptions {
        let options = LaunchOptions::new().headless(headless);
        if headless {
            options
                .chromium_sandbox(false)
                .args(HEADLESS_ARGS.iter().map(|a| a.to_string()).collect())
        } else {
            options
        }
    }
}
