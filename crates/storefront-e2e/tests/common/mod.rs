// Shared setup for the test binaries
//
// Each binary declares `mod common;` and `mod replica_server;` side by side.

#![allow(dead_code)]

use crate::replica_server::ReplicaServer;
use std::path::Path;
use storefront_e2e::{HeadlessPolicy, SuiteConfig};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Installs a test-friendly tracing subscriber (filtered by RUST_LOG, default `warn`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Whether the suites should hit the public services
pub fn live() -> bool {
    std::env::var("E2E_LIVE").as_deref() == Ok("1")
}

/// The systems a test runs against.
///
/// With `E2E_LIVE=1` this is the environment's configuration (the public
/// saucedemo and reqres by default). Otherwise a replica server is started and
/// the configuration points at it, headless unless `HEADLESS` says otherwise.
pub struct Target {
    pub config: SuiteConfig,
    replica: Option<ReplicaServer>,
}

impl Target {
    pub async fn start() -> Self {
        let config = SuiteConfig::from_env().expect("Invalid suite configuration");
        if live() {
            return Target {
                config,
                replica: None,
            };
        }

        let replica = ReplicaServer::start().await;
        let headless = if std::env::var_os("HEADLESS").is_some() {
            HeadlessPolicy::FromEnvironment
        } else {
            HeadlessPolicy::Headless
        };
        let config = config
            .headless(headless)
            .storefront_url(Url::parse(&replica.storefront_url()).expect("replica URL"))
            .api_base_url(Url::parse(&replica.api_url()).expect("replica API URL"))
            .api_key(crate::replica_server::API_KEY);

        Target {
            config,
            replica: Some(replica),
        }
    }

    /// Redirects reports and recordings under `dir`
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.config.results_dir = dir.join("allure-results");
        self.config.video_dir = dir.join("videos");
        self
    }
}

impl Drop for Target {
    fn drop(&mut self) {
        if let Some(replica) = self.replica.take() {
            replica.shutdown();
        }
    }
}
