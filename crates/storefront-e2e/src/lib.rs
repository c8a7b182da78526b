//! storefront-e2e: end-to-end checks for the saucedemo storefront and the reqres API
//!
//! The crate is the automation layer the checks in `tests/` are written
//! against:
//!
//! - [`Session`]: one Chromium browser, one recording context and one page
//!   per check, closed on every exit path
//! - [`LoginPage`] / [`InventoryPage`]: page objects over the session's page
//! - [`Evidence`]: screenshots attached on both the passing and failing path
//! - [`Report`]: Allure results writer (`allure-results/` by default)
//! - [`ReqresClient`]: the two reqres endpoints the API checks call
//! - [`ui_case`] / [`api_case`]: harnesses tying the above together
//!
//! # Example
//!
//! ```ignore
//! use storefront_e2e::{CaseMeta, SuiteConfig, UiCase, ui_case};
//!
//! #[tokio::test]
//! async fn valid_login_shows_inventory() {
//!     let config = SuiteConfig::from_env().expect("config");
//!     ui_case(
//!         &config,
//!         CaseMeta::new("Login_OK").feature("Login"),
//!         async |case: &UiCase<'_>| {
//!             let login = case.login_page();
//!             let inventory = case.inventory_page();
//!             case.step("Open login page", login.open()).await?;
//!             case.step("Log in", login.login("standard_user", "secret_sauce")).await?;
//!             case.evidence()
//!                 .verify("Inventory_OK", "Error_Login", async {
//!                     assert!(inventory.is_loaded().await?, "Inventory did not load");
//!                     Ok(())
//!                 })
//!                 .await
//!         },
//!     )
//!     .await
//!     .expect("UI case failed");
//! }
//! ```
//!
//! # Configuration
//!
//! See [`SuiteConfig::from_env`]. `CI=true` (or `HEADLESS=1`) runs Chromium
//! headless with the sandbox and GPU disabled.

pub mod api;
pub mod case;
pub mod config;
mod error;
pub mod evidence;
pub mod pages;
pub mod report;
pub mod session;

pub use error::{Error, Result};

pub use api::{ApiResponse, Credentials, ReqresClient, User, is_email_shaped};
pub use case::{ApiCase, CaseMeta, UiCase, api_case, ui_case};
pub use config::{HeadlessPolicy, SuiteConfig};
pub use evidence::Evidence;
pub use pages::{InventoryPage, LoginPage};
pub use report::{MediaType, Outcome, Report, Status, TestResult};
pub use session::{Session, SessionArtifacts, Teardown, live_sessions};
