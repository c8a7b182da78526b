// Login screen

use crate::error::Result;
use playwright_rs::Page;

/// Username input
const USERNAME: &str = r#"[data-test="username"]"#;
/// Password input
const PASSWORD: &str = r#"[data-test="password"]"#;
/// Submit button
const LOGIN_BUTTON: &str = r#"[data-test="login-button"]"#;
/// Error banner shown after a rejected login
const ERROR_MESSAGE: &str = r#"[data-test="error"]"#;

/// The storefront's login screen.
pub struct LoginPage<'a> {
    page: &'a Page,
    entry_url: &'a str,
}

impl<'a> LoginPage<'a> {
    /// Wraps `page`; `entry_url` is where [`LoginPage::open`] navigates.
    pub fn new(page: &'a Page, entry_url: &'a str) -> Self {
        Self { page, entry_url }
    }

    /// Navigates to the entry URL.
    pub async fn open(&self) -> Result<()> {
        self.page.goto(self.entry_url, None).await?;
        Ok(())
    }

    /// Fills both credential fields and submits.
    pub async fn login(&self, user: &str, password: &str) -> Result<()> {
        self.page.locator(USERNAME).await.fill(user, None).await?;
        self.page.locator(PASSWORD).await.fill(password, None).await?;
        self.page.locator(LOGIN_BUTTON).await.click(None).await?;
        Ok(())
    }

    /// Text of the error banner.
    ///
    /// Only meaningful after a rejected login: with no banner on the page
    /// this waits out the default timeout and fails.
    pub async fn error_text(&self) -> Result<String> {
        Ok(self.page.locator(ERROR_MESSAGE).await.inner_text().await?)
    }

    /// Whether the error banner is currently visible.
    pub async fn is_error_visible(&self) -> Result<bool> {
        Ok(self.page.locator(ERROR_MESSAGE).await.is_visible().await?)
    }
}
