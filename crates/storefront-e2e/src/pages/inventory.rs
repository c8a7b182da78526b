// Product listing shown after a successful login

use crate::error::Result;
use playwright_rs::{Page, expect};
use std::time::Duration;

const INVENTORY_CONTAINER: &str = r#"[data-test="inventory-container"]"#;
// The badge has no data-test attribute on saucedemo
const CART_BADGE: &str = ".shopping_cart_badge";
const ADD_BACKPACK: &str = r#"[data-test="add-to-cart-sauce-labs-backpack"]"#;
const ADD_BIKE_LIGHT: &str = r#"[data-test="add-to-cart-sauce-labs-bike-light"]"#;

/// How long a login may take to bring up the product list
const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// The inventory (product list) screen.
pub struct InventoryPage<'a> {
    page: &'a Page,
}

impl<'a> InventoryPage<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    /// Whether the product list container becomes visible.
    ///
    /// Polls for up to five seconds, since the list renders after the login
    /// submit returns. `false` means it never showed up.
    pub async fn is_loaded(&self) -> Result<bool> {
        let container = self.page.locator(INVENTORY_CONTAINER).await;
        match expect(container).with_timeout(LOAD_TIMEOUT).to_be_visible().await {
            Ok(()) => Ok(true),
            Err(playwright_rs::Error::AssertionTimeout(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Adds the backpack and the bike light to the cart, once each.
    pub async fn add_two_products(&self) -> Result<()> {
        self.page.locator(ADD_BACKPACK).await.click(None).await?;
        self.page.locator(ADD_BIKE_LIGHT).await.click(None).await?;
        Ok(())
    }

    /// Text of the cart badge, e.g. `"2"`.
    ///
    /// An empty cart has no badge, in which case this fails after the
    /// default timeout.
    pub async fn cart_count(&self) -> Result<String> {
        Ok(self.page.locator(CART_BADGE).await.inner_text().await?)
    }
}
