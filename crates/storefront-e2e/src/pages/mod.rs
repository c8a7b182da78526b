// Page objects for the storefront under test
//
// Each page object borrows the session's page and exposes what a user does on
// that screen. Selectors stay private constants of the page object; tests
// never see them.

pub mod inventory;
pub mod login;

pub use inventory::InventoryPage;
pub use login::LoginPage;
