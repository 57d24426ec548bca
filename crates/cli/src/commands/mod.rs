//! CLI command implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;

use std::sync::Arc;

use woala_core::NotificationKind;
use woala_storefront::catalog::ProductLookup;
use woala_storefront::navigation::{Navigator, Route};
use woala_storefront::notify::Notifier;
use woala_storefront::storage::FileStore;
use woala_storefront::{AppError, CartStore, Catalog, Shop, StorefrontConfig};

/// Prints notifications to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    #[allow(clippy::print_stdout, clippy::print_stderr)]
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Success => println!("✓ {message}"),
            NotificationKind::Error => eprintln!("✗ {message}"),
        }
    }
}

/// Prints the page the storefront would open next.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    #[allow(clippy::print_stdout)]
    fn go_to(&self, route: Route) {
        let hint = match route {
            Route::Home => "woala products".to_owned(),
            Route::Product(id) => format!("woala show {id}"),
            Route::Checkout => "woala checkout --help".to_owned(),
        };
        println!("→ {route} (run `{hint}`)");
    }
}

/// Open the file-backed cart over a loaded catalog.
pub fn open_shop(config: &StorefrontConfig, catalog: Catalog) -> Result<Shop, AppError> {
    let catalog: Arc<dyn ProductLookup> = Arc::new(catalog);
    let storage = Arc::new(FileStore::open(config.data_dir.clone())?);
    let cart = CartStore::with_key(storage, catalog.clone(), config.cart_key.clone());

    tracing::debug!(
        catalog = %config.catalog,
        data_dir = %config.data_dir.display(),
        "Shop opened"
    );

    Ok(Shop::new(
        catalog,
        cart,
        Arc::new(ConsoleNotifier),
        Arc::new(ConsoleNavigator),
    )
    .with_rates(config.rates))
}
