//! Page-level storefront commands.
//!
//! [`Shop`] wires the catalog, cart, notifier and navigator together the way
//! the storefront pages do: the listing's "add to cart" button, the product
//! page, the cart icon and the checkout page's entry guard.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use woala_core::{NotificationKind, ProductId};

use crate::cart::{AddOutcome, Cart, CartError, CartStore, MAX_LINE_QUANTITY};
use crate::catalog::{Catalog, CatalogSource, Product, ProductLookup};
use crate::checkout::{Checkout, EMPTY_CART_MESSAGE, PaymentGateway};
use crate::navigation::{Navigator, Route};
use crate::notify::Notifier;
use crate::pricing::{OrderSummary, Rates, compute_summary};

/// What the checkout page renders: the cart lines and their summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutView {
    pub cart: Cart,
    pub summary: OrderSummary,
}

/// Fetch the catalog as a page loads.
///
/// A failed fetch is recoverable: it is logged, the shopper is sent to the
/// catalog home page, and the fetch is not retried.
#[instrument(skip(navigator), fields(source = %source))]
pub async fn load_catalog(source: &CatalogSource, navigator: &dyn Navigator) -> Option<Catalog> {
    match Catalog::load(source).await {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            warn!(error = %e, "Catalog unavailable, returning home");
            navigator.go_to(Route::Home);
            None
        }
    }
}

/// The storefront, minus rendering.
#[derive(Clone)]
pub struct Shop {
    catalog: Arc<dyn ProductLookup>,
    cart: CartStore,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    rates: Rates,
}

impl std::fmt::Debug for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shop")
            .field("cart", &self.cart)
            .field("rates", &self.rates)
            .finish_non_exhaustive()
    }
}

impl Shop {
    /// Create a shop over a cart store.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn ProductLookup>,
        cart: CartStore,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            catalog,
            cart,
            notifier,
            navigator,
            rates: Rates::default(),
        }
    }

    /// Use different tax and shipping rates.
    #[must_use]
    pub const fn with_rates(mut self, rates: Rates) -> Self {
        self.rates = rates;
        self
    }

    /// The underlying cart store.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Rates used for order summaries.
    #[must_use]
    pub const fn rates(&self) -> &Rates {
        &self.rates
    }

    /// All catalog products, in catalog order.
    #[must_use]
    pub fn list_products(&self) -> Vec<Product> {
        self.catalog.list_products()
    }

    /// Add to cart and tell the shopper how it went.
    ///
    /// Unavailable products are ignored without a message.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read or written.
    #[instrument(skip(self))]
    pub fn add_to_cart(&self, id: ProductId, quantity: u32) -> Result<AddOutcome, CartError> {
        let outcome = self.cart.add_item(id, quantity)?;
        match outcome {
            AddOutcome::Added { added: 1, .. } if quantity == 1 => {
                self.notifier
                    .notify("Product added to cart!", NotificationKind::Success);
            }
            AddOutcome::Added { added, .. } => {
                self.notifier.notify(
                    &format!("{added} item(s) added to cart!"),
                    NotificationKind::Success,
                );
            }
            AddOutcome::AtLimit { .. } => {
                self.notifier.notify(
                    &format!("You can order at most {MAX_LINE_QUANTITY} of this product"),
                    NotificationKind::Error,
                );
            }
            AddOutcome::Unavailable { .. } => debug!("Add ignored"),
        }
        Ok(outcome)
    }

    /// Add to cart, then go straight to checkout.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read or written.
    pub fn buy_now(&self, id: ProductId, quantity: u32) -> Result<AddOutcome, CartError> {
        let outcome = self.add_to_cart(id, quantity)?;
        if !matches!(outcome, AddOutcome::Unavailable { .. }) {
            self.navigator.go_to(Route::Checkout);
        }
        Ok(outcome)
    }

    /// Navigate to a product's detail page.
    pub fn go_to_product(&self, id: ProductId) {
        self.navigator.go_to(Route::Product(id));
    }

    /// Resolve a product page location such as `product.html?id=3` or `?id=3`.
    ///
    /// A missing, malformed or unknown id sends the shopper home.
    #[instrument(skip(self))]
    pub fn open_product(&self, location: &str) -> Option<Product> {
        let location = if location.starts_with('?') {
            format!("{}{location}", Route::PRODUCT_PAGE)
        } else {
            location.to_owned()
        };

        let product = match Route::parse(&location) {
            Ok(Route::Product(id)) => self.catalog.get_product(id),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Unreadable product location");
                None
            }
        };

        if product.is_none() {
            self.navigator.go_to(Route::Home);
        }
        product
    }

    /// Cart icon: go to checkout, or say the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read.
    pub fn open_cart(&self) -> Result<(), CartError> {
        if self.cart.total_item_count()? == 0 {
            self.notifier
                .notify(EMPTY_CART_MESSAGE, NotificationKind::Error);
        } else {
            self.navigator.go_to(Route::Checkout);
        }
        Ok(())
    }

    /// Checkout page entry. An empty cart sends the shopper home.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read.
    pub fn open_checkout(&self) -> Result<Option<CheckoutView>, CartError> {
        let cart = self.cart.snapshot()?;
        if cart.is_empty() {
            self.navigator.go_to(Route::Home);
            return Ok(None);
        }
        let summary = compute_summary(cart.items(), &self.rates);
        Ok(Some(CheckoutView { cart, summary }))
    }

    /// Cart badge count.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read.
    pub fn item_count(&self) -> Result<u32, CartError> {
        self.cart.total_item_count()
    }

    /// Summary for the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read.
    pub fn order_summary(&self) -> Result<OrderSummary, CartError> {
        Ok(compute_summary(self.cart.snapshot()?.items(), &self.rates))
    }

    /// A checkout flow over this shop's cart and rates.
    #[must_use]
    pub fn checkout<G: PaymentGateway>(&self, gateway: G) -> Checkout<G> {
        Checkout::new(self.cart.clone(), gateway, self.notifier.clone()).with_rates(self.rates)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use woala_core::Price;

    use super::*;
    use crate::catalog::Catalog;
    use crate::navigation::RecordingNavigator;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;

    struct Fixture {
        shop: Shop,
        storage: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
    }

    fn product(id: i32, in_stock: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_cents(2_500),
            original_price: Price::from_cents(5_000),
            image: format!("images/{id}.jpg"),
            rating: Decimal::new(35, 1),
            reviews: 8,
            in_stock,
            images: Vec::new(),
            description: String::new(),
            features: Vec::new(),
        }
    }

    fn fixture() -> Fixture {
        let catalog: Arc<dyn ProductLookup> =
            Arc::new(Catalog::new(vec![product(1, true), product(2, false)]).unwrap());
        let storage = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let cart = CartStore::new(storage.clone(), catalog.clone());
        let shop = Shop::new(catalog, cart, notifier.clone(), navigator.clone());
        Fixture {
            shop,
            storage,
            notifier,
            navigator,
        }
    }

    #[test]
    fn test_add_to_cart_messages() {
        let f = fixture();
        f.shop.add_to_cart(ProductId::new(1), 1).unwrap();
        f.shop.add_to_cart(ProductId::new(1), 3).unwrap();

        assert_eq!(
            f.notifier.of_kind(NotificationKind::Success),
            vec![
                "Product added to cart!".to_owned(),
                "3 item(s) added to cart!".to_owned()
            ]
        );
        assert_eq!(f.shop.item_count().unwrap(), 4);
    }

    #[test]
    fn test_add_to_cart_reports_clamp() {
        let f = fixture();
        f.shop.add_to_cart(ProductId::new(1), 8).unwrap();
        let outcome = f.shop.add_to_cart(ProductId::new(1), 5).unwrap();
        assert!(matches!(outcome, AddOutcome::Added { added: 2, .. }));

        let outcome = f.shop.add_to_cart(ProductId::new(1), 1).unwrap();
        assert!(matches!(outcome, AddOutcome::AtLimit { item_count: 10 }));
        assert_eq!(f.notifier.of_kind(NotificationKind::Error).len(), 1);
    }

    #[test]
    fn test_out_of_stock_is_silent() {
        let f = fixture();
        let outcome = f.shop.buy_now(ProductId::new(2), 1).unwrap();

        assert!(matches!(outcome, AddOutcome::Unavailable { item_count: 0 }));
        assert!(f.notifier.messages().is_empty());
        assert!(f.navigator.visits().is_empty());
        assert_eq!(f.storage.write_count(), 0);
    }

    #[test]
    fn test_buy_now_goes_to_checkout() {
        let f = fixture();
        f.shop.buy_now(ProductId::new(1), 2).unwrap();
        assert_eq!(f.navigator.last(), Some(Route::Checkout));
        assert_eq!(f.shop.item_count().unwrap(), 2);
    }

    #[test]
    fn test_open_product() {
        let f = fixture();
        assert_eq!(f.shop.open_product("?id=1").unwrap().id, ProductId::new(1));
        assert!(f.navigator.visits().is_empty());

        for location in ["?id=99", "?id=abc", "product.html", "?"] {
            assert!(f.shop.open_product(location).is_none(), "{location}");
            assert_eq!(f.navigator.last(), Some(Route::Home));
        }
    }

    #[tokio::test]
    async fn test_catalog_fetch_failure_goes_home() {
        let navigator = RecordingNavigator::new();
        let missing = CatalogSource::File(std::env::temp_dir().join(format!(
            "woala-missing-{}.json",
            uuid::Uuid::new_v4().simple()
        )));

        assert!(load_catalog(&missing, &navigator).await.is_none());
        assert_eq!(navigator.visits(), vec![Route::Home]);
    }

    #[tokio::test]
    async fn test_catalog_fetch_success_stays_put() {
        let navigator = RecordingNavigator::new();
        let sample = CatalogSource::File(
            std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/products.json"),
        );

        let catalog = load_catalog(&sample, &navigator).await.unwrap();
        assert!(!catalog.is_empty());
        assert!(navigator.visits().is_empty());
    }

    #[test]
    fn test_open_cart_when_empty() {
        let f = fixture();
        f.shop.open_cart().unwrap();
        assert_eq!(
            f.notifier.of_kind(NotificationKind::Error),
            vec![EMPTY_CART_MESSAGE.to_owned()]
        );
        assert!(f.navigator.visits().is_empty());

        f.shop.add_to_cart(ProductId::new(1), 1).unwrap();
        f.shop.open_cart().unwrap();
        assert_eq!(f.navigator.last(), Some(Route::Checkout));
    }

    #[test]
    fn test_open_checkout_guard() {
        let f = fixture();
        assert!(f.shop.open_checkout().unwrap().is_none());
        assert_eq!(f.navigator.last(), Some(Route::Home));

        f.shop.add_to_cart(ProductId::new(1), 2).unwrap();
        let view = f.shop.open_checkout().unwrap().unwrap();
        assert_eq!(view.cart.total_quantity(), 2);
        assert_eq!(view.summary.subtotal, Price::from_cents(5_000));
        assert_eq!(view.summary.total.display(), "63.99 TL");
    }
}
