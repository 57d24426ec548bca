//! Page routes and navigation.

use std::sync::Mutex;

use thiserror::Error;
use url::Url;

use woala_core::ProductId;

const PAGE_BASE: &str = "http://woala.invalid/";

/// Errors turning a location into a [`Route`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid location: {0}")]
    Url(#[from] url::ParseError),
    #[error("unknown page: {0}")]
    UnknownPage(String),
    #[error("product page without an id")]
    MissingProductId,
    #[error("invalid product id: {0:?}")]
    InvalidProductId(String),
}

/// A storefront page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Catalog listing.
    Home,
    /// Product detail page.
    Product(ProductId),
    /// Order summary and payment form.
    Checkout,
}

impl Route {
    /// File name of the product detail page.
    pub const PRODUCT_PAGE: &'static str = "product.html";

    /// Parse a page location such as `product.html?id=3`.
    ///
    /// Accepts absolute URLs and paths relative to the site root.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` for unknown pages and for product pages whose
    /// `id` parameter is missing or not an integer.
    pub fn parse(location: &str) -> Result<Self, RouteError> {
        let url = Url::parse(PAGE_BASE)?.join(location)?;
        let page = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();

        match page {
            "" | "index.html" => Ok(Self::Home),
            "checkout.html" => Ok(Self::Checkout),
            Self::PRODUCT_PAGE => {
                let id = url
                    .query_pairs()
                    .find(|(key, _)| key == "id")
                    .map(|(_, value)| value.into_owned())
                    .ok_or(RouteError::MissingProductId)?;
                id.parse::<ProductId>()
                    .map(Self::Product)
                    .map_err(|_| RouteError::InvalidProductId(id))
            }
            other => Err(RouteError::UnknownPage(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Home => write!(f, "index.html"),
            Self::Product(id) => write!(f, "{}?id={id}", Self::PRODUCT_PAGE),
            Self::Checkout => write!(f, "checkout.html"),
        }
    }
}

/// Moves the shopper to another page.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`.
    fn go_to(&self, route: Route);
}

/// Navigator that remembers where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    /// Create a navigator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every route navigated to, oldest first.
    #[must_use]
    pub fn visits(&self) -> Vec<Route> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Most recent route, if any.
    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.visits().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, route: Route) {
        tracing::debug!(%route, "Navigating");
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(route);
        }
    }
}
