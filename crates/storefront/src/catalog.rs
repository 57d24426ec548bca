//! Product catalog.
//!
//! The catalog is a static JSON resource loaded once when a view
//! initializes. Everything downstream only needs [`ProductLookup`], so
//! tests can hand the cart a catalog built in memory.

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

use woala_core::{Price, ProductId, discount_percent};

/// Errors loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The remote catalog could not be fetched.
    #[error("failed to fetch catalog: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog body is not a valid product list.
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two products share an id.
    #[error("duplicate product id {0} in catalog")]
    DuplicateId(ProductId),
}

/// A product as listed in the catalog. Read-only to the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub original_price: Price,
    pub image: String,
    /// Average review score, 0 to 5.
    pub rating: Decimal,
    pub reviews: u32,
    pub in_stock: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Product {
    /// Discount badge percentage for this product.
    #[must_use]
    pub fn discount_percent(&self) -> i64 {
        discount_percent(self.original_price, self.price)
    }

    /// Star breakdown for the rating widget.
    #[must_use]
    pub fn star_rating(&self) -> StarRating {
        StarRating::from_rating(self.rating)
    }
}

/// How many full, half and empty stars to draw for a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating {
    pub full: u8,
    pub half: u8,
    pub empty: u8,
}

impl StarRating {
    /// Maximum number of stars.
    pub const MAX: u8 = 5;

    /// Break a 0-5 rating into stars. Out-of-range ratings are clamped.
    #[must_use]
    pub fn from_rating(rating: Decimal) -> Self {
        let rating = rating.clamp(Decimal::ZERO, Decimal::from(Self::MAX));
        let full = rating.floor().to_u8().unwrap_or(0);
        let half = u8::from(!rating.fract().is_zero());
        let empty = Self::MAX - rating.ceil().to_u8().unwrap_or(Self::MAX);
        Self { full, half, empty }
    }
}

/// Read access to the product catalog.
pub trait ProductLookup: Send + Sync {
    /// Find a product by id.
    fn get_product(&self, id: ProductId) -> Option<Product>;

    /// All products, in catalog order.
    fn list_products(&self) -> Vec<Product>;
}

/// Where the catalog JSON lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A local file, e.g. `data/products.json`.
    File(PathBuf),
    /// An `http` or `https` URL.
    Remote(Url),
}

impl FromStr for CatalogSource {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Url::parse(s).map(Self::Remote)
        } else {
            Ok(Self::File(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// In-memory catalog, kept in listing order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two products share an id.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = std::collections::HashSet::new();
        for product in &products {
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
        }
        Ok(Self { products })
    }

    /// Parse a catalog from its JSON array form.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or ids repeat.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Load the catalog from a file or URL.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the source cannot be read or parsed.
    #[instrument(skip_all, fields(source = %source))]
    pub async fn load(source: &CatalogSource) -> Result<Self, CatalogError> {
        let body = match source {
            CatalogSource::File(path) => tokio::fs::read_to_string(path).await?,
            CatalogSource::Remote(url) => {
                reqwest::get(url.as_str())
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
        };

        let catalog = Self::from_json(&body)?;
        info!(products = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductLookup for Catalog {
    fn get_product(&self, id: ProductId) -> Option<Product> {
        self.products.iter().find(|p| p.id == id).cloned()
    }

    fn list_products(&self) -> Vec<Product> {
        self.products.clone()
    }
}
