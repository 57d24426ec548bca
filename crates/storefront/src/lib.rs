//! Woala storefront library.
//!
//! Cart, pricing, checkout form and order submission for a small static
//! storefront. Rendering is left to the caller: everything here works on
//! plain values and reports back through the [`notify::Notifier`] and
//! [`navigation::Navigator`] ports.
//!
//! - [`cart::CartStore`] keeps the cart, persisted write-through to a
//!   [`storage::KeyValueStore`].
//! - [`pricing::compute_summary`] derives subtotal, tax, shipping and total.
//! - [`form::CheckoutForm`] validates and formats checkout input.
//! - [`checkout::Checkout`] submits the order at most once at a time.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod form;
pub mod navigation;
pub mod notify;
pub mod pricing;
pub mod shop;
pub mod storage;
pub mod validation;

pub use cart::{AddOutcome, Cart, CartError, CartItem, CartStore};
pub use catalog::{Catalog, CatalogError, CatalogSource, Product, ProductLookup};
pub use checkout::{
    Checkout, CheckoutState, OrderConfirmation, PaymentGateway, SimulatedGateway, SubmitError,
};
pub use config::StorefrontConfig;
pub use error::{AppError, Result};
pub use form::CheckoutForm;
pub use pricing::{OrderSummary, Rates, compute_summary};
pub use shop::{CheckoutView, Shop, load_catalog};
