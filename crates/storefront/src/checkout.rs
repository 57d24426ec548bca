//! Checkout state machine.
//!
//! ```text
//! Idle ──submit──▶ Validating ──valid──▶ Submitting ──ok──▶ Succeeded (terminal)
//!   ▲                  │                     │
//!   └────invalid───────┘                     └──err/timeout──▶ Failed ──submit──▶ Validating
//! ```
//!
//! At most one submission is in flight: a `submit` that arrives while the
//! machine is validating or submitting is rejected, not queued. The state
//! lock is never held across the gateway call, so the second caller sees
//! `Submitting` and returns immediately. Dropping a submission while the
//! gateway call is pending leaves the machine in `Failed`, never stuck in
//! `Submitting`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use woala_core::{NotificationKind, PaymentMethod};

use crate::cart::{CartError, CartItem, CartStore};
use crate::form::{CardDetails, CheckoutForm, ContactDetails};
use crate::notify::Notifier;
use crate::pricing::{OrderSummary, Rates, compute_summary};
use crate::validation::{self, FieldName};

/// How long an order submission may take before it counts as failed.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shown when checkout is attempted with nothing in the cart.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty!";

/// Shown when the form has invalid fields.
pub const INVALID_FORM_MESSAGE: &str = "Please fill in all required fields correctly";

/// Failure reason recorded when a submission is dropped before the gateway answers.
pub const CANCELLED_REASON: &str = "The order submission was cancelled.";

const REFERENCE_LEN: usize = 9;

/// Short order number shown to the shopper, e.g. `#K3J9Q0Z1A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderReference(String);

impl OrderReference {
    /// Generate a random 9-character base-36 reference.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..REFERENCE_LEN)
            .map(|_| {
                char::from_digit(rng.random_range(0..36), 36)
                    .unwrap_or('0')
                    .to_ascii_uppercase()
            })
            .collect();
        Self(code)
    }

    /// The reference without the leading `#`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the payment gateway needs to place one order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// Unique per submission attempt, for correlating gateway logs.
    pub attempt_id: Uuid,
    pub reference: OrderReference,
    pub items: Vec<CartItem>,
    pub summary: OrderSummary,
    pub contact: ContactDetails,
    pub payment_method: PaymentMethod,
    pub card: Option<CardDetails>,
}

/// Gateway acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReceipt {
    pub transaction_id: String,
}

/// Why the gateway did not place the order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The payment was refused.
    #[error("{0}")]
    Declined(String),
    /// The gateway could not be reached or failed internally.
    #[error("payment service unavailable: {0}")]
    Unavailable(String),
}

/// Places orders. Stands in for a real payment provider.
pub trait PaymentGateway: Send + Sync {
    /// Attempt to place `order`.
    fn place_order(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<GatewayReceipt, GatewayError>> + Send;
}

/// What a [`SimulatedGateway`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulatedOutcome {
    #[default]
    Approve,
    Decline,
}

/// Gateway that waits, then approves or declines every order.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
    outcome: SimulatedOutcome,
}

impl SimulatedGateway {
    /// Default processing delay.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

    /// Message used for declined payments.
    pub const DECLINE_MESSAGE: &'static str = "The bank declined the payment.";

    /// Create a gateway with the given delay and outcome.
    #[must_use]
    pub const fn new(delay: Duration, outcome: SimulatedOutcome) -> Self {
        Self { delay, outcome }
    }

    /// A gateway that approves after the default delay.
    #[must_use]
    pub const fn approving() -> Self {
        Self::new(Self::DEFAULT_DELAY, SimulatedOutcome::Approve)
    }

    /// A gateway that declines after the default delay.
    #[must_use]
    pub const fn declining() -> Self {
        Self::new(Self::DEFAULT_DELAY, SimulatedOutcome::Decline)
    }

    /// Same gateway with a different delay.
    #[must_use]
    pub const fn with_delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

impl PaymentGateway for SimulatedGateway {
    #[instrument(skip_all, fields(attempt_id = %order.attempt_id, reference = %order.reference))]
    async fn place_order(&self, order: &OrderRequest) -> Result<GatewayReceipt, GatewayError> {
        let card = order.card.as_ref().map(CardDetails::last_four);
        info!(
            method = %order.payment_method,
            card_last_four = card.as_deref().unwrap_or("-"),
            total = %order.summary.total,
            "Processing order"
        );

        tokio::time::sleep(self.delay).await;

        match self.outcome {
            SimulatedOutcome::Approve => Ok(GatewayReceipt {
                transaction_id: format!("SIM-{}", order.attempt_id.simple()),
            }),
            SimulatedOutcome::Decline => Err(GatewayError::Declined(Self::DECLINE_MESSAGE.to_owned())),
        }
    }
}

/// Shown to the shopper once the order is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub reference: OrderReference,
    pub transaction_id: String,
    pub items: Vec<CartItem>,
    pub summary: OrderSummary,
    pub contact: ContactDetails,
    pub placed_at: DateTime<Utc>,
}

/// Where the checkout flow currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded(Box<OrderConfirmation>),
    Failed {
        reason: String,
        reference: OrderReference,
    },
}

impl CheckoutState {
    /// Whether the submit control is enabled in this state.
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed { .. })
    }
}

/// Why a submission did not produce an order.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Another submission is being validated or placed.
    #[error("an order is already being placed")]
    InFlight,

    /// The order was already placed; checkout is finished.
    #[error("order already placed")]
    Completed,

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Some fields failed validation; their errors are on the form.
    #[error("{} field(s) need attention", .fields.len())]
    InvalidForm { fields: Vec<FieldName> },

    /// The gateway refused the order. The cart is untouched.
    #[error("order {reference} could not be processed: {reason}")]
    Declined {
        reference: OrderReference,
        reason: String,
    },

    /// The gateway could not be reached. The cart is untouched.
    #[error("order {reference} could not be processed: {reason}")]
    Unavailable {
        reference: OrderReference,
        reason: String,
    },

    /// The gateway did not answer in time. The cart is untouched.
    #[error("order {reference} timed out after {}s", .after.as_secs())]
    TimedOut {
        reference: OrderReference,
        after: Duration,
    },

    /// The cart could not be read.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Drives one checkout view from idle to a placed order.
pub struct Checkout<G> {
    cart: CartStore,
    gateway: G,
    notifier: Arc<dyn Notifier>,
    rates: Rates,
    timeout: Duration,
    state: Mutex<CheckoutState>,
}

impl<G: PaymentGateway> Checkout<G> {
    /// Create a checkout in the `Idle` state with default rates and timeout.
    #[must_use]
    pub fn new(cart: CartStore, gateway: G, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cart,
            gateway,
            notifier,
            rates: Rates::default(),
            timeout: DEFAULT_SUBMIT_TIMEOUT,
            state: Mutex::new(CheckoutState::Idle),
        }
    }

    /// Use different tax and shipping rates.
    #[must_use]
    pub const fn with_rates(mut self, rates: Rates) -> Self {
        self.rates = rates;
        self
    }

    /// Use a different submission timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.lock_state().clone()
    }

    /// Whether the submit control should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.lock_state().can_submit()
    }

    /// Order summary for the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be read.
    pub fn summary(&self) -> Result<OrderSummary, CartError> {
        Ok(compute_summary(self.cart.snapshot()?.items(), &self.rates))
    }

    /// Submit the order, validating against today's date.
    ///
    /// # Errors
    ///
    /// See [`Checkout::submit_at`].
    pub async fn submit(&self, form: &mut CheckoutForm) -> Result<OrderConfirmation, SubmitError> {
        self.submit_at(form, validation::today()).await
    }

    /// Submit the order, validating card expiry against `today`.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError` when the submission is rejected (in flight,
    /// already completed, empty cart, invalid form) or the gateway fails.
    #[instrument(skip_all)]
    pub async fn submit_at(
        &self,
        form: &mut CheckoutForm,
        today: NaiveDate,
    ) -> Result<OrderConfirmation, SubmitError> {
        let request = self.begin(form, today)?;
        let reference = request.reference.clone();
        let pending = PendingSubmission {
            state: &self.state,
            reference: reference.clone(),
            settled: false,
        };
        info!(
            attempt_id = %request.attempt_id,
            %reference,
            lines = request.items.len(),
            total = %request.summary.total,
            "Submitting order"
        );

        let outcome = tokio::time::timeout(self.timeout, self.gateway.place_order(&request)).await;
        pending.settle();

        match outcome {
            Ok(Ok(receipt)) => Ok(self.succeed(request, receipt)),
            Ok(Err(GatewayError::Declined(reason))) => {
                self.fail(&reference, &reason);
                Err(SubmitError::Declined { reference, reason })
            }
            Ok(Err(e @ GatewayError::Unavailable(_))) => {
                let reason = e.to_string();
                self.fail(&reference, &reason);
                Err(SubmitError::Unavailable { reference, reason })
            }
            Err(_) => {
                self.fail(&reference, "The payment service did not respond in time.");
                Err(SubmitError::TimedOut {
                    reference,
                    after: self.timeout,
                })
            }
        }
    }

    /// Guarded transition out of `Idle`/`Failed` into `Submitting`.
    fn begin(&self, form: &mut CheckoutForm, today: NaiveDate) -> Result<OrderRequest, SubmitError> {
        let mut state = self.lock_state();
        match &*state {
            CheckoutState::Validating | CheckoutState::Submitting => {
                warn!("Submit ignored, order already in flight");
                return Err(SubmitError::InFlight);
            }
            CheckoutState::Succeeded(_) => return Err(SubmitError::Completed),
            CheckoutState::Idle | CheckoutState::Failed { .. } => {}
        }

        let cart = self.cart.snapshot()?;
        if cart.is_empty() {
            self.notifier.notify(EMPTY_CART_MESSAGE, NotificationKind::Error);
            return Err(SubmitError::EmptyCart);
        }

        *state = CheckoutState::Validating;
        let contact = if form.validate_all(today) {
            form.contact_details()
        } else {
            None
        };
        let Some(contact) = contact else {
            *state = CheckoutState::Idle;
            let fields = form.invalid_fields();
            info!(invalid = fields.len(), "Checkout form invalid");
            self.notifier.notify(INVALID_FORM_MESSAGE, NotificationKind::Error);
            return Err(SubmitError::InvalidForm { fields });
        };

        let summary = compute_summary(cart.items(), &self.rates);
        let request = OrderRequest {
            attempt_id: Uuid::new_v4(),
            reference: OrderReference::generate(),
            items: cart.into_items(),
            summary,
            contact,
            payment_method: form.payment_method(),
            card: form.card_details(),
        };

        *state = CheckoutState::Submitting;
        Ok(request)
    }

    fn succeed(&self, request: OrderRequest, receipt: GatewayReceipt) -> OrderConfirmation {
        if let Err(e) = self.cart.clear() {
            error!(error = %e, reference = %request.reference, "Order placed but cart could not be cleared");
        }

        let confirmation = OrderConfirmation {
            reference: request.reference,
            transaction_id: receipt.transaction_id,
            items: request.items,
            summary: request.summary,
            contact: request.contact,
            placed_at: Utc::now(),
        };

        *self.lock_state() = CheckoutState::Succeeded(Box::new(confirmation.clone()));
        info!(reference = %confirmation.reference, "Order placed");
        self.notifier.notify(
            &format!("Order placed! Order Number: {}", confirmation.reference),
            NotificationKind::Success,
        );
        confirmation
    }

    fn fail(&self, reference: &OrderReference, reason: &str) {
        warn!(%reference, %reason, "Order failed");
        *self.lock_state() = CheckoutState::Failed {
            reason: reason.to_owned(),
            reference: reference.clone(),
        };
        self.notifier.notify(
            &format!("Order could not be processed. {reason} Order Number: {reference}"),
            NotificationKind::Error,
        );
    }

    fn lock_state(&self) -> MutexGuard<'_, CheckoutState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held while the gateway call is pending. Dropping it unsettled (the
/// submission future was dropped, or the gateway panicked) moves the
/// machine from `Submitting` to `Failed` so the shopper can retry.
struct PendingSubmission<'a> {
    state: &'a Mutex<CheckoutState>,
    reference: OrderReference,
    settled: bool,
}

impl PendingSubmission<'_> {
    /// The gateway answered; the caller records the outcome.
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, CheckoutState::Submitting) {
            warn!(reference = %self.reference, "Order submission cancelled");
            *state = CheckoutState::Failed {
                reason: CANCELLED_REASON.to_owned(),
                reference: self.reference.clone(),
            };
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;
    use woala_core::{Price, ProductId};

    use super::*;
    use crate::catalog::{Catalog, Product};
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;

    const FAST: Duration = Duration::from_millis(50);

    /// Counts calls and delegates to a simulated gateway.
    struct CountingGateway {
        inner: SimulatedGateway,
        calls: AtomicUsize,
    }

    impl CountingGateway {
        fn new(outcome: SimulatedOutcome) -> Self {
            Self {
                inner: SimulatedGateway::new(FAST, outcome),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PaymentGateway for CountingGateway {
        async fn place_order(&self, order: &OrderRequest) -> Result<GatewayReceipt, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.place_order(order).await
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn catalog() -> Catalog {
        let product = Product {
            id: ProductId::new(1),
            name: "Desk Lamp".to_owned(),
            price: Price::from_cents(10_000),
            original_price: Price::from_cents(12_000),
            image: "images/lamp.jpg".to_owned(),
            rating: Decimal::new(45, 1),
            reviews: 12,
            in_stock: true,
            images: Vec::new(),
            description: String::new(),
            features: Vec::new(),
        };
        Catalog::new(vec![product]).unwrap()
    }

    fn setup<G: PaymentGateway>(
        gateway: G,
    ) -> (Arc<MemoryStore>, Arc<RecordingNotifier>, CartStore, Checkout<G>) {
        let storage = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let cart = CartStore::new(storage.clone(), Arc::new(catalog()));
        let checkout = Checkout::new(cart.clone(), gateway, notifier.clone());
        (storage, notifier, cart, checkout)
    }

    fn filled_form() -> CheckoutForm {
        let mut form = CheckoutForm::new();
        for (field, value) in [
            (FieldName::FirstName, "Ada"),
            (FieldName::LastName, "Lovelace"),
            (FieldName::Email, "ada@example.com"),
            (FieldName::Phone, "5550000000"),
            (FieldName::Address, "1 Analytical St"),
            (FieldName::City, "Izmir"),
            (FieldName::PostalCode, "35000"),
            (FieldName::CardNumber, "4111111111111111"),
            (FieldName::CardName, "ADA LOVELACE"),
            (FieldName::ExpiryDate, "1230"),
            (FieldName::Cvv, "123"),
        ] {
            form.input(field, value);
        }
        form
    }

    #[test]
    fn test_order_reference_format() {
        let reference = OrderReference::generate();
        assert_eq!(reference.as_str().len(), 9);
        assert!(
            reference
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
        assert_eq!(reference.to_string(), format!("#{}", reference.as_str()));
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_without_gateway_call() {
        let (storage, notifier, _cart, checkout) =
            setup(CountingGateway::new(SimulatedOutcome::Approve));
        let mut form = filled_form();

        let err = checkout.submit_at(&mut form, today()).await.unwrap_err();
        assert!(matches!(err, SubmitError::EmptyCart));
        assert_eq!(checkout.state(), CheckoutState::Idle);
        assert_eq!(checkout.gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(storage.write_count(), 0);
        assert_eq!(
            notifier.of_kind(NotificationKind::Error),
            vec![EMPTY_CART_MESSAGE.to_owned()]
        );
    }

    #[tokio::test]
    async fn test_invalid_form_returns_to_idle() {
        let (_storage, notifier, cart, checkout) =
            setup(CountingGateway::new(SimulatedOutcome::Approve));
        cart.add_item(ProductId::new(1), 1).unwrap();
        let mut form = filled_form();
        form.input(FieldName::Email, "not-an-email");
        form.input(FieldName::Cvv, "");

        let err = checkout.submit_at(&mut form, today()).await.unwrap_err();
        let SubmitError::InvalidForm { fields } = err else {
            panic!("expected InvalidForm, got {err:?}");
        };
        assert_eq!(fields, vec![FieldName::Email, FieldName::Cvv]);
        assert_eq!(checkout.state(), CheckoutState::Idle);
        assert!(checkout.can_submit());
        assert_eq!(checkout.gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            notifier.of_kind(NotificationKind::Error),
            vec![INVALID_FORM_MESSAGE.to_owned()]
        );
    }

    #[tokio::test]
    async fn test_success_clears_cart_and_is_terminal() {
        let (_storage, notifier, cart, checkout) =
            setup(CountingGateway::new(SimulatedOutcome::Approve));
        cart.add_item(ProductId::new(1), 2).unwrap();
        let mut form = filled_form();

        let confirmation = checkout.submit_at(&mut form, today()).await.unwrap();
        assert_eq!(confirmation.summary.subtotal, Price::from_cents(20_000));
        assert_eq!(confirmation.summary.total, Price::from_cents(22_599));
        assert_eq!(confirmation.items.len(), 1);
        assert!(confirmation.transaction_id.starts_with("SIM-"));

        assert!(cart.snapshot().unwrap().is_empty());
        assert!(matches!(checkout.state(), CheckoutState::Succeeded(_)));
        assert!(!checkout.can_submit());

        let success = notifier.of_kind(NotificationKind::Success);
        assert_eq!(success.len(), 1);
        assert!(success[0].contains(&confirmation.reference.to_string()));

        let again = checkout.submit_at(&mut form, today()).await.unwrap_err();
        assert!(matches!(again, SubmitError::Completed));
        assert_eq!(checkout.gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_double_submit_places_one_order() {
        let (_storage, _notifier, cart, checkout) =
            setup(CountingGateway::new(SimulatedOutcome::Approve));
        cart.add_item(ProductId::new(1), 1).unwrap();
        let mut first = filled_form();
        let mut second = filled_form();

        let (a, b) = tokio::join!(
            checkout.submit_at(&mut first, today()),
            checkout.submit_at(&mut second, today())
        );

        assert!(a.is_ok());
        assert!(matches!(b, Err(SubmitError::InFlight)));
        assert_eq!(checkout.gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decline_keeps_cart_and_allows_retry() {
        let (_storage, notifier, cart, checkout) =
            setup(CountingGateway::new(SimulatedOutcome::Decline));
        cart.add_item(ProductId::new(1), 1).unwrap();
        let mut form = filled_form();

        let err = checkout.submit_at(&mut form, today()).await.unwrap_err();
        let SubmitError::Declined { reference, reason } = err else {
            panic!("expected Declined, got {err:?}");
        };
        assert_eq!(reason, SimulatedGateway::DECLINE_MESSAGE);
        assert_eq!(cart.total_item_count().unwrap(), 1);
        assert_eq!(
            checkout.state(),
            CheckoutState::Failed {
                reason: reason.clone(),
                reference: reference.clone(),
            }
        );
        assert!(checkout.can_submit());

        let failures = notifier.of_kind(NotificationKind::Error);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains(&reference.to_string()));

        let retry = checkout.submit_at(&mut form, today()).await.unwrap_err();
        assert!(matches!(retry, SubmitError::Declined { .. }));
        assert_eq!(checkout.gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let gateway = SimulatedGateway::approving().with_delay(Duration::from_secs(5));
        let (_storage, _notifier, cart, checkout) = setup(gateway);
        let checkout = checkout.with_timeout(FAST);
        cart.add_item(ProductId::new(1), 1).unwrap();
        let mut form = filled_form();

        let err = checkout.submit_at(&mut form, today()).await.unwrap_err();
        assert!(matches!(err, SubmitError::TimedOut { .. }));
        assert!(matches!(checkout.state(), CheckoutState::Failed { .. }));
        assert_eq!(cart.total_item_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_submission_rearms_submit() {
        let gateway = SimulatedGateway::approving().with_delay(Duration::from_millis(200));
        let (_storage, _notifier, cart, checkout) = setup(gateway);
        cart.add_item(ProductId::new(1), 1).unwrap();
        let mut form = filled_form();

        let outer = tokio::time::timeout(
            Duration::from_millis(20),
            checkout.submit_at(&mut form, today()),
        )
        .await;
        assert!(outer.is_err());

        let CheckoutState::Failed { reason, .. } = checkout.state() else {
            panic!("expected Failed, got {:?}", checkout.state());
        };
        assert_eq!(reason, CANCELLED_REASON);
        assert!(checkout.can_submit());
        assert_eq!(cart.total_item_count().unwrap(), 1);

        let confirmation = checkout.submit_at(&mut form, today()).await.unwrap();
        assert_eq!(confirmation.items.len(), 1);
        assert!(cart.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_outage_is_not_a_decline() {
        struct Offline;

        impl PaymentGateway for Offline {
            async fn place_order(
                &self,
                _order: &OrderRequest,
            ) -> Result<GatewayReceipt, GatewayError> {
                Err(GatewayError::Unavailable("connection refused".to_owned()))
            }
        }

        let (_storage, _notifier, cart, checkout) = setup(Offline);
        cart.add_item(ProductId::new(1), 1).unwrap();
        let mut form = filled_form();

        let err = checkout.submit_at(&mut form, today()).await.unwrap_err();
        let SubmitError::Unavailable { reason, .. } = err else {
            panic!("expected Unavailable, got {err:?}");
        };
        assert_eq!(reason, "payment service unavailable: connection refused");
        assert!(checkout.can_submit());
        assert_eq!(cart.total_item_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cash_on_delivery_sends_no_card() {
        struct CardCheck;

        impl PaymentGateway for CardCheck {
            async fn place_order(
                &self,
                order: &OrderRequest,
            ) -> Result<GatewayReceipt, GatewayError> {
                assert!(order.card.is_none());
                assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
                Ok(GatewayReceipt {
                    transaction_id: "COD-1".to_owned(),
                })
            }
        }

        let (_storage, _notifier, cart, checkout) = setup(CardCheck);
        cart.add_item(ProductId::new(1), 1).unwrap();
        let mut form = filled_form();
        form.select_payment_method(PaymentMethod::CashOnDelivery);
        form.input(FieldName::CardNumber, "");

        let confirmation = checkout.submit_at(&mut form, today()).await.unwrap();
        assert_eq!(confirmation.transaction_id, "COD-1");
    }
}
