//! Checkout command.

#![allow(clippy::print_stdout)]

use std::time::Duration;

use clap::Args;
use woala_core::PaymentMethod;
use woala_storefront::checkout::{SimulatedGateway, SimulatedOutcome, SubmitError};
use woala_storefront::validation::FieldName;
use woala_storefront::{AppError, CheckoutForm, Shop};

use super::cart::print_cart;

/// Checkout form fields, as typed on the checkout page.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, default_value = "")]
    pub city: String,
    #[arg(long, default_value = "")]
    pub postal_code: String,

    /// Payment method (`card` or `cod`)
    #[arg(long, default_value = "card")]
    pub payment: PaymentMethod,

    #[arg(long, default_value = "")]
    pub card_number: String,
    /// Name on card
    #[arg(long, default_value = "")]
    pub card_name: String,
    /// Expiry as MM/YY
    #[arg(long, default_value = "")]
    pub expiry: String,
    #[arg(long, default_value = "")]
    pub cvv: String,

    /// Make the simulated bank decline the payment
    #[arg(long)]
    pub decline: bool,

    /// Simulated processing time in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub delay_ms: u64,
}

impl CheckoutArgs {
    /// Feed every field through the form's input handling.
    fn fill(&self, form: &mut CheckoutForm) {
        form.select_payment_method(self.payment);
        for (field, value) in [
            (FieldName::FirstName, &self.first_name),
            (FieldName::LastName, &self.last_name),
            (FieldName::Email, &self.email),
            (FieldName::Phone, &self.phone),
            (FieldName::Address, &self.address),
            (FieldName::City, &self.city),
            (FieldName::PostalCode, &self.postal_code),
            (FieldName::CardNumber, &self.card_number),
            (FieldName::CardName, &self.card_name),
            (FieldName::ExpiryDate, &self.expiry),
            (FieldName::Cvv, &self.cvv),
        ] {
            form.input(field, value);
        }
    }
}

/// Show the order summary, validate the form and place the order.
pub async fn run(shop: &Shop, args: CheckoutArgs, timeout: Duration) -> Result<(), AppError> {
    let Some(view) = shop.open_checkout()? else {
        return Ok(());
    };
    print_cart(&view.cart, &view.summary);
    println!();

    let mut form = CheckoutForm::new();
    args.fill(&mut form);

    let outcome = if args.decline {
        SimulatedOutcome::Decline
    } else {
        SimulatedOutcome::Approve
    };
    let gateway = SimulatedGateway::new(Duration::from_millis(args.delay_ms), outcome);
    let checkout = shop.checkout(gateway).with_timeout(timeout);

    println!("Placing order...");
    match checkout.submit(&mut form).await {
        Ok(confirmation) => {
            println!("Order Number: {}", confirmation.reference);
            println!("Total: {}", confirmation.summary.total.display());
            println!("Contact: {}", confirmation.contact.email);
            Ok(())
        }
        Err(SubmitError::InvalidForm { fields }) => {
            for field in &fields {
                if let Some(error) = form.error(*field) {
                    println!("  {field}: {error}");
                }
            }
            Err(SubmitError::InvalidForm { fields }.into())
        }
        Err(e) => Err(e.into()),
    }
}
