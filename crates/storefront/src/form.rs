//! Checkout form state.
//!
//! The form is driven by the same events the checkout page emits: `input`
//! on every keystroke and `blur` when a field loses focus. Each field keeps
//! its current value and the error shown under it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

use woala_core::{Email, PaymentMethod};

use crate::validation::{FieldError, FieldName, validate_field};

/// Value and inline error of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub error: Option<FieldError>,
}

/// Contact and shipping details from a validated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

/// Card details from a validated form.
///
/// Implements `Debug` manually to redact the card number and CVV.
#[derive(Clone)]
pub struct CardDetails {
    pub number: SecretString,
    pub holder: String,
    pub expiry: String,
    pub cvv: SecretString,
}

impl CardDetails {
    /// Last four digits of the card number, for receipts and logs.
    #[must_use]
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self
            .number
            .expose_secret()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let start = digits.len().saturating_sub(4);
        digits.get(start..).unwrap_or_default().iter().collect()
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("**** {}", self.last_four()))
            .field("holder", &self.holder)
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// The checkout form: field values, their errors, and the payment method.
#[derive(Clone)]
pub struct CheckoutForm {
    fields: BTreeMap<FieldName, FieldState>,
    payment_method: PaymentMethod,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CheckoutForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (field, state) in &self.fields {
            let value: &dyn std::fmt::Debug = match field {
                FieldName::CardNumber | FieldName::Cvv if !state.value.is_empty() => &"[REDACTED]",
                _ => &state.value,
            };
            map.entry(&field.id(), &(value, state.error));
        }
        map.entry(&"paymentMethod", &self.payment_method);
        map.finish()
    }
}

impl CheckoutForm {
    /// A blank form paying by card.
    #[must_use]
    pub fn new() -> Self {
        let fields = FieldName::CONTACT
            .into_iter()
            .chain(FieldName::CARD)
            .map(|field| (field, FieldState::default()))
            .collect();
        Self {
            fields,
            payment_method: PaymentMethod::default(),
        }
    }

    /// Current value of a field.
    #[must_use]
    pub fn value(&self, field: FieldName) -> &str {
        self.fields.get(&field).map_or("", |s| s.value.as_str())
    }

    /// Inline error currently shown for a field.
    #[must_use]
    pub fn error(&self, field: FieldName) -> Option<FieldError> {
        self.fields.get(&field).and_then(|s| s.error)
    }

    /// Every field with its state, in display order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldName, &FieldState)> {
        self.fields.iter().map(|(field, state)| (*field, state))
    }

    /// Fields currently showing an error.
    #[must_use]
    pub fn invalid_fields(&self) -> Vec<FieldName> {
        self.fields
            .iter()
            .filter(|(_, s)| s.error.is_some())
            .map(|(field, _)| *field)
            .collect()
    }

    /// Selected payment method.
    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Switch payment method. Hidden card fields stop showing errors.
    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
        if !method.requires_card() {
            for field in FieldName::CARD {
                self.clear_error(field);
            }
        }
    }

    /// Fields that must pass validation for the current payment method.
    #[must_use]
    pub fn required_fields(&self) -> Vec<FieldName> {
        let mut required = FieldName::CONTACT.to_vec();
        if self.payment_method.requires_card() {
            required.extend(FieldName::CARD);
        }
        required
    }

    /// Keystroke in a field: format the value and clear its error.
    ///
    /// Returns the value as it now appears in the field.
    pub fn input(&mut self, field: FieldName, raw: &str) -> &str {
        let state = self.fields.entry(field).or_default();
        state.value = field.format_input(raw);
        state.error = None;
        &state.value
    }

    /// Field lost focus: validate it and show any error.
    ///
    /// # Errors
    ///
    /// Returns the rule the field's value breaks.
    pub fn blur(&mut self, field: FieldName, today: NaiveDate) -> Result<(), FieldError> {
        let state = self.fields.entry(field).or_default();
        let result = validate_field(field, &state.value, today);
        state.error = result.err();
        result
    }

    /// Validate every required field and show all errors at once.
    ///
    /// Does not stop at the first failure. Returns `true` only if every
    /// required field passes.
    pub fn validate_all(&mut self, today: NaiveDate) -> bool {
        let required = self.required_fields();
        let mut all_valid = true;
        for field in FieldName::CONTACT.into_iter().chain(FieldName::CARD) {
            if required.contains(&field) {
                all_valid &= self.blur(field, today).is_ok();
            } else {
                self.clear_error(field);
            }
        }
        all_valid
    }

    /// Contact details, if the contact fields hold valid values.
    #[must_use]
    pub fn contact_details(&self) -> Option<ContactDetails> {
        let text = |field| self.value(field).trim().to_owned();
        Some(ContactDetails {
            first_name: text(FieldName::FirstName),
            last_name: text(FieldName::LastName),
            email: Email::parse(self.value(FieldName::Email).trim()).ok()?,
            phone: text(FieldName::Phone),
            address: text(FieldName::Address),
            city: text(FieldName::City),
            postal_code: text(FieldName::PostalCode),
        })
    }

    /// Card details when paying by card.
    #[must_use]
    pub fn card_details(&self) -> Option<CardDetails> {
        if !self.payment_method.requires_card() {
            return None;
        }
        Some(CardDetails {
            number: SecretString::from(self.value(FieldName::CardNumber).trim().to_owned()),
            holder: self.value(FieldName::CardName).trim().to_owned(),
            expiry: self.value(FieldName::ExpiryDate).trim().to_owned(),
            cvv: SecretString::from(self.value(FieldName::Cvv).trim().to_owned()),
        })
    }

    fn clear_error(&mut self, field: FieldName) {
        if let Some(state) = self.fields.get_mut(&field) {
            state.error = None;
        }
    }
}
