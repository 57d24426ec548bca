//! Checkout field rules and live input formatters.
//!
//! Rules check a single field's value and return a [`FieldError`] whose
//! `Display` is the inline message shown under the field. Formatters run on
//! every keystroke and are idempotent: formatting their own output returns
//! it unchanged.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use woala_core::Email;

/// Number of digits on a card.
pub const CARD_DIGITS: usize = 16;

const CARD_GROUP: usize = 4;
const EXPIRY_DIGITS: usize = 4;
const CVV_MIN_DIGITS: usize = 3;
const CVV_MAX_DIGITS: usize = 4;

/// Fields on the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    City,
    PostalCode,
    CardNumber,
    CardName,
    ExpiryDate,
    Cvv,
}

impl FieldName {
    /// Contact and shipping fields, always required.
    pub const CONTACT: [Self; 7] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::City,
        Self::PostalCode,
    ];

    /// Card fields, required only when paying by card.
    pub const CARD: [Self; 4] = [Self::CardNumber, Self::CardName, Self::ExpiryDate, Self::Cvv];

    /// Element id used by the checkout page.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::City => "city",
            Self::PostalCode => "postalCode",
            Self::CardNumber => "cardNumber",
            Self::CardName => "cardName",
            Self::ExpiryDate => "expiryDate",
            Self::Cvv => "cvv",
        }
    }

    /// Look a field up by its element id.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::CONTACT
            .into_iter()
            .chain(Self::CARD)
            .find(|field| field.id() == id)
    }

    /// Apply this field's live formatter, if it has one.
    #[must_use]
    pub fn format_input(self, raw: &str) -> String {
        match self {
            Self::CardNumber => format_card_number(raw),
            Self::ExpiryDate => format_expiry(raw),
            Self::Cvv => format_cvv(raw),
            _ => raw.to_owned(),
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a valid card number")]
    InvalidCardNumber,
    #[error("Please enter a valid expiration date (MM/YY)")]
    InvalidExpiry,
    #[error("Card has expired")]
    Expired,
    #[error("Please enter a valid CVV")]
    InvalidCvv,
}

/// Today's date in local time, for expiry checks.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Validate one field's value.
///
/// Every field is required; the value is trimmed before any rule runs.
///
/// # Errors
///
/// Returns the first rule the value breaks.
pub fn validate_field(field: FieldName, value: &str, today: NaiveDate) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::Required);
    }

    match field {
        FieldName::Email => validate_email(value),
        FieldName::CardNumber => validate_card_number(value),
        FieldName::ExpiryDate => validate_expiry(value, today),
        FieldName::Cvv => validate_cvv(value),
        _ => Ok(()),
    }
}

/// `local@domain.tld` with no whitespace.
///
/// # Errors
///
/// Returns `FieldError::InvalidEmail` if the shape does not match.
pub fn validate_email(value: &str) -> Result<(), FieldError> {
    Email::parse(value)
        .map(|_| ())
        .map_err(|_| FieldError::InvalidEmail)
}

/// Four groups of four digits separated by single spaces.
///
/// # Errors
///
/// Returns `FieldError::InvalidCardNumber` if the shape does not match.
pub fn validate_card_number(value: &str) -> Result<(), FieldError> {
    let groups: Vec<&str> = value.split(' ').collect();
    let valid = groups.len() == CARD_DIGITS / CARD_GROUP
        && groups
            .iter()
            .all(|g| g.len() == CARD_GROUP && g.bytes().all(|b| b.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        Err(FieldError::InvalidCardNumber)
    }
}

/// `MM/YY`, month 01-12, not before the current month.
///
/// The two-digit year is compared against the current year mod 100.
///
/// # Errors
///
/// Returns `FieldError::InvalidExpiry` for a malformed value and
/// `FieldError::Expired` for a month in the past.
pub fn validate_expiry(value: &str, today: NaiveDate) -> Result<(), FieldError> {
    let (month, year) = parse_expiry(value).ok_or(FieldError::InvalidExpiry)?;

    let current_year = today.year().rem_euclid(100).unsigned_abs();
    let current_month = today.month();
    if year < current_year || (year == current_year && month < current_month) {
        return Err(FieldError::Expired);
    }

    Ok(())
}

fn parse_expiry(value: &str) -> Option<(u32, u32)> {
    let (month, year) = value.split_once('/')?;
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return None;
    }

    let month: u32 = month.parse().ok()?;
    let year: u32 = year.parse().ok()?;
    (1..=12).contains(&month).then_some((month, year))
}

/// Three or four digits.
///
/// # Errors
///
/// Returns `FieldError::InvalidCvv` if the shape does not match.
pub fn validate_cvv(value: &str) -> Result<(), FieldError> {
    let valid = (CVV_MIN_DIGITS..=CVV_MAX_DIGITS).contains(&value.len())
        && value.bytes().all(|b| b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(FieldError::InvalidCvv)
    }
}

fn digits(raw: &str, max: usize) -> String {
    raw.chars().filter(char::is_ascii_digit).take(max).collect()
}

/// Regroup a card number as `dddd dddd dddd dddd`, dropping non-digits.
#[must_use]
pub fn format_card_number(raw: &str) -> String {
    let digits = digits(raw, CARD_DIGITS);
    let mut formatted = String::with_capacity(digits.len() + CARD_DIGITS / CARD_GROUP);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && i % CARD_GROUP == 0 {
            formatted.push(' ');
        }
        formatted.push(c);
    }
    formatted
}

/// Insert `/` after the month once two digits are typed.
#[must_use]
pub fn format_expiry(raw: &str) -> String {
    let digits = digits(raw, EXPIRY_DIGITS);
    match digits.split_at_checked(2) {
        Some((month, year)) => format!("{month}/{year}"),
        None => digits,
    }
}

/// Keep only digits.
#[must_use]
pub fn format_cvv(raw: &str) -> String {
    digits(raw, CVV_MAX_DIGITS)
}
