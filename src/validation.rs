//! Input validation for money-moving operations.
//!
//! Every public operation validates all of its parameters before any
//! network call is made, and reports every violated field at once.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::Violation;

/// Orange Money subscriber numbers, without a country prefix.
static OM_SUBSCRIBER_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(69\d{7}|65[5-9]\d{6})$").expect("subscriber number pattern is valid")
});

/// Merchant numbers accepted by Y-Note, with an optional 237 country
/// prefix.
static YNOTE_MERCHANT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(237)?(69\d{7}$|65[5-9]\d{6}$)").expect("merchant number pattern is valid")
});

/// Whether `value` is a valid Orange Money subscriber number.
pub fn is_om_number(value: &str) -> bool {
    OM_SUBSCRIBER_NUMBER.is_match(value)
}

/// Whether `value` is a merchant number accepted by Y-Note.
pub fn is_ynote_merchant_number(value: &str) -> bool {
    YNOTE_MERCHANT_NUMBER.is_match(value)
}

/// Whether a zero transaction amount is accepted.
///
/// The provider contract does not say; [`ZeroAmountPolicy::Reject`] is the
/// conservative default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroAmountPolicy {
    #[default]
    Reject,
    Allow,
}

pub(crate) fn require_env(violations: &mut Vec<Violation>, name: &str) -> String {
    match std::env::var(name) {
        Ok(value) => value,
        Err(_) => {
            violations.push(Violation::new(name, "environment variable is not set"));
            String::new()
        }
    }
}

pub(crate) fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).as_deref(), Ok("true") | Ok("1"))
}

pub(crate) fn check_required(violations: &mut Vec<Violation>, field: &str, value: &str) {
    if value.trim().is_empty() {
        violations.push(Violation::new(field, "must not be empty"));
    }
}

pub(crate) fn check_notification_url(violations: &mut Vec<Violation>, field: &str, value: &str) {
    if Url::parse(value).is_err() {
        violations.push(Violation::new(field, "must be a well-formed URL"));
    }
}

pub(crate) fn check_amount(
    violations: &mut Vec<Violation>,
    field: &str,
    amount: u32,
    policy: ZeroAmountPolicy,
) {
    if amount == 0 && policy == ZeroAmountPolicy::Reject {
        violations.push(Violation::new(field, "must be greater than zero"));
    }
}

pub(crate) fn check_om_number(violations: &mut Vec<Violation>, field: &str, value: &str) {
    if !is_om_number(value) {
        violations.push(Violation::new(
            field,
            "must be an Orange Money subscriber number",
        ));
    }
}

pub(crate) fn check_ynote_merchant_number(
    violations: &mut Vec<Violation>,
    field: &str,
    value: &str,
) {
    if !is_ynote_merchant_number(value) {
        violations.push(Violation::new(
            field,
            "must be a merchant number accepted by Y-Note",
        ));
    }
}
