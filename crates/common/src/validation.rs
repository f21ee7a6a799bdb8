//! Field validation shared by the form controller and the intake service
//!
//! The rules here decide whether a non-anonymous reporter left enough
//! contact information for the case to be followed up.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").expect("email pattern compiles");
}

/// Chilean country calling code, stripped before counting phone digits
const NATIONAL_PREFIX: &str = "56";

/// Accepted RUT body length, in digits
const MIN_RUT_BODY_DIGITS: usize = 7;
const MAX_RUT_BODY_DIGITS: usize = 8;

/// Compute the RUT check character for a string of body digits.
///
/// Digits are weighted from least significant upward with 2,3,4,5,6,7
/// repeating. Returns `None` if the body contains anything but ASCII digits
/// or is empty.
pub fn rut_check_digit(body: &str) -> Option<char> {
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = body
        .bytes()
        .rev()
        .zip([2u32, 3, 4, 5, 6, 7].into_iter().cycle())
        .map(|(digit, weight)| u32::from(digit - b'0') * weight)
        .sum();

    let check = match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        n => char::from_digit(n, 10)?,
    };
    Some(check)
}

/// Validate a RUT in any common formatting (`12.345.678-5`, `123456785`, ...)
pub fn validate_rut(rut: &str) -> bool {
    let clean: String = rut
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let body_len = clean.len().saturating_sub(1);
    if !(MIN_RUT_BODY_DIGITS..=MAX_RUT_BODY_DIGITS).contains(&body_len) {
        return false;
    }

    let (body, supplied) = clean.split_at(clean.len() - 1);
    match rut_check_digit(body) {
        Some(expected) => supplied.starts_with(expected),
        None => false,
    }
}

/// Validate a phone number: 8 or 9 digits once formatting and an optional
/// leading `56` are removed
pub fn validate_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = digits.strip_prefix(NATIONAL_PREFIX).unwrap_or(&digits);
    matches!(national.len(), 8 | 9)
}

/// Validate an e-mail address shape (`local@domain.tld`)
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

/// Step-1 rule: the reporter is anonymous, or gave a name with a valid RUT,
/// or gave a valid e-mail together with a valid phone.
pub fn contact_is_sufficient(
    anonymous: bool,
    name: &str,
    rut: &str,
    email: &str,
    phone: &str,
) -> bool {
    if anonymous {
        return true;
    }

    let identified = !name.trim().is_empty() && validate_rut(rut);
    let reachable = validate_email(email) && validate_phone(phone);

    identified || reachable
}
