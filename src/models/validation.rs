//! Input format checks for student data
//!
//! Initials are written as `И.О.` (two uppercase Cyrillic letters, each
//! followed by a dot, with an optional space between). Phone numbers are
//! Russian numbers such as `+7 999 123-45-67`, `8(999)1234567` or
//! `+79991234567`.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Minimum age at admission, in years
pub const MIN_ADMISSION_AGE: i32 = 16;

/// Earliest accepted birth or admission year
pub const MIN_YEAR: i32 = 1900;

/// Validation errors for student data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    /// A required field is blank
    Required(&'static str),
    /// Initials are not in the `И.О.` form
    InvalidInitials(String),
    /// Phone number is not a recognised Russian number
    InvalidPhone(String),
    /// A year lies outside the accepted range
    YearOutOfRange { field: &'static str, year: i32 },
    /// Student would be younger than the minimum admission age
    TooYoung { age: i32 },
    /// Department reference is not a valid identifier
    InvalidDepartment(i64),
}

impl fmt::Display for StudentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required(field) => write!(f, "{} is required", field),
            Self::InvalidInitials(value) => {
                write!(f, "Initials '{}' must be in the form 'И.О.'", value)
            }
            Self::InvalidPhone(value) => write!(f, "Invalid phone number format: '{}'", value),
            Self::YearOutOfRange { field, year } => {
                write!(f, "{} {} is out of range", field, year)
            }
            Self::TooYoung { age } => write!(
                f,
                "Student cannot be younger than {} at admission (got {})",
                MIN_ADMISSION_AGE, age
            ),
            Self::InvalidDepartment(id) => write!(f, "Invalid department id: {}", id),
        }
    }
}

impl std::error::Error for StudentValidationError {}

fn is_upper_cyrillic(c: char) -> bool {
    matches!(c, 'А'..='Я' | 'Ё')
}

/// Check that initials have the form `И.О.` or `И. О.`
pub fn is_valid_initials(initials: &str) -> bool {
    let mut chars = initials.chars().peekable();

    let first = chars.next().is_some_and(is_upper_cyrillic) && chars.next() == Some('.');
    if !first {
        return false;
    }

    if chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    chars.next().is_some_and(is_upper_cyrillic)
        && chars.next() == Some('.')
        && chars.next().is_none()
}

/// Consume exactly `count` ASCII digits
fn digits(chars: &mut Peekable<Chars<'_>>, count: usize) -> bool {
    (0..count).all(|_| chars.next().is_some_and(|c| c.is_ascii_digit()))
}

/// Consume one optional character matching `pred`
fn optional(chars: &mut Peekable<Chars<'_>>, pred: impl Fn(char) -> bool) {
    if chars.peek().is_some_and(|&c| pred(c)) {
        chars.next();
    }
}

fn is_separator(c: char) -> bool {
    c == '-' || c.is_whitespace()
}

/// Check a phone number and return it normalized to `7XXXXXXXXXX`
///
/// Accepts a `+7` or `8` prefix, an optional space, an optional bracketed
/// area code, and single spaces or dashes between the digit groups.
/// Returns `None` when the number is not in a recognised format.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let mut chars = phone.chars().peekable();

    match chars.next() {
        Some('+') if chars.next() == Some('7') => {}
        Some('8') => {}
        _ => return None,
    }

    optional(&mut chars, char::is_whitespace);
    optional(&mut chars, |c| c == '(');
    if !digits(&mut chars, 3) {
        return None;
    }
    optional(&mut chars, |c| c == ')');

    for group in [3, 2, 2] {
        optional(&mut chars, is_separator);
        if !digits(&mut chars, group) {
            return None;
        }
    }

    if chars.next().is_some() {
        return None;
    }

    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    Some(format!("7{}", &digits[1..]))
}
