//! Registration form field validators.
//!
//! Each `check_*` function returns a typed result; the `validate_*`
//! counterparts flatten it into a [`Validation`] record whose message is
//! shown to the user verbatim.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 30;
pub const AGE_MAX: i64 = 150;

// Mainland mobile numbers: 1, then 3-9, then nine more digits.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[3-9][0-9]{9}$").expect("valid phone pattern"));

// CJK unified ideographs, Latin letters, whitespace, middle dot and period.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{4E00}-\x{9FA5}a-zA-Z\s·.]+$").expect("valid name pattern")
});

/// Outcome of validating one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Validation {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Validation::ok(),
            Err(e) => Validation::invalid(e.to_string()),
        }
    }
}

/// Reasons a phone, name or age field is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("请输入有效的11位手机号码")]
    Phone,

    #[error("请输入姓名")]
    NameEmpty,

    #[error("姓名至少2个字符")]
    NameTooShort,

    #[error("姓名不能超过30个字符")]
    NameTooLong,

    #[error("姓名只能包含中文、英文字母")]
    NameCharacters,

    #[error("请输入有效年龄")]
    AgeNotNumber,

    #[error("年龄不能为负数")]
    AgeNegative,

    #[error("年龄不能超过150岁")]
    AgeTooLarge,
}

/// Returns the trimmed phone number if it is a valid mainland mobile number.
pub fn check_phone(input: &str) -> Result<&str, FieldError> {
    let trimmed = input.trim();
    if PHONE_PATTERN.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(FieldError::Phone)
    }
}

pub fn validate_phone(input: &str) -> Validation {
    check_phone(input).into()
}

/// Returns the trimmed name if it is acceptable for a patient record.
pub fn check_name(input: &str) -> Result<&str, FieldError> {
    let trimmed = input.trim();
    let chars = trimmed.chars().count();
    if chars == 0 {
        return Err(FieldError::NameEmpty);
    }
    if chars < NAME_MIN_CHARS {
        return Err(FieldError::NameTooShort);
    }
    if chars > NAME_MAX_CHARS {
        return Err(FieldError::NameTooLong);
    }
    if !NAME_PATTERN.is_match(trimmed) {
        return Err(FieldError::NameCharacters);
    }
    Ok(trimmed)
}

pub fn validate_name(input: &str) -> Validation {
    check_name(input).into()
}

/// Age as typed into a form (text) or supplied by code (number).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgeInput<'a> {
    Number(f64),
    Text(&'a str),
}

impl From<f64> for AgeInput<'_> {
    fn from(value: f64) -> Self {
        AgeInput::Number(value)
    }
}

impl From<i64> for AgeInput<'_> {
    fn from(value: i64) -> Self {
        AgeInput::Number(value as f64)
    }
}

impl From<i32> for AgeInput<'_> {
    fn from(value: i32) -> Self {
        AgeInput::Number(f64::from(value))
    }
}

impl From<u32> for AgeInput<'_> {
    fn from(value: u32) -> Self {
        AgeInput::Number(f64::from(value))
    }
}

impl<'a> From<&'a str> for AgeInput<'a> {
    fn from(value: &'a str) -> Self {
        AgeInput::Text(value)
    }
}

impl<'a> From<&'a String> for AgeInput<'a> {
    fn from(value: &'a String) -> Self {
        AgeInput::Text(value.as_str())
    }
}

/// Returns the age in whole years if it lies in `0..=150`.
///
/// Text is read like a form field: leading whitespace and an optional sign,
/// then the leading run of digits; anything after the digits is ignored.
pub fn check_age<'a>(input: impl Into<AgeInput<'a>>) -> Result<u32, FieldError> {
    let value = match input.into() {
        AgeInput::Number(n) => n,
        AgeInput::Text(text) => leading_integer(text).ok_or(FieldError::AgeNotNumber)?,
    };
    if value.is_nan() {
        return Err(FieldError::AgeNotNumber);
    }
    if value < 0.0 {
        return Err(FieldError::AgeNegative);
    }
    if value > AGE_MAX as f64 {
        return Err(FieldError::AgeTooLarge);
    }
    Ok(value as u32)
}

pub fn validate_age<'a>(input: impl Into<AgeInput<'a>>) -> Validation {
    check_age(input).into()
}

fn leading_integer(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    // Digit runs too long for f64 precision still compare correctly against the bounds.
    let magnitude: f64 = rest[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
