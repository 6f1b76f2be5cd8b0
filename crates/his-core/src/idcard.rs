//! Resident identity card numbers (GB 11643, 18 characters).
//!
//! An identity number is `RRRRRR YYYYMMDD SSS C`: a six-digit region code,
//! the holder's birth date, a three-digit sequence whose last digit encodes
//! the holder's gender (odd for male, even for female), and a check character
//! computed with the ISO 7064 MOD 11-2 scheme over the first 17 digits.
//!
//! [`IdCard::parse`] is the typed entry point. [`validate_id_card`] and
//! [`parse_id_card`] expose the same rules as plain records for form code and
//! batch import, and never fail.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::error::CoreError;
use crate::time::{elapsed_years, format_date, today};
use crate::validators::Validation;

/// Required length of an identity number.
pub const ID_CARD_LENGTH: usize = 18;

/// Oldest age accepted for a holder, counted in calendar years: a birth
/// year earlier than the current year minus this is rejected.
pub const MAX_AGE: i32 = 150;

const WEIGHTS: [u32; 17] = [7, 9, 10, 5, 8, 4, 2, 1, 6, 3, 7, 9, 10, 5, 8, 4, 2];
const CHECK_CODES: &[u8; 11] = b"10X98765432";

static ID_CARD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{17}[0-9X]$").expect("valid identity number pattern"));

/// Reasons an identity number is rejected. The display text is shown to the
/// user verbatim next to the input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdCardError {
    #[error("请输入身份证号")]
    Empty,

    #[error("身份证号必须为18位")]
    Length,

    #[error("身份证号格式不正确")]
    Format,

    #[error("身份证号校验位错误")]
    Checksum,

    #[error("身份证号出生日期无效")]
    InvalidBirthDate,

    #[error("出生日期不能是未来日期")]
    FutureBirthDate,

    #[error("出生日期不合理")]
    UnreasonableAge,
}

/// Gender encoded by the 17th character of an identity number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Gender {
    Female = 0,
    Male = 1,
}

impl Gender {
    /// Numeric code used by the registration API (1 male, 0 female).
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Female => "女",
            Gender::Male => "男",
        }
    }

    fn from_digit(digit: u8) -> Self {
        if digit % 2 == 1 {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        gender.code()
    }
}

impl TryFrom<u8> for Gender {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Gender::Female),
            1 => Ok(Gender::Male),
            other => Err(CoreError::InvalidGender(other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated identity number in canonical (trimmed, upper-case) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdCard {
    number: String,
    birth_date: Date,
    gender: Gender,
}

impl IdCard {
    /// Validates `input` against today's date.
    pub fn parse(input: &str) -> Result<Self, IdCardError> {
        Self::parse_on(input, today())
    }

    /// Validates `input` as of `today`.
    ///
    /// Checks run in a fixed order and the first failure wins: empty input,
    /// length, character format, check character, calendar validity of the
    /// embedded birth date, birth date in the future, birth year more than
    /// [`MAX_AGE`] years back.
    pub fn parse_on(input: &str, today: Date) -> Result<Self, IdCardError> {
        let number = input.trim().to_uppercase();
        if number.is_empty() {
            return Err(IdCardError::Empty);
        }
        if number.chars().count() != ID_CARD_LENGTH {
            return Err(IdCardError::Length);
        }
        if !ID_CARD_PATTERN.is_match(&number) {
            return Err(IdCardError::Format);
        }

        // The pattern guarantees 18 ASCII bytes from here on.
        let bytes = number.as_bytes();
        let expected = check_code(&bytes[..17]);
        if bytes[17] != expected {
            return Err(IdCardError::Checksum);
        }

        let birth_date = birth_date_of(&number).ok_or(IdCardError::InvalidBirthDate)?;
        if birth_date > today {
            return Err(IdCardError::FutureBirthDate);
        }
        if birth_date.year() < today.year() - MAX_AGE {
            return Err(IdCardError::UnreasonableAge);
        }

        let gender = Gender::from_digit(bytes[16] - b'0');

        Ok(Self {
            number,
            birth_date,
            gender,
        })
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    /// Six-digit administrative region code.
    pub fn region_code(&self) -> &str {
        &self.number[..6]
    }

    pub fn birth_date(&self) -> Date {
        self.birth_date
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    /// Completed years of age on `today`.
    pub fn age_on(&self, today: Date) -> u32 {
        elapsed_years(self.birth_date, today).max(0) as u32
    }

    /// Derived facts as of `today`.
    pub fn info_on(&self, today: Date) -> IdCardInfo {
        IdCardInfo {
            gender: self.gender,
            birth_date: format_date(self.birth_date),
            age: self.age_on(today),
        }
    }
}

impl FromStr for IdCard {
    type Err = IdCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IdCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.number)
    }
}

/// Facts extracted from a valid identity number, used to auto-fill the
/// registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdCardInfo {
    pub gender: Gender,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub age: u32,
}

/// Expected check character for the first 17 digits of an identity number.
///
/// `body` must hold exactly 17 ASCII digits.
pub fn check_code(body: &[u8]) -> u8 {
    let sum: u32 = body
        .iter()
        .zip(WEIGHTS)
        .map(|(digit, weight)| u32::from(digit - b'0') * weight)
        .sum();
    CHECK_CODES[(sum % 11) as usize]
}

fn birth_date_of(number: &str) -> Option<Date> {
    let year: i32 = number[6..10].parse().ok()?;
    let month: u8 = number[10..12].parse().ok()?;
    let day: u8 = number[12..14].parse().ok()?;
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// Validates an identity number as of today.
pub fn validate_id_card(input: &str) -> Validation {
    validate_id_card_on(input, today())
}

pub fn validate_id_card_on(input: &str, today: Date) -> Validation {
    IdCard::parse_on(input, today).into()
}

/// Extracts gender, birth date and age, or `None` when the number is invalid.
pub fn parse_id_card(input: &str) -> Option<IdCardInfo> {
    parse_id_card_on(input, today())
}

pub fn parse_id_card_on(input: &str, today: Date) -> Option<IdCardInfo> {
    IdCard::parse_on(input, today)
        .ok()
        .map(|card| card.info_on(today))
}
