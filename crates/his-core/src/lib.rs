//! # his-core
//!
//! Domain types shared by the HIS front-desk crates and the pure validators
//! used by the registration desk: identity card numbers, phone numbers,
//! patient names and ages.

pub mod error;
pub mod idcard;
pub mod time;
pub mod user;
pub mod validators;

pub use error::{CoreError, Result};
pub use idcard::{
    Gender, IdCard, IdCardError, IdCardInfo, parse_id_card, parse_id_card_on, validate_id_card,
    validate_id_card_on,
};
pub use self::time::{elapsed_years, format_date, today};
pub use user::{Role, User};
pub use validators::{
    AgeInput, FieldError, Validation, check_age, check_name, check_phone, validate_age,
    validate_name, validate_phone,
};
