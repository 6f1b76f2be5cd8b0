use anyhow::Result;
use his_core::{AgeInput, Validation, validate_age, validate_name, validate_phone};

use crate::cli::{CheckField, OutputFormat};
use crate::output::{print_json, print_success};

pub fn run_check(field: &CheckField) -> (&'static str, Validation) {
    match field {
        CheckField::Phone { value } => ("phone", validate_phone(value)),
        CheckField::Name { value } => ("name", validate_name(value)),
        CheckField::Age { value } => ("age", validate_age(AgeInput::Text(value))),
    }
}

pub fn check(field: &CheckField, format: OutputFormat) -> Result<()> {
    let (name, result) = run_check(field);
    if format == OutputFormat::Json {
        print_json(&result)?;
    }
    match result.message {
        None => {
            if format == OutputFormat::Table {
                print_success(&format!("{name} is valid"));
            }
            Ok(())
        }
        Some(message) => anyhow::bail!("{name}: {message}"),
    }
}
