use anyhow::Result;
use his_core::{IdCard, IdCardInfo, format_date, today};
use serde::Serialize;
use time::Date;

use crate::cli::OutputFormat;
use crate::output::{mark, print_json, print_table};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdCardReport {
    pub input: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(flatten)]
    pub info: Option<IdCardInfo>,
}

pub fn inspect(input: &str, today: Date) -> IdCardReport {
    match IdCard::parse_on(input, today) {
        Ok(card) => IdCardReport {
            input: input.to_string(),
            valid: true,
            message: None,
            region: Some(card.region_code().to_string()),
            info: Some(card.info_on(today)),
        },
        Err(e) => IdCardReport {
            input: input.to_string(),
            valid: false,
            message: Some(e.to_string()),
            region: None,
            info: None,
        },
    }
}

pub fn idcard(numbers: &[String], format: OutputFormat) -> Result<()> {
    let today = today();
    let reports: Vec<IdCardReport> = numbers.iter().map(|n| inspect(n, today)).collect();

    match format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Table => {
            println!("As of {}", format_date(today));
            print_table(
                ["", "Number", "Gender", "Birth date", "Age", "Message"],
                reports
                    .iter()
                    .map(|r| {
                        let (gender, birth, age) = match &r.info {
                            Some(info) => (
                                info.gender.label().to_string(),
                                info.birth_date.clone(),
                                info.age.to_string(),
                            ),
                            None => Default::default(),
                        };
                        [
                            mark(r.valid),
                            r.input.clone(),
                            gender,
                            birth,
                            age,
                            r.message.clone().unwrap_or_default(),
                        ]
                    })
                    .collect(),
            );
        }
    }

    let invalid = reports.iter().filter(|r| !r.valid).count();
    if invalid > 0 {
        anyhow::bail!("{invalid} of {} numbers invalid", reports.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn test_inspect_valid_number() {
        let report = inspect("11010519491231002x", date!(2024 - 06 - 01));
        assert!(report.valid);
        assert_eq!(report.region.as_deref(), Some("110105"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["birthDate"], "1949-12-31");
        assert_eq!(json["gender"], 0);
        assert_eq!(json["age"], 74);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_inspect_invalid_number() {
        let report = inspect("110105194912310021", date!(2024 - 06 - 01));
        assert!(!report.valid);
        assert_eq!(report.message.as_deref(), Some("身份证号校验位错误"));
        assert!(report.info.is_none());
    }
}
