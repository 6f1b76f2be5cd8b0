//! Batch validation of registration drafts exported from the front desk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use his_core::{AgeInput, Gender, IdCard, IdCardInfo, check_age, check_name, check_phone, today};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::cli::OutputFormat;
use crate::output::{mark, print_json, print_table};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDraft {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub id_card: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub age: Option<AgeField>,
    #[serde(default)]
    pub gender: Option<u8>,
}

/// Age as it appears in exported drafts: a number or the raw form text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AgeField {
    Number(f64),
    Text(String),
}

impl AgeField {
    fn as_input(&self) -> AgeInput<'_> {
        match self {
            AgeField::Number(n) => AgeInput::Number(*n),
            AgeField::Text(s) => AgeInput::Text(s),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftReport {
    pub row: usize,
    pub patient_name: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<IdCardInfo>,
}

/// Validates every draft; rows are numbered from 1.
pub fn review(drafts: &[RegistrationDraft], today: Date) -> Vec<DraftReport> {
    drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| review_one(i + 1, draft, today))
        .collect()
}

fn review_one(row: usize, draft: &RegistrationDraft, today: Date) -> DraftReport {
    let mut problems = Vec::new();

    if let Err(e) = check_name(&draft.patient_name) {
        problems.push(e.to_string());
    }

    let derived = match IdCard::parse_on(&draft.id_card, today) {
        Ok(card) => Some(card.info_on(today)),
        Err(e) => {
            problems.push(e.to_string());
            None
        }
    };

    if let Err(e) = check_phone(&draft.phone) {
        problems.push(e.to_string());
    }

    if let Some(age) = &draft.age {
        match check_age(age.as_input()) {
            Ok(age) => {
                if let Some(info) = &derived
                    && info.age != age
                {
                    problems.push(format!("年龄与身份证号不一致（应为{}岁）", info.age));
                }
            }
            Err(e) => problems.push(e.to_string()),
        }
    }

    if let Some(code) = draft.gender {
        match Gender::try_from(code) {
            Ok(gender) => {
                if let Some(info) = &derived
                    && info.gender != gender
                {
                    problems.push(format!("性别与身份证号不一致（应为{}）", info.gender));
                }
            }
            Err(_) => problems.push(format!("性别代码无效: {code}")),
        }
    }

    DraftReport {
        row,
        patient_name: draft.patient_name.trim().to_string(),
        valid: problems.is_empty(),
        problems,
        derived,
    }
}

pub fn import(file: &Path, format: OutputFormat) -> Result<()> {
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let drafts: Vec<RegistrationDraft> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not an array of registration drafts", file.display()))?;

    let reports = review(&drafts, today());
    match format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Table => print_table(
            ["", "Row", "Patient", "Problems"],
            reports
                .iter()
                .map(|r| {
                    [
                        mark(r.valid),
                        r.row.to_string(),
                        r.patient_name.clone(),
                        r.problems.join("; "),
                    ]
                })
                .collect(),
        ),
    }

    let failed = reports.iter().filter(|r| !r.valid).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} drafts failed validation", reports.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::NamedTempFile;
    use time::macros::date;

    use super::*;

    const TODAY: Date = date!(2024 - 06 - 01);

    fn drafts(json: &str) -> Vec<RegistrationDraft> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_draft() {
        let reports = review(
            &drafts(
                r#"[{"patientName":"张三","idCard":"11010519491231002X","phone":"13800138000","age":74,"gender":0}]"#,
            ),
            TODAY,
        );
        assert!(reports[0].valid, "{:?}", reports[0].problems);
        assert_eq!(reports[0].row, 1);
        assert_eq!(reports[0].derived.as_ref().map(|d| d.age), Some(74));
    }

    #[test]
    fn test_collects_every_problem() {
        let reports = review(
            &drafts(r#"[{"patientName":"x","idCard":"123","phone":"1234","age":"abc"}]"#),
            TODAY,
        );
        let problems = &reports[0].problems;
        assert!(!reports[0].valid);
        assert_eq!(
            problems,
            &[
                "姓名至少2个字符",
                "身份证号必须为18位",
                "请输入有效的11位手机号码",
                "请输入有效年龄"
            ]
        );
    }

    #[test]
    fn test_mismatch_with_identity_number() {
        let reports = review(
            &drafts(
                r#"[{"patientName":"张三","idCard":"11010519491231002X","phone":"13800138000","age":"70","gender":1}]"#,
            ),
            TODAY,
        );
        assert_eq!(
            reports[0].problems,
            ["年龄与身份证号不一致（应为74岁）", "性别与身份证号不一致（应为女）"]
        );
    }

    #[test]
    fn test_invalid_gender_code() {
        let reports = review(
            &drafts(
                r#"[{"patientName":"张三","idCard":"11010519491231002X","phone":"13800138000","gender":7}]"#,
            ),
            TODAY,
        );
        assert_eq!(reports[0].problems, ["性别代码无效: 7"]);
    }

    #[test]
    fn test_import_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[{"patientName":"李四","idCard":"bad","phone":"13800138000"}]"#,
        )
        .unwrap();
        let err = import(file.path(), OutputFormat::Json).unwrap_err();
        assert_eq!(err.to_string(), "1 of 1 drafts failed validation");

        std::fs::write(file.path(), r#"{"not":"an array"}"#).unwrap();
        assert!(import(file.path(), OutputFormat::Json).is_err());
    }
}
