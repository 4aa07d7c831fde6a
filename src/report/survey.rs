//! Survey report KPIs: customer effort (CES) and satisfaction (CAST).

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::Result;

use super::kpi::{KpiRow, KpiValue};
use super::period::MonthBucket;
use super::sheet::Sheet;

pub const REPORT: &str = "Survey Report";

pub const COL_LAST_MODIFIED: &str = "Customer Feed Back Survey: Last Modified Date";
pub const COL_CLOSED: &str = "Closed Data";
pub const COL_CASE_NUMBER: &str = "Case Number";
pub const COL_EASE: &str = "OpenText made it easy to handle my case";
pub const COL_SATISFIED: &str = "Satisfied with support experience";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Minimum ease score counted as a low-effort case.
const CES_THRESHOLD: f64 = 8.0;
/// Minimum satisfaction score counted as satisfied.
const CAST_THRESHOLD: f64 = 7.0;

/// One survey response.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyRow {
    pub last_modified: Option<NaiveDate>,
    pub closed: Option<NaiveDate>,
    pub case_number: Option<String>,
    pub ease: Option<f64>,
    pub satisfied: Option<f64>,
}

/// Load every survey row. Missing columns are reported before any row is read.
pub fn load_surveys(bytes: &[u8]) -> Result<Vec<SurveyRow>> {
    let sheet = Sheet::parse(REPORT, bytes)?;

    let modified = sheet.column(COL_LAST_MODIFIED)?;
    let closed = sheet.column(COL_CLOSED)?;
    let case = sheet.column(COL_CASE_NUMBER)?;
    let ease = sheet.column(COL_EASE)?;
    let satisfied = sheet.column(COL_SATISFIED)?;

    let mut surveys = Vec::with_capacity(sheet.rows().len());
    for (i, row) in sheet.rows().iter().enumerate() {
        let row_no = i + 2;
        surveys.push(SurveyRow {
            last_modified: sheet.date(row, row_no, modified, COL_LAST_MODIFIED, DATE_FORMAT)?,
            closed: sheet.date(row, row_no, closed, COL_CLOSED, DATE_FORMAT)?,
            case_number: sheet.cell(row, case).map(str::to_string),
            ease: sheet.number(row, row_no, ease, COL_EASE)?,
            satisfied: sheet.number(row, row_no, satisfied, COL_SATISFIED)?,
        });
    }
    Ok(surveys)
}

/// Keep one response per case number: the most recently modified.
///
/// Ties keep the earlier row; responses without a modification date rank
/// last. Rows without a case number share one key.
pub fn dedup_latest(surveys: &[SurveyRow]) -> Vec<&SurveyRow> {
    let mut ordered: Vec<&SurveyRow> = surveys.iter().collect();
    // None < Some(_), so reversing puts undated rows last; sort_by is stable
    ordered.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

    let mut seen: HashSet<Option<&str>> = HashSet::new();
    let mut kept = Vec::with_capacity(ordered.len());
    for survey in ordered {
        if seen.insert(survey.case_number.as_deref()) {
            kept.push(survey);
        }
    }
    kept
}

/// Compute the survey KPIs for `bucket`, in report order.
pub fn survey_kpis(surveys: &[SurveyRow], bucket: MonthBucket) -> Vec<KpiRow> {
    let in_month: Vec<&SurveyRow> = dedup_latest(surveys)
        .into_iter()
        .filter(|s| s.closed.map(|d| bucket.contains(d)).unwrap_or(false))
        .collect();

    let meets = |score: Option<f64>, threshold: f64| score.map(|v| v >= threshold).unwrap_or(false);
    let ces = in_month.iter().filter(|s| meets(s.ease, CES_THRESHOLD)).count();
    let cast = in_month
        .iter()
        .filter(|s| meets(s.satisfied, CAST_THRESHOLD))
        .count();

    vec![
        KpiRow::new("Survey CES", KpiValue::ratio(ces, in_month.len())),
        KpiRow::new("Survey CAST", KpiValue::ratio(cast, in_month.len())),
    ]
}
