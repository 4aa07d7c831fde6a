//! Case report KPIs: volume, closure, backlog, and knowledge-article metrics.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;

use super::kpi::{KpiRow, KpiValue};
use super::period::MonthBucket;
use super::sheet::Sheet;

pub const REPORT: &str = "Case Report";

pub const COL_OPENED: &str = "Date/Time Opened";
pub const COL_CLOSED: &str = "Closed Date";
pub const COL_STATUS: &str = "Status";
pub const COL_AGE_DAYS: &str = "Age (Days)";
pub const COL_AGE: &str = "Age";
pub const COL_KB_ARTICLE: &str = "Knowledge Base Article";
pub const COL_IDOL_LINK: &str = "Idol Knowledge Link";
pub const COL_RD_INCIDENT: &str = "R&D Incident";

const OPENED_FORMAT: &str = "%Y-%m-%d %p%I:%M";
const CLOSED_FORMAT: &str = "%Y-%m-%d";

/// Status value of a finished case.
const CLOSED_STATUS: &str = "Closed";

/// Age threshold for the aged-backlog KPI, in days.
const AGED_BACKLOG_DAYS: f64 = 30.0;

/// One case from the extract.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRow {
    pub opened: Option<NaiveDateTime>,
    pub closed: Option<NaiveDate>,
    pub status: Option<String>,
    pub age_days: Option<f64>,
    pub kb_article: bool,
    pub idol_link: bool,
    pub rd_incident: bool,
}

/// Load every case row. Missing columns are reported before any row is read.
///
/// The age column is only required when `need_age` is set; `Age (Days)` is
/// preferred over `Age`.
pub fn load_cases(bytes: &[u8], need_age: bool) -> Result<Vec<CaseRow>> {
    let sheet = Sheet::parse(REPORT, bytes)?;

    let opened = sheet.column(COL_OPENED)?;
    let closed = sheet.column(COL_CLOSED)?;
    let status = sheet.column(COL_STATUS)?;
    let kb = sheet.column(COL_KB_ARTICLE)?;
    let idol = sheet.column(COL_IDOL_LINK)?;
    let rd = sheet.column(COL_RD_INCIDENT)?;
    let age = match sheet.find_column(COL_AGE_DAYS) {
        Some(col) => Some((col, COL_AGE_DAYS)),
        None if need_age => Some((sheet.column(COL_AGE)?, COL_AGE)),
        None => sheet.find_column(COL_AGE).map(|col| (col, COL_AGE)),
    };

    let mut cases = Vec::with_capacity(sheet.rows().len());
    for (i, row) in sheet.rows().iter().enumerate() {
        // Data rows start at line 2 of the file
        let row_no = i + 2;
        let age_days = match age {
            Some((col, name)) if need_age => sheet.number(row, row_no, col, name)?,
            _ => None,
        };
        cases.push(CaseRow {
            opened: sheet.datetime(row, row_no, opened, COL_OPENED, OPENED_FORMAT)?,
            closed: sheet.date(row, row_no, closed, COL_CLOSED, CLOSED_FORMAT)?,
            status: sheet.cell(row, status).map(str::to_string),
            age_days,
            kb_article: sheet.cell(row, kb).is_some(),
            idol_link: sheet.cell(row, idol).is_some(),
            rd_incident: sheet.cell(row, rd).is_some(),
        });
    }
    Ok(cases)
}

/// Compute the case KPIs for `bucket`, in report order.
///
/// `current_month` enables the aged-backlog count; for past months it is `-`.
pub fn case_kpis(cases: &[CaseRow], bucket: MonthBucket, current_month: bool) -> Vec<KpiRow> {
    let month_end = bucket.month_end();
    let opened_by_end = |c: &CaseRow| c.opened.map(|t| t <= month_end).unwrap_or(false);

    let open_count = cases
        .iter()
        .filter(|c| c.opened.map(|t| bucket.contains(t.date())).unwrap_or(false))
        .count();

    let closed: Vec<&CaseRow> = cases
        .iter()
        .filter(|c| c.closed.map(|d| bucket.contains(d)).unwrap_or(false))
        .collect();
    let close_count = closed.len();

    // Still open today and opened by month end
    let open_backlog: Vec<&CaseRow> = cases
        .iter()
        .filter(|c| c.status.as_deref() != Some(CLOSED_STATUS))
        .filter(|c| opened_by_end(*c))
        .collect();

    // Closed later, so they were still open at month end
    let closed_backlog = cases
        .iter()
        .filter(|c| {
            c.closed
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|t| t > month_end)
                .unwrap_or(false)
        })
        .filter(|c| opened_by_end(*c))
        .count();

    let backlog = open_backlog.len() + closed_backlog;

    let rd_assisted = closed.iter().filter(|c| c.rd_incident).count();
    let kcs_created = closed.iter().filter(|c| c.kb_article).count();
    let kcs_linked = closed
        .iter()
        .filter(|c| c.kb_article || c.idol_link)
        .count();

    let mut rows = vec![
        KpiRow::new("Open Cases", KpiValue::Count(open_count)),
        KpiRow::new("Close Cases", KpiValue::Count(close_count)),
        KpiRow::new("Closure Rate", KpiValue::ratio(close_count, open_count)),
        KpiRow::new("R&D Assist Rate", KpiValue::ratio(rd_assisted, close_count)),
        KpiRow::new("Backlog", KpiValue::Count(backlog)),
    ];

    let aged = if current_month {
        KpiValue::Count(
            open_backlog
                .iter()
                .filter(|c| c.age_days.map(|a| a >= AGED_BACKLOG_DAYS).unwrap_or(false))
                .count(),
        )
    } else {
        KpiValue::Missing
    };
    rows.push(KpiRow::new("Backlog > 30", aged));
    rows.push(KpiRow::new("Backlog Index", KpiValue::ratio(backlog, open_count)));
    rows.push(KpiRow::new("KCS Articles Created", KpiValue::Count(kcs_created)));

    if close_count != 0 {
        rows.push(KpiRow::new(
            "KCS Created / Closed Cases",
            KpiValue::ratio(kcs_created, close_count),
        ));
    } else {
        rows.push(KpiRow::new("KCS Created / Closed Cases", KpiValue::Missing));
        // Known defect kept for compatibility: linkage is only reported when no
        // case closed, where its denominator is zero.
        rows.push(KpiRow::new(
            "KCS Linkage",
            KpiValue::ratio(kcs_linked, close_count),
        ));
    }

    rows
}
