//! Monthly KPI report: attachment selection, CSV loading, and aggregation.

pub mod case;
pub mod kpi;
pub mod period;
pub mod selector;
pub mod sheet;
pub mod survey;

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{MailKpiError, Result};
use crate::mailbox::MailClient;
use crate::model::attachment::AttachmentRef;
use crate::model::mail::MessageRecord;

use self::kpi::KpiRow;
use self::period::MonthBucket;
use self::selector::{select_reports, NamePattern};

/// The computed report for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub bucket: MonthBucket,
    pub rows: Vec<KpiRow>,
}

impl MonthlyReport {
    /// Header row of the rendered report.
    pub fn header(&self) -> [String; 2] {
        ["KPI".to_string(), self.bucket.label()]
    }
}

/// What to look for when building a report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub case_pattern: Option<NamePattern>,
    pub survey_pattern: Option<NamePattern>,
    /// Months back from the current month (`0` or negative).
    pub month_offset: i32,
}

/// Compute the KPI rows for `bucket` from raw CSV content.
///
/// Case KPIs come first, survey KPIs after. The aged-backlog KPI is only
/// computed for the current month, so the age column is only required then.
pub fn aggregate(
    bucket: MonthBucket,
    current_month: bool,
    case_csv: Option<&[u8]>,
    survey_csv: Option<&[u8]>,
) -> Result<Vec<KpiRow>> {
    if case_csv.is_none() && survey_csv.is_none() {
        return Err(MailKpiError::NothingFound);
    }

    let mut rows = Vec::new();
    if let Some(bytes) = case_csv {
        let cases = case::load_cases(bytes, current_month)?;
        debug!(count = cases.len(), "Loaded case rows");
        rows.extend(case::case_kpis(&cases, bucket, current_month));
    }
    if let Some(bytes) = survey_csv {
        let surveys = survey::load_surveys(bytes)?;
        debug!(count = surveys.len(), "Loaded survey rows");
        rows.extend(survey::survey_kpis(&surveys, bucket));
    }
    Ok(rows)
}

/// Select the newest extracts among `messages`, fetch them through the
/// client, and aggregate them for the requested month.
///
/// Each attachment is copied to a temporary file under `work_dir` (the
/// system temp directory when `None`) which is removed once read.
pub fn generate_monthly_report(
    client: &dyn MailClient,
    messages: &[MessageRecord],
    request: &ReportRequest,
    today: NaiveDate,
    work_dir: Option<&Path>,
) -> Result<MonthlyReport> {
    let bucket = MonthBucket::from_offset(today, request.month_offset)?;
    let selection = select_reports(
        messages,
        request.case_pattern.as_ref(),
        request.survey_pattern.as_ref(),
    )?;

    let case_csv = selection
        .case
        .map(|att| read_attachment(client, att, work_dir))
        .transpose()?;
    let survey_csv = selection
        .survey
        .map(|att| read_attachment(client, att, work_dir))
        .transpose()?;

    let rows = aggregate(
        bucket,
        request.month_offset == 0,
        case_csv.as_deref(),
        survey_csv.as_deref(),
    )?;
    info!(month = %bucket, rows = rows.len(), "Generated monthly report");
    Ok(MonthlyReport { bucket, rows })
}

/// Save an attachment to a temporary file and read it back.
fn read_attachment(
    client: &dyn MailClient,
    attachment: &AttachmentRef,
    work_dir: Option<&Path>,
) -> Result<Vec<u8>> {
    let temp = match work_dir {
        Some(dir) => tempfile::Builder::new()
            .prefix("mailkpi-")
            .suffix(".csv")
            .tempfile_in(dir)
            .map_err(|e| MailKpiError::io(dir, e))?,
        None => tempfile::Builder::new()
            .prefix("mailkpi-")
            .suffix(".csv")
            .tempfile()
            .map_err(|e| MailKpiError::io(std::env::temp_dir(), e))?,
    };

    client.save_attachment(attachment, temp.path())?;
    let bytes = std::fs::read(temp.path()).map_err(|e| MailKpiError::io(temp.path(), e))?;
    debug!(
        file_name = %attachment.file_name,
        bytes = bytes.len(),
        "Read attachment"
    );
    // Dropping the handle deletes the file; failures there are ignored.
    drop(temp);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use chrono::DateTime;

    use crate::model::attachment::{AttachmentHandle, Locator};
    use crate::model::outgoing::OutgoingMail;
    use crate::report::kpi::KpiValue;

    const CASES: &str = "Date/Time Opened,Closed Date,Status,Age (Days),Knowledge Base Article,Idol Knowledge Link,R&D Incident\n\
        2024-03-04 AM09:00,2024-03-20,Closed,,KB-1,,INC-1\n\
        2024-03-05 PM02:30,,New,3,,,\n";

    const SURVEYS: &str = "Case Number,Customer Feed Back Survey: Last Modified Date,Closed Data,OpenText made it easy to handle my case,Satisfied with support experience\n\
        C-1,2024-03-21,2024-03-20,9,9\n";

    /// Attachments keyed by filename.
    struct MapClient {
        files: HashMap<String, Vec<u8>>,
    }

    impl MailClient for MapClient {
        fn accounts(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn folders(&self, _account: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn sorted_items(&self, _account: &str, folder: &str) -> Result<Vec<MessageRecord>> {
            Err(MailKpiError::FolderUnsortable {
                folder: folder.to_string(),
            })
        }

        fn save_attachment(&self, attachment: &AttachmentRef, dest: &Path) -> Result<()> {
            let bytes = self
                .files
                .get(&attachment.file_name)
                .ok_or_else(|| MailKpiError::AttachmentNotFound(attachment.file_name.clone()))?;
            std::fs::write(dest, bytes).map_err(|e| MailKpiError::io(dest, e))
        }

        fn send(&self, _mail: &OutgoingMail) -> Result<()> {
            Ok(())
        }
    }

    fn attachment(name: &str) -> AttachmentRef {
        AttachmentRef {
            file_name: name.to_string(),
            size: 0,
            handle: AttachmentHandle {
                locator: Locator::Key(name.to_string()),
                index: 0,
            },
        }
    }

    fn inbox(names: &[&str]) -> Vec<MessageRecord> {
        vec![MessageRecord {
            subject: "Monthly extracts".to_string(),
            sender_name: "Salesforce".to_string(),
            recipients: Vec::new(),
            received: DateTime::UNIX_EPOCH,
            attachments: names.iter().map(|n| attachment(n)).collect(),
        }]
    }

    fn march() -> MonthBucket {
        MonthBucket {
            year: 2024,
            month: 3,
        }
    }

    fn labels(rows: &[KpiRow]) -> Vec<&'static str> {
        rows.iter().map(|r| r.label).collect()
    }

    #[test]
    fn test_aggregate_needs_some_input() {
        assert!(matches!(
            aggregate(march(), false, None, None),
            Err(MailKpiError::NothingFound)
        ));
    }

    #[test]
    fn test_aggregate_orders_case_before_survey() {
        let rows = aggregate(
            march(),
            false,
            Some(CASES.as_bytes()),
            Some(SURVEYS.as_bytes()),
        )
        .unwrap();
        assert_eq!(
            labels(&rows),
            vec![
                "Open Cases",
                "Close Cases",
                "Closure Rate",
                "R&D Assist Rate",
                "Backlog",
                "Backlog > 30",
                "Backlog Index",
                "KCS Articles Created",
                "KCS Created / Closed Cases",
                "Survey CES",
                "Survey CAST",
            ]
        );
        assert_eq!(rows[0].value, KpiValue::Count(2));
        assert_eq!(rows[2].value.to_string(), "50.0%");
        assert_eq!(rows[9].value.to_string(), "100.0%");
    }

    #[test]
    fn test_aggregate_survey_only() {
        let rows = aggregate(march(), false, None, Some(SURVEYS.as_bytes())).unwrap();
        assert_eq!(labels(&rows), vec!["Survey CES", "Survey CAST"]);
    }

    #[test]
    fn test_generate_reads_newest_extracts() {
        let mut files = HashMap::new();
        files.insert(
            "cases-2024-01-01-00-00-00.csv".to_string(),
            b"not,the,file\n".to_vec(),
        );
        files.insert(
            "cases-2024-04-01-00-00-00.csv".to_string(),
            CASES.as_bytes().to_vec(),
        );
        let client = MapClient { files };
        let messages = inbox(&[
            "cases-2024-01-01-00-00-00.csv",
            "cases-2024-04-01-00-00-00.csv",
        ]);
        let request = ReportRequest {
            case_pattern: Some(NamePattern::new("cases").unwrap()),
            survey_pattern: None,
            month_offset: -1,
        };
        let work = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();

        let report =
            generate_monthly_report(&client, &messages, &request, today, Some(work.path()))
                .unwrap();

        assert_eq!(report.bucket, march());
        assert_eq!(report.header(), ["KPI".to_string(), "2024-3".to_string()]);
        assert_eq!(report.rows[0].value, KpiValue::Count(2));
        // Previous month: aged backlog is not computed.
        assert_eq!(report.rows[5].value, KpiValue::Missing);
        // Temporary copies are gone.
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_generate_without_patterns() {
        let client = MapClient {
            files: HashMap::new(),
        };
        let request = ReportRequest {
            case_pattern: None,
            survey_pattern: None,
            month_offset: 0,
        };
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let err = generate_monthly_report(&client, &inbox(&[]), &request, today, None).unwrap_err();
        assert!(err.is_benign());
    }

    #[test]
    fn test_generate_rejects_positive_offset() {
        let client = MapClient {
            files: HashMap::new(),
        };
        let request = ReportRequest {
            case_pattern: Some(NamePattern::new("cases").unwrap()),
            survey_pattern: None,
            month_offset: 2,
        };
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        assert!(matches!(
            generate_monthly_report(&client, &inbox(&[]), &request, today, None),
            Err(MailKpiError::InvalidMonthOffset(2))
        ));
    }
}
