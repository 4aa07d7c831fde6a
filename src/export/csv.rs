//! Write a monthly report to a CSV file.

use std::path::{Path, PathBuf};

use crate::error::{MailKpiError, Result};
use crate::report::MonthlyReport;

/// Append `.csv` unless the path already ends with it.
pub fn with_csv_extension(path: &Path) -> PathBuf {
    let raw = path.as_os_str().to_string_lossy();
    if raw.ends_with(".csv") {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{raw}.csv"))
    }
}

/// Write the report as `KPI,<year>-<month>` followed by one line per KPI.
///
/// Returns the path actually written.
pub fn export_report_csv(report: &MonthlyReport, output_path: &Path) -> Result<PathBuf> {
    let path = with_csv_extension(output_path);
    let csv_err = |source| MailKpiError::Csv {
        report: "KPI output",
        source,
    };

    let mut writer = ::csv::Writer::from_path(&path).map_err(csv_err)?;
    writer.write_record(report.header()).map_err(csv_err)?;
    for row in &report.rows {
        writer
            .write_record([row.label.to_string(), row.value.to_string()])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| MailKpiError::io(&path, e))?;

    tracing::info!(path = %path.display(), rows = report.rows.len(), "Wrote report CSV");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::report::kpi::{KpiRow, KpiValue};
    use crate::report::period::MonthBucket;

    #[test]
    fn test_extension_appended() {
        assert_eq!(
            with_csv_extension(Path::new("out/march")),
            PathBuf::from("out/march.csv")
        );
        assert_eq!(
            with_csv_extension(Path::new("march.csv")),
            PathBuf::from("march.csv")
        );
        assert_eq!(
            with_csv_extension(Path::new("march.CSV")),
            PathBuf::from("march.CSV.csv")
        );
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let report = MonthlyReport {
            bucket: MonthBucket {
                year: 2024,
                month: 3,
            },
            rows: vec![
                KpiRow::new("Open Cases", KpiValue::Count(4)),
                KpiRow::new("R&D Assist Rate", KpiValue::Percent("66.67%".to_string())),
                KpiRow::new("Backlog > 30", KpiValue::Missing),
            ],
        };

        let written = export_report_csv(&report, &dir.path().join("kpi")).unwrap();
        assert_eq!(written, dir.path().join("kpi.csv"));

        let contents = std::fs::read_to_string(&written).unwrap();
        assert_eq!(
            contents,
            "KPI,2024-3\nOpen Cases,4\nR&D Assist Rate,66.67%\nBacklog > 30,-\n"
        );
    }
}
