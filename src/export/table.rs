//! Bordered console tables.
//!
//! Cells are centered in their column, widths are measured in terminal
//! columns so CJK subjects line up.

use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::report::MonthlyReport;

/// A table built for one command and printed once.
#[derive(Debug, Clone, Default)]
pub struct ConsoleTable {
    field_names: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ConsoleTable {
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_names: field_names.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with empty cells, long rows cut.
    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.field_names.len(), String::new());
        self.rows.push(row);
    }

    fn column_widths(&self) -> Vec<usize> {
        self.field_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                self.rows
                    .iter()
                    .map(|row| cell_width(&row[i]))
                    .chain(std::iter::once(cell_width(name)))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

impl From<&MonthlyReport> for ConsoleTable {
    fn from(report: &MonthlyReport) -> Self {
        let mut table = ConsoleTable::new(report.header());
        for row in &report.rows {
            table.add_row([row.label.to_string(), row.value.to_string()]);
        }
        table
    }
}

impl fmt::Display for ConsoleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();
        let border = border_line(&widths);

        writeln!(f, "{border}")?;
        writeln!(f, "{}", row_line(&self.field_names, &widths))?;
        writeln!(f, "{border}")?;
        for row in &self.rows {
            writeln!(f, "{}", row_line(row, &widths))?;
        }
        write!(f, "{border}")
    }
}

fn border_line(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.push_str(&"-".repeat(w + 2));
        line.push('+');
    }
    line
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, &w) in cells.iter().zip(widths) {
        line.push(' ');
        line.push_str(&center(cell, w));
        line.push_str(" |");
    }
    line
}

/// Widest line of a cell; multi-line values are flattened.
fn cell_width(cell: &str) -> usize {
    UnicodeWidthStr::width(flatten(cell).as_str())
}

fn flatten(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ")
}

/// Center `text` in `width` columns. Odd leftovers go right for odd-width
/// text and left for even-width text.
fn center(text: &str, width: usize) -> String {
    let text = flatten(text);
    let text_width = UnicodeWidthStr::width(text.as_str());
    let excess = width.saturating_sub(text_width);
    let half = excess / 2;
    let (left, right) = if excess % 2 == 0 {
        (half, half)
    } else if text_width % 2 == 1 {
        (half, half + 1)
    } else {
        (half + 1, half)
    };
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::report::kpi::{KpiRow, KpiValue};
    use crate::report::period::MonthBucket;

    #[test]
    fn test_render_layout() {
        let mut table = ConsoleTable::new(["ID", "Subject"]);
        table.add_row(["1", "Weekly"]);
        let rendered = table.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "+----+---------+",
                "| ID | Subject |",
                "+----+---------+",
                "| 1  |  Weekly |",
                "+----+---------+",
            ]
        );
    }

    #[test]
    fn test_wide_characters_align() {
        let mut table = ConsoleTable::new(["Subject"]);
        table.add_row(["周报"]);
        let rendered = table.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "+---------+");
        assert_eq!(lines[3], "|   周报  |");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut table = ConsoleTable::new(["A", "B"]);
        table.add_row(["x"]);
        assert!(table.to_string().contains("| x |   |"));
    }

    #[test]
    fn test_from_report() {
        let report = MonthlyReport {
            bucket: MonthBucket {
                year: 2024,
                month: 3,
            },
            rows: vec![
                KpiRow::new("Open Cases", KpiValue::Count(4)),
                KpiRow::new("Closure Rate", KpiValue::Missing),
            ],
        };
        let rendered = ConsoleTable::from(&report).to_string();
        assert!(rendered.contains("| 2024-3 |"));
        assert!(rendered.contains("|  Open Cases  |   4    |"));
        assert!(rendered.contains("| Closure Rate |   -    |"));
    }
}
