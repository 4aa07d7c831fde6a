//! KPI rows and the value formats they use.

use std::fmt;

/// Placeholder shown when a KPI has no meaningful value.
pub const PLACEHOLDER: &str = "-";

/// The value column of a KPI row.
#[derive(Debug, Clone, PartialEq)]
pub enum KpiValue {
    /// A plain count of rows.
    Count(usize),
    /// A ratio already rendered as a percentage string, e.g. `66.67%`.
    Percent(String),
    /// No value for this period (`-`).
    Missing,
}

impl KpiValue {
    /// `numerator / denominator` as a percentage, or [`KpiValue::Missing`]
    /// when the denominator is zero.
    pub fn ratio(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            Self::Missing
        } else {
            Self::Percent(format_percent(numerator as f64 / denominator as f64))
        }
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Percent(p) => f.write_str(p),
            Self::Missing => f.write_str(PLACEHOLDER),
        }
    }
}

/// One labeled metric.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiRow {
    pub label: &'static str,
    pub value: KpiValue,
}

impl KpiRow {
    pub fn new(label: &'static str, value: KpiValue) -> Self {
        Self { label, value }
    }
}

/// Render a fraction as a percentage rounded to two decimals.
///
/// Rounding works on the exact binary value with ties to even, so
/// `3.125` becomes `3.12`. Whole numbers keep one decimal (`50.0%`);
/// otherwise the shortest representation is used (`66.67%`, `12.5%`).
pub fn format_percent(fraction: f64) -> String {
    let percent = fraction * 100.0;
    let rounded = format!("{percent:.2}").parse::<f64>().unwrap_or(percent);
    if rounded.fract() == 0.0 {
        format!("{rounded:.1}%")
    } else {
        format!("{rounded}%")
    }
}
