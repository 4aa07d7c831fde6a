//! Picks the newest case and survey extracts among retrieved attachments.
//!
//! Extract filenames end in `-YYYY-MM-DD-HH-MM-SS.csv`, so the
//! lexicographically greatest match is the most recent one.

use regex::{Regex, RegexBuilder};

use crate::error::{MailKpiError, Result};
use crate::model::attachment::AttachmentRef;
use crate::model::mail::MessageRecord;

/// A case-insensitive pattern matched at the start of a filename.
#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    /// Compile a filename prefix pattern (regular-expression syntax).
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})"))
            .case_insensitive(true)
            .build()
            .map_err(|source| MailKpiError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self { regex })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

/// The attachments chosen for one report run.
#[derive(Debug, Default)]
pub struct Selection<'a> {
    pub case: Option<&'a AttachmentRef>,
    pub survey: Option<&'a AttachmentRef>,
}

/// Choose at most one attachment per pattern.
///
/// Fails with [`MailKpiError::NoReportSpecified`] when both patterns are
/// absent and with [`MailKpiError::NothingFound`] when nothing matched.
pub fn select_reports<'a>(
    messages: &'a [MessageRecord],
    case: Option<&NamePattern>,
    survey: Option<&NamePattern>,
) -> Result<Selection<'a>> {
    if case.is_none() && survey.is_none() {
        return Err(MailKpiError::NoReportSpecified);
    }

    let selection = Selection {
        case: case.and_then(|p| newest_match(messages, p)),
        survey: survey.and_then(|p| newest_match(messages, p)),
    };

    if selection.case.is_none() && selection.survey.is_none() {
        return Err(MailKpiError::NothingFound);
    }

    if let Some(att) = selection.case {
        tracing::info!(file_name = %att.file_name, "Selected case report");
    }
    if let Some(att) = selection.survey {
        tracing::info!(file_name = %att.file_name, "Selected survey report");
    }
    Ok(selection)
}

/// Greatest matching filename; the first attachment carrying it wins ties.
fn newest_match<'a>(messages: &'a [MessageRecord], pattern: &NamePattern) -> Option<&'a AttachmentRef> {
    let mut best: Option<&AttachmentRef> = None;
    for att in messages.iter().flat_map(|m| m.attachments.iter()) {
        if !pattern.matches(&att.file_name) {
            continue;
        }
        match best {
            Some(current) if att.file_name <= current.file_name => {}
            _ => best = Some(att),
        }
    }
    best
}
