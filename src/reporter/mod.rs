//! Rendering of consolidated reports.
//!
//! Reporters turn a [`ConsolidatedVerifyReport`] or its coverage views into
//! file contents. Writing them to disk is left to [`crate::output`].

pub mod coverage;
pub mod csv;
pub mod json;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::ConsolidatedVerifyReport;

pub use coverage::CoverageReporter;
pub use csv::CsvReporter;
pub use json::JsonReporter;

pub trait Reporter {
    fn report(&self, report: &ConsolidatedVerifyReport) -> String;
}

/// Quote a CSV field when it holds a delimiter, quote or line break.
pub(crate) fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Join fields into one CSV record, newline included.
pub(crate) fn csv_record<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

pub(crate) fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}
