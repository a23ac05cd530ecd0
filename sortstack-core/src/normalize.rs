//! Adapter from the raw JSON dataset rows to validated [`WasteRecord`]s.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{BuildingId, WasteRecord};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// Weight as it appears in the dataset: usually a string, sometimes a number.
pub enum RawWeight {
    /// JSON number.
    Number(f64),
    /// JSON string holding a number.
    Text(String),
    /// Anything else (`true`, arrays, objects); always malformed.
    Other(serde_json::Value),
}

impl fmt::Display for RawWeight {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawWeight::Number(number) => write!(formatter, "{number}"),
            RawWeight::Text(text) => formatter.write_str(text),
            RawWeight::Other(value) => write!(formatter, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One row of the input dataset, field names as published.
pub struct RawWasteRecord {
    /// Audit date string.
    #[serde(rename = "Date")]
    pub date: String,
    /// Weight in pounds, numeric-as-string.
    #[serde(rename = "Weight", default)]
    pub weight: Option<RawWeight>,
    /// Building identifier.
    #[serde(rename = "Building")]
    pub building: String,
    /// Found-in label.
    #[serde(rename = "Stream")]
    pub stream: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// What to do with a row whose weight is missing, non-numeric, or negative.
pub enum WeightPolicy {
    /// Keep the row with a weight of zero.
    #[default]
    Zero,
    /// Drop the row.
    Reject,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
/// Problems found while normalizing a single dataset row.
pub enum RecordIssue {
    /// The date could not be parsed; the row is always dropped.
    #[error("row {row}: unparseable date `{value}`")]
    InvalidDate {
        /// Zero-based position in the dataset.
        row: usize,
        /// Offending text.
        value: String,
    },
    /// The weight is missing or not a finite number.
    #[error("row {row}: malformed weight `{value}`")]
    MalformedWeight {
        /// Zero-based position in the dataset.
        row: usize,
        /// Offending text, empty when the field was absent.
        value: String,
    },
    /// The weight parsed but is below zero.
    #[error("row {row}: negative weight {value}")]
    NegativeWeight {
        /// Zero-based position in the dataset.
        row: usize,
        /// Parsed value.
        value: f64,
    },
}

impl RecordIssue {
    /// Dataset position the issue refers to.
    #[must_use]
    pub fn row(&self) -> usize {
        match self {
            RecordIssue::InvalidDate { row, .. }
            | RecordIssue::MalformedWeight { row, .. }
            | RecordIssue::NegativeWeight { row, .. } => *row,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Output of [`normalize`].
pub struct Normalized {
    /// Rows that survived validation, in dataset order.
    pub records: Vec<WasteRecord>,
    /// Everything that was zeroed or dropped.
    pub issues: Vec<RecordIssue>,
}

/// Parse a dataset date. Accepts plain dates, RFC 3339 timestamps, and naive
/// date-times; the time of day is discarded.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    {
        return Some(date);
    }

    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|stamp| stamp.date())
}

/// Validate a weight field for `row`.
///
/// # Errors
///
/// Returns a [`RecordIssue`] when the weight is missing, not a finite number, or negative.
pub fn parse_weight(row: usize, raw: Option<&RawWeight>) -> Result<f64, RecordIssue> {
    let malformed = |value: String| RecordIssue::MalformedWeight { row, value };

    let value = match raw {
        None => return Err(malformed(String::new())),
        Some(RawWeight::Number(number)) => *number,
        Some(RawWeight::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_err| malformed(text.clone()))?,
        Some(RawWeight::Other(value)) => return Err(malformed(value.to_string())),
    };

    if !value.is_finite() {
        return Err(malformed(raw.map(ToString::to_string).unwrap_or_default()));
    }
    if value < 0.0 {
        return Err(RecordIssue::NegativeWeight { row, value });
    }
    Ok(value)
}

/// Turn raw rows into records, applying `policy` to bad weights.
#[must_use]
pub fn normalize(raw: &[RawWasteRecord], policy: WeightPolicy) -> Normalized {
    let mut out = Normalized {
        records: Vec::with_capacity(raw.len()),
        issues: Vec::new(),
    };

    for (row, entry) in raw.iter().enumerate() {
        let Some(date) = parse_date(&entry.date) else {
            warn!(row, date = %entry.date, "dropping row with unparseable date");
            out.issues.push(RecordIssue::InvalidDate {
                row,
                value: entry.date.clone(),
            });
            continue;
        };

        let weight = match parse_weight(row, entry.weight.as_ref()) {
            Ok(weight) => weight,
            Err(issue) => {
                out.issues.push(issue);
                match policy {
                    WeightPolicy::Zero => {
                        warn!(row, "zeroing malformed weight");
                        0.0
                    }
                    WeightPolicy::Reject => {
                        warn!(row, "dropping row with malformed weight");
                        continue;
                    }
                }
            }
        };

        out.records.push(WasteRecord {
            date,
            year: date.year(),
            building: BuildingId::from(entry.building.trim()),
            stream: entry.stream.trim().to_owned(),
            weight,
        });
    }

    debug!(
        rows = raw.len(),
        kept = out.records.len(),
        issues = out.issues.len(),
        "normalized dataset"
    );
    out
}
