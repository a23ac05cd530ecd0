//! Domain data structures for waste records, streams, and view selections.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// The three streams every chart draws, in their default stacking order.
pub enum CanonicalStream {
    /// Organic material bound for composting.
    Compost,
    /// Recyclables and reusables.
    Recycling,
    /// Residual waste.
    Landfill,
}

impl CanonicalStream {
    /// Default draw order, bottom band first.
    pub const ALL: [CanonicalStream; 3] = [
        CanonicalStream::Compost,
        CanonicalStream::Recycling,
        CanonicalStream::Landfill,
    ];

    /// Label used for the stream in datasets and series keys.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CanonicalStream::Compost => "Compost",
            CanonicalStream::Recycling => "Recycling",
            CanonicalStream::Landfill => "Landfill",
        }
    }
}

impl fmt::Display for CanonicalStream {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Key of a stacked stream; canonical or a passed-through raw label.
pub struct StreamName(pub String);

impl StreamName {
    /// Borrow the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<CanonicalStream> for StreamName {
    fn from(stream: CanonicalStream) -> Self {
        StreamName(stream.label().to_owned())
    }
}

impl From<&str> for StreamName {
    fn from(label: &str) -> Self {
        StreamName(label.to_owned())
    }
}

impl Borrow<str> for StreamName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of the building a record was audited at.
pub struct BuildingId(pub String);

impl BuildingId {
    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BuildingId {
    fn from(label: &str) -> Self {
        BuildingId(label.to_owned())
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One observed disposal event after normalization.
pub struct WasteRecord {
    /// Audit date.
    pub date: NaiveDate,
    /// Calendar year of `date`.
    pub year: i32,
    /// Where the waste was audited.
    pub building: BuildingId,
    /// Raw found-in label such as "Reusables in Compost", or a resolved stream name.
    pub stream: String,
    /// Weight in pounds; finite and non-negative.
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Which reclassification table resolves raw labels.
pub enum ClassificationMode {
    /// Where each item should have gone.
    #[default]
    Before,
    /// Where each item ends up after a sorting correction pass.
    After,
}

impl ClassificationMode {
    /// The other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            ClassificationMode::Before => ClassificationMode::After,
            ClassificationMode::After => ClassificationMode::Before,
        }
    }
}

impl fmt::Display for ClassificationMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            ClassificationMode::Before => "before",
            ClassificationMode::After => "after",
        };
        write!(formatter, "{slug}")
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown classification mode `{0}` (expected `before` or `after`)")]
/// Returned when parsing a [`ClassificationMode`] from text fails.
pub struct UnknownModeError(pub String);

impl FromStr for ClassificationMode {
    type Err = UnknownModeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_lowercase().as_str() {
            "before" => Ok(ClassificationMode::Before),
            "after" => Ok(ClassificationMode::After),
            _ => Err(UnknownModeError(text.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Current chart selection. Replaced wholesale on every UI event.
pub struct ViewState {
    /// Selected year.
    pub year: i32,
    /// Selected classification mode.
    pub mode: ClassificationMode,
}

impl ViewState {
    /// Create a selection.
    #[must_use]
    pub fn new(year: i32, mode: ClassificationMode) -> Self {
        Self { year, mode }
    }

    /// Same mode, different year.
    #[must_use]
    pub fn with_year(self, year: i32) -> Self {
        Self { year, ..self }
    }

    /// Same year, other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        Self {
            mode: self.mode.toggled(),
            ..self
        }
    }
}
