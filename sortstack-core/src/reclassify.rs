//! Lookup tables mapping raw "X in Y" audit labels onto canonical streams.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{CanonicalStream, ClassificationMode, StreamName};

// (raw label, before sorting, after sorting)
const BUILT_IN: [(&str, CanonicalStream, CanonicalStream); 9] = [
    (
        "Reusables in Compost",
        CanonicalStream::Compost,
        CanonicalStream::Recycling,
    ),
    (
        "Reusables in Landfill",
        CanonicalStream::Landfill,
        CanonicalStream::Recycling,
    ),
    (
        "Reusables in Recycling",
        CanonicalStream::Recycling,
        CanonicalStream::Recycling,
    ),
    (
        "Compost in Landfill",
        CanonicalStream::Landfill,
        CanonicalStream::Compost,
    ),
    (
        "Compost in Recycling",
        CanonicalStream::Recycling,
        CanonicalStream::Compost,
    ),
    (
        "Landfill in Compost",
        CanonicalStream::Compost,
        CanonicalStream::Landfill,
    ),
    (
        "Landfill in Recycling",
        CanonicalStream::Recycling,
        CanonicalStream::Landfill,
    ),
    (
        "Recycling in Compost",
        CanonicalStream::Compost,
        CanonicalStream::Recycling,
    ),
    (
        "Recycling in Landfill",
        CanonicalStream::Landfill,
        CanonicalStream::Recycling,
    ),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Raw label to stream mapping for a single classification mode.
///
/// Labels without an entry resolve to themselves.
pub struct ReclassificationTable {
    entries: HashMap<String, StreamName>,
}

impl ReclassificationTable {
    /// Build a table from `(raw label, stream)` pairs. Later pairs win.
    #[must_use]
    pub fn from_pairs<I, R, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, S)>,
        R: Into<String>,
        S: Into<StreamName>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(raw, stream)| (raw.into(), stream.into()))
                .collect(),
        }
    }

    /// "Where should this have gone": an item found in the wrong bin counts
    /// toward the bin it was found in.
    #[must_use]
    pub fn before_sorting() -> Self {
        Self::from_pairs(BUILT_IN.iter().map(|(raw, before, _)| (*raw, *before)))
    }

    /// "Where does it end up": an item counts toward the stream it is moved to
    /// by the sorting correction pass.
    #[must_use]
    pub fn after_sorting() -> Self {
        Self::from_pairs(BUILT_IN.iter().map(|(raw, _, after)| (*raw, *after)))
    }

    /// Built-in table for a mode.
    #[must_use]
    pub fn for_mode(mode: ClassificationMode) -> Self {
        match mode {
            ClassificationMode::Before => Self::before_sorting(),
            ClassificationMode::After => Self::after_sorting(),
        }
    }

    /// Resolve a raw label. Unknown labels pass through unchanged.
    #[must_use]
    pub fn resolve<'label>(&'label self, raw: &'label str) -> &'label str {
        self.entries.get(raw).map_or(raw, StreamName::as_str)
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries, so every label passes through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One table per classification mode.
pub struct ClassificationTables {
    /// Table used in [`ClassificationMode::Before`].
    pub before: ReclassificationTable,
    /// Table used in [`ClassificationMode::After`].
    pub after: ReclassificationTable,
}

impl ClassificationTables {
    /// Table for the requested mode.
    #[must_use]
    pub fn table(&self, mode: ClassificationMode) -> &ReclassificationTable {
        match mode {
            ClassificationMode::Before => &self.before,
            ClassificationMode::After => &self.after,
        }
    }
}

impl Default for ClassificationTables {
    fn default() -> Self {
        Self {
            before: ReclassificationTable::before_sorting(),
            after: ReclassificationTable::after_sorting(),
        }
    }
}
