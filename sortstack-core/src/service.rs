//! High-level service facade answering chart and selector queries.

use std::collections::BTreeSet;

use tracing::info;

use crate::model::{BuildingId, ClassificationMode, ViewState, WasteRecord};
use crate::normalize::{RecordIssue, WeightPolicy, normalize};
use crate::pipeline::{Aggregation, StackedSeries, StreamOrder, aggregate, stack};
use crate::ports::{DatasetSource, SourceError};
use crate::reclassify::ClassificationTables;

#[derive(Debug, Clone, Default)]
/// Knobs applied when a dataset is loaded.
pub struct DashboardOptions {
    /// Reclassification tables for both modes.
    pub tables: ClassificationTables,
    /// Stream stacking strategy.
    pub order: StreamOrder,
    /// Handling of malformed weights.
    pub weight_policy: WeightPolicy,
}

/// Public entry point holding a loaded dataset.
///
/// Every query recomputes from the stored records; nothing is cached between
/// selections.
pub struct DashboardService {
    records: Vec<WasteRecord>,
    tables: ClassificationTables,
    order: StreamOrder,
}

impl DashboardService {
    /// Wrap already-normalized records.
    #[must_use]
    pub fn from_records(
        records: Vec<WasteRecord>,
        tables: ClassificationTables,
        order: StreamOrder,
    ) -> Self {
        Self {
            records,
            tables,
            order,
        }
    }

    /// Fetch and normalize a dataset.
    ///
    /// Rows that were zeroed or dropped are returned alongside the service.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the source cannot be read or decoded.
    pub async fn load(
        source: &dyn DatasetSource,
        options: DashboardOptions,
    ) -> Result<(Self, Vec<RecordIssue>), SourceError> {
        let raw = source.fetch().await?;
        let normalized = normalize(&raw, options.weight_policy);

        info!(
            location = source.location(),
            rows = raw.len(),
            records = normalized.records.len(),
            issues = normalized.issues.len(),
            "dataset loaded"
        );

        let service = Self::from_records(normalized.records, options.tables, options.order);
        Ok((service, normalized.issues))
    }

    /// Number of usable records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Distinct years present in the dataset, ascending.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|record| record.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First year, before-sorting view. `None` for an empty dataset.
    #[must_use]
    pub fn initial_state(&self) -> Option<ViewState> {
        self.years()
            .first()
            .map(|year| ViewState::new(*year, ClassificationMode::Before))
    }

    /// Buildings with records in `year`, in first-seen order.
    #[must_use]
    pub fn buildings(&self, year: i32) -> Vec<BuildingId> {
        let mut buildings: Vec<BuildingId> = Vec::new();
        for record in self.records.iter().filter(|record| record.year == year) {
            if !buildings.contains(&record.building) {
                buildings.push(record.building.clone());
            }
        }
        buildings
    }

    /// Per-building sums for a selection.
    #[must_use]
    pub fn aggregate(&self, state: ViewState) -> Aggregation {
        aggregate(
            &self.records,
            state.year,
            self.tables.table(state.mode),
            &self.order,
        )
    }

    /// Stacked series for a selection.
    #[must_use]
    pub fn series(&self, state: ViewState) -> StackedSeries {
        stack(&self.aggregate(state))
    }
}
