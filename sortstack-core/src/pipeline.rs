//! Year filter, reclassification, per-building sums, and stacking.
//!
//! The pipeline is a pure function of its inputs: identical records and
//! selections always produce an identical [`StackedSeries`].

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{BuildingId, CanonicalStream, ClassificationMode, StreamName, WasteRecord};
use crate::reclassify::{ClassificationTables, ReclassificationTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// How the set and order of stacked streams is chosen.
pub enum StreamOrder {
    /// Stack these keys in this order, zero-filling any a building lacks.
    /// Observed streams missing from the list are appended after it.
    Fixed(Vec<StreamName>),
    /// Stack the distinct streams observed after reclassification, first-seen first.
    Discovered,
}

impl StreamOrder {
    /// `Compost`, `Recycling`, `Landfill`.
    #[must_use]
    pub fn canonical() -> Self {
        StreamOrder::Fixed(CanonicalStream::ALL.into_iter().map(StreamName::from).collect())
    }

    /// Final key list for a selection, given the streams observed in it.
    #[must_use]
    pub fn resolve(&self, observed: &[StreamName]) -> Vec<StreamName> {
        match self {
            StreamOrder::Discovered => observed.to_vec(),
            StreamOrder::Fixed(keys) => {
                let mut seen = HashSet::new();
                let mut resolved: Vec<StreamName> = keys
                    .iter()
                    .filter(|key| seen.insert(key.as_str()))
                    .cloned()
                    .collect();

                let unplanned: Vec<StreamName> = observed
                    .iter()
                    .filter(|stream| !seen.contains(stream.as_str()))
                    .cloned()
                    .collect();
                if !unplanned.is_empty() {
                    warn!(
                        streams = ?unplanned,
                        "appending streams missing from the fixed order"
                    );
                }
                resolved.extend(unplanned);
                resolved
            }
        }
    }
}

impl Default for StreamOrder {
    fn default() -> Self {
        Self::canonical()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Summed weight per stream for one building in the selected year.
pub struct AggregatedBuildingRecord {
    /// Building the sums belong to.
    pub building: BuildingId,
    /// Pounds per stream; every key of the resolved order is present.
    pub stream_weights: BTreeMap<StreamName, f64>,
}

impl AggregatedBuildingRecord {
    fn new(building: BuildingId) -> Self {
        Self {
            building,
            stream_weights: BTreeMap::new(),
        }
    }

    /// Weight for a stream, zero when absent.
    #[must_use]
    pub fn weight(&self, stream: &str) -> f64 {
        self.stream_weights.get(stream).copied().unwrap_or(0.0)
    }

    /// Sum over all streams.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.stream_weights.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Per-building sums plus the stream order they will be stacked in.
pub struct Aggregation {
    /// Resolved stacking order.
    pub keys: Vec<StreamName>,
    /// One row per building, first-seen order.
    pub buildings: Vec<AggregatedBuildingRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One building's slice of a stream: `[lower_bound, upper_bound)`.
pub struct Band {
    /// Building the band is drawn for.
    pub building: BuildingId,
    /// Sum of all streams stacked below this one.
    pub lower_bound: f64,
    /// `lower_bound` plus this stream's weight.
    pub upper_bound: f64,
}

impl Band {
    /// Height of the band.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// All bands for one stream, one per building in building order.
pub struct StreamSeries {
    /// Stream key.
    pub key: StreamName,
    /// Position in the stacking order, 0 at the bottom.
    pub index: usize,
    /// Bands in building order.
    pub bands: Vec<Band>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Stacked-bar-ready output of the pipeline.
pub struct StackedSeries {
    /// Stacking order.
    pub keys: Vec<StreamName>,
    /// Bar order.
    pub buildings: Vec<BuildingId>,
    /// One entry per key, same order as `keys`.
    pub series: Vec<StreamSeries>,
}

impl StackedSeries {
    /// True when no building matched the selection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Bands of one building, bottom first, paired with their stream key.
    #[must_use]
    pub fn bands_for(&self, building: &BuildingId) -> Vec<(&StreamName, &Band)> {
        let Some(position) = self.buildings.iter().position(|candidate| candidate == building)
        else {
            return Vec::new();
        };
        self.series
            .iter()
            .filter_map(|stream| stream.bands.get(position).map(|band| (&stream.key, band)))
            .collect()
    }

    /// Top of the stack for a building.
    #[must_use]
    pub fn building_total(&self, building: &BuildingId) -> Option<f64> {
        if !self.buildings.contains(building) {
            return None;
        }
        Some(
            self.bands_for(building)
                .last()
                .map_or(0.0, |(_, band)| band.upper_bound),
        )
    }

    /// Tallest stack across buildings, zero when empty.
    #[must_use]
    pub fn max_total(&self) -> f64 {
        self.series
            .last()
            .map(|top| {
                top.bands
                    .iter()
                    .map(|band| band.upper_bound)
                    .fold(0.0, f64::max)
            })
            .unwrap_or(0.0)
    }
}

/// Filter to `year`, reclassify with `table`, and sum weights per building and stream.
#[must_use]
pub fn aggregate(
    records: &[WasteRecord],
    year: i32,
    table: &ReclassificationTable,
    order: &StreamOrder,
) -> Aggregation {
    let mut buildings: Vec<AggregatedBuildingRecord> = Vec::new();
    let mut slots: HashMap<&BuildingId, usize> = HashMap::new();
    let mut observed: Vec<StreamName> = Vec::new();
    let mut observed_set: HashSet<&str> = HashSet::new();
    let mut matched = 0_usize;

    for record in records.iter().filter(|record| record.year == year) {
        matched += 1;
        let stream = table.resolve(&record.stream);
        if observed_set.insert(stream) {
            observed.push(StreamName::from(stream));
        }

        let slot = *slots.entry(&record.building).or_insert_with(|| {
            buildings.push(AggregatedBuildingRecord::new(record.building.clone()));
            buildings.len() - 1
        });
        if let Some(row) = buildings.get_mut(slot) {
            *row.stream_weights
                .entry(StreamName::from(stream))
                .or_insert(0.0) += record.weight;
        }
    }

    let keys = order.resolve(&observed);
    for row in &mut buildings {
        for key in &keys {
            row.stream_weights.entry(key.clone()).or_insert(0.0);
        }
    }

    debug!(
        year,
        records = matched,
        buildings = buildings.len(),
        streams = keys.len(),
        "aggregated selection"
    );

    Aggregation { keys, buildings }
}

/// Stack aggregated rows into contiguous bands, one series per key.
#[must_use]
pub fn stack(aggregation: &Aggregation) -> StackedSeries {
    let mut series: Vec<StreamSeries> = aggregation
        .keys
        .iter()
        .enumerate()
        .map(|(index, key)| StreamSeries {
            key: key.clone(),
            index,
            bands: Vec::with_capacity(aggregation.buildings.len()),
        })
        .collect();

    for row in &aggregation.buildings {
        let mut running = 0.0;
        for stream in &mut series {
            let upper_bound = running + row.weight(stream.key.as_str());
            stream.bands.push(Band {
                building: row.building.clone(),
                lower_bound: running,
                upper_bound,
            });
            running = upper_bound;
        }
    }

    StackedSeries {
        keys: aggregation.keys.clone(),
        buildings: aggregation
            .buildings
            .iter()
            .map(|row| row.building.clone())
            .collect(),
        series,
    }
}

/// Full pipeline with the built-in table for `mode`.
#[must_use]
pub fn compute_stacked_series(
    records: &[WasteRecord],
    year: i32,
    mode: ClassificationMode,
    order: &StreamOrder,
) -> StackedSeries {
    let table = ReclassificationTable::for_mode(mode);
    stack(&aggregate(records, year, &table, order))
}

/// Full pipeline with caller-provided tables.
#[must_use]
pub fn compute_with_tables(
    records: &[WasteRecord],
    year: i32,
    tables: &ClassificationTables,
    mode: ClassificationMode,
    order: &StreamOrder,
) -> StackedSeries {
    stack(&aggregate(records, year, tables.table(mode), order))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate};
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(date: &str, building: &str, stream: &str, weight: f64) -> WasteRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("test date");
        WasteRecord {
            date,
            year: date.year(),
            building: BuildingId::from(building),
            stream: stream.to_owned(),
            weight,
        }
    }

    fn sample() -> Vec<WasteRecord> {
        vec![
            record("2023-02-01", "Library", "Reusables in Compost", 10.0),
            record("2023-02-01", "Library", "Landfill in Recycling", 4.0),
            record("2023-03-10", "Gym", "Compost in Landfill", 6.0),
            record("2022-11-20", "Library", "Recycling in Landfill", 9.0),
            record("2023-04-02", "Dorm", "Recycling in Compost", 2.5),
            record("2023-04-02", "Gym", "Reusables in Landfill", 1.5),
        ]
    }

    fn key(label: &str) -> StreamName {
        StreamName::from(label)
    }

    fn raw_total(records: &[WasteRecord], year: i32, building: &str) -> f64 {
        records
            .iter()
            .filter(|record| record.year == year && record.building.as_str() == building)
            .map(|record| record.weight)
            .sum()
    }

    #[test]
    fn spec_example_moves_weight_between_streams_but_keeps_total() {
        let records = vec![record("2023-01-01", "A", "Reusables in Compost", 10.0)];
        let order = StreamOrder::canonical();
        let table_before = ReclassificationTable::before_sorting();
        let table_after = ReclassificationTable::after_sorting();

        let before = aggregate(&records, 2023, &table_before, &order);
        let after = aggregate(&records, 2023, &table_after, &order);

        let expected_before: BTreeMap<StreamName, f64> = [
            (key("Compost"), 10.0),
            (key("Recycling"), 0.0),
            (key("Landfill"), 0.0),
        ]
        .into_iter()
        .collect();
        let expected_after: BTreeMap<StreamName, f64> = [
            (key("Compost"), 0.0),
            (key("Recycling"), 10.0),
            (key("Landfill"), 0.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            before.buildings.first().map(|row| &row.stream_weights),
            Some(&expected_before)
        );
        assert_eq!(
            after.buildings.first().map(|row| &row.stream_weights),
            Some(&expected_after)
        );

        for mode in [ClassificationMode::Before, ClassificationMode::After] {
            let series = compute_stacked_series(&records, 2023, mode, &order);
            assert_eq!(series.building_total(&BuildingId::from("A")), Some(10.0));
        }
    }

    #[test]
    fn every_building_gets_every_fixed_stream() {
        let aggregation = aggregate(
            &sample(),
            2023,
            &ReclassificationTable::before_sorting(),
            &StreamOrder::canonical(),
        );

        assert_eq!(aggregation.buildings.len(), 3);
        for row in &aggregation.buildings {
            for stream in CanonicalStream::ALL {
                let weight = row.stream_weights.get(stream.label()).copied();
                assert!(
                    weight.is_some_and(|weight| weight >= 0.0),
                    "{} is missing {stream}",
                    row.building
                );
            }
        }
        let dorm = aggregation
            .buildings
            .iter()
            .find(|row| row.building.as_str() == "Dorm")
            .expect("dorm row");
        assert_eq!(dorm.weight("Landfill"), 0.0);
        assert_eq!(dorm.weight("Compost"), 2.5);
    }

    #[test]
    fn sums_are_conserved_per_building() {
        let records = sample();
        for mode in [ClassificationMode::Before, ClassificationMode::After] {
            let aggregation = aggregate(
                &records,
                2023,
                &ReclassificationTable::for_mode(mode),
                &StreamOrder::canonical(),
            );
            for row in &aggregation.buildings {
                assert_eq!(
                    row.total(),
                    raw_total(&records, 2023, row.building.as_str()),
                    "{} in {mode} mode",
                    row.building
                );
            }
        }
    }

    #[test]
    fn bands_are_contiguous_from_zero() {
        let records = sample();
        let series = compute_stacked_series(
            &records,
            2023,
            ClassificationMode::After,
            &StreamOrder::canonical(),
        );

        assert_eq!(series.series.len(), 3);
        for building in &series.buildings {
            let bands = series.bands_for(building);
            assert_eq!(bands.len(), 3);
            assert_eq!(bands.first().map(|(_, band)| band.lower_bound), Some(0.0));
            for pair in bands.windows(2) {
                if let [(_, lower), (_, upper)] = pair {
                    assert_eq!(lower.upper_bound, upper.lower_bound);
                }
            }
            let stacked: f64 = bands.iter().map(|(_, band)| band.weight()).sum();
            assert_eq!(stacked, raw_total(&records, 2023, building.as_str()));
            assert_eq!(
                series.building_total(building),
                Some(raw_total(&records, 2023, building.as_str()))
            );
        }
    }

    #[test]
    fn buildings_keep_first_seen_order_and_series_keep_key_order() {
        let series = compute_stacked_series(
            &sample(),
            2023,
            ClassificationMode::Before,
            &StreamOrder::canonical(),
        );

        let buildings: Vec<&str> = series.buildings.iter().map(BuildingId::as_str).collect();
        assert_eq!(buildings, ["Library", "Gym", "Dorm"]);

        let keys: Vec<&str> = series.series.iter().map(|stream| stream.key.as_str()).collect();
        assert_eq!(keys, ["Compost", "Recycling", "Landfill"]);
        for (position, stream) in series.series.iter().enumerate() {
            assert_eq!(stream.index, position);
            let band_buildings: Vec<&str> = stream
                .bands
                .iter()
                .map(|band| band.building.as_str())
                .collect();
            assert_eq!(band_buildings, buildings);
        }
    }

    #[test]
    fn absent_year_and_empty_input_give_empty_series() {
        let missing = compute_stacked_series(
            &sample(),
            1999,
            ClassificationMode::Before,
            &StreamOrder::canonical(),
        );
        assert!(missing.is_empty());
        assert!(missing.series.iter().all(|stream| stream.bands.is_empty()));
        assert_eq!(missing.max_total(), 0.0);

        let nothing =
            compute_stacked_series(&[], 2023, ClassificationMode::After, &StreamOrder::Discovered);
        assert!(nothing.is_empty());
        assert!(nothing.keys.is_empty());
    }

    #[test]
    fn discovered_order_passes_unknown_labels_through() {
        let records = vec![
            record("2023-05-01", "Annex", "Unknown", 3.0),
            record("2023-05-01", "Annex", "Compost in Recycling", 2.0),
            record("2023-05-02", "Hall", "Landfill", 1.0),
        ];
        for mode in [ClassificationMode::Before, ClassificationMode::After] {
            let series = compute_stacked_series(&records, 2023, mode, &StreamOrder::Discovered);

            assert_eq!(series.keys.first(), Some(&key("Unknown")));
            let annex = series.bands_for(&BuildingId::from("Annex"));
            let unknown = annex
                .iter()
                .find(|(stream, _)| stream.as_str() == "Unknown")
                .map(|(_, band)| band.weight());
            assert_eq!(unknown, Some(3.0));

            // discovered keys are zero-filled across buildings too
            let hall = series.bands_for(&BuildingId::from("Hall"));
            assert_eq!(hall.len(), series.keys.len());
        }

        let before = compute_stacked_series(
            &records,
            2023,
            ClassificationMode::Before,
            &StreamOrder::Discovered,
        );
        assert_eq!(before.keys, vec![key("Unknown"), key("Recycling"), key("Landfill")]);
    }

    #[test]
    fn fixed_order_appends_unplanned_streams_after_its_keys() {
        let records = vec![
            record("2023-05-01", "Annex", "Glass", 3.0),
            record("2023-05-01", "Annex", "Compost in Recycling", 2.0),
        ];

        let series = compute_stacked_series(
            &records,
            2023,
            ClassificationMode::Before,
            &StreamOrder::canonical(),
        );

        assert_eq!(
            series.keys,
            vec![key("Compost"), key("Recycling"), key("Landfill"), key("Glass")]
        );
        assert_eq!(series.building_total(&BuildingId::from("Annex")), Some(5.0));
    }

    #[test]
    fn fixed_order_drops_duplicate_keys() {
        let order = StreamOrder::Fixed(vec![key("Landfill"), key("Compost"), key("Landfill")]);
        assert_eq!(order.resolve(&[]), vec![key("Landfill"), key("Compost")]);
    }

    #[test]
    fn custom_fixed_order_changes_stacking_but_not_totals() {
        let records = sample();
        let order = StreamOrder::Fixed(vec![key("Landfill"), key("Recycling"), key("Compost")]);

        let series = compute_stacked_series(&records, 2023, ClassificationMode::Before, &order);

        let library = series.bands_for(&BuildingId::from("Library"));
        let bottom = library.first().map(|(stream, band)| (stream.as_str(), band.lower_bound));
        assert_eq!(bottom, Some(("Landfill", 0.0)));
        assert_eq!(series.building_total(&BuildingId::from("Library")), Some(14.0));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let records = sample();
        let tables = ClassificationTables::default();
        for order in [StreamOrder::canonical(), StreamOrder::Discovered] {
            let first =
                compute_with_tables(&records, 2023, &tables, ClassificationMode::After, &order);
            let second =
                compute_with_tables(&records, 2023, &tables, ClassificationMode::After, &order);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn max_total_is_tallest_stack() {
        let series = compute_stacked_series(
            &sample(),
            2023,
            ClassificationMode::Before,
            &StreamOrder::canonical(),
        );
        assert_eq!(series.max_total(), 14.0);
        assert_eq!(series.building_total(&BuildingId::from("Nowhere")), None);
    }

    #[test]
    fn series_serializes_with_camel_case_bounds() {
        let records = vec![record("2023-01-01", "A", "Landfill", 2.0)];
        let series = compute_stacked_series(
            &records,
            2023,
            ClassificationMode::Before,
            &StreamOrder::canonical(),
        );

        let json = serde_json::to_value(&series).expect("serializable");
        let landfill_band = json
            .get("series")
            .and_then(|series| series.get(2))
            .and_then(|stream| stream.get("bands"))
            .and_then(|bands| bands.get(0))
            .cloned();
        assert_eq!(
            landfill_band,
            Some(serde_json::json!({"building": "A", "lowerBound": 0.0, "upperBound": 2.0}))
        );
    }
}
