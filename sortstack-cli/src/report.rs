use std::io::Write;

use anyhow::Result;
use sortstack_core::{RecordIssue, StackedSeries, ViewState};

const BUILDING_HEADER: &str = "Building";
const TOTAL_HEADER: &str = "Total";

pub(crate) fn write_years(out: &mut impl Write, years: &[i32]) -> Result<()> {
    for year in years {
        writeln!(out, "{year}")?;
    }
    Ok(())
}

/// One row per building: weight of each stacked stream, then the stack height.
pub(crate) fn write_series_table(
    out: &mut impl Write,
    state: ViewState,
    series: &StackedSeries,
) -> Result<()> {
    writeln!(out, "{} · {} sorting · lbs", state.year, state.mode)?;

    if series.is_empty() {
        writeln!(out, "No records for {}.", state.year)?;
        return Ok(());
    }

    let building_width = series
        .buildings
        .iter()
        .map(|building| building.as_str().chars().count())
        .chain([BUILDING_HEADER.len()])
        .max()
        .unwrap_or(BUILDING_HEADER.len());
    let widths: Vec<usize> = series
        .keys
        .iter()
        .map(|key| key.as_str().chars().count().max(10))
        .collect();

    let mut header = vec![format!("{BUILDING_HEADER:<building_width$}")];
    header.extend(
        series
            .keys
            .iter()
            .zip(widths.iter().copied())
            .map(|(key, width)| format!("{:>width$}", key.as_str())),
    );
    header.push(format!("{TOTAL_HEADER:>10}"));
    writeln!(out, "{}", header.join("  "))?;

    for building in &series.buildings {
        let mut cells = vec![format!("{:<building_width$}", building.as_str())];
        cells.extend(
            series
                .bands_for(building)
                .iter()
                .zip(widths.iter().copied())
                .map(|((_, band), width)| format!("{:>width$.2}", band.weight())),
        );
        let total = series.building_total(building).unwrap_or(0.0);
        cells.push(format!("{total:>10.2}"));
        writeln!(out, "{}", cells.join("  "))?;
    }
    Ok(())
}

pub(crate) fn write_series_json(out: &mut impl Write, series: &StackedSeries) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, series)?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn write_issues(out: &mut impl Write, issues: &[RecordIssue]) -> Result<()> {
    if issues.is_empty() {
        writeln!(out, "All rows valid.")?;
        return Ok(());
    }
    for issue in issues {
        writeln!(out, "{issue}")?;
    }
    writeln!(out, "{} row(s) with issues.", issues.len())?;
    Ok(())
}
