//! Command line front end printing stacked waste-stream series per building and year.

mod cli;
mod report;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use reqwest::Client;
use sortstack_core::{ClassificationTables, DashboardOptions, DashboardService, ViewState};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Format};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let order = cli.command.stream_order().unwrap_or_else(|err| err.exit());
    init_tracing(&cli.log_level)?;

    // HTTP + source setup
    let client = Client::builder().user_agent("sortstack/0.1").build()?;
    let source = sortstack_source::source_for(&cli.dataset, client);

    let tables = match &cli.tables {
        Some(path) => load_tables(path).await?,
        None => ClassificationTables::default(),
    };
    let options = DashboardOptions {
        tables,
        order,
        weight_policy: cli.weight_policy.into(),
    };

    let (service, issues) = match DashboardService::load(source.as_ref(), options).await {
        Ok(loaded) => loaded,
        Err(err) => {
            error!(location = source.location(), error = %err, "failed to load dataset");
            return Err(err).with_context(|| format!("loading {}", source.location()));
        }
    };
    if !issues.is_empty() {
        warn!(
            count = issues.len(),
            "some rows were zeroed or dropped; run `validate` for details"
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Years => report::write_years(&mut out, &service.years())?,
        Command::Series(args) => {
            let Some(year) = args
                .year
                .or_else(|| service.initial_state().map(|state| state.year))
            else {
                writeln!(out, "No records in {}.", source.location())?;
                return Ok(());
            };

            let state = ViewState::new(year, args.mode);
            let series = service.series(state);
            info!(
                year = state.year,
                mode = %state.mode,
                buildings = series.buildings.len(),
                "computed series"
            );

            match args.format {
                Format::Table => report::write_series_table(&mut out, state, &series)?,
                Format::Json => report::write_series_json(&mut out, &series)?,
            }
        }
        Command::Validate => {
            report::write_issues(&mut out, &issues)?;
            if !issues.is_empty() {
                bail!("{} row(s) failed validation", issues.len());
            }
        }
    }

    Ok(())
}

fn init_tracing(directives: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log filter `{directives}`"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

async fn load_tables(path: &Path) -> Result<ClassificationTables> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading tables from {}", path.display()))?;
    let tables = serde_json::from_slice(&bytes)
        .with_context(|| format!("decoding tables from {}", path.display()))?;
    info!(path = %path.display(), "using custom reclassification tables");
    Ok(tables)
}
