use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use sortstack_core::{ClassificationMode, StreamName, StreamOrder, WeightPolicy};

#[derive(Debug, Parser)]
#[command(
    name = "sortstack",
    version,
    about = "Stacked waste-stream weights per building, before and after sorting"
)]
pub(crate) struct Cli {
    /// Dataset location: a JSON file path or an http(s) URL.
    #[arg(long, env = "SORTSTACK_DATASET", default_value = "data.json")]
    pub dataset: String,

    /// JSON file overriding the before/after reclassification tables.
    #[arg(long, env = "SORTSTACK_TABLES")]
    pub tables: Option<PathBuf>,

    /// What to do with rows whose weight is missing or not a number.
    #[arg(long, value_enum, default_value_t = PolicyArg::Zero)]
    pub weight_policy: PolicyArg,

    /// Log filter directives, written to stderr.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List the years present in the dataset, ascending.
    Years,
    /// Print the stacked series for one year and classification mode.
    Series(SeriesArgs),
    /// List rows that were zeroed or dropped while loading.
    Validate,
}

impl Command {
    pub(crate) fn stream_order(&self) -> Result<StreamOrder, clap::Error> {
        match self {
            Command::Series(args) => args.stream_order(),
            Command::Years | Command::Validate => Ok(StreamOrder::default()),
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct SeriesArgs {
    /// Year to chart; defaults to the earliest year in the dataset.
    #[arg(long)]
    pub year: Option<i32>,

    /// `before` or `after` sorting.
    #[arg(long, default_value = "before")]
    pub mode: ClassificationMode,

    /// Fixed stream order or streams discovered in the data.
    #[arg(long, value_enum, default_value_t = OrderArg::Fixed)]
    pub order: OrderArg,

    /// Comma separated stacking order for `--order fixed`.
    #[arg(long, value_delimiter = ',')]
    pub streams: Vec<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

impl SeriesArgs {
    /// Stacking order selected by `--order` and `--streams`.
    ///
    /// A stream list only makes sense for a fixed order, so pairing it with
    /// `--order discovered` is a usage error.
    pub(crate) fn stream_order(&self) -> Result<StreamOrder, clap::Error> {
        match self.order {
            OrderArg::Discovered if !self.streams.is_empty() => Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "`--streams` cannot be used with `--order discovered`",
            )),
            OrderArg::Discovered => Ok(StreamOrder::Discovered),
            OrderArg::Fixed if self.streams.is_empty() => Ok(StreamOrder::canonical()),
            OrderArg::Fixed => Ok(StreamOrder::Fixed(
                self.streams
                    .iter()
                    .map(|stream| stream.trim())
                    .filter(|stream| !stream.is_empty())
                    .map(StreamName::from)
                    .collect(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PolicyArg {
    /// Keep the row with zero weight.
    Zero,
    /// Drop the row.
    Reject,
}

impl From<PolicyArg> for WeightPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Zero => WeightPolicy::Zero,
            PolicyArg::Reject => WeightPolicy::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OrderArg {
    Fixed,
    Discovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Table,
    Json,
}
