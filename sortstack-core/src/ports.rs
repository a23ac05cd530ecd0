//! Trait describing where the raw dataset comes from, plus its error type.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

use crate::normalize::RawWasteRecord;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while loading the dataset.
pub enum SourceError {
    /// Reading a local file failed.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Network layer failed or the server answered with an error status.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The payload was not a JSON array of dataset rows.
    #[error("Decode error: {0}")]
    Decode(#[from] JsonError),
}

#[async_trait]
/// Backend able to produce the raw dataset rows.
pub trait DatasetSource: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> &str;

    /// Fetch every row of the dataset.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the dataset cannot be read or decoded.
    async fn fetch(&self) -> Result<Vec<RawWasteRecord>, SourceError>;
}
