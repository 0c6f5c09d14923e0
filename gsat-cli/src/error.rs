//! This module defines all the errors that can occur while executing gsat-cli.

use std::path::PathBuf;

use thiserror::Error;

/// Error that occur during execution of Gsat's CLI app
#[derive(Error, Debug)]
pub enum CliError {
    /// Error if the output file exists and should not be replaced
    #[error("output file \"{filename}\" already exists, use --overwrite to replace it")]
    OutputExists {
        /// Name of the existing file
        filename: PathBuf,
    },
    /// Error while writing to a file
    #[error("failed to write \"{filename}\": {error}")]
    Writing {
        /// Contains the wrapped error
        error: std::io::Error,
        /// Name of the file that could not be written
        filename: PathBuf,
    },
    /// Error while serializing statistics
    #[error("failed to serialize statistics: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// Error originating from gsat
    #[error(transparent)]
    GsatError(#[from] gsat::error::Error),
}
