// SPDX-License-Identifier: MIT OR Apache-2.0

//! The crate error type.
//!
//! Logging itself never returns an error; this type covers the recoverable
//! configuration surface, currently just opening file sinks.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The log file could not be created or opened.
    #[error("failed to open log file '{path}': {source}")]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
