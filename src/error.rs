#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the summarizer crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.

use std::path::{Path, PathBuf};

/// Unified error type returned by the pipeline stages and the CLI.
///
/// Only fatal conditions are represented here. Per-repository README and
/// summary failures are carried as outcomes on the record instead, see
/// [`ReadmeOutcome`](crate::ReadmeOutcome) and
/// [`SummaryOutcome`](crate::SummaryOutcome).
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Required configuration such as an access token is missing or invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Human readable message describing the configuration problem.
        message: String
    },
    /// Failures talking to the repository hosting API.
    #[error("github error: {message}")]
    Github {
        /// Human readable message describing the failed request.
        message: String
    },
    /// Failures talking to the completion endpoint.
    #[error("completion error: {message}")]
    Completion {
        /// Human readable message describing the failed request.
        message: String
    },
    /// Wraps I/O errors that occur while writing the output file.
    #[error("failed to write output to {path:?}: {source}")]
    Io {
        /// Location of the output file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps JSON encoding errors.
    #[error("failed to serialize JSON: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Wraps YAML encoding errors.
    #[error("failed to serialize YAML: {source}")]
    Yaml {
        /// Source error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps CSV encoding errors.
    #[error("failed to serialize CSV: {source}")]
    Csv {
        /// Source error from the csv writer.
        source: csv::Error
    }
}

impl Error {
    /// Constructs a configuration error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the configuration failure.
    pub fn config<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Config {
            message: message.into()
        }
    }

    /// Constructs a hosting API error.
    pub fn github<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Github {
            message: message.into()
        }
    }

    /// Constructs a completion endpoint error.
    pub fn completion<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Completion {
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml {
            source
        }
    }
}

impl From<csv::Error> for Error {
    fn from(source: csv::Error) -> Self {
        Self::Csv {
            source
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Completion {
            message: error.to_string()
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the output file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}
