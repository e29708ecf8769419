//! Error types for vcf-normalize
//!
//! Every failure aborts the whole run; there is no per-row recovery.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for normalization runs
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Input path does not exist or cannot be opened
    #[error("Input file not found or unreadable: {path}: {source}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Structural problem in the input (header, row shape, FORMAT alignment)
    #[error("Malformed input at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    /// More than one allele-frequency subfield in INFO (strict mode only)
    #[error("Ambiguous INFO at line {line}: {count} subfields with key '{tag}'")]
    AmbiguousInfo { line: usize, tag: String, count: usize },

    /// Destination could not be created or written
    #[error("Failed to write output {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid pipeline configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error while reading an already opened input
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NormalizeError {
    /// Shorthand for a `MalformedInput` error
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        NormalizeError::MalformedInput {
            line,
            message: message.into(),
        }
    }

    /// Source line the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            NormalizeError::MalformedInput { line, .. }
            | NormalizeError::AmbiguousInfo { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type alias for normalization operations
pub type Result<T> = std::result::Result<T, NormalizeError>;
