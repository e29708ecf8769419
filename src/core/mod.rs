//! Core normalization functionality
//!
//! This module contains the configuration, error types, I/O plumbing and
//! the filter stages, plus the pipeline that ties them together.

pub mod config;
mod error;
pub mod filters;
pub mod io;
mod pipeline;

pub use config::{FormatOrder, InfoPolicy, NormalizeConfig};
pub use error::{NormalizeError, Result};
pub use filters::{
    AltPresenceStage, FilterStatusStage, FormatEntry, FormatReduceStage, InfoReduceStage, Stage,
};
pub use io::{AtomicOutput, CompressionFormat};
pub use pipeline::{normalize, normalize_default, NormalizeStats, Pipeline};
