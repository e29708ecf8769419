//! vcf-normalize - VCF record normalization
//!
//! Reads a VCF file, keeps only rows that passed QC, reduces INFO to a single
//! allele-frequency subfield, restricts FORMAT and sample columns to a tag
//! whitelist, drops rows without an alternate allele, and writes the result
//! back with the original `##` metadata untouched.
//!
//! # Example
//!
//! ```no_run
//! use vcf_normalize::{normalize, NormalizeConfig};
//!
//! let config = NormalizeConfig::default().with_af_rename(Some("AF".to_string()));
//! let stats = normalize("NA12878.genome.vcf", "NA12878.normalized.vcf", &config)?;
//! println!("kept {} of {} records", stats.kept, stats.total);
//! # Ok::<(), vcf_normalize::NormalizeError>(())
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use crate::core::{
    normalize, normalize_default, FormatOrder, InfoPolicy, NormalizeConfig, NormalizeError,
    NormalizeStats, Pipeline, Result,
};
pub use crate::formats::vcf;
