//! Read → filter → write
//!
//! [`normalize`] is the file-to-file entry point. [`Pipeline`] holds the
//! ordered stages and can be run on an in-memory [`VcfDocument`] as well.

use super::config::NormalizeConfig;
use super::error::{NormalizeError, Result};
use super::filters::{default_stages, Stage};
use crate::formats::vcf::{read_vcf, write_vcf, VariantTable, VcfDocument};
use log::{debug, info};
use std::path::Path;

/// Counters for one normalization run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Data rows read
    pub total: usize,
    /// Data rows written
    pub kept: usize,
    /// Rows dropped by FILTER-status selection
    pub dropped_filter: usize,
    /// Rows dropped for lacking an alternate allele
    pub dropped_alt: usize,
    /// Rows whose INFO had no allele-frequency subfield
    pub info_missing: usize,
}

/// Ordered normalization stages
pub struct Pipeline {
    config: NormalizeConfig,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Build the standard four-stage pipeline; the config is validated first
    pub fn new(config: NormalizeConfig) -> Result<Self> {
        config.validate()?;
        let stages = default_stages(&config);
        Ok(Self { config, stages })
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over a table
    pub fn run_table(&self, table: VariantTable, stats: &mut NormalizeStats) -> Result<VariantTable> {
        self.check_sample_column(&table)?;

        stats.total += table.len();
        let mut table = table;
        for stage in &self.stages {
            let before = table.len();
            table = stage.apply(table, stats)?;
            debug!("{}: {} -> {} records", stage.name(), before, table.len());
        }
        stats.kept += table.len();
        Ok(table)
    }

    /// Run every stage over a document, keeping its metadata
    pub fn run(&self, doc: VcfDocument) -> Result<(VcfDocument, NormalizeStats)> {
        let mut stats = NormalizeStats::default();
        let VcfDocument { metadata, table } = doc;
        let table = self.run_table(table, &mut stats)?;
        Ok((VcfDocument { metadata, table }, stats))
    }

    fn check_sample_column(&self, table: &VariantTable) -> Result<()> {
        if let Some(sample) = &self.config.sample_column {
            let header = table.header();
            if !header.sample_names().iter().any(|s| s == sample) {
                return Err(NormalizeError::malformed(
                    header.line(),
                    format!(
                        "sample column '{}' not found in header (samples: {})",
                        sample,
                        header.sample_names().join(", ")
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Normalize `input` into `output`
///
/// The output is written to a temporary file next to `output` and renamed
/// into place only after everything succeeded.
pub fn normalize<P, Q>(input: P, output: Q, config: &NormalizeConfig) -> Result<NormalizeStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let pipeline = Pipeline::new(config.clone())?;
    let doc = read_vcf(input.as_ref())?;
    let (doc, stats) = pipeline.run(doc)?;
    write_vcf(&doc, output.as_ref())?;

    info!(
        "Normalized {:?} -> {:?}: {} of {} records kept",
        input.as_ref(),
        output.as_ref(),
        stats.kept,
        stats.total
    );
    Ok(stats)
}

/// [`normalize`] with the default configuration
pub fn normalize_default<P, Q>(input: P, output: Q) -> Result<NormalizeStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    normalize(input, output, &NormalizeConfig::default())
}
