//! vcf-normalize CLI entry point
//!
//! Normalizes a single VCF file: FILTER selection, AF extraction, FORMAT
//! whitelisting and removal of rows without an alternate allele.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Instant;
use vcf_normalize::core::config::{DEFAULT_AF_TAG, DEFAULT_FORMAT_TAGS, DEFAULT_PASS_FILTERS};
use vcf_normalize::{normalize, FormatOrder, InfoPolicy, NormalizeConfig};

/// Order of the FORMAT tags kept in the output (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum FormatOrderArg {
    /// Order in which the tags appear in each record's FORMAT column
    #[default]
    #[value(name = "original")]
    Original,
    /// Order given by --format-tags
    #[value(name = "whitelist")]
    Whitelist,
}

impl From<FormatOrderArg> for FormatOrder {
    fn from(arg: FormatOrderArg) -> Self {
        match arg {
            FormatOrderArg::Original => FormatOrder::Original,
            FormatOrderArg::Whitelist => FormatOrder::Whitelist,
        }
    }
}

#[derive(Parser)]
#[command(name = "vcf-normalize")]
#[command(about = "Normalize VCF records: FILTER selection, AF extraction, FORMAT whitelisting")]
#[command(version)]
struct Cli {
    /// Input VCF file (plain, .gz or .bz2)
    input: PathBuf,

    /// Output VCF file (.gz for gzip-compressed output)
    output: PathBuf,

    /// Print progress and statistics
    #[arg(short = 'v', long)]
    verbose: bool,

    /// INFO key holding the allele frequency
    #[arg(long = "af-tag", default_value = DEFAULT_AF_TAG)]
    af_tag: String,

    /// Write the allele-frequency subfield under this key instead (e.g. AF)
    #[arg(long = "rename-af")]
    rename_af: Option<String>,

    /// FORMAT tags to keep
    #[arg(long = "format-tags", value_delimiter = ',', default_values_t = DEFAULT_FORMAT_TAGS.map(String::from))]
    format_tags: Vec<String>,

    /// Order of the kept FORMAT tags
    #[arg(long = "format-order", default_value = "original")]
    format_order: FormatOrderArg,

    /// Fail unless this sample column is present in the header
    #[arg(long = "sample")]
    sample: Option<String>,

    /// FILTER value that keeps a record (repeatable)
    #[arg(long = "pass-filter", default_values_t = DEFAULT_PASS_FILTERS.map(String::from))]
    pass_filters: Vec<String>,

    /// Fail on records with more than one allele-frequency subfield
    #[arg(long = "strict-info")]
    strict_info: bool,

    /// Keep records whose ALT equals REF
    #[arg(long = "keep-ref-alt")]
    keep_ref_alt: bool,
}

impl Cli {
    fn config(&self) -> NormalizeConfig {
        let info_policy = if self.strict_info {
            InfoPolicy::Strict
        } else {
            InfoPolicy::Lenient
        };

        NormalizeConfig::default()
            .with_af_tag(self.af_tag.clone())
            .with_af_rename(self.rename_af.clone())
            .with_format_whitelist(self.format_tags.iter().cloned())
            .with_format_order(self.format_order.into())
            .with_sample_column(self.sample.clone())
            .with_pass_filters(self.pass_filters.iter().cloned())
            .with_info_policy(info_policy)
            .with_drop_ref_equal_alt(!self.keep_ref_alt)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Info } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start = Instant::now();

    let config = cli.config();
    log::info!("Normalizing VCF file: {:?} -> {:?}", cli.input, cli.output);

    let stats = normalize(&cli.input, &cli.output, &config)
        .with_context(|| format!("failed to normalize {:?}", cli.input))?;

    if cli.verbose {
        eprintln!("\n=== Normalization Statistics ===");
        eprintln!("Total records:   {}", stats.total);
        eprintln!("Kept:            {}", stats.kept);
        eprintln!("  - FILTER:      {} dropped", stats.dropped_filter);
        eprintln!("  - No ALT:      {} dropped", stats.dropped_alt);
        eprintln!("  - No AF:       {} set to '.'", stats.info_missing);
        eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
    }

    Ok(())
}
