//! Row and column normalization stages
//!
//! Each stage consumes a [`VariantTable`] and returns a new one. Row-dropping
//! stages are stable selections; rewriting stages never add or remove
//! columns.

use super::config::{FormatOrder, InfoPolicy, NormalizeConfig};
use super::error::{NormalizeError, Result};
use super::pipeline::NormalizeStats;
use crate::formats::vcf::{Header, VariantRecord, VariantTable, MISSING};
use log::debug;

/// A single step of the normalization pipeline
pub trait Stage {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Transform the table, recording what happened in `stats`
    fn apply(&self, table: VariantTable, stats: &mut NormalizeStats) -> Result<VariantTable>;
}

// ---------------------------------------------------------------------------
// FILTER-status selection
// ---------------------------------------------------------------------------

/// Keeps rows whose FILTER value is exactly one of the passing values
#[derive(Debug, Clone)]
pub struct FilterStatusStage {
    pass_filters: Vec<String>,
}

impl FilterStatusStage {
    pub fn new<I, S>(pass_filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pass_filters: pass_filters.into_iter().map(Into::into).collect(),
        }
    }

    pub fn passes(&self, record: &VariantRecord) -> bool {
        self.pass_filters.iter().any(|p| p == record.filter())
    }
}

impl Stage for FilterStatusStage {
    fn name(&self) -> &'static str {
        "filter-status"
    }

    fn apply(&self, table: VariantTable, stats: &mut NormalizeStats) -> Result<VariantTable> {
        let (table, dropped) = table.select(|r| self.passes(r));
        stats.dropped_filter += dropped;
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// INFO reduction
// ---------------------------------------------------------------------------

/// Reduces INFO to the single allele-frequency subfield
#[derive(Debug, Clone)]
pub struct InfoReduceStage {
    tag: String,
    out_key: String,
    policy: InfoPolicy,
}

impl InfoReduceStage {
    pub fn new(tag: impl Into<String>, out_key: impl Into<String>, policy: InfoPolicy) -> Self {
        Self {
            tag: tag.into(),
            out_key: out_key.into(),
            policy,
        }
    }

    /// Reduced INFO value for one record: `<KEY>=<value>` or `.`
    pub fn reduce(&self, info: &str, line: usize) -> Result<String> {
        match find_info_value(info, &self.tag, self.policy, line)? {
            Some(value) => Ok(format!("{}={}", self.out_key, value)),
            None => Ok(MISSING.to_string()),
        }
    }
}

/// Value of the `tag=value` subfield in a `;`-separated INFO string
///
/// Bare flags carry no value and are ignored. With several matches the
/// first wins under [`InfoPolicy::Lenient`] and is an error under
/// [`InfoPolicy::Strict`].
pub fn find_info_value<'a>(
    info: &'a str,
    tag: &str,
    policy: InfoPolicy,
    line: usize,
) -> Result<Option<&'a str>> {
    let mut matches = info
        .split(';')
        .filter_map(|sub| sub.split_once('='))
        .filter(|(key, _)| *key == tag)
        .map(|(_, value)| value);

    let first = matches.next();
    if first.is_some() {
        let extra = matches.count();
        if extra > 0 {
            match policy {
                InfoPolicy::Strict => {
                    return Err(NormalizeError::AmbiguousInfo {
                        line,
                        tag: tag.to_string(),
                        count: extra + 1,
                    })
                }
                InfoPolicy::Lenient => {
                    debug!("line {}: {} '{}' subfields, keeping the first", line, extra + 1, tag);
                }
            }
        }
    }
    Ok(first)
}

impl Stage for InfoReduceStage {
    fn name(&self) -> &'static str {
        "info-reduce"
    }

    fn apply(&self, table: VariantTable, stats: &mut NormalizeStats) -> Result<VariantTable> {
        table.try_map(|_, record| {
            let info = self.reduce(record.info(), record.line())?;
            if info == MISSING {
                stats.info_missing += 1;
            }
            Ok(record.with_info(info))
        })
    }
}

// ---------------------------------------------------------------------------
// FORMAT/sample reduction
// ---------------------------------------------------------------------------

/// One FORMAT tag with the matching value from every sample column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEntry<'a> {
    pub tag: &'a str,
    pub values: Vec<&'a str>,
}

/// Pair FORMAT tags with sample values by position
///
/// Every sample must have exactly as many `:`-separated values as FORMAT
/// has tags.
pub fn pair_format<'a>(
    format: &'a str,
    samples: &'a [String],
    sample_names: &[String],
    line: usize,
) -> Result<Vec<FormatEntry<'a>>> {
    let tags: Vec<&str> = format.split(':').collect();
    let mut entries: Vec<FormatEntry> = tags
        .iter()
        .map(|&tag| FormatEntry {
            tag,
            values: Vec::with_capacity(samples.len()),
        })
        .collect();

    for (i, sample) in samples.iter().enumerate() {
        let values: Vec<&str> = sample.split(':').collect();
        if values.len() != tags.len() {
            let name = sample_names.get(i).map(String::as_str).unwrap_or("?");
            return Err(NormalizeError::malformed(
                line,
                format!(
                    "FORMAT '{}' has {} tags but sample {} has {} values",
                    format,
                    tags.len(),
                    name,
                    values.len()
                ),
            ));
        }
        for (entry, value) in entries.iter_mut().zip(values) {
            entry.values.push(value);
        }
    }

    Ok(entries)
}

/// Restricts FORMAT and sample columns to a whitelist of tags
#[derive(Debug, Clone)]
pub struct FormatReduceStage {
    whitelist: Vec<String>,
    order: FormatOrder,
}

impl FormatReduceStage {
    pub fn new<I, S>(whitelist: I, order: FormatOrder) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            whitelist: whitelist.into_iter().map(Into::into).collect(),
            order,
        }
    }

    fn allowed(&self, tag: &str) -> bool {
        self.whitelist.iter().any(|w| w == tag)
    }

    /// Pick the surviving entries; a repeated tag keeps its first occurrence
    pub fn select<'e, 'a>(&self, entries: &'e [FormatEntry<'a>]) -> Vec<&'e FormatEntry<'a>> {
        match self.order {
            FormatOrder::Original => {
                let mut selected: Vec<&FormatEntry> = Vec::new();
                for entry in entries {
                    if self.allowed(entry.tag) && !selected.iter().any(|s| s.tag == entry.tag) {
                        selected.push(entry);
                    }
                }
                selected
            }
            FormatOrder::Whitelist => self
                .whitelist
                .iter()
                .filter_map(|w| entries.iter().find(|e| e.tag == w.as_str()))
                .collect(),
        }
    }

    /// Rewrite one record's FORMAT and sample columns
    pub fn reduce(&self, header: &Header, record: VariantRecord) -> Result<VariantRecord> {
        let Some(format) = record.format() else {
            return Ok(record);
        };

        let sample_count = record.samples().len();
        let (new_format, new_samples) = {
            let entries = pair_format(format, record.samples(), header.sample_names(), record.line())?;
            let selected = self.select(&entries);

            if selected.is_empty() {
                (MISSING.to_string(), vec![MISSING.to_string(); sample_count])
            } else {
                let new_format = selected.iter().map(|e| e.tag).collect::<Vec<_>>().join(":");
                let new_samples: Vec<String> = (0..sample_count)
                    .map(|i| selected.iter().map(|e| e.values[i]).collect::<Vec<_>>().join(":"))
                    .collect();
                (new_format, new_samples)
            }
        };

        Ok(record.with_format_and_samples(new_format, new_samples))
    }
}

impl Stage for FormatReduceStage {
    fn name(&self) -> &'static str {
        "format-reduce"
    }

    fn apply(&self, table: VariantTable, _stats: &mut NormalizeStats) -> Result<VariantTable> {
        table.try_map(|header, record| self.reduce(header, record))
    }
}

// ---------------------------------------------------------------------------
// Alternate-allele presence
// ---------------------------------------------------------------------------

/// Drops rows without a real alternate allele
#[derive(Debug, Clone)]
pub struct AltPresenceStage {
    drop_ref_equal_alt: bool,
}

impl AltPresenceStage {
    pub fn new(drop_ref_equal_alt: bool) -> Self {
        Self { drop_ref_equal_alt }
    }

    pub fn has_alt(&self, record: &VariantRecord) -> bool {
        let alt = record.alt();
        if alt == MISSING {
            return false;
        }
        !(self.drop_ref_equal_alt && alt == record.ref_allele())
    }
}

impl Stage for AltPresenceStage {
    fn name(&self) -> &'static str {
        "alt-presence"
    }

    fn apply(&self, table: VariantTable, stats: &mut NormalizeStats) -> Result<VariantTable> {
        let (table, dropped) = table.select(|r| self.has_alt(r));
        stats.dropped_alt += dropped;
        Ok(table)
    }
}

/// The four stages in their fixed order
pub fn default_stages(config: &NormalizeConfig) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(FilterStatusStage::new(config.pass_filters.iter().cloned())),
        Box::new(InfoReduceStage::new(
            config.af_tag.clone(),
            config.output_af_key(),
            config.info_policy,
        )),
        Box::new(FormatReduceStage::new(
            config.format_whitelist.iter().cloned(),
            config.format_order,
        )),
        Box::new(AltPresenceStage::new(config.drop_ref_equal_alt)),
    ]
}
