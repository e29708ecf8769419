//! Pipeline configuration
//!
//! Cohort-specific knobs (which INFO key is the allele frequency, which
//! FORMAT tags survive, which FILTER values count as passing) live here
//! instead of being hard-coded in the stages.

use super::error::{NormalizeError, Result};

/// Default allele-frequency INFO key
pub const DEFAULT_AF_TAG: &str = "AF1000G";

/// Default FORMAT whitelist
pub const DEFAULT_FORMAT_TAGS: [&str; 3] = ["GT", "AD", "DP"];

/// Default passing FILTER values
pub const DEFAULT_PASS_FILTERS: [&str; 2] = ["PASS", "LowGQX"];

/// What to do when INFO carries the AF key more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InfoPolicy {
    /// First occurrence wins
    #[default]
    Lenient,
    /// Fail with `AmbiguousInfo`
    Strict,
}

/// Order of the surviving FORMAT tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatOrder {
    /// Relative order of appearance in the record's FORMAT column
    #[default]
    Original,
    /// Order of the configured whitelist
    Whitelist,
}

/// Configuration for a normalization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeConfig {
    /// INFO key holding the allele frequency
    pub af_tag: String,
    /// Key written in place of `af_tag` (e.g. `AF`); `None` keeps `af_tag`
    pub af_rename: Option<String>,
    /// FORMAT tags to keep
    pub format_whitelist: Vec<String>,
    pub format_order: FormatOrder,
    /// Sample column that must be present in the header
    pub sample_column: Option<String>,
    /// FILTER values that keep a row
    pub pass_filters: Vec<String>,
    pub info_policy: InfoPolicy,
    /// Treat `ALT == REF` as "no alternate allele"
    pub drop_ref_equal_alt: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            af_tag: DEFAULT_AF_TAG.to_string(),
            af_rename: None,
            format_whitelist: DEFAULT_FORMAT_TAGS.iter().map(|s| s.to_string()).collect(),
            format_order: FormatOrder::Original,
            sample_column: None,
            pass_filters: DEFAULT_PASS_FILTERS.iter().map(|s| s.to_string()).collect(),
            info_policy: InfoPolicy::Lenient,
            drop_ref_equal_alt: true,
        }
    }
}

impl NormalizeConfig {
    pub fn with_af_tag(mut self, tag: impl Into<String>) -> Self {
        self.af_tag = tag.into();
        self
    }

    pub fn with_af_rename(mut self, rename: Option<String>) -> Self {
        self.af_rename = rename;
        self
    }

    pub fn with_format_whitelist<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.format_whitelist = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_format_order(mut self, order: FormatOrder) -> Self {
        self.format_order = order;
        self
    }

    pub fn with_sample_column(mut self, sample: Option<String>) -> Self {
        self.sample_column = sample;
        self
    }

    pub fn with_pass_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pass_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_info_policy(mut self, policy: InfoPolicy) -> Self {
        self.info_policy = policy;
        self
    }

    pub fn with_drop_ref_equal_alt(mut self, drop: bool) -> Self {
        self.drop_ref_equal_alt = drop;
        self
    }

    /// Key written to the reduced INFO column
    pub fn output_af_key(&self) -> &str {
        self.af_rename.as_deref().unwrap_or(&self.af_tag)
    }

    /// Reject configurations that would produce malformed VCF
    pub fn validate(&self) -> Result<()> {
        check_info_key("AF tag", &self.af_tag)?;
        if let Some(rename) = &self.af_rename {
            check_info_key("AF rename", rename)?;
        }

        if self.format_whitelist.is_empty() {
            return Err(NormalizeError::Config("FORMAT whitelist is empty".to_string()));
        }
        for (i, tag) in self.format_whitelist.iter().enumerate() {
            if tag.is_empty() || tag.contains([':', '\t']) {
                return Err(NormalizeError::Config(format!(
                    "invalid FORMAT tag '{}'",
                    tag
                )));
            }
            if self.format_whitelist[..i].contains(tag) {
                return Err(NormalizeError::Config(format!(
                    "FORMAT tag '{}' listed more than once",
                    tag
                )));
            }
        }

        if self.pass_filters.is_empty() {
            return Err(NormalizeError::Config("no passing FILTER values given".to_string()));
        }

        Ok(())
    }
}

fn check_info_key(what: &str, key: &str) -> Result<()> {
    if key.is_empty() || key.contains([';', '=', '\t']) {
        return Err(NormalizeError::Config(format!("invalid {} '{}'", what, key)));
    }
    Ok(())
}
