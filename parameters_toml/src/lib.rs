// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]
// Other warnings (as of rust 1.55)
#![deny(
    confusable_idents,
    const_item_mutation,
    deprecated,
    drop_bounds,
    elided_lifetimes_in_paths,
    irrefutable_let_patterns,
    non_shorthand_field_patterns,
    overlapping_range_endpoints,
    renamed_and_removed_lints,
    trivial_bounds,
    type_alias_bounds,
    unconditional_recursion,
    unknown_lints,
    unused_comparisons,
    while_true
)]

//! Run parameters for platemerge.
//!
//! Every stage receives a `&Parameters`; nothing is read from ambient state.
//! Defaults reproduce the standard 384-well layout conventions and can be
//! overridden by a TOML file.

use anyhow::{ensure, Context, Result};
use log::warn;
use serde::Deserialize;
use std::path::Path;

/// How the sample name is cut out of an FCS filename once the plate token
/// has been located.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SampleNameRule {
    /// `..._<plate>_<sample>`: the sample is the `_`-delimited token right
    /// after the plate token, and the plate label ends at the first `_`.
    AfterPlate,
    /// `..._<delimiter><sample>_<plate>`: the sample sits between the
    /// delimiter and the plate token.
    BetweenDelimiter {
        /// Literal marker that precedes the sample name.
        delimiter: String,
    },
}

/// One entry of the ordered plate-prefix table.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PlatePrefix {
    /// Token that starts a plate label, e.g. `LCE`.
    pub prefix: String,
    /// Sample-name extraction used when this prefix matches.
    #[serde(flatten)]
    pub sample_rule: SampleNameRule,
}

impl PlatePrefix {
    fn between(prefix: &str, delimiter: &str) -> Self {
        PlatePrefix {
            prefix: prefix.to_string(),
            sample_rule: SampleNameRule::BetweenDelimiter {
                delimiter: delimiter.to_string(),
            },
        }
    }

    fn after(prefix: &str) -> Self {
        PlatePrefix {
            prefix: prefix.to_string(),
            sample_rule: SampleNameRule::AfterPlate,
        }
    }
}

/// Which TEXT keyword names an FCS channel.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ChannelNaming {
    /// Short name `$PnS`, falling back to `$PnN` when absent or not unique.
    #[serde(rename = "$PnS")]
    PnS,
    /// Always the parameter name `$PnN`.
    #[serde(rename = "$PnN")]
    PnN,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Number of well rows in a plate layout (A..P).
    pub well_rows: usize,
    /// Number of well columns in a plate layout.
    pub well_cols: usize,
    /// Anchor scans visit rows `1..search_max_rows`.
    pub search_max_rows: u32,
    /// Anchor scans visit columns `1..search_max_cols`.
    pub search_max_cols: u32,
    /// Header labels that mark the start of the color legend, compared
    /// case-insensitively.
    pub legend_headers: Vec<String>,
    /// Fill token of a cell without a fill.
    pub no_fill_token: String,
    /// Sample name given to wells without a fill.
    pub removed_sample: String,
    /// Consecutive unfilled legend rows tolerated before the legend ends.
    pub blank_row_tolerance: usize,
    /// Ordered plate-prefix table, first match wins.
    pub plate_prefixes: Vec<PlatePrefix>,
    /// Plate layout sheets are those whose title starts with one of these.
    pub layout_sheet_prefixes: Vec<String>,
    /// FCS channel holding the acquisition time.
    pub time_channel: String,
    pub channel_naming: ChannelNaming,
    /// Primer/index workbooks: sheet name prefix.
    pub primer_sheet_prefix: String,
    /// Workbook sample sheets: sheet name prefix.
    pub sample_sheet_prefix: String,
    /// Header row of primer/index sheets starts with this text.
    pub header_row_prefix: String,
    /// Header row of workbook sample sheets starts with this text.
    pub sample_sheet_header_prefix: String,
    /// Accepted spellings of the sample column in auxiliary sheets.
    pub primer_sample_columns: Vec<String>,
    /// Empty columns whose name starts with one of these are dropped.
    pub artifact_column_prefixes: Vec<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            well_rows: 16,
            well_cols: 24,
            search_max_rows: 100,
            search_max_cols: 25,
            legend_headers: vec!["sort description".into(), "sort discription".into()],
            no_fill_token: "00000000".into(),
            removed_sample: "removed".into(),
            blank_row_tolerance: 2,
            plate_prefixes: vec![
                PlatePrefix::between("LCE", "INX_"),
                PlatePrefix::after("PRM"),
            ],
            layout_sheet_prefixes: vec!["lce".into(), "prm".into()],
            time_channel: "Time".into(),
            channel_naming: ChannelNaming::PnS,
            primer_sheet_prefix: "sample primer".into(),
            sample_sheet_prefix: "sample".into(),
            header_row_prefix: "plate#".into(),
            sample_sheet_header_prefix: "plate".into(),
            primer_sample_columns: vec![
                "sample".into(),
                "sample name".into(),
                "sample type".into(),
            ],
            artifact_column_prefixes: vec!["X.".into(), "Y.".into(), "unnamed".into()],
        }
    }
}

macro_rules! warn_non_default {
    ($params:expr, $defaults:expr, $($a:ident),+ $(,)?) => {
        $(
            if $defaults.$a != $params.$a {
                warn!("using non-default {} = {:?}", stringify!($a), $params.$a);
            }
        )+
    };
}

impl Parameters {
    /// Load parameters from `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Parameters> {
        let Some(path) = path else {
            return Ok(Parameters::default());
        };
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        let params = Parameters::from_toml_str(&s).with_context(|| path.display().to_string())?;
        params.report_non_defaults();
        Ok(params)
    }

    /// Parse and validate parameters from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Parameters> {
        let params: Parameters = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (1..=26).contains(&self.well_rows),
            "well_rows must be between 1 and 26, got {}",
            self.well_rows
        );
        ensure!(self.well_cols > 0, "well_cols must be positive");
        ensure!(
            self.search_max_rows > 1 && self.search_max_cols > 1,
            "search bounds must exceed 1, got rows={} cols={}",
            self.search_max_rows,
            self.search_max_cols
        );
        ensure!(
            !self.legend_headers.is_empty(),
            "at least one legend header label is required"
        );
        ensure!(
            !self.plate_prefixes.is_empty(),
            "at least one plate prefix is required"
        );
        for p in &self.plate_prefixes {
            ensure!(!p.prefix.is_empty(), "plate prefixes must not be empty");
        }
        Ok(())
    }

    fn report_non_defaults(&self) {
        let defaults = Parameters::default();
        warn_non_default!(
            self,
            defaults,
            well_rows,
            well_cols,
            search_max_rows,
            search_max_cols,
            legend_headers,
            no_fill_token,
            removed_sample,
            blank_row_tolerance,
            plate_prefixes,
            layout_sheet_prefixes,
            time_channel,
            channel_naming,
            primer_sheet_prefix,
            sample_sheet_prefix,
            header_row_prefix,
            sample_sheet_header_prefix,
            primer_sample_columns,
            artifact_column_prefixes,
        );
    }
}
