//! Stage MERGE_ALL
//!
//! Builds one table from whichever inputs were supplied. The sample sheet
//! (given directly, or decoded from a plate layout) is the base; a template
//! is broadcast over its plates, then FCS events and primer/index rows are
//! joined on. Without a sample sheet the collated FCS events are the result.

use crate::collate::{collate_fcs_files, drop_duplicate_wells};
use crate::merge::{broadcast_template, join_fcs, join_primer_index, strip_artifact_columns};
use crate::output::{write_output, OutputFormat};
use crate::plate_grid::plate_layout_to_samplesheet;
use crate::sheets::{load_primer_index, load_samplesheet, load_template, SampleSheet};
use crate::stages::Stage;
use anyhow::{bail, Result};
use log::{info, warn};
use parameters_toml::Parameters;
use pm_types::{PlateMergeError, Table};
use pm_xlsx::Workbook;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub struct MergeAll;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageInputs {
    pub plate_layout: Option<PathBuf>,
    pub samplesheet: Option<PathBuf>,
    #[serde(default)]
    pub fcs_files: Vec<PathBuf>,
    pub template: Option<PathBuf>,
    pub primer_index: Option<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutputs {
    pub merged: PathBuf,
    pub rows: usize,
}

impl StageInputs {
    fn is_empty(&self) -> bool {
        self.plate_layout.is_none()
            && self.samplesheet.is_none()
            && self.fcs_files.is_empty()
            && self.template.is_none()
            && self.primer_index.is_none()
    }
}

fn conflict(msg: &str) -> PlateMergeError {
    PlateMergeError::FormatConflict(msg.to_string())
}

fn prerequisite(msg: &str) -> PlateMergeError {
    PlateMergeError::MissingPrerequisite(msg.to_string())
}

/// The sample sheet table: decoded from the plate layout or loaded as given.
fn resolve_samplesheet(args: &StageInputs, params: &Parameters) -> Result<Option<SampleSheet>> {
    Ok(match (&args.plate_layout, &args.samplesheet) {
        (Some(_), Some(_)) => bail!(conflict(
            "Please provide either a plate layout or a sample sheet, not both."
        )),
        (Some(layout), None) => {
            let workbook = Workbook::open(layout)?;
            Some(SampleSheet::Normalized(plate_layout_to_samplesheet(
                &workbook, params,
            )?))
        }
        (None, Some(path)) => Some(load_samplesheet(path, params)?),
        (None, None) => None,
    })
}

/// Run the merge and return the table without writing it.
pub fn merge_inputs(args: &StageInputs, params: &Parameters) -> Result<Table> {
    if args.is_empty() {
        bail!(prerequisite("No input files were provided."));
    }

    let mut table = match resolve_samplesheet(args, params)? {
        Some(samplesheet) => {
            let mut base = match (&args.template, samplesheet) {
                (Some(_), SampleSheet::Workbook(_)) => bail!(conflict(
                    "A template can only be combined with a tab or comma separated sample \
                     sheet, not a sample sheet workbook."
                )),
                (Some(template), SampleSheet::Normalized(samplesheet)) => {
                    broadcast_template(&load_template(template)?, &samplesheet)?
                }
                (None, samplesheet) => samplesheet.into_table(),
            };
            if !args.fcs_files.is_empty() {
                let fcs = collate_fcs_files(&args.fcs_files, params)?;
                base = join_fcs(&base, &fcs)?;
            }
            if let Some(primer_index) = &args.primer_index {
                base = join_primer_index(&base, &load_primer_index(primer_index, params)?)?;
            }
            base
        }
        None => {
            if args.template.is_some() {
                bail!(prerequisite("A template requires a sample sheet or plate layout."));
            }
            if args.primer_index.is_some() {
                bail!(prerequisite(
                    "A primer/index sheet requires a sample sheet or plate layout."
                ));
            }
            let mut fcs = collate_fcs_files(&args.fcs_files, params)?;
            let dropped = drop_duplicate_wells(&mut fcs)?;
            if dropped > 0 {
                warn!("dropped {dropped} events sharing a plate and well with an earlier event");
            }
            fcs
        }
    };

    strip_artifact_columns(&mut table, &params.artifact_column_prefixes);
    Ok(table)
}

impl Stage for MergeAll {
    type StageInputs = StageInputs;
    type StageOutputs = StageOutputs;

    fn main(&self, args: Self::StageInputs, params: &Parameters) -> Result<Self::StageOutputs> {
        OutputFormat::for_path(&args.output)?;
        let table = merge_inputs(&args, params)?;
        write_output(&table, &args.output)?;
        info!("merge finished: {} rows", table.len());
        Ok(StageOutputs {
            merged: args.output,
            rows: table.len(),
        })
    }
}
