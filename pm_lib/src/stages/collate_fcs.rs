//! Stage COLLATE_FCS

use crate::collate::collate_fcs_files;
use crate::output::{write_output, OutputFormat};
use crate::stages::Stage;
use anyhow::{bail, Result};
use parameters_toml::Parameters;
use pm_types::PlateMergeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub struct CollateFcs;

#[derive(Debug, Clone, Deserialize)]
pub struct StageInputs {
    pub fcs_files: Vec<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutputs {
    pub collated: PathBuf,
    pub rows: usize,
}

impl Stage for CollateFcs {
    type StageInputs = StageInputs;
    type StageOutputs = StageOutputs;

    fn main(&self, args: Self::StageInputs, params: &Parameters) -> Result<Self::StageOutputs> {
        OutputFormat::for_path(&args.output)?;
        if args.fcs_files.is_empty() {
            bail!(PlateMergeError::MissingPrerequisite(
                "No FCS files were provided.".to_string()
            ));
        }
        let table = collate_fcs_files(&args.fcs_files, params)?;
        write_output(&table, &args.output)?;
        Ok(StageOutputs {
            collated: args.output,
            rows: table.len(),
        })
    }
}
