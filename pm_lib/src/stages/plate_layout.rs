//! Stage PLATE_LAYOUT

use crate::output::{write_output, OutputFormat};
use crate::plate_grid::plate_layout_to_samplesheet;
use crate::stages::Stage;
use anyhow::Result;
use parameters_toml::Parameters;
use pm_xlsx::Workbook;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub struct PlateLayout;

#[derive(Debug, Clone, Deserialize)]
pub struct StageInputs {
    pub plate_layout: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutputs {
    pub samplesheet: PathBuf,
    pub rows: usize,
}

impl Stage for PlateLayout {
    type StageInputs = StageInputs;
    type StageOutputs = StageOutputs;

    fn main(&self, args: Self::StageInputs, params: &Parameters) -> Result<Self::StageOutputs> {
        OutputFormat::for_path(&args.output)?;
        let workbook = Workbook::open(&args.plate_layout)?;
        let table = plate_layout_to_samplesheet(&workbook, params)?;
        write_output(&table, &args.output)?;
        Ok(StageOutputs {
            samplesheet: args.output,
            rows: table.len(),
        })
    }
}
