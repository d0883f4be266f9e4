//! The pipeline stages. Every stage reads its inputs from files, writes one
//! output table and can be run on its own.

use anyhow::Result;
use parameters_toml::Parameters;

pub mod collate_fcs;
pub mod merge_all;
pub mod plate_layout;

/// A unit of the pipeline with serializable inputs and outputs.
pub trait Stage {
    type StageInputs;
    type StageOutputs;

    fn main(&self, args: Self::StageInputs, params: &Parameters) -> Result<Self::StageOutputs>;
}
