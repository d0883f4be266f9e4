//! Command line arguments of `platemerge`.

use clap::{Args, Parser, Subcommand};
use pm_lib::stages::{collate_fcs, merge_all, plate_layout};
use std::path::PathBuf;

/// Decode plate layouts and index-sorted FCS files and merge them with
/// sample sheets, templates and primer/index sheets.
#[derive(Parser, Debug)]
#[clap(name = "platemerge", version)]
pub struct Platemerge {
    #[clap(subcommand)]
    pub subcmd: SubCommand,

    /// TOML file overriding the default parameters.
    #[clap(long, global = true, value_name = "TOML")]
    pub params: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Convert a color-coded plate layout workbook into a sample sheet.
    Layout(LayoutArgs),

    /// Collate index-sorted FCS files into one table of events.
    Collate(CollateArgs),

    /// Merge all supplied inputs into one table.
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Plate layout workbook (.xlsx).
    #[clap(long, value_name = "XLSX")]
    pub plate_layout: PathBuf,

    /// Output file; .csv, .tsv, .txt or .xlsx.
    #[clap(long, short)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct CollateArgs {
    /// Index-sorted FCS files.
    #[clap(long = "fcs", value_name = "FCS", num_args = 1.., required = true)]
    pub fcs_files: Vec<PathBuf>,

    /// Output file; .csv, .tsv, .txt or .xlsx.
    #[clap(long, short)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Plate layout workbook; cannot be combined with --samplesheet.
    #[clap(long, value_name = "XLSX")]
    pub plate_layout: Option<PathBuf>,

    /// Sample sheet: tab or comma separated text, or a workbook.
    #[clap(long)]
    pub samplesheet: Option<PathBuf>,

    /// Index-sorted FCS files.
    #[clap(long = "fcs", value_name = "FCS", num_args = 1..)]
    pub fcs_files: Vec<PathBuf>,

    /// Template workbook broadcast over every plate of the sample sheet.
    #[clap(long, value_name = "XLSX")]
    pub template: Option<PathBuf>,

    /// Primer/index workbook.
    #[clap(long, value_name = "XLSX")]
    pub primer_index: Option<PathBuf>,

    /// Output file; .csv, .tsv, .txt or .xlsx.
    #[clap(long, short)]
    pub output: PathBuf,
}

impl From<LayoutArgs> for plate_layout::StageInputs {
    fn from(args: LayoutArgs) -> Self {
        plate_layout::StageInputs {
            plate_layout: args.plate_layout,
            output: args.output,
        }
    }
}

impl From<CollateArgs> for collate_fcs::StageInputs {
    fn from(args: CollateArgs) -> Self {
        collate_fcs::StageInputs {
            fcs_files: args.fcs_files,
            output: args.output,
        }
    }
}

impl From<MergeArgs> for merge_all::StageInputs {
    fn from(args: MergeArgs) -> Self {
        merge_all::StageInputs {
            plate_layout: args.plate_layout,
            samplesheet: args.samplesheet,
            fcs_files: args.fcs_files,
            template: args.template,
            primer_index: args.primer_index,
            output: args.output,
        }
    }
}
