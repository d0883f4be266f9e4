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
    bindings_with_variant_name,
    confusable_idents,
    deprecated,
    elided_lifetimes_in_paths,
    irrefutable_let_patterns,
    non_shorthand_field_patterns,
    renamed_and_removed_lints,
    unconditional_recursion,
    unused_comparisons,
    while_true
)]

use anyhow::Result;
use cli::{Platemerge, SubCommand};
use log::info;
use parameters_toml::Parameters;
use pm_lib::stages::collate_fcs::CollateFcs;
use pm_lib::stages::merge_all::MergeAll;
use pm_lib::stages::plate_layout::PlateLayout;
use pm_lib::Stage;

pub mod cli;
pub mod utils;

/// Run the requested subcommand with the parameters named by `--params`.
pub fn execute(args: Platemerge) -> Result<()> {
    let params = Parameters::load(args.params.as_deref())?;
    match args.subcmd {
        SubCommand::Layout(layout) => {
            let outs = PlateLayout.main(layout.into(), &params)?;
            info!(
                "sample sheet with {} wells written to {}",
                outs.rows,
                outs.samplesheet.display()
            );
        }
        SubCommand::Collate(collate) => {
            let outs = CollateFcs.main(collate.into(), &params)?;
            info!(
                "{} events written to {}",
                outs.rows,
                outs.collated.display()
            );
        }
        SubCommand::Merge(merge) => {
            let outs = MergeAll.main(merge.into(), &params)?;
            info!(
                "merged table of {} rows written to {}",
                outs.rows,
                outs.merged.display()
            );
        }
    }
    Ok(())
}
