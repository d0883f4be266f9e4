//! platemerge
#![deny(missing_docs)]

use clap::Parser;
use pm_wrap::cli::Platemerge;
use pm_wrap::utils::{init_logging, print_error_chain};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Platemerge::parse();
    init_logging();
    match pm_wrap::execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error_chain(&err);
            ExitCode::FAILURE
        }
    }
}
