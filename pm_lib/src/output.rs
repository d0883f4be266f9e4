//! Write result tables in the format named by the output file extension.

use anyhow::{bail, Result};
use log::info;
use pm_types::tabular::{write_table_to_path, Delimiter};
use pm_types::{PlateMergeError, Table};
use std::path::Path;

/// Sheet title used for workbook output.
pub const OUTPUT_SHEET: &str = "Sheet1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Tsv,
    Xlsx,
}

impl OutputFormat {
    /// `.csv` is comma separated, `.tsv` and `.txt` tab separated, `.xlsx`
    /// a workbook. Case is ignored.
    pub fn for_path(path: &Path) -> Result<OutputFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Ok(match extension.as_str() {
            "csv" => OutputFormat::Csv,
            "tsv" | "txt" => OutputFormat::Tsv,
            "xlsx" => OutputFormat::Xlsx,
            _ => bail!(PlateMergeError::UnsupportedOutputFormat { extension }),
        })
    }
}

pub fn write_output(table: &Table, path: &Path) -> Result<()> {
    let format = OutputFormat::for_path(path)?;
    match format {
        OutputFormat::Csv => write_table_to_path(path, table, Delimiter::Comma)?,
        OutputFormat::Tsv => write_table_to_path(path, table, Delimiter::Tab)?,
        OutputFormat::Xlsx => pm_xlsx::write_table(path, table, OUTPUT_SHEET)?,
    }
    info!(
        "wrote {} rows x {} columns to {}",
        table.len(),
        table.width(),
        path.display()
    );
    Ok(())
}
