//! Delimited (CSV/TSV) reading and writing of `Table`s.

use crate::errors::PlateMergeError;
use crate::table::{Table, Value};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Field separator of a delimited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    /// `.csv` is comma separated, everything else is read as tab separated.
    pub fn for_path(path: &Path) -> Delimiter {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Delimiter::Comma,
            _ => Delimiter::Tab,
        }
    }

    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// Read a delimited file with a header row. `required_headers` are checked
/// and a `MissingColumn` error is returned if one is absent. `filetype` is a
/// readable description of the kind of file, used in error messages.
/// Cells are trimmed; empty cells become `Value::Null`, everything else text.
pub fn read_table<T: AsRef<str>>(
    path: &Path,
    delimiter: Delimiter,
    required_headers: impl IntoIterator<Item = T>,
    filetype: &str,
) -> Result<Table> {
    let file = File::open(path).with_context(|| path.display().to_string())?;
    read_table_from(
        BufReader::new(file),
        &path.display().to_string(),
        delimiter,
        required_headers,
        filetype,
    )
}

/// As [`read_table`], from any reader; `origin` names the input in errors.
pub fn read_table_from<R: Read, T: AsRef<str>>(
    rdr: R,
    origin: &str,
    delimiter: Delimiter,
    required_headers: impl IntoIterator<Item = T>,
    filetype: &str,
) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .flexible(true)
        .from_reader(rdr);

    let mut headers = rdr.headers()?.clone();
    headers.trim();
    let headers: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut table = Table::new(headers.iter().cloned());
    for (line, result) in rdr.records().enumerate() {
        let mut record = result.with_context(|| format!("reading {filetype} file '{origin}'"))?;
        record.trim();
        if record.len() > headers.len() {
            bail!(
                "Error in {filetype} file '{origin}'. On line {} there are {} fields but only {} \
                 column headers.",
                line + 2,
                record.len(),
                headers.len()
            );
        }
        if record.iter().all(str::is_empty) {
            continue;
        }
        let mut row: Vec<Value> = record
            .iter()
            .map(|v| {
                if v.is_empty() {
                    Value::Null
                } else {
                    Value::Text(v.to_string())
                }
            })
            .collect();
        row.resize(headers.len(), Value::Null);
        table.push_row(row)?;
    }

    check_headers(origin, required_headers, &headers, filetype)?;
    Ok(table)
}

fn check_headers<T: AsRef<str>>(
    origin: &str,
    required: impl IntoIterator<Item = T>,
    headers: &[String],
    filetype: &str,
) -> Result<()> {
    for r in required {
        if !headers.iter().any(|h| h == r.as_ref()) {
            bail!(PlateMergeError::MissingColumn {
                filetype: filetype.to_string(),
                origin: origin.to_string(),
                column: r.as_ref().to_string(),
            });
        }
    }
    Ok(())
}

/// Write `table` with a header row.
pub fn write_table<W: Write>(w: W, table: &Table, delimiter: Delimiter) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter.byte())
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(w);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.render().into_owned()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_table_to_path(path: &Path, table: &Table, delimiter: Delimiter) -> Result<()> {
    let file = File::create(path).with_context(|| path.display().to_string())?;
    write_table(BufWriter::new(file), table, delimiter)
        .with_context(|| format!("writing {}", path.display()))
}
