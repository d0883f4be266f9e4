//! Loaders for the auxiliary inputs: template, primer/index sheet and the
//! two sample sheet formats.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use parameters_toml::Parameters;
use pm_types::tabular::{read_table, Delimiter};
use pm_types::{PlateMergeError, Table, Value, IDENTITY_COLS, PLATE_COL, SAMPLE_COL, WELL_COL};
use pm_xlsx::{CellValue, Sheet, Workbook};
use std::path::Path;
use string_utils::TextUtils;

/// A sample sheet as supplied by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleSheet {
    /// Delimited text with `Plate#`, `Well position` and `Sample name`.
    Normalized(Table),
    /// A workbook sheet in the lab's own layout; not usable with a template.
    Workbook(Table),
}

impl SampleSheet {
    pub fn table(&self) -> &Table {
        match self {
            SampleSheet::Normalized(t) | SampleSheet::Workbook(t) => t,
        }
    }

    pub fn into_table(self) -> Table {
        match self {
            SampleSheet::Normalized(t) | SampleSheet::Workbook(t) => t,
        }
    }
}

pub fn is_xlsx(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("xlsx"))
}

fn header_name(value: &CellValue, index: usize) -> String {
    let name = value.to_string();
    let name = name.trim();
    if name.is_empty() {
        format!("Unnamed: {index}")
    } else {
        name.to_string()
    }
}

/// Rows `first..=sheet.max_row()` as table rows over `width` columns,
/// skipping rows without any value.
fn data_rows(sheet: &Sheet, first: u32, width: usize) -> Vec<Vec<Value>> {
    (first..=sheet.max_row())
        .map(|row| {
            (1..=width as u32)
                .map(|col| sheet.value(row, col).to_value())
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.iter().all(Value::is_empty))
        .collect()
}

/// Load a template workbook. Row 1 is skipped; rows 2 and 3 together name
/// the columns (`<row2>_<row3>`, or whichever of the two is present); data
/// starts on row 4.
pub fn load_template(path: &Path) -> Result<Table> {
    let workbook = Workbook::open(path)?;
    let origin = path.display().to_string();
    let Some(sheet) = workbook.first_sheet() else {
        bail!("template {origin} has no sheets");
    };

    let width = sheet.max_col() as usize;
    let columns: Vec<String> = (1..=width as u32)
        .map(|col| {
            let upper = sheet.value(2, col);
            let lower = sheet.value(3, col);
            match (upper.is_empty(), lower.is_empty()) {
                (false, false) => format!("{upper}_{lower}"),
                (false, true) => upper.to_string(),
                (true, false) => lower.to_string(),
                (true, true) => format!("Unnamed: {}", col - 1),
            }
        })
        .collect();

    let table = Table::from_rows(columns, data_rows(sheet, 4, width))?;
    for required in [SAMPLE_COL, WELL_COL] {
        table.require_column(required, "template sheet", &origin)?;
    }
    info!("template {origin}: {} rows, {} columns", table.len(), table.width());
    Ok(table)
}

/// Where a workbook table lives and what its sample column may be called.
struct SheetLayout<'a> {
    filetype: &'a str,
    sheet_prefix: &'a str,
    header_prefix: &'a str,
    sample_columns: &'a [String],
}

/// Load the table of the first sheet named `layout.sheet_prefix...`, whose
/// header is the first row starting with `layout.header_prefix`. The sample
/// column is renamed `Sample name` and held as text.
fn load_workbook_table(path: &Path, layout: &SheetLayout<'_>) -> Result<Table> {
    let workbook = Workbook::open(path)?;
    let origin = path.display().to_string();
    let Some(sheet) = workbook.sheet_with_prefix(layout.sheet_prefix) else {
        bail!(PlateMergeError::SheetNotFound {
            path: origin,
            prefix: layout.sheet_prefix.to_string(),
        });
    };

    let Some(header_row) = (1..=sheet.max_row()).find(|&row| {
        sheet
            .value(row, 1)
            .to_string()
            .trim()
            .starts_with_ignore_case(layout.header_prefix)
    }) else {
        bail!(PlateMergeError::HeaderRowNotFound {
            path: origin,
            sheet: sheet.title().to_string(),
            prefix: layout.header_prefix.to_string(),
        });
    };
    debug!("{origin}: header of sheet '{}' on row {header_row}", sheet.title());

    let width = sheet.max_col() as usize;
    let columns: Vec<String> = (1..=width as u32)
        .map(|col| header_name(sheet.value(header_row, col), col as usize - 1))
        .collect();
    let mut table = Table::from_rows(columns, data_rows(sheet, header_row + 1, width))?;

    let Some(sample_col) = table
        .columns()
        .iter()
        .find(|c| {
            layout
                .sample_columns
                .iter()
                .any(|s| c.eq_ignore_ascii_case(s))
        })
        .cloned()
    else {
        bail!(PlateMergeError::MissingColumn {
            filetype: layout.filetype.to_string(),
            origin,
            column: SAMPLE_COL.to_string(),
        });
    };
    table
        .rename_column(&sample_col, SAMPLE_COL)
        .with_context(|| format!("{} {origin}", layout.filetype))?;
    coerce_to_text(&mut table, SAMPLE_COL);

    for required in [PLATE_COL, WELL_COL] {
        canonicalize_column(&mut table, required)?;
        table.require_column(required, layout.filetype, &origin)?;
    }
    Ok(table)
}

/// Rename the first column matching `name` ignoring ASCII case to `name`.
fn canonicalize_column(table: &mut Table, name: &str) -> Result<()> {
    if table.has_column(name) {
        return Ok(());
    }
    let found = table
        .columns()
        .iter()
        .find(|c| c.eq_ignore_ascii_case(name))
        .cloned();
    match found {
        Some(found) => table.rename_column(&found, name),
        None => Ok(()),
    }
}

/// Replace every value of `column` by its text rendering; nulls become "".
fn coerce_to_text(table: &mut Table, column: &str) {
    let Some((at, values)) = table.remove_column(column) else {
        return;
    };
    let values = values
        .into_iter()
        .map(|v| Value::Text(v.render().into_owned()))
        .collect();
    // re-inserting the column just removed at its old position cannot fail
    let _ = table.insert_column(at, column, values);
}

/// Load a primer/index workbook.
pub fn load_primer_index(path: &Path, params: &Parameters) -> Result<Table> {
    let table = load_workbook_table(
        path,
        &SheetLayout {
            filetype: "primer/index sheet",
            sheet_prefix: &params.primer_sheet_prefix,
            header_prefix: &params.header_row_prefix,
            sample_columns: &params.primer_sample_columns,
        },
    )?;
    info!("primer/index sheet {}: {} rows", path.display(), table.len());
    Ok(table)
}

/// Load a sample sheet: a workbook when the extension is `.xlsx`, otherwise
/// delimited text (comma for `.csv`, tab for anything else).
pub fn load_samplesheet(path: &Path, params: &Parameters) -> Result<SampleSheet> {
    let sheet = if is_xlsx(path) {
        SampleSheet::Workbook(load_workbook_table(
            path,
            &SheetLayout {
                filetype: "sample sheet",
                sheet_prefix: &params.sample_sheet_prefix,
                header_prefix: &params.sample_sheet_header_prefix,
                sample_columns: &params.primer_sample_columns,
            },
        )?)
    } else {
        SampleSheet::Normalized(read_table(
            path,
            Delimiter::for_path(path),
            IDENTITY_COLS,
            "sample sheet",
        )?)
    };
    info!("sample sheet {}: {} rows", path.display(), sheet.table().len());
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn save(dir: &Path, name: &str, sheets: &[Sheet]) -> std::path::PathBuf {
        let path = dir.join(name);
        pm_xlsx::write_sheets_to_path(&path, sheets).unwrap();
        path
    }

    fn template_sheet() -> Sheet {
        let mut sheet = Sheet::new("Template");
        sheet
            .set_value(1, 1, "Experiment template v2")
            .set_value(2, 1, "Well position")
            .set_value(2, 2, "Sample name")
            .set_value(2, 3, "Treatment")
            .set_value(3, 3, "dose")
            .set_value(3, 4, "Notes")
            .set_value(4, 1, "A1")
            .set_value(4, 2, "template sample")
            .set_value(4, 3, 0.5)
            .set_value(5, 1, "A2")
            .set_value(5, 3, 1.0);
        sheet
    }

    #[test]
    fn test_template_headers() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = template_sheet();
        sheet.set_value(2, 6, "");
        sheet.set_value(8, 6, "trailing");
        let path = save(dir.path(), "template.xlsx", &[sheet]);
        let table = load_template(&path).unwrap();
        assert_eq!(
            table.columns(),
            [
                "Well position",
                "Sample name",
                "Treatment_dose",
                "Notes",
                "Unnamed: 4",
                "Unnamed: 5"
            ]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1, "Treatment_dose"), Some(&Value::Number(1.0)));
        assert_eq!(table.get(1, "Sample name"), Some(&Value::Null));
    }

    #[test]
    fn test_template_requires_sample_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = template_sheet();
        sheet.set_value(2, 2, "Sample");
        let path = save(dir.path(), "template.xlsx", &[sheet]);
        let err = load_template(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlateMergeError>(),
            Some(PlateMergeError::MissingColumn { column, .. }) if column == "Sample name"
        ));
    }

    fn primer_sheet(title: &str, header: &str, sample_header: &str) -> Sheet {
        let mut sheet = Sheet::new(title);
        sheet
            .set_value(1, 1, "Primer plate for run 7")
            .set_value(3, 1, header)
            .set_value(3, 2, "Well position")
            .set_value(3, 3, sample_header)
            .set_value(3, 4, "i7 index")
            .set_value(4, 1, "LCE1")
            .set_value(4, 2, "A1")
            .set_value(4, 3, 42.0)
            .set_value(4, 4, "ATTACTCG")
            .set_value(5, 1, "LCE1")
            .set_value(5, 2, "A2")
            .set_value(5, 4, "TCCGGAGA");
        sheet
    }

    #[test]
    fn test_primer_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(
            dir.path(),
            "primers.xlsx",
            &[
                primer_sheet("Summary", "Plate#", "Sample"),
                primer_sheet("Sample primer & index", "PLATE# ", "sample TYPE"),
            ],
        );
        let table = load_primer_index(&path, &Parameters::default()).unwrap();
        assert_eq!(
            table.columns(),
            ["Plate#", "Well position", "Sample name", "i7 index"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, SAMPLE_COL), Some(&Value::from("42")));
        assert_eq!(table.get(1, SAMPLE_COL), Some(&Value::from("")));
    }

    #[test]
    fn test_primer_sheet_problems() {
        let dir = tempfile::tempdir().unwrap();
        let params = Parameters::default();

        let path = save(dir.path(), "a.xlsx", &[primer_sheet("Summary", "Plate#", "Sample")]);
        let err = load_primer_index(&path, &params).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlateMergeError>(),
            Some(PlateMergeError::SheetNotFound { prefix, .. }) if prefix == "sample primer"
        ));

        let path = save(dir.path(), "b.xlsx", &[primer_sheet("sample primers", "Plate", "Sample")]);
        let err = load_primer_index(&path, &params).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlateMergeError>(),
            Some(PlateMergeError::HeaderRowNotFound { sheet, .. }) if sheet == "sample primers"
        ));

        let path = save(dir.path(), "c.xlsx", &[primer_sheet("sample primers", "Plate#", "Donor")]);
        let err = load_primer_index(&path, &params).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlateMergeError>(),
            Some(PlateMergeError::MissingColumn { filetype, .. }) if filetype == "primer/index sheet"
        ));
    }

    #[test]
    fn test_workbook_samplesheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(
            dir.path(),
            "samples.xlsx",
            &[primer_sheet("Samples", "plate#", "Sample name")],
        );
        let sheet = load_samplesheet(&path, &Parameters::default()).unwrap();
        assert!(matches!(sheet, SampleSheet::Workbook(_)));
        assert_eq!(sheet.table().get(0, PLATE_COL), Some(&Value::from("LCE1")));
    }

    #[test]
    fn test_delimited_samplesheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.tsv");
        std::fs::write(
            &path,
            "Plate#\tWell position\tSample name\nLCE1\tA1\tm1\nLCE1\tA2\t\n",
        )
        .unwrap();
        let sheet = load_samplesheet(&path, &Parameters::default()).unwrap();
        let SampleSheet::Normalized(table) = sheet else {
            panic!("expected a delimited sample sheet");
        };
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, SAMPLE_COL), Some(&Value::Null));

        std::fs::write(&path, "Plate#\tWell\nLCE1\tA1\n").unwrap();
        assert!(load_samplesheet(&path, &Parameters::default()).is_err());
    }
}
