//! Decode color-coded plate layout sheets into sample sheet rows.

use crate::legend::{extract_legend, ColorLegend};
use crate::locator::{find_legend_start, find_well_grid_start, SheetAnchor};
use anyhow::{bail, Context, Result};
use log::info;
use parameters_toml::Parameters;
use pm_types::{PlateMergeError, Table, Value, WellId, IDENTITY_COLS};
use pm_xlsx::{cell_ref, Sheet, Workbook};
use std::collections::HashSet;
use string_utils::TextUtils;

/// Walk the `well_rows` x `well_cols` grid to the right of and below
/// `anchor`, returning each well with its sample name in grid order.
///
/// Well ids come from the row label (anchor column) and the column numeral
/// (row above the anchor) of each cell, so relabelled grids decode as
/// labelled.
pub fn decode_plate_grid(
    sheet: &Sheet,
    anchor: SheetAnchor,
    legend: &ColorLegend,
    params: &Parameters,
) -> Result<Vec<(WellId, String)>> {
    let mut seen = HashSet::new();
    let mut wells = Vec::with_capacity(params.well_rows * params.well_cols);
    for r in 0..params.well_rows as u32 {
        let row = anchor.row + r;
        for c in 1..=params.well_cols as u32 {
            let col = anchor.col + c;
            let sample = match sheet.fill(row, col).token(&params.no_fill_token) {
                None => params.removed_sample.clone(),
                Some(color) => match legend.sample(color) {
                    Some(name) => name.to_string(),
                    None => bail!(PlateMergeError::ColorNotInLegend {
                        sheet: sheet.title().to_string(),
                        cell: cell_ref(row, col),
                        color: color.to_string(),
                    }),
                },
            };

            let well = well_label(sheet, row, anchor.col, anchor.row - 1, col)?;
            if !seen.insert(well) {
                bail!(PlateMergeError::DuplicateWell {
                    plate: sheet.title().to_string(),
                    well: well.to_string(),
                });
            }
            wells.push((well, sample));
        }
    }
    Ok(wells)
}

/// Assemble the well id from the row label at (row, label_col) and the
/// column numeral at (numeral_row, col).
fn well_label(sheet: &Sheet, row: u32, label_col: u32, numeral_row: u32, col: u32) -> Result<WellId> {
    let missing = |r: u32, c: u32, found: String| PlateMergeError::WellLabelMissing {
        sheet: sheet.title().to_string(),
        cell: cell_ref(r, c),
        found,
    };
    let letter = sheet.value(row, label_col).to_string();
    let letter = letter.trim();
    if letter.len() != 1 || !letter.chars().all(|ch| ch.is_ascii_alphabetic()) {
        bail!(missing(row, label_col, letter.to_string()));
    }
    let numeral = sheet.value(numeral_row, col).to_string();
    let numeral = numeral.trim();
    if numeral.is_empty() || !numeral.chars().all(|ch| ch.is_ascii_digit()) {
        bail!(missing(numeral_row, col, numeral.to_string()));
    }
    let id = format!("{letter}{numeral}");
    match id.parse::<WellId>() {
        Ok(well) => Ok(well),
        Err(_) => bail!(missing(numeral_row, col, numeral.to_string())),
    }
}

/// Decode one layout sheet: find both anchors, read the legend and walk the
/// grid.
pub fn decode_sheet(sheet: &Sheet, params: &Parameters) -> Result<Vec<(WellId, String)>> {
    let legend_start = find_legend_start(sheet, params)?;
    let grid_start = find_well_grid_start(sheet, params)?;
    let legend = extract_legend(sheet, legend_start, params)?;
    decode_plate_grid(sheet, grid_start, &legend, params)
}

/// Whether `title` names a plate layout sheet.
pub fn is_layout_sheet(title: &str, params: &Parameters) -> bool {
    params
        .layout_sheet_prefixes
        .iter()
        .any(|p| title.starts_with_ignore_case(p))
}

/// Convert every layout sheet of `workbook` into `Plate#`, `Well position`,
/// `Sample name` rows; the plate is the sheet title.
pub fn plate_layout_to_samplesheet(workbook: &Workbook, params: &Parameters) -> Result<Table> {
    let mut table = Table::new(IDENTITY_COLS);
    for sheet in workbook.sheets() {
        if !is_layout_sheet(sheet.title(), params) {
            info!("Skipping sheet {}", sheet.title());
            continue;
        }
        let wells = decode_sheet(sheet, params)
            .with_context(|| format!("decoding plate layout {}", workbook.origin()))?;
        info!("sheet '{}': {} wells", sheet.title(), wells.len());
        for (well, sample) in wells {
            table.push_row(vec![
                Value::from(sheet.title()),
                Value::from(well.to_string()),
                Value::from(sample),
            ])?;
        }
    }
    Ok(table)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pm_types::SAMPLE_COL;
    use pm_xlsx::Fill;
    use pretty_assertions::assert_eq;

    pub(crate) const RED: &str = "FFFF0000";
    pub(crate) const BLUE: &str = "FF0000FF";

    /// A layout sheet in the usual shape: column numerals in row 3, row
    /// labels in column B, legend under a header in B30. Wells of
    /// row A are red, row B blue, the rest unfilled.
    pub(crate) fn layout_sheet(title: &str, params: &Parameters) -> Sheet {
        let mut sheet = Sheet::new(title);
        for c in 1..=params.well_cols as u32 {
            sheet.set_value(3, 2 + c, f64::from(c));
        }
        for r in 0..params.well_rows as u32 {
            let letter = char::from(b'A' + r as u8).to_string();
            sheet.set_value(4 + r, 2, letter);
        }
        for c in 1..=params.well_cols as u32 {
            sheet.set_fill(4, 2 + c, Fill::color(RED));
            sheet.set_fill(5, 2 + c, Fill::color(BLUE));
        }
        sheet
            .set_value(30, 2, "Sort description")
            .set_fill(31, 2, Fill::color(RED))
            .set_value(31, 3, "mouse 1")
            .set_fill(32, 2, Fill::color(BLUE))
            .set_value(32, 3, "mouse 2");
        sheet
    }

    fn small_params() -> Parameters {
        Parameters {
            well_rows: 3,
            well_cols: 4,
            ..Parameters::default()
        }
    }

    #[test]
    fn test_decode_grid_order() {
        let params = small_params();
        let sheet = layout_sheet("LCE1", &params);
        let wells = decode_sheet(&sheet, &params).unwrap();
        let rendered: Vec<(String, &str)> = wells
            .iter()
            .map(|(w, s)| (w.to_string(), s.as_str()))
            .collect();
        assert_eq!(
            rendered[..5].to_vec(),
            vec![
                ("A1".to_string(), "mouse 1"),
                ("A2".to_string(), "mouse 1"),
                ("A3".to_string(), "mouse 1"),
                ("A4".to_string(), "mouse 1"),
                ("B1".to_string(), "mouse 2"),
            ]
        );
        assert_eq!(rendered[11], ("C4".to_string(), "removed"));
        assert_eq!(rendered.len(), 12);
    }

    #[test]
    fn test_full_plate_roundtrips_through_legend() {
        let params = Parameters::default();
        let sheet = layout_sheet("PRM2", &params);
        let anchor = find_well_grid_start(&sheet, &params).unwrap();
        let legend = extract_legend(&sheet, find_legend_start(&sheet, &params).unwrap(), &params)
            .unwrap();
        let wells = decode_plate_grid(&sheet, anchor, &legend, &params).unwrap();
        assert_eq!(wells.len(), 384);
        for (i, (well, sample)) in wells.iter().enumerate() {
            let (row, col) = (anchor.row + i as u32 / 24, anchor.col + 1 + i as u32 % 24);
            let expected = match sheet.fill(row, col).token(&params.no_fill_token) {
                Some(color) => legend.sample(color).unwrap(),
                None => "removed",
            };
            assert_eq!(sample, expected, "well {well}");
        }
    }

    #[test]
    fn test_relabelled_columns() {
        let params = small_params();
        let mut sheet = layout_sheet("LCE1", &params);
        // columns numbered 1, 3, 2, 4
        sheet.set_value(3, 4, 3.0).set_value(3, 5, 2.0);
        let wells = decode_sheet(&sheet, &params).unwrap();
        let ids: Vec<String> = wells.iter().take(4).map(|(w, _)| w.to_string()).collect();
        assert_eq!(ids, ["A1", "A3", "A2", "A4"]);
    }

    #[test]
    fn test_unknown_color() {
        let params = small_params();
        let mut sheet = layout_sheet("LCE1", &params);
        sheet.set_fill(6, 4, Fill::color("FF123456"));
        let err = decode_sheet(&sheet, &params).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PlateMergeError>(),
            Some(&PlateMergeError::ColorNotInLegend {
                sheet: "LCE1".to_string(),
                cell: "D6".to_string(),
                color: "FF123456".to_string(),
            })
        );
    }

    #[test]
    fn test_label_problems() {
        let params = small_params();
        let mut sheet = layout_sheet("LCE1", &params);
        sheet.set_value(5, 2, "");
        let err = decode_sheet(&sheet, &params).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlateMergeError>(),
            Some(PlateMergeError::WellLabelMissing { cell, .. }) if cell == "B5"
        ));

        let mut sheet = layout_sheet("LCE1", &params);
        sheet.set_value(5, 2, "A");
        let err = decode_sheet(&sheet, &params).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PlateMergeError>(),
            Some(&PlateMergeError::DuplicateWell {
                plate: "LCE1".to_string(),
                well: "A1".to_string(),
            })
        );
    }

    #[test]
    fn test_workbook_to_samplesheet() {
        let params = small_params();
        let mut notes = Sheet::new("Notes");
        notes.set_value(1, 1, "not a plate");
        let mut buf = std::io::Cursor::new(Vec::new());
        buf = pm_xlsx::write_workbook(
            buf,
            &[
                notes,
                layout_sheet("LCE1", &params),
                layout_sheet("prm10", &params),
            ],
        )
        .unwrap();
        buf.set_position(0);
        let wb = Workbook::from_reader(buf, "layout.xlsx").unwrap();

        let table = plate_layout_to_samplesheet(&wb, &params).unwrap();
        assert_eq!(table.columns(), IDENTITY_COLS);
        assert_eq!(table.len(), 24);
        assert_eq!(table.rows()[12][0], Value::from("prm10"));
        assert_eq!(table.get(4, SAMPLE_COL), Some(&Value::from("mouse 2")));
    }

    #[test]
    fn test_missing_legend_header() {
        let params = small_params();
        let mut sheet = layout_sheet("LCE1", &params);
        sheet.set_value(30, 2, "legend");
        let err = decode_sheet(&sheet, &params).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlateMergeError>(),
            Some(PlateMergeError::AnchorNotFound { .. })
        ));
    }
}
