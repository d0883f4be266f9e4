//! Bounded scans of a sheet for anchor cells.

use anyhow::Result;
use parameters_toml::Parameters;
use pm_types::{AnchorKind, PlateMergeError};
use pm_xlsx::{cell_ref, CellValue, Sheet};
use std::fmt;

/// A located cell, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetAnchor {
    pub row: u32,
    pub col: u32,
}

impl fmt::Display for SheetAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cell_ref(self.row, self.col))
    }
}

/// The region visited by a scan: rows `1..max_row`, columns `1..max_col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    pub max_row: u32,
    pub max_col: u32,
}

impl SearchBounds {
    pub fn from_params(params: &Parameters) -> SearchBounds {
        SearchBounds {
            max_row: params.search_max_rows,
            max_col: params.search_max_cols,
        }
    }

    fn not_found(self, sheet: &Sheet, anchor: AnchorKind) -> PlateMergeError {
        PlateMergeError::AnchorNotFound {
            sheet: sheet.title().to_string(),
            anchor,
            max_row: self.max_row.saturating_sub(1),
            max_col: self.max_col.saturating_sub(1),
        }
    }
}

/// First cell, scanning column by column and top to bottom within a
/// column, for which `pred(sheet, row, col)` holds.
pub fn scan_column_major<F>(sheet: &Sheet, bounds: SearchBounds, pred: F) -> Option<SheetAnchor>
where
    F: Fn(&Sheet, u32, u32) -> bool,
{
    (1..bounds.max_col)
        .flat_map(|col| (1..bounds.max_row).map(move |row| (row, col)))
        .find(|&(row, col)| pred(sheet, row, col))
        .map(|(row, col)| SheetAnchor { row, col })
}

/// The legend header cell: text matching one of `params.legend_headers`,
/// ignoring case.
pub fn find_legend_start(sheet: &Sheet, params: &Parameters) -> Result<SheetAnchor> {
    let bounds = SearchBounds::from_params(params);
    let is_header = |sheet: &Sheet, row: u32, col: u32| {
        sheet.value(row, col).as_text().map_or(false, |text| {
            let text = text.trim();
            params
                .legend_headers
                .iter()
                .any(|h| text.eq_ignore_ascii_case(h))
        })
    };
    match scan_column_major(sheet, bounds, is_header) {
        Some(anchor) => Ok(anchor),
        None => Err(bounds.not_found(sheet, AnchorKind::LegendStart).into()),
    }
}

fn is_numeral_one(value: &CellValue) -> bool {
    match value {
        CellValue::Number(n) => *n == 1.0,
        CellValue::Text(s) => s.trim() == "1",
        _ => false,
    }
}

/// The `A` row label of the well grid: a cell holding exactly `A` whose
/// upper-right neighbour is the column numeral 1.
pub fn find_well_grid_start(sheet: &Sheet, params: &Parameters) -> Result<SheetAnchor> {
    let bounds = SearchBounds::from_params(params);
    let is_grid_start = |sheet: &Sheet, row: u32, col: u32| {
        sheet.value(row, col).as_text() == Some("A")
            && is_numeral_one(sheet.value(row - 1, col + 1))
    };
    match scan_column_major(sheet, bounds, is_grid_start) {
        Some(anchor) => Ok(anchor),
        None => Err(bounds.not_found(sheet, AnchorKind::WellGridStart).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_major_order() {
        let mut sheet = Sheet::new("LCE1");
        sheet.set_value(2, 5, "x").set_value(9, 3, "x").set_value(30, 3, "x");
        let found = scan_column_major(
            &sheet,
            SearchBounds { max_row: 100, max_col: 25 },
            |s, r, c| s.value(r, c).as_text() == Some("x"),
        );
        assert_eq!(found, Some(SheetAnchor { row: 9, col: 3 }));
        assert_eq!(found.unwrap().to_string(), "C9");
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let mut sheet = Sheet::new("LCE1");
        sheet.set_value(100, 1, "x").set_value(1, 25, "x");
        let found = scan_column_major(
            &sheet,
            SearchBounds { max_row: 100, max_col: 25 },
            |s, r, c| !s.value(r, c).is_empty(),
        );
        assert_eq!(found, None);
    }

    #[test]
    fn test_legend_header_spellings() {
        let params = Parameters::default();
        let mut sheet = Sheet::new("PRM3");
        sheet.set_value(40, 2, " Sort Discription ");
        assert_eq!(
            find_legend_start(&sheet, &params).unwrap(),
            SheetAnchor { row: 40, col: 2 }
        );
    }

    #[test]
    fn test_well_grid_needs_numeral_above_right() {
        let params = Parameters::default();
        let mut sheet = Sheet::new("LCE1");
        // a stray 'A' without a column header is passed over
        sheet.set_value(3, 1, "A");
        sheet.set_value(5, 2, "A").set_value(4, 3, 1.0);
        assert_eq!(
            find_well_grid_start(&sheet, &params).unwrap(),
            SheetAnchor { row: 5, col: 2 }
        );
    }

    #[test]
    fn test_missing_anchor() {
        let params = Parameters::default();
        let sheet = Sheet::new("LCE7");
        let err = find_legend_start(&sheet, &params).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PlateMergeError>(),
            Some(&PlateMergeError::AnchorNotFound {
                sheet: "LCE7".to_string(),
                anchor: AnchorKind::LegendStart,
                max_row: 99,
                max_col: 24,
            })
        );
        assert!(find_well_grid_start(&sheet, &params).is_err());
    }
}
