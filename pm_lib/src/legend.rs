//! The color legend of a plate layout sheet: a column of filled cells, each
//! with the sample name in the cell to its right.

use crate::locator::SheetAnchor;
use anyhow::{bail, Result};
use log::debug;
use parameters_toml::Parameters;
use pm_types::PlateMergeError;
use pm_xlsx::{cell_ref, Sheet};
use std::collections::BTreeMap;

/// Fill color token -> sample name, unique per sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorLegend {
    entries: BTreeMap<String, String>,
}

impl ColorLegend {
    pub fn sample(&self, color: &str) -> Option<&str> {
        self.entries.get(color).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Add an entry. Listing a color twice is fine as long as the name agrees.
    fn insert(&mut self, sheet: &Sheet, row: u32, col: u32, color: &str, name: String) -> Result<()> {
        if let Some(first) = self.entries.get(color) {
            if *first != name {
                bail!(PlateMergeError::DuplicateLegendColor {
                    sheet: sheet.title().to_string(),
                    cell: cell_ref(row, col),
                    color: color.to_string(),
                    first: first.clone(),
                    second: name,
                });
            }
            return Ok(());
        }
        self.entries.insert(color.to_string(), name);
        Ok(())
    }
}

/// Read the legend that starts one row below `anchor`. Unfilled rows end the
/// legend once more than `params.blank_row_tolerance` of them follow each
/// other.
pub fn extract_legend(sheet: &Sheet, anchor: SheetAnchor, params: &Parameters) -> Result<ColorLegend> {
    let mut legend = ColorLegend::default();
    let mut blank_run = 0;
    let mut row = anchor.row;
    loop {
        row += 1;
        let Some(color) = sheet.fill(row, anchor.col).token(&params.no_fill_token) else {
            if blank_run == params.blank_row_tolerance {
                break;
            }
            blank_run += 1;
            continue;
        };
        blank_run = 0;

        let name = sheet.value(row, anchor.col + 1);
        if name.is_empty() {
            bail!(PlateMergeError::LegendNameMissing {
                sheet: sheet.title().to_string(),
                cell: cell_ref(row, anchor.col + 1),
                color: color.to_string(),
            });
        }
        legend.insert(sheet, row, anchor.col, color, name.to_string().trim().to_string())?;
    }

    if legend.is_empty() {
        bail!(PlateMergeError::LegendEmpty {
            sheet: sheet.title().to_string(),
            cell: anchor.to_string(),
        });
    }
    debug!("sheet '{}': {} legend colors", sheet.title(), legend.len());
    Ok(legend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_xlsx::Fill;
    use pretty_assertions::assert_eq;

    const ANCHOR: SheetAnchor = SheetAnchor { row: 20, col: 2 };

    fn legend_sheet(rows: &[(u32, Option<&str>, &str)]) -> Sheet {
        let mut sheet = Sheet::new("LCE1");
        sheet.set_value(ANCHOR.row, ANCHOR.col, "sort description");
        for &(row, color, name) in rows {
            if let Some(color) = color {
                sheet.set_fill(row, 2, Fill::color(color));
            }
            if !name.is_empty() {
                sheet.set_value(row, 3, name);
            }
        }
        sheet
    }

    #[test]
    fn test_tolerates_blank_rows() {
        let sheet = legend_sheet(&[
            (21, Some("FFFF0000"), "mouse 1"),
            (22, None, ""),
            (23, None, "ignored"),
            (24, Some("theme:5"), "mouse 2"),
            (25, None, ""),
            (26, None, ""),
            (27, None, ""),
            (28, Some("FF00FF00"), "past the end"),
        ]);
        let legend = extract_legend(&sheet, ANCHOR, &Parameters::default()).unwrap();
        assert_eq!(
            legend.iter().collect::<Vec<_>>(),
            vec![("FFFF0000", "mouse 1"), ("theme:5", "mouse 2")]
        );
        assert_eq!(legend.sample("FF00FF00"), None);
    }

    #[test]
    fn test_zero_tolerance() {
        let sheet = legend_sheet(&[(21, Some("FFFF0000"), "a"), (23, Some("FF0000FF"), "b")]);
        let params = Parameters {
            blank_row_tolerance: 0,
            ..Parameters::default()
        };
        let legend = extract_legend(&sheet, ANCHOR, &params).unwrap();
        assert_eq!(legend.len(), 1);
    }

    #[test]
    fn test_explicit_no_fill_color_is_blank() {
        let sheet = legend_sheet(&[(21, Some("00000000"), "x"), (22, Some("FFFF0000"), "a")]);
        let legend = extract_legend(&sheet, ANCHOR, &Parameters::default()).unwrap();
        assert_eq!(legend.iter().collect::<Vec<_>>(), vec![("FFFF0000", "a")]);
    }

    #[test]
    fn test_empty_legend() {
        let sheet = legend_sheet(&[]);
        let err = extract_legend(&sheet, ANCHOR, &Parameters::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PlateMergeError>(),
            Some(&PlateMergeError::LegendEmpty {
                sheet: "LCE1".to_string(),
                cell: "B20".to_string()
            })
        );
    }

    #[test]
    fn test_name_missing() {
        let sheet = legend_sheet(&[(21, Some("FFFF0000"), "")]);
        let err = extract_legend(&sheet, ANCHOR, &Parameters::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlateMergeError>(),
            Some(PlateMergeError::LegendNameMissing { cell, .. }) if cell == "C21"
        ));
    }

    #[test]
    fn test_duplicate_color() {
        let sheet = legend_sheet(&[
            (21, Some("FFFF0000"), "a"),
            (22, Some("FFFF0000"), "a"),
            (23, Some("FFFF0000"), "b"),
        ]);
        let err = extract_legend(&sheet, ANCHOR, &Parameters::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlateMergeError>(),
            Some(PlateMergeError::DuplicateLegendColor { first, second, .. })
                if first == "a" && second == "b"
        ));
    }
}
