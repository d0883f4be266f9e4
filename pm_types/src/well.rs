//! Well and plate identifiers.

use anyhow::{bail, ensure, Context, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use string_utils::natural_cmp;

/// Number of row letters available to a well id.
pub const MAX_WELL_ROWS: u8 = 26;

/// A well in a microplate: row letter plus 1-based column number.
/// Ordering is row-major (A1..A24, B1..B24, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WellId {
    row: u8,
    col: u32,
}

impl WellId {
    /// `row` is 0-based (0 = A), `col` is 1-based.
    pub fn new(row: u8, col: u32) -> Result<WellId> {
        ensure!(
            row < MAX_WELL_ROWS,
            "well row index {row} is past the last row letter Z"
        );
        ensure!(col >= 1, "well columns are numbered from 1");
        Ok(WellId { row, col })
    }

    /// Convert a 0-based index-sort location (x = row, y = column) into a well.
    /// (0,0) is A1, (1,0) is B1, (0,1) is A2.
    pub fn from_sort_location(x: u32, y: u32) -> Result<WellId> {
        let row = u8::try_from(x)
            .ok()
            .filter(|&r| r < MAX_WELL_ROWS)
            .with_context(|| format!("sort location row {x} does not map to a row letter"))?;
        WellId::new(row, y + 1)
    }

    pub fn row_letter(&self) -> char {
        char::from(b'A' + self.row)
    }

    pub fn row_index(&self) -> u8 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.col
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.col)
    }
}

impl FromStr for WellId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<WellId> {
        let s = s.trim();
        let mut chars = s.chars();
        let Some(letter) = chars.next().filter(char::is_ascii_alphabetic) else {
            bail!("'{s}' is not a well position; expected a row letter followed by a number");
        };
        let col: u32 = chars
            .as_str()
            .parse()
            .with_context(|| format!("'{s}' is not a well position; bad column number"))?;
        let row = letter.to_ascii_uppercase() as u8 - b'A';
        WellId::new(row, col)
    }
}

/// Plate label taken from a filename or a sheet title. Plates order
/// naturally: "Plate2" < "Plate10".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlateId(String);

impl PlateId {
    pub fn new(label: impl Into<String>) -> PlateId {
        PlateId(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for PlateId {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for PlateId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sort_location_corners() {
        assert_eq!(WellId::from_sort_location(0, 0).unwrap().to_string(), "A1");
        assert_eq!(WellId::from_sort_location(1, 0).unwrap().to_string(), "B1");
        assert_eq!(WellId::from_sort_location(0, 1).unwrap().to_string(), "A2");
        assert_eq!(WellId::from_sort_location(15, 23).unwrap().to_string(), "P24");
        assert!(WellId::from_sort_location(26, 0).is_err());
    }

    #[test]
    fn test_parse() {
        let well: WellId = "c12".parse().unwrap();
        assert_eq!(well.row_letter(), 'C');
        assert_eq!(well.column(), 12);
        assert_eq!("B01".parse::<WellId>().unwrap().to_string(), "B1");
        assert!("12".parse::<WellId>().is_err());
        assert!("A".parse::<WellId>().is_err());
        assert!("A0".parse::<WellId>().is_err());
    }

    #[test]
    fn test_row_major_order() {
        let mut wells: Vec<WellId> = ["B1", "A24", "A3", "B10"]
            .iter()
            .map(|w| w.parse().unwrap())
            .collect();
        wells.sort();
        let names: Vec<String> = wells.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["A3", "A24", "B1", "B10"]);
    }

    #[test]
    fn test_plate_order() {
        let mut plates: Vec<PlateId> = ["LCE10", "LCE2", "LCE1"].into_iter().map(PlateId::new).collect();
        plates.sort();
        assert_eq!(
            plates,
            vec![PlateId::new("LCE1"), PlateId::new("LCE2"), PlateId::new("LCE10")]
        );
    }

    proptest! {
        #[test]
        fn prop_sort_location_layout(x in 0u32..16, y in 0u32..24) {
            let well = WellId::from_sort_location(x, y).unwrap();
            prop_assert_eq!(u32::from(well.row_index()), x);
            prop_assert_eq!(well.column(), y + 1);
            prop_assert_eq!(well.to_string().parse::<WellId>().unwrap(), well);
        }
    }
}
