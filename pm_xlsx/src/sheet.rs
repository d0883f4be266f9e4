use pm_types::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Value stored in a spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert to a table value. Booleans become `TRUE`/`FALSE` text.
    pub fn to_value(&self) -> Value {
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Text(s) if s.is_empty() => Value::Null,
            CellValue::Text(s) => Value::Text(s.clone()),
            CellValue::Number(n) => Value::Number(*n),
            CellValue::Bool(b) => Value::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> CellValue {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> CellValue {
        CellValue::Number(n)
    }
}

impl From<&Value> for CellValue {
    fn from(v: &Value) -> CellValue {
        match v {
            Value::Null => CellValue::Empty,
            Value::Text(s) => CellValue::Text(s.clone()),
            Value::Number(n) if n.is_nan() => CellValue::Empty,
            Value::Number(n) => CellValue::Number(*n),
        }
    }
}

/// Foreground color of a cell's fill, as an opaque comparable token.
///
/// `Color` holds `AARRGGBB` for explicit colors, `theme:<n>` (with
/// `:<tint>` when tinted) for theme colors and `indexed:<n>` for palette
/// colors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Fill {
    #[default]
    None,
    Color(String),
}

impl Fill {
    pub fn color(token: impl Into<String>) -> Fill {
        Fill::Color(token.into())
    }

    /// The color token, or None for an unfilled cell or one whose color
    /// equals `no_fill_token`.
    pub fn token<'a>(&'a self, no_fill_token: &str) -> Option<&'a str> {
        match self {
            Fill::Color(c) if c != no_fill_token => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fill::None => f.write_str("none"),
            Fill::Color(c) => f.write_str(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub fill: Fill,
}

static EMPTY_VALUE: CellValue = CellValue::Empty;
static NO_FILL: Fill = Fill::None;

/// A worksheet as a sparse grid. Rows and columns are 1-based; any
/// coordinate that was never written (including row or column 0) reads as
/// an empty, unfilled cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    title: String,
    cells: BTreeMap<(u32, u32), Cell>,
}

impl Sheet {
    pub fn new(title: impl Into<String>) -> Sheet {
        Sheet {
            title: title.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        self.cell(row, col).map_or(&EMPTY_VALUE, |c| &c.value)
    }

    pub fn fill(&self, row: u32, col: u32) -> &Fill {
        self.cell(row, col).map_or(&NO_FILL, |c| &c.fill)
    }

    pub fn set_value(&mut self, row: u32, col: u32, value: impl Into<CellValue>) -> &mut Sheet {
        self.cells.entry((row, col)).or_default().value = value.into();
        self
    }

    pub fn set_fill(&mut self, row: u32, col: u32, fill: Fill) -> &mut Sheet {
        self.cells.entry((row, col)).or_default().fill = fill;
        self
    }

    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        self.cells.insert((row, col), cell);
    }

    /// Last row holding a non-empty value.
    pub fn max_row(&self) -> u32 {
        self.cells
            .iter()
            .filter(|(_, c)| !c.value.is_empty())
            .map(|(&(r, _), _)| r)
            .max()
            .unwrap_or(0)
    }

    /// Last column holding a non-empty value.
    pub fn max_col(&self) -> u32 {
        self.cells
            .iter()
            .filter(|(_, c)| !c.value.is_empty())
            .map(|(&(_, c), _)| c)
            .max()
            .unwrap_or(0)
    }

    /// Values of row `row`, columns `1..=max_col()`.
    pub fn row_values(&self, row: u32) -> Vec<CellValue> {
        (1..=self.max_col())
            .map(|col| self.value(row, col).clone())
            .collect()
    }

    /// Populated cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u32), &Cell)> + '_ {
        self.cells.iter().map(|(&k, c)| (k, c))
    }
}

/// A1-style reference of a 1-based (row, col) coordinate.
pub fn cell_ref(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &row.to_string()
}

/// Parse an A1-style reference into a 1-based (row, col) coordinate.
pub fn parse_cell_ref(r: &str) -> Option<(u32, u32)> {
    let split = r.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = r.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let col = letters.chars().try_fold(0u32, |acc, c| {
        acc.checked_mul(26)?
            .checked_add(u32::from(c.to_ascii_uppercase() as u8 - b'A' + 1))
    })?;
    let row = digits.parse().ok().filter(|&r| r > 0)?;
    Some((row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_refs() {
        assert_eq!(cell_ref(1, 1), "A1");
        assert_eq!(cell_ref(12, 26), "Z12");
        assert_eq!(cell_ref(3, 27), "AA3");
        assert_eq!(cell_ref(7, 703), "AAA7");
        assert_eq!(parse_cell_ref("AA3"), Some((3, 27)));
        assert_eq!(parse_cell_ref("b12"), Some((12, 2)));
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("A0"), None);
    }

    #[test]
    fn test_sparse_reads() {
        let mut sheet = Sheet::new("LCE1");
        sheet.set_value(2, 3, "A").set_fill(2, 4, Fill::color("FFFF0000"));
        assert_eq!(sheet.value(2, 3).as_text(), Some("A"));
        assert!(sheet.value(0, 0).is_empty());
        assert_eq!(sheet.fill(0, 3), &Fill::None);
        assert_eq!(sheet.fill(2, 4).token("00000000"), Some("FFFF0000"));
        assert_eq!(Fill::color("00000000").token("00000000"), None);
        assert_eq!(sheet.max_row(), 2);
        assert_eq!(sheet.max_col(), 3);
    }
}
