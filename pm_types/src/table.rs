//! In-memory tables passed between stages.
//!
//! A `Table` is a list of named columns and a list of rows of `Value`s. Every
//! stage produces a new table; nothing is shared or mutated across stages.

use crate::errors::PlateMergeError;
use anyhow::{bail, ensure, Result};
use itertools::Itertools;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(f64),
}

impl Value {
    /// Null, an empty string, or NaN.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::Number(n) => n.is_nan(),
        }
    }

    /// Canonical text of the value. Integral numbers render without a
    /// fractional part so that `1.0` read from a workbook matches `1` read
    /// from a text file.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Number(n) => Cow::Owned(render_number(*n)),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

fn render_number(n: f64) -> String {
    if n.is_nan() {
        String::new()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

/// Named columns over rows of values. All rows have exactly one value per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Table {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Table> {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        ensure!(
            row.len() == self.columns.len(),
            "row has {} values but the table has {} columns",
            row.len(),
            self.columns.len()
        );
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of column `name`, or a `MissingColumn` error naming `filetype`
    /// and `origin` so the user can find the offending input.
    pub fn require_column(&self, name: &str, filetype: &str, origin: &str) -> Result<usize> {
        match self.column_index(name) {
            Some(i) => Ok(i),
            None => bail!(PlateMergeError::MissingColumn {
                filetype: filetype.to_string(),
                origin: origin.to_string(),
                column: name.to_string(),
            }),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of column `name` in row `row`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let i = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[i])
    }

    /// Iterate the values of one column.
    pub fn column_values(&self, i: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| &r[i])
    }

    /// Set every row of column `name` to `value`, appending the column if it
    /// does not exist yet.
    pub fn fill_column(&mut self, name: &str, value: Value) {
        match self.column_index(name) {
            Some(i) => {
                for row in &mut self.rows {
                    row[i] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Insert a column at position `at` with one value per row.
    pub fn insert_column(&mut self, at: usize, name: &str, values: Vec<Value>) -> Result<()> {
        ensure!(
            values.len() == self.rows.len(),
            "column '{name}' has {} values but the table has {} rows",
            values.len(),
            self.rows.len()
        );
        ensure!(!self.has_column(name), "column '{name}' already exists");
        let at = at.min(self.columns.len());
        self.columns.insert(at, name.to_string());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.insert(at, v);
        }
        Ok(())
    }

    /// Remove column `name`, returning its former position and values.
    pub fn remove_column(&mut self, name: &str) -> Option<(usize, Vec<Value>)> {
        let i = self.column_index(name)?;
        self.columns.remove(i);
        let values = self.rows.iter_mut().map(|r| r.remove(i)).collect();
        Some((i, values))
    }

    /// Move column `name` to position `at`.
    pub fn move_column(&mut self, name: &str, at: usize) -> Result<()> {
        let Some((_, values)) = self.remove_column(name) else {
            bail!("cannot move missing column '{name}'");
        };
        self.insert_column(at, name, values)
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        ensure!(!self.has_column(to), "column '{to}' already exists");
        let Some(i) = self.column_index(from) else {
            bail!("cannot rename missing column '{from}'");
        };
        self.columns[i] = to.to_string();
        Ok(())
    }

    /// Concatenate tables row-wise. Columns are the union of all inputs in
    /// first-seen order; values missing from a table are null.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
        let tables: Vec<Table> = tables.into_iter().collect();
        let columns: Vec<String> = tables
            .iter()
            .flat_map(|t| t.columns.iter().cloned())
            .unique()
            .collect();
        let mut out = Table::new(columns);
        for table in tables {
            let mapping: Vec<Option<usize>> = out
                .columns
                .iter()
                .map(|c| table.column_index(c))
                .collect();
            for mut row in table.rows {
                let new_row = mapping
                    .iter()
                    .map(|m| m.map(|i| std::mem::take(&mut row[i])).unwrap_or_default())
                    .collect();
                out.rows.push(new_row);
            }
        }
        out
    }

    /// Stable sort of the rows.
    pub fn sort_rows_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&[Value], &[Value]) -> Ordering,
    {
        self.rows.sort_by(|a, b| cmp(a, b));
    }

    /// Keep the first row for every distinct combination of `keys`; returns the
    /// number of rows dropped.
    pub fn drop_duplicates(&mut self, keys: &[usize]) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| {
            let key: Vec<String> = keys.iter().map(|&i| row[i].render().into_owned()).collect();
            seen.insert(key)
        });
        before - self.rows.len()
    }

    /// Remove every column for which `pred(name)` holds and all values are
    /// empty. Returns the removed names.
    pub fn drop_empty_columns_where<F>(&mut self, pred: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let doomed: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, name)| pred(name) && self.column_values(*i).all(Value::is_empty))
            .map(|(_, name)| name.clone())
            .collect();
        for name in &doomed {
            self.remove_column(name);
        }
        doomed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Value {
        Value::from(s)
    }

    fn sample() -> Table {
        Table::from_rows(
            ["Plate#", "Well position", "Sample name"],
            vec![
                vec![text("LCE1"), text("A1"), text("s1")],
                vec![text("LCE1"), text("A2"), text("s2")],
                vec![text("LCE1"), text("A1"), text("s3")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_render_numbers() {
        assert_eq!(Value::Number(1.0).render(), "1");
        assert_eq!(Value::Number(-3.0).render(), "-3");
        assert_eq!(Value::Number(2.5).render(), "2.5");
        assert_eq!(Value::Number(f64::NAN).render(), "");
        assert_eq!(Value::Null.render(), "");
        assert!(Value::Text(String::new()).is_empty());
    }

    #[test]
    fn test_push_row_width_checked() {
        let mut t = Table::new(["a", "b"]);
        assert!(t.push_row(vec![Value::Null]).is_err());
        t.push_row(vec![Value::Null, text("x")]).unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_missing_column_is_typed() {
        let err = sample()
            .require_column("Time", "FCS file", "x.fcs")
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<PlateMergeError>(),
            Some(&PlateMergeError::MissingColumn {
                filetype: "FCS file".into(),
                origin: "x.fcs".into(),
                column: "Time".into(),
            })
        );
    }

    #[test]
    fn test_column_edits() {
        let mut t = sample();
        let (idx, values) = t.remove_column("Sample name").unwrap();
        assert_eq!(idx, 2);
        assert_eq!(values.len(), 3);
        t.fill_column("Plate#", text("PRM2"));
        t.fill_column("Extra", Value::Null);
        t.insert_column(0, "Sample name", values).unwrap();
        assert_eq!(t.columns(), ["Sample name", "Plate#", "Well position", "Extra"]);
        t.move_column("Sample name", 2).unwrap();
        assert_eq!(t.columns(), ["Plate#", "Well position", "Sample name", "Extra"]);
        assert_eq!(t.get(2, "Sample name"), Some(&text("s3")));
        assert_eq!(t.get(0, "Plate#"), Some(&text("PRM2")));
        t.rename_column("Extra", "Notes").unwrap();
        assert!(t.rename_column("Notes", "Plate#").is_err());
    }

    #[test]
    fn test_concat_unions_columns() {
        let a = Table::from_rows(["x", "y"], vec![vec![text("1"), text("2")]]).unwrap();
        let b = Table::from_rows(["y", "z"], vec![vec![text("3"), text("4")]]).unwrap();
        let c = Table::concat([a, b]);
        assert_eq!(c.columns(), ["x", "y", "z"]);
        assert_eq!(
            c.rows(),
            [
                vec![text("1"), text("2"), Value::Null],
                vec![Value::Null, text("3"), text("4")],
            ]
        );
    }

    #[test]
    fn test_drop_duplicates_keeps_first() {
        let mut t = sample();
        assert_eq!(t.drop_duplicates(&[0, 1]), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0, "Sample name"), Some(&text("s1")));
        assert_eq!(t.get(1, "Sample name"), Some(&text("s2")));
    }

    #[test]
    fn test_drop_empty_columns_where() {
        let mut t = Table::from_rows(
            ["Plate#", "Unnamed: 3", "X.1", "Notes"],
            vec![
                vec![text("LCE1"), Value::Null, text("kept"), Value::Null],
                vec![text("LCE1"), text(""), Value::Null, Value::Null],
            ],
        )
        .unwrap();
        let dropped = t.drop_empty_columns_where(|c| c.starts_with("Unnamed") || c.starts_with("X."));
        assert_eq!(dropped, vec!["Unnamed: 3".to_string()]);
        assert_eq!(t.columns(), ["Plate#", "X.1", "Notes"]);
    }
}
