//! Core table types for representing tabular datasets

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;

/// An in-memory table: ordered column names plus ordered rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, unique within the table
    pub columns: Vec<String>,
    /// Row data
    pub rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from columns and positional row values
    ///
    /// Each value list is zipped with the column list; short lists leave
    /// the trailing cells null.
    pub fn from_values(columns: Vec<String>, values: Vec<Vec<CellValue>>) -> Self {
        let rows = values
            .into_iter()
            .map(|cells| Row::from_pairs(columns.iter().cloned().zip(cells)))
            .collect();
        Self { columns, rows }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Columns present in both tables, in this table's order
    pub fn common_columns(&self, other: &Table) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| other.has_column(c))
            .cloned()
            .collect()
    }

    /// Check the column-set invariant: names are unique and non-empty
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for (idx, name) in self.columns.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::EmptyColumnName(idx));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateColumn(name.clone()));
            }
        }
        Ok(())
    }
}

/// A row of data: a mapping from column name to cell value
///
/// Columns with no entry read as [`CellValue::Null`], so extending a
/// table's schema never requires touching existing rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from (column, value) pairs
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, CellValue)>,
    {
        let cells = pairs
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.into(), v))
            .collect();
        Self { cells }
    }

    /// Get a cell value by column name; absent columns read as null
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&CellValue::Null)
    }

    /// Set a cell value
    ///
    /// Setting null removes the entry, keeping absent-column and
    /// explicit-null rows equal under `PartialEq`.
    pub fn set(&mut self, column: impl Into<String>, value: CellValue) {
        let column = column.into();
        if value.is_null() {
            self.cells.remove(&column);
        } else {
            self.cells.insert(column, value);
        }
    }

    /// Copy this row restricted to the given columns, dropping the rest
    ///
    /// Null cells are not materialized; they stay absent and read back
    /// as null.
    pub fn project(&self, columns: &[String]) -> Row {
        let cells = columns
            .iter()
            .filter_map(|c| {
                let value = self.get(c);
                if value.is_null() {
                    None
                } else {
                    Some((c.clone(), value.clone()))
                }
            })
            .collect();
        Self { cells }
    }
}

/// A nullable scalar cell value
///
/// Numeric subtypes are deliberately not distinguished; merge logic only
/// needs nullability and equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
}

impl CellValue {
    /// Check if the cell is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Normalize the value to a string for identity comparisons
    ///
    /// Whole numbers print without a fractional part, so `Number(5.0)`
    /// and `Text("5")` match when used as keys.
    pub fn to_key_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}
