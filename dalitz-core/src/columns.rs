//! Columnar in-memory event table.
//!
//! `EventColumns` stores each named field as its own vector (`SoA` layout),
//! which is how columnar event files are laid out on disk. A row is a cheap
//! borrowed view that implements [`EventRecord`].

use crate::error::{Error, FieldAccessError, Result};
use crate::record::{required_fields, EventRecord};
use crate::source::EventSource;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named `f64` columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventColumns {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    rows: usize,
}

impl EventColumns {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, values)` pairs.
    ///
    /// # Errors
    /// Returns [`Error::ColumnLengthMismatch`] if the columns differ in length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Builds a table with the twelve standard fields from row-major data.
    ///
    /// Each row is `[mag, theta, phi]` for π⁺, π⁻, γ1, γ2 in that order.
    #[must_use]
    pub fn from_rows(rows: &[[f64; 12]]) -> Self {
        let names = required_fields();
        let columns = (0..names.len())
            .map(|col| rows.iter().map(|row| row[col]).collect())
            .collect();
        Self {
            names: names.into_iter().map(str::to_string).collect(),
            columns,
            rows: rows.len(),
        }
    }

    /// Appends a column, replacing any existing column of the same name.
    ///
    /// # Errors
    /// Returns [`Error::ColumnLengthMismatch`] if the table already has
    /// columns of a different length.
    pub fn push_column<S: Into<String>>(&mut self, name: S, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if !self.names.is_empty() && values.len() != self.rows {
            return Err(Error::ColumnLengthMismatch {
                name,
                expected: self.rows,
                actual: values.len(),
            });
        }
        self.rows = values.len();
        if let Some(idx) = self.position(&name) {
            self.columns[idx] = values;
        } else {
            self.names.push(name);
            self.columns.push(values);
        }
        Ok(())
    }

    /// Builder form of [`push_column`](Self::push_column).
    ///
    /// # Errors
    /// See [`push_column`](Self::push_column).
    pub fn with_column<S: Into<String>>(mut self, name: S, values: Vec<f64>) -> Result<Self> {
        self.push_column(name, values)?;
        Ok(self)
    }

    /// Removes a column, returning its values.
    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        let idx = self.position(name)?;
        self.names.remove(idx);
        if self.names.is_empty() {
            self.rows = 0;
        }
        Some(self.columns.remove(idx))
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in insertion order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Values of column `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|idx| self.columns[idx].as_slice())
    }

    /// Borrowed view of row `index`.
    ///
    /// # Errors
    /// Returns [`Error::RecordOutOfRange`] past the last row.
    pub fn row(&self, index: usize) -> Result<ColumnRow<'_>> {
        if index >= self.rows {
            return Err(Error::RecordOutOfRange {
                index,
                len: self.rows,
            });
        }
        Ok(ColumnRow { table: self, index })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// One row of an [`EventColumns`] table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRow<'a> {
    table: &'a EventColumns,
    index: usize,
}

impl ColumnRow<'_> {
    /// Row index within the table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl EventRecord for ColumnRow<'_> {
    fn field(&self, name: &str) -> std::result::Result<f64, FieldAccessError> {
        let column = self
            .table
            .column(name)
            .ok_or_else(|| FieldAccessError::Missing {
                name: name.to_string(),
            })?;
        let value = column[self.index];
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FieldAccessError::Malformed {
                name: name.to_string(),
                value,
            })
        }
    }
}

impl EventSource for EventColumns {
    type Record<'a> = ColumnRow<'a>;

    fn len(&self) -> usize {
        self.rows
    }

    fn record(&self, index: usize) -> Result<ColumnRow<'_>> {
        self.row(index)
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} events, {} columns)", self.rows, self.names.len())
    }
}
