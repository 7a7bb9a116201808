// ============================================================
// Layer 3: Table Domain Type
// ============================================================
// A header row plus rectangular rows of text cells.
//
// Cells stay as strings until a stage actually needs a number.
// The raw bike sharing files mix a date column (dteday) with
// integer and float columns, and most stages only move columns
// around, so parsing everything up front would buy nothing.
//
// Every row always has exactly `columns.len()` cells.
//
// Reference: Rust Book §8 (Vectors), §5 (Structs and Methods)

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use crate::domain::errors::PipelineError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows:    Vec<Vec<String>>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!(
                    "row {} has {} cells but the header has {} columns",
                    i,
                    row.len(),
                    columns.len()
                );
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()).into())
    }

    /// Borrow every cell of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Parse one column as f64. Fails on the first unparsable cell.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r[idx].trim().parse::<f64>().with_context(|| {
                    format!("column '{}' row {}: '{}' is not a number", name, i, r[idx])
                })
            })
            .collect()
    }

    /// Return a copy without the named columns.
    /// Every name must exist, mirroring a strict `drop(columns=...)`.
    pub fn drop_columns(&self, names: &[String]) -> Result<Table> {
        let mut drop_idx = Vec::with_capacity(names.len());
        for name in names {
            drop_idx.push(self.column_index(name)?);
        }

        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|i| !drop_idx.contains(i))
            .collect();

        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows    = self
            .rows
            .iter()
            .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
            .collect();

        Ok(Table { columns, rows })
    }

    /// Append a column at the right edge.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            bail!(
                "column '{}' has {} values but the table has {} rows",
                name,
                values.len(),
                self.rows.len()
            );
        }
        if self.has_column(&name) {
            bail!("column '{}' already exists", name);
        }
        self.columns.push(name);
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
        Ok(())
    }

    /// Rename columns found in `map`; names not in the table are ignored.
    /// Fails, leaving the header as it was, if two columns would end
    /// up with the same name.
    pub fn rename_columns(&mut self, map: &IndexMap<String, String>) -> Result<()> {
        let renamed: Vec<String> = self
            .columns
            .iter()
            .map(|c| map.get(c.as_str()).unwrap_or(c).clone())
            .collect();

        for (i, name) in renamed.iter().enumerate() {
            if renamed[..i].contains(name) {
                bail!("renaming would create a second column named '{}'", name);
            }
        }
        self.columns = renamed;
        Ok(())
    }
}
