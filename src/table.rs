use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use polars::prelude::{Column, NamedFrom, Series};

use crate::common::io::csv;
use crate::features::ID_COLUMN;
use crate::types::{Insee, Value};

/// An ordered, code-indexed table of feature values. Row order is
/// first-insertion order, so rebuilding a table from the same inputs
/// writes byte-identical output.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<Insee, usize>,
    codes: Vec<Insee>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, index: HashMap::new(), codes: Vec::new(), rows: Vec::new() }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn codes(&self) -> &[Insee] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, code: &Insee) -> bool {
        self.index.contains_key(code)
    }

    pub fn row(&self, code: &Insee) -> Option<&[Value]> {
        self.index.get(code).map(|&i| self.rows[i].as_slice())
    }

    pub fn value(&self, code: &Insee, column: &str) -> Option<Value> {
        let row = self.row(code)?;
        Some(row[self.column_index(column)?])
    }

    /// Rows in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Insee, &[Value])> {
        self.codes.iter().zip(self.rows.iter().map(Vec::as_slice))
    }

    pub fn push_row(&mut self, code: Insee, values: Vec<Value>) -> Result<()> {
        if values.len() != self.columns.len() {
            bail!(
                "row for {code} has {} values, table has {} columns",
                values.len(),
                self.columns.len()
            );
        }
        if self.index.contains_key(&code) {
            bail!("duplicate row for {code}");
        }
        self.index.insert(code.clone(), self.rows.len());
        self.codes.push(code);
        self.rows.push(values);
        Ok(())
    }

    /// Writes the table as semicolon CSV, identifier column first and NA
    /// cells rendered as the literal `NA`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len() + 1);
        let ids: Vec<String> = self.codes.iter().map(|c| c.as_str().to_string()).collect();
        columns.push(Series::new(ID_COLUMN.into(), ids).into());
        for (j, name) in self.columns.iter().enumerate() {
            let cells: Vec<String> = self.rows.iter().map(|r| r[j].to_string()).collect();
            columns.push(Series::new(name.as_str().into(), cells).into());
        }
        csv::write_columns(path, columns)
    }

    /// Reads a table previously written by `write_csv` (or any semicolon
    /// CSV with an `insee` column).
    pub fn read_csv(path: &Path) -> Result<Table> {
        let df = csv::read_all_str(path, b';')?;
        let ids = csv::str_column(&df, ID_COLUMN, path)?;

        let feature_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| name != ID_COLUMN)
            .collect();
        let cells = feature_names
            .iter()
            .map(|name| csv::str_column(&df, name, path))
            .collect::<Result<Vec<_>>>()?;

        let mut table = Table::new(feature_names.clone());
        for i in 0..df.height() {
            let code = ids
                .get(i)
                .ok_or_else(|| anyhow!("row {i} of {}: empty insee cell", path.display()))?;
            let mut values = Vec::with_capacity(cells.len());
            for (column, name) in cells.iter().zip(&feature_names) {
                let cell = column
                    .get(i)
                    .ok_or_else(|| anyhow!("row {i} of {}: empty `{name}` cell", path.display()))?;
                let value = Value::parse(cell).with_context(|| {
                    format!("column `{name}`, row {i} of {}", path.display())
                })?;
                values.push(value);
            }
            table.push_row(Insee::new(code), values)?;
        }
        Ok(table)
    }
}
