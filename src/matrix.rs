//! Projects the final feature tables into the numeric train/test arrays
//! the regression model consumes.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array2;
use polars::prelude::{Column, NamedFrom, Series};
use tracing::debug;

use crate::common::io::csv;
use crate::error::Error;
use crate::split::{Partition, Split};
use crate::table::Table;
use crate::types::Insee;

/// Column selection and standardization switches for the matrix builder.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    /// Feature columns of the data table, in matrix column order.
    pub features: Vec<String>,
    /// Target columns of the results table, in matrix column order.
    pub targets: Vec<String>,
    pub standardize_features: bool,
    pub standardize_targets: bool,
}

/// Train/test design matrices. Feature rows follow the data table's row
/// order; target rows are aligned to them by zone code.
#[derive(Debug)]
pub struct Dataset {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array2<f64>,
    pub y_test: Array2<f64>,
    pub train_codes: Vec<Insee>,
    pub test_codes: Vec<Insee>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnStats {
    mean: f64,
    std: f64,
}

/// Mean and population standard deviation over every row of the table:
/// the whole unit/zone universe, not one partition.
fn column_stats(table: &Table, column: &str) -> Result<ColumnStats> {
    let j = table
        .column_index(column)
        .ok_or_else(|| anyhow!("no column `{column}` in the table"))?;
    if table.is_empty() {
        bail!("cannot standardize `{column}` over an empty table");
    }

    let mut sum = 0.0;
    for (code, row) in table.iter() {
        sum += cell(row[j], code, column)?;
    }
    let mean = sum / table.len() as f64;

    let mut variance = 0.0;
    for (code, row) in table.iter() {
        let x = cell(row[j], code, column)? - mean;
        variance += x * x;
    }
    let std = (variance / table.len() as f64).sqrt();
    Ok(ColumnStats { mean, std })
}

fn cell(value: crate::types::Value, code: &Insee, column: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        Error::NotAvailable { code: code.as_str().to_string(), feature: column.to_string() }.into()
    })
}

fn column_indices(table: &Table, columns: &[String]) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|name| {
            table
                .column_index(name)
                .ok_or_else(|| anyhow!("no column `{name}` in the table"))
        })
        .collect()
}

fn stats_for(table: &Table, columns: &[String], standardize: bool) -> Result<Option<Vec<ColumnStats>>> {
    if !standardize {
        return Ok(None);
    }
    let stats = columns
        .iter()
        .map(|name| {
            let s = column_stats(table, name)?;
            if s.std == 0.0 {
                bail!("column `{name}` has zero variance; cannot standardize");
            }
            Ok(s)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(stats))
}

fn project_row(
    row: &[crate::types::Value],
    code: &Insee,
    indices: &[usize],
    columns: &[String],
    stats: Option<&[ColumnStats]>,
    out: &mut Vec<f64>,
) -> Result<()> {
    for (k, &j) in indices.iter().enumerate() {
        let x = cell(row[j], code, &columns[k])?;
        out.push(match stats {
            Some(stats) => (x - stats[k].mean) / stats[k].std,
            None => x,
        });
    }
    Ok(())
}

/// Projects the data table (features) and the results table (targets)
/// into train/test matrices per the partition assignment.
pub fn build(data: &Table, results: &Table, split: &Split, spec: &DatasetSpec) -> Result<Dataset> {
    let feature_indices = column_indices(data, &spec.features)
        .context("selecting feature columns")?;
    let target_indices = column_indices(results, &spec.targets)
        .context("selecting target columns")?;
    let feature_stats = stats_for(data, &spec.features, spec.standardize_features)?;
    let target_stats = stats_for(results, &spec.targets, spec.standardize_targets)?;

    let mut train_codes = Vec::new();
    let mut test_codes = Vec::new();
    let mut x_train = Vec::new();
    let mut x_test = Vec::new();
    for (code, row) in data.iter() {
        let partition = split
            .partition_of(code)
            .ok_or_else(|| anyhow!("zone {code} is missing from the partition"))?;
        let (codes, flat) = match partition {
            Partition::Train => (&mut train_codes, &mut x_train),
            Partition::Test => (&mut test_codes, &mut x_test),
        };
        project_row(row, code, &feature_indices, &spec.features, feature_stats.as_deref(), flat)?;
        codes.push(code.clone());
    }

    // target rows are fetched by code so X and Y stay aligned
    let project_targets = |codes: &[Insee]| -> Result<Vec<f64>> {
        let mut flat = Vec::with_capacity(codes.len() * target_indices.len());
        for code in codes {
            let row = results
                .row(code)
                .ok_or_else(|| anyhow!("results table has no row for zone {code}"))?;
            project_row(row, code, &target_indices, &spec.targets, target_stats.as_deref(), &mut flat)?;
        }
        Ok(flat)
    };
    let y_train = project_targets(&train_codes)?;
    let y_test = project_targets(&test_codes)?;

    let dataset = Dataset {
        x_train: Array2::from_shape_vec((train_codes.len(), spec.features.len()), x_train)?,
        x_test: Array2::from_shape_vec((test_codes.len(), spec.features.len()), x_test)?,
        y_train: Array2::from_shape_vec((train_codes.len(), spec.targets.len()), y_train)?,
        y_test: Array2::from_shape_vec((test_codes.len(), spec.targets.len()), y_test)?,
        train_codes,
        test_codes,
    };
    debug!(
        train = dataset.train_codes.len(),
        test = dataset.test_codes.len(),
        "built dataset"
    );
    Ok(dataset)
}

/// Writes one matrix as a headed semicolon CSV, one column per name.
pub fn write_matrix(path: &Path, names: &[String], matrix: &Array2<f64>) -> Result<()> {
    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for (j, name) in names.iter().enumerate() {
        let cells: Vec<String> = matrix.column(j).iter().map(|x| x.to_string()).collect();
        columns.push(Series::new(name.as_str().into(), cells).into());
    }
    csv::write_columns(path, columns)
}
