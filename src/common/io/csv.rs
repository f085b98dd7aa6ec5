use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use polars::frame::DataFrame;
use polars::io::{SerReader, SerWriter};
use polars::prelude::{Column, CsvReadOptions, CsvReader, CsvWriter, StringChunked};

use crate::common::fs::{finalize_write, open_for_write};

/// Reads a delimited file with every column forced to String, so commune
/// codes keep leading zeros and `NA` cells arrive untouched.
pub(crate) fn read_all_str(path: &Path, separator: u8) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(separator));

    CsvReader::new(file)
        .with_options(options)
        .finish()
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// String column accessor with a readable error.
pub(crate) fn str_column<'a>(df: &'a DataFrame, name: &str, path: &Path) -> Result<&'a StringChunked> {
    let column = df
        .column(name)
        .map_err(|_| anyhow!("{} has no `{name}` column", path.display()))?;
    column
        .as_materialized_series()
        .str()
        .map_err(|e| anyhow!("column `{name}` of {}: {e}", path.display()))
}

/// Writes string columns as a semicolon-separated table, atomically.
pub(crate) fn write_columns(path: &Path, columns: Vec<Column>) -> Result<()> {
    let mut df = DataFrame::new(columns)
        .with_context(|| format!("building table for {}", path.display()))?;

    let mut out = open_for_write(path)?;
    CsvWriter::new(&mut out)
        .include_header(true)
        .with_separator(b';')
        .finish(&mut df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    finalize_write(out)
}
