use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::aggregate::UnitAggregator;
use crate::common::io::csv;
use crate::resolve::apply_merge_correction;
use crate::types::Insee;

/// Reads the household travel survey (comma CSV) and accumulates vehicle
/// and person running totals per residence commune. Survey codes predate
/// several commune mergers, so each is corrected before accumulating; the
/// final `cars_per_persons` ratio is taken when the aggregator finishes.
///
/// Survey columns: `RESCOMM` residence commune, `NB_VD` vehicles owned,
/// `MNP` household size.
pub fn load_survey(agg: &mut UnitAggregator, path: &Path) -> Result<()> {
    let df = csv::read_all_str(path, b',')?;
    let commune_column = csv::str_column(&df, "RESCOMM", path)?;
    let vehicles_column = csv::str_column(&df, "NB_VD", path)?;
    let persons_column = csv::str_column(&df, "MNP", path)?;

    let mut households = 0usize;
    for i in 0..df.height() {
        let (Some(raw), Some(vehicles), Some(persons)) = (
            commune_column.get(i),
            vehicles_column.get(i),
            persons_column.get(i),
        ) else {
            bail!("row {i} of {}: empty survey cell", path.display());
        };
        let insee = Insee::new(apply_merge_correction(raw.trim()));
        let vehicles: f64 = vehicles
            .trim()
            .parse()
            .with_context(|| format!("row {i} of {}: malformed NB_VD", path.display()))?;
        let persons: f64 = persons
            .trim()
            .parse()
            .with_context(|| format!("row {i} of {}: malformed MNP", path.display()))?;

        agg.record_ratio(&insee, "cars_per_persons", vehicles, persons)?;
        households += 1;
    }
    debug!(households, "read household survey");
    Ok(())
}
