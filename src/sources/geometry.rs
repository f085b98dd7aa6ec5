use std::path::Path;

use anyhow::{bail, Context, Result};
use shapefile::dbase::FieldValue;
use tracing::debug;

use crate::aggregate::UnitAggregator;
use crate::types::Insee;

const M2_PER_KM2: f64 = 1_000_000.0;

/// Reads the commune shapefile's attribute table and records each
/// commune's `area` in km². The shapes themselves are never decoded: the
/// IGN export carries the surveyed area in its `st_areasha` attribute.
pub fn load_commune_areas(agg: &mut UnitAggregator, path: &Path) -> Result<()> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("failed to open shapefile {}", path.display()))?;

    let mut communes = 0usize;
    for item in reader.iter_shapes_and_records() {
        let (_, record) = item.context("error reading shape record")?;

        let insee = match record.get("insee") {
            Some(FieldValue::Character(Some(code))) => Insee::new(code.trim()),
            Some(FieldValue::Numeric(Some(code))) => Insee::new(&format!("{}", *code as i64)),
            _ => bail!("{}: record without an `insee` attribute", path.display()),
        };
        let area_m2 = match record.get("st_areasha") {
            Some(FieldValue::Numeric(Some(area))) => *area,
            Some(FieldValue::Float(Some(area))) => f64::from(*area),
            _ => bail!("commune {insee}: missing `st_areasha` attribute"),
        };

        agg.record(&insee, "area", area_m2 / M2_PER_KM2)?;
        communes += 1;
    }
    debug!(communes, "read commune areas");
    Ok(())
}
