use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::aggregate::UnitAggregator;
use crate::common::io::csv;
use crate::error::Error;
use crate::types::{Insee, Value};

/// Reads the communal population table (semicolon CSV with `insee` and
/// `popmun2017` columns) and records `pop` plus the derived `density`.
/// Must run after the geometry pass: density needs the commune's area.
pub fn load_population(agg: &mut UnitAggregator, path: &Path) -> Result<()> {
    let df = csv::read_all_str(path, b';')?;
    let insee_column = csv::str_column(&df, "insee", path)?;
    let pop_column = csv::str_column(&df, "popmun2017", path)?;

    let mut communes = 0usize;
    for i in 0..df.height() {
        let (Some(code), Some(pop)) = (insee_column.get(i), pop_column.get(i)) else {
            bail!("row {i} of {}: empty insee or popmun2017 cell", path.display());
        };
        let insee = Insee::new(code.trim());
        let pop: f64 = pop
            .trim()
            .parse()
            .with_context(|| format!("row {i} of {}: malformed popmun2017", path.display()))?;

        agg.record(&insee, "pop", pop)?;
        let area = match agg.value(&insee, "area") {
            Some(Value::Num(area)) if area > 0.0 => area,
            _ => {
                return Err(Error::MissingUpstreamFeature {
                    code: insee.as_str().to_string(),
                    feature: "density",
                    requires: "area",
                }
                .into())
            }
        };
        agg.record(&insee, "density", pop / area)?;
        communes += 1;
    }
    debug!(communes, "read communal population");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn derives_density_from_area() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "pop.csv", "insee;popmun2017\n75056;100\n77433;400\n");

        let mut agg = UnitAggregator::new();
        agg.record(&Insee::new("75056"), "area", 2.0).unwrap();
        agg.record(&Insee::new("77433"), "area", 4.0).unwrap();
        load_population(&mut agg, &path).unwrap();

        assert_eq!(agg.value(&Insee::new("75056"), "density"), Some(Value::Num(50.0)));
        assert_eq!(agg.value(&Insee::new("77433"), "density"), Some(Value::Num(100.0)));
    }

    #[test]
    fn missing_area_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "pop.csv", "insee;popmun2017\n75056;100\n");

        let mut agg = UnitAggregator::new();
        let err = load_population(&mut agg, &path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingUpstreamFeature { requires: "area", .. })
        ));
    }
}
