//! Fused-zone composition, roll-up, and the external baseline store.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use crate::error::Error;
use crate::features::{self, Combine, FeatureSpec, ER_BASELINE};
use crate::table::Table;
use crate::types::{Insee, Value};

/// A zone: one or more communes treated as a single analysis region.
/// The membership list is produced upstream and never mutated here.
#[derive(Debug, Clone)]
pub struct Zone {
    pub code: Insee,
    pub members: Vec<Insee>,
}

/// Parses the zone composition file: a zone code line followed by a
/// whitespace-separated member commune line, repeated.
pub fn read_zone_composition(path: &Path) -> Result<Vec<Zone>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read zone composition {}", path.display()))?;
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() % 2 != 0 {
        bail!(
            "{}: dangling zone code line without a member list",
            path.display()
        );
    }

    let mut zones = Vec::with_capacity(lines.len() / 2);
    for pair in lines.chunks(2) {
        let code = pair[0].trim();
        if code.is_empty() {
            bail!("{}: empty zone code line", path.display());
        }
        let members: Vec<Insee> = pair[1].split_whitespace().map(Insee::new).collect();
        if members.is_empty() {
            bail!("{}: zone {code} has an empty member list", path.display());
        }
        zones.push(Zone { code: Insee::new(code), members });
    }
    Ok(zones)
}

const BASELINE_KEY: &str = "0km";

/// Per-zone external emission results, one artifact directory per zone.
/// A missing artifact is normal (the simulation never ran for that zone);
/// a present but malformed one is not.
pub struct BaselineStore {
    root: PathBuf,
}

impl BaselineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn get(&self, zone: &Insee) -> Result<Option<f64>> {
        let path = self.root.join(format!("bs_{zone}")).join("c_co2.json");
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let doc: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("malformed baseline {}", path.display()))?;
        match doc.get(BASELINE_KEY).and_then(|v| v.as_f64()) {
            Some(value) => Ok(Some(value)),
            None => bail!("{}: no numeric `{BASELINE_KEY}` entry", path.display()),
        }
    }
}

/// Rolls the commune table up to fused zones: sums for additive features,
/// unweighted means over the member list for intensive ones, and a
/// baseline lookup for `er_bs`. Commune rows are read, never mutated.
pub fn roll_up(units: &Table, zones: &[Zone], baselines: &BaselineStore) -> Result<Table> {
    let specs: Vec<&'static FeatureSpec> = units
        .columns()
        .iter()
        .map(|name| {
            features::unit_feature(name)
                .ok_or_else(|| anyhow!("unknown feature column `{name}` in commune table"))
        })
        .collect::<Result<_>>()?;

    let columns = units
        .columns()
        .iter()
        .cloned()
        .chain([ER_BASELINE.name.to_string()])
        .collect();
    let mut out = Table::new(columns);

    for zone in zones {
        let mut row = vec![Value::ZERO; specs.len()];
        for member in &zone.members {
            let unit_row = units.row(member).ok_or_else(|| Error::InconsistentMembership {
                zone: zone.code.as_str().to_string(),
                member: member.as_str().to_string(),
            })?;
            for (j, value) in unit_row.iter().enumerate() {
                row[j] = row[j].add(*value);
            }
        }
        let members = zone.members.len() as f64;
        for (j, spec) in specs.iter().enumerate() {
            if spec.combine == Combine::Mean {
                row[j] = row[j].div(members);
            }
        }
        let baseline = match baselines.get(&zone.code)? {
            Some(value) => Value::Num(value),
            None => Value::Na,
        };
        row.push(baseline);
        out.push_row(zone.code.clone(), row)?;
    }
    debug!(zones = out.len(), "rolled up zones");
    Ok(out)
}
