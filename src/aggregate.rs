use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use tracing::debug;

use crate::features::{Accumulate, FeatureSpec, UNIT_FEATURES};
use crate::table::Table;
use crate::types::{Insee, Value};

/// Owns the commune → feature-record mapping while the source adapters
/// run. A record is created zero-filled on first sight of a code; rows
/// keep first-observation order.
pub struct UnitAggregator {
    index: HashMap<Insee, usize>,
    codes: Vec<Insee>,
    rows: Vec<Vec<Value>>,
    /// (numerator, denominator) accumulators per row, one slot per
    /// ratio-accumulated feature. `None` means the source never touched
    /// this commune.
    ratios: Vec<Vec<Option<(f64, f64)>>>,
    ratio_columns: Vec<usize>,
}

impl Default for UnitAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitAggregator {
    pub fn new() -> Self {
        let ratio_columns = UNIT_FEATURES
            .iter()
            .enumerate()
            .filter(|(_, f)| f.accumulate == Accumulate::Ratio)
            .map(|(j, _)| j)
            .collect();
        Self {
            index: HashMap::new(),
            codes: Vec::new(),
            rows: Vec::new(),
            ratios: Vec::new(),
            ratio_columns,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_index(&mut self, code: &Insee) -> usize {
        if let Some(&i) = self.index.get(code) {
            return i;
        }
        let i = self.rows.len();
        self.index.insert(code.clone(), i);
        self.codes.push(code.clone());
        self.rows.push(vec![Value::ZERO; UNIT_FEATURES.len()]);
        self.ratios.push(vec![None; self.ratio_columns.len()]);
        i
    }

    fn feature_index(feature: &str) -> Result<(usize, &'static FeatureSpec)> {
        UNIT_FEATURES
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == feature)
            .map(|(j, f)| (j, f))
            .ok_or_else(|| anyhow!("unknown feature `{feature}`"))
    }

    /// Folds one observation into a commune's record per the feature's
    /// accumulation policy.
    pub fn record(&mut self, code: &Insee, feature: &str, value: f64) -> Result<()> {
        let (j, spec) = Self::feature_index(feature)?;
        let i = self.row_index(code);
        match spec.accumulate {
            Accumulate::Replace => self.rows[i][j] = Value::Num(value),
            Accumulate::Sum => self.rows[i][j] = self.rows[i][j].add(Value::Num(value)),
            Accumulate::Ratio => {
                bail!("feature `{feature}` accumulates as a ratio; use record_ratio")
            }
        }
        Ok(())
    }

    /// Accumulates numerator and denominator separately; the division
    /// happens once, in `finish`.
    pub fn record_ratio(
        &mut self,
        code: &Insee,
        feature: &str,
        numerator: f64,
        denominator: f64,
    ) -> Result<()> {
        let (j, spec) = Self::feature_index(feature)?;
        if spec.accumulate != Accumulate::Ratio {
            bail!("feature `{feature}` does not accumulate as a ratio");
        }
        let slot = self
            .ratio_columns
            .iter()
            .position(|&column| column == j)
            .expect("ratio feature is indexed");
        let i = self.row_index(code);
        let (num, den) = self.ratios[i][slot].get_or_insert((0.0, 0.0));
        *num += numerator;
        *den += denominator;
        Ok(())
    }

    /// Current value of a feature, if the commune has been seen. Lets a
    /// later adapter derive from an earlier one (density from area).
    pub fn value(&self, code: &Insee, feature: &str) -> Option<Value> {
        let i = *self.index.get(code)?;
        let (j, _) = Self::feature_index(feature).ok()?;
        Some(self.rows[i][j])
    }

    /// Resolves deferred ratios and missing-feature defaults, drops the
    /// outside-of-study-area row, and freezes the result.
    pub fn finish(mut self) -> Result<Table> {
        let columns = UNIT_FEATURES.iter().map(|f| f.name.to_string()).collect();
        let mut table = Table::new(columns);
        for (i, code) in self.codes.iter().enumerate() {
            for (slot, &j) in self.ratio_columns.iter().enumerate() {
                self.rows[i][j] = match self.ratios[i][slot] {
                    Some((_, den)) if den == 0.0 => Value::Na,
                    Some((num, den)) => Value::Num(num / den),
                    None if UNIT_FEATURES[j].na_when_missing => Value::Na,
                    None => Value::ZERO,
                };
            }
            if code.is_outside() {
                continue;
            }
            table.push_row(code.clone(), self.rows[i].clone())?;
        }
        debug!(communes = table.len(), "aggregation finished");
        Ok(table)
    }
}
