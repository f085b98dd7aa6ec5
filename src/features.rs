//! Declarative feature schema: one row per feature, naming how commune
//! observations accumulate and how member communes combine into a zone.
//! Adding a feature means adding a row here, not touching aggregation code.

/// How incoming per-source observations fold into a commune's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulate {
    /// Set-once value; a later observation overwrites the earlier one.
    Replace,
    /// Running sum of every observation.
    Sum,
    /// Deferred ratio: numerator and denominator accumulate separately
    /// and divide once every source has run.
    Ratio,
}

/// How member communes combine into a fused-zone value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Additive across members.
    Sum,
    /// Unweighted arithmetic mean over the member list.
    Mean,
    /// Looked up in the external per-zone result store, not aggregated.
    Baseline,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub accumulate: Accumulate,
    pub combine: Combine,
    /// Whether a commune no source ever touched reads NA rather than 0.
    pub na_when_missing: bool,
}

/// Identifier column of every persisted table.
pub const ID_COLUMN: &str = "insee";

/// Commune-level schema, in output column order.
pub const UNIT_FEATURES: &[FeatureSpec] = &[
    FeatureSpec { name: "area", accumulate: Accumulate::Replace, combine: Combine::Sum, na_when_missing: false },
    FeatureSpec { name: "pop", accumulate: Accumulate::Replace, combine: Combine::Sum, na_when_missing: false },
    FeatureSpec { name: "density", accumulate: Accumulate::Replace, combine: Combine::Mean, na_when_missing: false },
    FeatureSpec { name: "road", accumulate: Accumulate::Sum, combine: Combine::Sum, na_when_missing: false },
    FeatureSpec { name: "nb_pt", accumulate: Accumulate::Sum, combine: Combine::Sum, na_when_missing: false },
    FeatureSpec { name: "work_or_edu_fac", accumulate: Accumulate::Sum, combine: Combine::Sum, na_when_missing: false },
    FeatureSpec { name: "other_fac", accumulate: Accumulate::Sum, combine: Combine::Sum, na_when_missing: false },
    FeatureSpec { name: "cars_per_persons", accumulate: Accumulate::Ratio, combine: Combine::Mean, na_when_missing: true },
    FeatureSpec { name: "big_road", accumulate: Accumulate::Sum, combine: Combine::Sum, na_when_missing: false },
];

/// Baseline emission reference, present only on zone tables.
pub const ER_BASELINE: FeatureSpec = FeatureSpec {
    name: "er_bs",
    accumulate: Accumulate::Replace,
    combine: Combine::Baseline,
    na_when_missing: true,
};

pub fn unit_feature(name: &str) -> Option<&'static FeatureSpec> {
    UNIT_FEATURES.iter().find(|f| f.name == name)
}

pub fn unit_columns() -> Vec<&'static str> {
    UNIT_FEATURES.iter().map(|f| f.name).collect()
}

pub fn zone_columns() -> Vec<&'static str> {
    UNIT_FEATURES.iter().map(|f| f.name).chain([ER_BASELINE.name]).collect()
}
