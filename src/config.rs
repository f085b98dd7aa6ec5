use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::common::fs::require_file_exists;

/// Input and output locations for every pipeline stage, loaded from one
/// JSON file so a run is reproducible from a single artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataPaths {
    /// Commune shapefile (`insee` and `st_areasha` attributes).
    pub communes_shapefile: PathBuf,
    /// Communal population table (semicolon CSV).
    pub population_csv: PathBuf,
    /// Link id → commune JSON mapping.
    pub link_communes_json: PathBuf,
    /// Link id → length (m) JSON mapping.
    pub link_lengths_json: PathBuf,
    /// MATSim network XML, optionally gzipped.
    pub network_xml: PathBuf,
    /// MATSim transit schedule XML.
    pub transit_schedule_xml: PathBuf,
    /// MATSim facilities XML.
    pub facilities_xml: PathBuf,
    /// Household travel survey (comma CSV).
    pub household_survey_csv: PathBuf,
    /// Fused-zone composition file.
    pub zone_composition: PathBuf,
    /// Root of the per-zone external emission results.
    pub baseline_root: PathBuf,
    /// External per-zone regression targets (semicolon CSV).
    pub results_csv: PathBuf,
    /// Output: commune feature table.
    pub communes_table: PathBuf,
    /// Output: zone feature table.
    pub zones_table: PathBuf,
}

impl DataPaths {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("malformed config {}", path.display()))
    }

    /// Inputs the commune aggregation stage reads. Checked before any
    /// work so a typo fails in milliseconds, not after the network scan.
    pub fn validate_unit_inputs(&self) -> Result<()> {
        for path in [
            &self.communes_shapefile,
            &self.population_csv,
            &self.link_communes_json,
            &self.link_lengths_json,
            &self.network_xml,
            &self.transit_schedule_xml,
            &self.facilities_xml,
            &self.household_survey_csv,
        ] {
            require_file_exists(path)?;
        }
        Ok(())
    }

    /// Inputs the zone roll-up stage reads. The baseline root is a
    /// directory whose per-zone artifacts may legitimately be absent.
    pub fn validate_zone_inputs(&self) -> Result<()> {
        require_file_exists(&self.communes_table)?;
        require_file_exists(&self.zone_composition)?;
        Ok(())
    }

    pub fn validate_split_inputs(&self) -> Result<()> {
        require_file_exists(&self.zone_composition)
    }

    pub fn validate_dataset_inputs(&self) -> Result<()> {
        require_file_exists(&self.zones_table)?;
        require_file_exists(&self.results_csv)?;
        require_file_exists(&self.zone_composition)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn missing_input_is_reported_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths {
            communes_shapefile: dir.path().join("communes.shp"),
            population_csv: dir.path().join("pop.csv"),
            link_communes_json: dir.path().join("all_links.json"),
            link_lengths_json: dir.path().join("links_len.json"),
            network_xml: dir.path().join("network.xml"),
            transit_schedule_xml: dir.path().join("schedule.xml"),
            facilities_xml: dir.path().join("facilities.xml"),
            household_survey_csv: dir.path().join("menages.csv"),
            zone_composition: dir.path().join("zones.txt"),
            baseline_root: dir.path().join("er"),
            results_csv: dir.path().join("results.csv"),
            communes_table: dir.path().join("data_communes.csv"),
            zones_table: dir.path().join("data_zones.csv"),
        };

        let err = paths.validate_unit_inputs().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingInput(path)) if path.ends_with("communes.shp")
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paths.json");
        let json = r#"{
            "communes_shapefile": "gis/communes.shp",
            "population_csv": "pop.csv",
            "link_communes_json": "all_links.json",
            "link_lengths_json": "links_len.json",
            "network_xml": "network.xml.gz",
            "transit_schedule_xml": "schedule.xml",
            "facilities_xml": "facilities.xml",
            "household_survey_csv": "menages.csv",
            "zone_composition": "zones.txt",
            "baseline_root": "er",
            "results_csv": "results.csv",
            "communes_table": "out/data_communes.csv",
            "zones_table": "out/data_zones.csv"
        }"#;
        std::fs::write(&path, json).unwrap();

        let paths = DataPaths::load(&path).unwrap();
        assert_eq!(paths.network_xml, PathBuf::from("network.xml.gz"));
        assert_eq!(paths.communes_table, PathBuf::from("out/data_communes.csv"));
    }
}
