use std::path::Path;

use anyhow::Result;
use polars::prelude::{Column, NamedFrom, Series};
use tracing::info;

use crate::aggregate::UnitAggregator;
use crate::cli::{Cli, DatasetArgs, SplitArgs};
use crate::common::fs::ensure_dir_exists;
use crate::common::io::csv;
use crate::config::DataPaths;
use crate::features::{zone_columns, ID_COLUMN};
use crate::matrix::{self, DatasetSpec};
use crate::resolve::LinkIndex;
use crate::sources;
use crate::split::{stratified_split, Partition, Split};
use crate::table::Table;
use crate::zones::{read_zone_composition, roll_up, BaselineStore, Zone};

/// Build the per-commune feature table from every source.
pub fn units(cli: &Cli) -> Result<()> {
    let paths = DataPaths::load(&cli.config)?;
    paths.validate_unit_inputs()?;

    let links = LinkIndex::from_json(&paths.link_communes_json)?;
    info!(links = links.len(), "loaded link-commune index");

    let mut agg = UnitAggregator::new();
    // density derives from area, so geometry runs before population
    sources::load_commune_areas(&mut agg, &paths.communes_shapefile)?;
    sources::load_population(&mut agg, &paths.population_csv)?;
    sources::load_road_lengths(&mut agg, &paths.link_lengths_json, &links)?;
    sources::load_transit_stops(&mut agg, &paths.transit_schedule_xml, &links)?;
    sources::load_facilities(&mut agg, &paths.facilities_xml, &links)?;
    sources::load_survey(&mut agg, &paths.household_survey_csv)?;
    sources::load_major_roads(&mut agg, &paths.network_xml, &links)?;

    let table = agg.finish()?;
    table.write_csv(&paths.communes_table)?;
    info!(
        communes = table.len(),
        out = %paths.communes_table.display(),
        "wrote commune table"
    );
    Ok(())
}

/// Roll the commune table up to fused zones.
pub fn zones(cli: &Cli) -> Result<()> {
    let paths = DataPaths::load(&cli.config)?;
    paths.validate_zone_inputs()?;

    let units = Table::read_csv(&paths.communes_table)?;
    let zones = read_zone_composition(&paths.zone_composition)?;
    let store = BaselineStore::new(&paths.baseline_root);

    let table = roll_up(&units, &zones, &store)?;
    table.write_csv(&paths.zones_table)?;
    info!(
        zones = table.len(),
        out = %paths.zones_table.display(),
        "wrote zone table"
    );
    Ok(())
}

/// Emit the deterministic train/test assignment as a two-column table.
pub fn split(cli: &Cli, args: &SplitArgs) -> Result<()> {
    let paths = DataPaths::load(&cli.config)?;
    paths.validate_split_inputs()?;

    let zones = read_zone_composition(&paths.zone_composition)?;
    let split = stratified_split(&zones);

    let out = args.output.clone().unwrap_or_else(|| "./split.csv".into());
    write_assignment(&out, &zones, &split)?;
    info!(
        train = split.train().len(),
        test = split.test().len(),
        out = %out.display(),
        "wrote train/test assignment"
    );
    Ok(())
}

fn write_assignment(path: &Path, zones: &[Zone], split: &Split) -> Result<()> {
    let mut codes = Vec::with_capacity(zones.len());
    let mut partitions = Vec::with_capacity(zones.len());
    for zone in zones {
        let partition = match split.partition_of(&zone.code) {
            Some(Partition::Test) => "test",
            _ => "train",
        };
        codes.push(zone.code.as_str().to_string());
        partitions.push(partition.to_string());
    }
    let columns: Vec<Column> = vec![
        Series::new(ID_COLUMN.into(), codes).into(),
        Series::new("partition".into(), partitions).into(),
    ];
    csv::write_columns(path, columns)
}

/// Project the zone table and the results table into train/test matrices.
pub fn dataset(cli: &Cli, args: &DatasetArgs) -> Result<()> {
    let paths = DataPaths::load(&cli.config)?;
    paths.validate_dataset_inputs()?;

    let data = Table::read_csv(&paths.zones_table)?;
    let results = Table::read_csv(&paths.results_csv)?;
    let zones = read_zone_composition(&paths.zone_composition)?;
    let split = stratified_split(&zones);

    let features = if args.features.is_empty() {
        zone_columns().iter().map(|s| s.to_string()).collect()
    } else {
        args.features.clone()
    };
    let spec = DatasetSpec {
        features,
        targets: args.targets.clone(),
        standardize_features: args.norm_features,
        standardize_targets: args.norm_targets,
    };
    let dataset = matrix::build(&data, &results, &split, &spec)?;

    ensure_dir_exists(&args.out_dir)?;
    matrix::write_matrix(&args.out_dir.join("x_train.csv"), &spec.features, &dataset.x_train)?;
    matrix::write_matrix(&args.out_dir.join("x_test.csv"), &spec.features, &dataset.x_test)?;
    matrix::write_matrix(&args.out_dir.join("y_train.csv"), &spec.targets, &dataset.y_train)?;
    matrix::write_matrix(&args.out_dir.join("y_test.csv"), &spec.targets, &dataset.y_test)?;
    info!(
        train = dataset.train_codes.len(),
        test = dataset.test_codes.len(),
        out = %args.out_dir.display(),
        "wrote dataset matrices"
    );
    Ok(())
}
