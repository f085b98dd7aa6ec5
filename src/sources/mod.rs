//! Source adapters. Each consumes one external source and folds
//! (commune, feature, value) observations into the aggregator; every
//! adapter writes a disjoint set of feature names and can be replayed
//! against a fresh aggregator. Ordering matters once: population derives
//! density from area, so the geometry pass must run first.

use std::path::Path;

use anyhow::{anyhow, Result};
use quick_xml::events::BytesStart;

mod facilities;
mod geometry;
mod network;
mod population;
mod survey;
mod transit;

pub use facilities::load_facilities;
pub use geometry::load_commune_areas;
pub use network::{load_major_roads, load_road_lengths, MAJOR_ROAD_CLASSES};
pub use population::load_population;
pub use survey::load_survey;
pub use transit::load_transit_stops;

pub(crate) fn attribute_value(event: &BytesStart, key: &str) -> Result<Option<String>> {
    for attr in event.attributes().with_checks(false) {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

pub(crate) fn require_attribute(event: &BytesStart, key: &str, path: &Path) -> Result<String> {
    attribute_value(event, key)?.ok_or_else(|| {
        anyhow!(
            "{}: <{}> element without a `{key}` attribute",
            path.display(),
            String::from_utf8_lossy(event.name().as_ref())
        )
    })
}
