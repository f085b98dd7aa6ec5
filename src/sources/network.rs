use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::{attribute_value, require_attribute};
use crate::aggregate::UnitAggregator;
use crate::common::fs::open_maybe_gzip;
use crate::resolve::LinkIndex;

/// Road classes whose links count toward `big_road`.
pub const MAJOR_ROAD_CLASSES: &[&str] =
    &["motorway", "motorway_link", "motorway_junction", "trunk", "trunk_link"];

const HIGHWAY_ATTRIBUTE: &str = "osm:way:highway";

/// Sums every link's length (metres) into its owning commune's `road`
/// total, from the link-to-length JSON mapping.
pub fn load_road_lengths(agg: &mut UnitAggregator, path: &Path, links: &LinkIndex) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read link lengths {}", path.display()))?;
    let lengths: BTreeMap<String, f64> = serde_json::from_str(&text)
        .with_context(|| format!("malformed link lengths {}", path.display()))?;

    for (link, length) in &lengths {
        let insee = links.resolve(link)?.clone();
        agg.record(&insee, "road", *length)?;
    }
    debug!(links = lengths.len(), "summed link lengths");
    Ok(())
}

/// Scans the MATSim network and sums the length of motorway and trunk
/// links into `big_road`. A link with no declared `osm:way:highway`
/// class contributes nothing.
pub fn load_major_roads(agg: &mut UnitAggregator, path: &Path, links: &LinkIndex) -> Result<()> {
    let mut reader = Reader::from_reader(open_maybe_gzip(path)?);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut current: Option<(String, f64)> = None;
    let mut current_class: Option<String> = None;
    let mut capture_class = false;
    let mut seen = 0usize;
    let mut major = 0usize;

    loop {
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed network XML {}", path.display()))?
        {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"link" => {
                    let id = require_attribute(e, "id", path)?;
                    let length: f64 = require_attribute(e, "length", path)?
                        .parse()
                        .with_context(|| format!("link {id}: malformed length"))?;
                    current = Some((id, length));
                    current_class = None;
                    seen += 1;
                }
                b"attribute" => {
                    capture_class = current.is_some()
                        && attribute_value(e, "name")?.as_deref() == Some(HIGHWAY_ATTRIBUTE);
                }
                _ => {}
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"link" => {
                // self-closing link: no nested attributes, never major
                seen += 1;
            }
            Event::Text(ref t) if capture_class => {
                current_class = Some(t.unescape()?.trim().to_string());
                capture_class = false;
            }
            Event::End(ref e) if e.local_name().as_ref() == b"attribute" => {
                capture_class = false;
            }
            Event::End(ref e) if e.local_name().as_ref() == b"link" => {
                if let Some((id, length)) = current.take() {
                    let is_major = current_class
                        .as_deref()
                        .is_some_and(|class| MAJOR_ROAD_CLASSES.contains(&class));
                    if is_major {
                        let insee = links.resolve(&id)?.clone();
                        agg.record(&insee, "big_road", length)?;
                        major += 1;
                    }
                }
                current_class = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    debug!(links = seen, major, "scanned network for major roads");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Insee, Value};

    fn index() -> LinkIndex {
        LinkIndex::from_pairs([
            ("a1".to_string(), Insee::new("75056")),
            ("a2".to_string(), Insee::new("75056")),
            ("b1".to_string(), Insee::new("77433")),
            ("out".to_string(), Insee::new("outside")),
        ])
    }

    #[test]
    fn road_sums_lengths_per_commune() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links_len.json");
        std::fs::write(&path, r#"{"a1": 100.0, "a2": 50.5, "b1": 10.0, "out": 7.0}"#).unwrap();

        let mut agg = UnitAggregator::new();
        load_road_lengths(&mut agg, &path, &index()).unwrap();

        assert_eq!(agg.value(&Insee::new("75056"), "road"), Some(Value::Num(150.5)));
        assert_eq!(agg.value(&Insee::new("77433"), "road"), Some(Value::Num(10.0)));
        // outside links are tracked like the rest; exclusion happens at emission
        assert_eq!(agg.value(&Insee::new("outside"), "road"), Some(Value::Num(7.0)));
    }

    #[test]
    fn unmapped_link_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links_len.json");
        std::fs::write(&path, r#"{"nope": 1.0}"#).unwrap();

        let mut agg = UnitAggregator::new();
        let err = load_road_lengths(&mut agg, &path, &index()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::Error>(),
            Some(crate::error::Error::UnresolvedKey(link)) if link == "nope"
        ));
    }

    #[test]
    fn big_road_counts_only_declared_major_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.xml");
        std::fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<network>
<links>
<link id="a1" length="100.0">
 <attributes>
  <attribute name="osm:way:highway" class="java.lang.String">motorway</attribute>
 </attributes>
</link>
<link id="a2" length="50.5">
 <attributes>
  <attribute name="osm:way:highway" class="java.lang.String">residential</attribute>
 </attributes>
</link>
<link id="b1" length="10.0">
 <attributes>
  <attribute name="osm:way:highway" class="java.lang.String">trunk_link</attribute>
 </attributes>
</link>
<link id="out" length="7.0"/>
</links>
</network>
"#,
        )
        .unwrap();

        let mut agg = UnitAggregator::new();
        load_major_roads(&mut agg, &path, &index()).unwrap();

        assert_eq!(agg.value(&Insee::new("75056"), "big_road"), Some(Value::Num(100.0)));
        assert_eq!(agg.value(&Insee::new("77433"), "big_road"), Some(Value::Num(10.0)));
        // the classless self-closing link contributes nothing
        assert_eq!(agg.value(&Insee::new("outside"), "big_road"), None);
    }
}
