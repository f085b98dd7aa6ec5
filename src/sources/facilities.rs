use std::path::Path;

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::{attribute_value, require_attribute};
use crate::aggregate::UnitAggregator;
use crate::common::fs::open_maybe_gzip;
use crate::resolve::LinkIndex;
use crate::types::Insee;

/// Classifies each facility by its first declared activity: work and
/// education facilities count apart from the rest.
pub fn load_facilities(agg: &mut UnitAggregator, path: &Path, links: &LinkIndex) -> Result<()> {
    let mut reader = Reader::from_reader(open_maybe_gzip(path)?);
    reader.trim_text(true);

    let mut buf = Vec::new();
    // commune of the open <facility>, cleared once its first activity counts
    let mut pending: Option<Insee> = None;
    let mut facilities = 0usize;
    loop {
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed facilities XML {}", path.display()))?
        {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"facility" => {
                    let link = require_attribute(e, "linkId", path)?;
                    pending = Some(links.resolve(&link)?.clone());
                }
                b"activity" => {
                    if let Some(insee) = pending.take() {
                        let kind = require_attribute(e, "type", path)?;
                        record_facility(agg, &insee, &kind)?;
                        facilities += 1;
                    }
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"facility" => {
                    let id = attribute_value(e, "id")?.unwrap_or_else(|| "?".into());
                    bail!("{}: facility {id} has no activity type", path.display());
                }
                b"activity" => {
                    if let Some(insee) = pending.take() {
                        let kind = require_attribute(e, "type", path)?;
                        record_facility(agg, &insee, &kind)?;
                        facilities += 1;
                    }
                }
                _ => {}
            },
            Event::End(ref e) if e.local_name().as_ref() == b"facility" => {
                if pending.take().is_some() {
                    bail!("{}: facility without an activity type", path.display());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    debug!(facilities, "classified facilities");
    Ok(())
}

fn record_facility(agg: &mut UnitAggregator, insee: &Insee, kind: &str) -> Result<()> {
    let feature = if kind == "work" || kind == "education" {
        "work_or_edu_fac"
    } else {
        "other_fac"
    };
    agg.record(insee, feature, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn links() -> LinkIndex {
        LinkIndex::from_pairs([
            ("a1".to_string(), Insee::new("75056")),
            ("b1".to_string(), Insee::new("77433")),
        ])
    }

    #[test]
    fn first_activity_decides_the_class() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facilities.xml");
        std::fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<facilities>
 <facility id="f1" linkId="a1" x="0" y="0">
  <activity type="work"/>
  <activity type="leisure"/>
 </facility>
 <facility id="f2" linkId="a1" x="0" y="0">
  <activity type="shop"/>
 </facility>
 <facility id="f3" linkId="b1" x="0" y="0">
  <activity type="education"/>
 </facility>
</facilities>
"#,
        )
        .unwrap();

        let mut agg = UnitAggregator::new();
        load_facilities(&mut agg, &path, &links()).unwrap();

        assert_eq!(agg.value(&Insee::new("75056"), "work_or_edu_fac"), Some(Value::Num(1.0)));
        assert_eq!(agg.value(&Insee::new("75056"), "other_fac"), Some(Value::Num(1.0)));
        assert_eq!(agg.value(&Insee::new("77433"), "work_or_edu_fac"), Some(Value::Num(1.0)));
    }

    #[test]
    fn facility_without_activity_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facilities.xml");
        std::fs::write(
            &path,
            r#"<facilities><facility id="f1" linkId="a1" x="0" y="0"/></facilities>"#,
        )
        .unwrap();

        let mut agg = UnitAggregator::new();
        assert!(load_facilities(&mut agg, &path, &links()).is_err());
    }
}
