use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::require_attribute;
use crate::aggregate::UnitAggregator;
use crate::common::fs::open_maybe_gzip;
use crate::resolve::LinkIndex;

/// Counts public-transport stops per commune: every stop facility in the
/// transit schedule references the network link it sits on, which
/// resolves to a commune.
pub fn load_transit_stops(agg: &mut UnitAggregator, path: &Path, links: &LinkIndex) -> Result<()> {
    let mut reader = Reader::from_reader(open_maybe_gzip(path)?);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stops = 0usize;
    loop {
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed transit schedule {}", path.display()))?
        {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"stopFacility" =>
            {
                let link = require_attribute(e, "linkRefId", path)?;
                let insee = links.resolve(&link)?.clone();
                agg.record(&insee, "nb_pt", 1.0)?;
                stops += 1;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    debug!(stops, "counted transit stops");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Insee, Value};

    #[test]
    fn counts_stops_per_commune() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.xml");
        std::fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<transitSchedule>
 <transitStops>
  <stopFacility id="s1" x="0" y="0" linkRefId="a1"/>
  <stopFacility id="s2" x="0" y="0" linkRefId="a1"/>
  <stopFacility id="s3" x="0" y="0" linkRefId="b1"/>
 </transitStops>
</transitSchedule>
"#,
        )
        .unwrap();

        let links = LinkIndex::from_pairs([
            ("a1".to_string(), Insee::new("75056")),
            ("b1".to_string(), Insee::new("77433")),
        ]);
        let mut agg = UnitAggregator::new();
        load_transit_stops(&mut agg, &path, &links).unwrap();

        assert_eq!(agg.value(&Insee::new("75056"), "nb_pt"), Some(Value::Num(2.0)));
        assert_eq!(agg.value(&Insee::new("77433"), "nb_pt"), Some(Value::Num(1.0)));
    }
}
