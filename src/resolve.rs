//! Key resolution between the network, survey, and commune keyspaces.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};

use crate::error::Error;
use crate::types::Insee;

/// Communes merged since the survey was collected: legacy code to
/// successor code. Applied wherever a commune code is read from the
/// household survey.
const MERGED_COMMUNES: &[(&str, &str)] = &[
    ("77028", "77433"),
    ("77166", "77316"),
    ("77299", "77316"),
    ("77399", "77504"),
    ("77491", "77316"),
    ("78251", "78551"),
    ("78524", "78158"),
    ("91182", "91228"),
    ("91222", "91390"),
    ("95259", "95040"),
];

/// Returns the post-merger code for a legacy commune, or the input
/// unchanged.
pub fn apply_merge_correction(code: &str) -> &str {
    MERGED_COMMUNES
        .iter()
        .find(|(legacy, _)| *legacy == code)
        .map(|(_, successor)| *successor)
        .unwrap_or(code)
}

/// Total mapping from network link id to owning commune.
pub struct LinkIndex {
    map: AHashMap<String, Insee>,
}

impl LinkIndex {
    /// Loads the link-to-commune JSON object. Each distinct commune code
    /// is interned once; ~1300 communes back millions of links.
    pub fn from_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read link mapping {}", path.display()))?;
        let raw: BTreeMap<String, String> = serde_json::from_str(&text)
            .with_context(|| format!("malformed link mapping {}", path.display()))?;

        let mut interned: AHashMap<String, Insee> = AHashMap::new();
        let mut map = AHashMap::with_capacity(raw.len());
        for (link, code) in raw {
            let insee = interned
                .entry(code.clone())
                .or_insert_with(|| Insee::new(&code))
                .clone();
            map.insert(link, insee);
        }
        Ok(Self { map })
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Insee)>) -> Self {
        Self { map: pairs.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Owning commune of a link; an unmapped link is fatal.
    pub fn resolve(&self, link: &str) -> Result<&Insee> {
        self.map
            .get(link)
            .ok_or_else(|| Error::UnresolvedKey(link.to_string()).into())
    }
}
