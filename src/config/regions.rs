//! Region Directory
//! Maps short market codes to the display names used in chart titles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default code -> country mapping.
const DEFAULT_REGIONS: [(&str, &str); 17] = [
    ("at", "Austria"),
    ("be", "Belgium"),
    ("cz", "CzechRepublic"),
    ("dk", "Denmark"),
    ("fr", "France"),
    ("de", "Germany"),
    ("ie", "Ireland"),
    ("it", "Italy"),
    ("li", "Liechtenstein"),
    ("lu", "Luxembourg"),
    ("nl", "Netherlands"),
    ("pl", "Poland"),
    ("pt", "Portugal"),
    ("es", "Spain"),
    ("se", "Sweden"),
    ("ch", "Switzerland"),
    ("gb", "UK"),
];

/// Immutable lookup from region code to display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionDirectory {
    names: BTreeMap<String, String>,
}

impl Default for RegionDirectory {
    fn default() -> Self {
        DEFAULT_REGIONS.iter().copied().collect()
    }
}

impl<C: Into<String>, N: Into<String>> FromIterator<(C, N)> for RegionDirectory {
    fn from_iter<I: IntoIterator<Item = (C, N)>>(iter: I) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
        }
    }
}

impl RegionDirectory {
    /// A directory with no entries.
    pub fn empty() -> Self {
        Self {
            names: BTreeMap::new(),
        }
    }

    /// Display name for a region code, if known.
    pub fn display_name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.names.contains_key(code)
    }

    /// Known codes in sorted order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
