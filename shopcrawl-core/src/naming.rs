use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Directory name -> output identifier lookup.
///
/// Unknown names are transliterated mechanically (spaces and hyphens become
/// underscores) and reported with a warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMap {
    entries: BTreeMap<String, String>,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, identifier: &str) {
        self.entries.insert(name.to_string(), identifier.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, name: &str) -> String {
        match self.get(name) {
            Some(identifier) => identifier.to_string(),
            None => {
                let fallback = transliterate(name);
                warn!("No mapping for '{}', using '{}'", name, fallback);
                fallback
            }
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for NameMap {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut map = NameMap::new();
        for (name, identifier) in pairs {
            map.insert(name, identifier);
        }
        map
    }
}

pub fn transliterate(name: &str) -> String {
    name.trim().replace([' ', '-'], "_")
}
