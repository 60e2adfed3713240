//! Tag access helper

use std::collections::BTreeMap;

/// Key → value tags of one way, with the accessors the labelers need.
#[derive(Debug, Clone, Default)]
pub struct WayTags {
    tags: BTreeMap<String, String>,
}

impl WayTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            tags: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }
}

/// Tag values that mean "yes".
pub fn is_affirmative(value: &str) -> bool {
    matches!(value, "yes" | "true" | "1")
}
