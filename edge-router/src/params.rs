use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

/// Name under which wildcard captures are stored.
pub const WILDCARD: &str = "_";

/// Parameters captured by a successful pattern match.
///
/// Names keep the order in which they first matched. A name that appears
/// more than once in a pattern collects every captured value.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(IndexMap<String, Vec<String>>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// First value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Values captured by wildcards, in order.
    pub fn wildcards(&self) -> &[String] {
        self.get_all(WILDCARD)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over names paired with their first value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.first().map(|v| (k.as_str(), v.as_str())))
    }

    /// Flattens to one value per name, keeping the first capture.
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
