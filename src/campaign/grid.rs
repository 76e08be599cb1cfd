use crate::scenario::ParamValue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One concrete parameter combination, in grid order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamSet(pub Vec<(String, ParamValue)>);

impl ParamSet {
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ParamValue)> {
        self.0.iter()
    }

    /// Simulator arguments, `--key=value`.
    pub fn to_args(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(k, v)| format!("--{}={}", k, v.to_arg()))
            .collect()
    }
}

/// Ordered mapping of parameter name to candidate values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamGrid(Vec<(String, Vec<ParamValue>)>);

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter, keeping its original position.
    pub fn with<V: Into<ParamValue>>(mut self, key: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<ParamValue> = values.into_iter().map(Into::into).collect();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = values,
            None => self.0.push((key.to_string(), values)),
        }
        self
    }

    pub fn fixed(self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.with(key, [value.into()])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Cartesian product; the last key varies fastest.
    pub fn combinations(&self) -> Vec<ParamSet> {
        let mut result = vec![ParamSet::default()];
        for (key, values) in &self.0 {
            let mut next = Vec::with_capacity(result.len() * values.len());
            for partial in &result {
                for value in values {
                    let mut set = partial.clone();
                    set.0.push((key.clone(), value.clone()));
                    next.push(set);
                }
            }
            result = next;
        }
        result
    }

    /// True when every key of this grid is set to one of its values in `set`.
    pub fn matches(&self, set: &ParamSet) -> bool {
        self.0
            .iter()
            .all(|(key, values)| set.get(key).is_some_and(|v| values.contains(v)))
    }

    /// `key=value/...` path of `set` restricted to this grid's keys.
    pub fn folder(&self, set: &ParamSet) -> PathBuf {
        self.0
            .iter()
            .filter_map(|(key, _)| set.get(key).map(|v| segment(key, v)))
            .collect()
    }
}

/// One `key=value` path component. Slashes in values (trace files such as
/// `/dev/null`) would otherwise nest directories.
pub fn segment(key: &str, value: &ParamValue) -> String {
    format!("{}={}", key, value).replace('/', "%2F")
}
