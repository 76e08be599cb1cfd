use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Parses a folder-name value. Only pure digit strings become integers.
    pub fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(v) = raw.parse::<i64>() {
                return Self::Int(v);
            }
        }
        Self::Text(raw.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Rendering used on the simulator command line.
    pub fn to_arg(&self) -> String {
        match self {
            Self::Bool(true) => "true".to_string(),
            Self::Bool(false) => "false".to_string(),
            other => other.to_string(),
        }
    }
}

// Folder names keep the capitalised booleans of existing result trees (use-torch-lm=False)
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Parameters recovered from a `key=value/...` result path.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioParams {
    pub path: PathBuf,
    values: BTreeMap<String, ParamValue>,
}

impl ScenarioParams {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut values = BTreeMap::new();

        for segment in path.to_string_lossy().split('/') {
            if let Some((key, value)) = segment.split_once('=') {
                values.insert(key.to_string(), ParamValue::parse(value));
            }
        }

        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn int(&self, key: &str) -> Result<i64> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| anyhow!("Missing parameter '{}' in {}", key, self.path.display()))?;

        value.as_int().ok_or_else(|| {
            anyhow!(
                "Parameter '{}' in {} is not an integer: {}",
                key,
                self.path.display(),
                value
            )
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
