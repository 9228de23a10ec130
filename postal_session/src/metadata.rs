//! Dataset metadata and validity links.
//!
//! A dataset's metadata names, for some labels, a companion validity series:
//! a point of the data series is valid iff the validity series is `0` at the
//! same timestamp. The mapping is a list of regular expressions over labels.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::debug;

/// Metadata loading failures.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The file could not be read.
    #[error("reading metadata: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid metadata JSON.
    #[error("parsing metadata: {0}")]
    Json(#[from] serde_json::Error),
    /// A `valid_map` entry maps to something other than a string.
    #[error("validity target for {0:?} is not a string")]
    InvalidValidityTarget(String),
}

/// Resolves the validity label of a data label.
pub trait ValidityLink: Send + Sync {
    /// Validity label conditioning `label`, if any.
    fn lookup(&self, label: &str) -> Option<String>;
}

impl ValidityLink for HashMap<String, String> {
    fn lookup(&self, label: &str) -> Option<String> {
        self.get(label).cloned()
    }
}

#[derive(Debug, Clone)]
enum Pattern {
    Regex(Regex),
    Literal(String),
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    target: String,
}

impl Rule {
    fn new(key: &str, target: &str) -> Self {
        let pattern = match Regex::new(&format!("^(?:{key})$")) {
            Ok(re) => Pattern::Regex(re),
            Err(e) => {
                debug!(key, error = %e, "validity key is not a regex, matching literally");
                Pattern::Literal(key.to_owned())
            }
        };
        Self {
            pattern,
            target: backrefs_to_dollar(target),
        }
    }

    fn apply(&self, label: &str) -> Option<String> {
        match &self.pattern {
            Pattern::Literal(key) => (key == label).then(|| self.target.clone()),
            Pattern::Regex(re) => {
                if !re.is_match(label) {
                    return None;
                }
                let substituted = re.replace(label, self.target.as_str());
                if substituted == label {
                    Some(self.target.clone())
                } else {
                    Some(substituted.into_owned())
                }
            }
        }
    }
}

/// `\1` style group references become `${1}`.
fn backrefs_to_dollar(target: &str) -> String {
    let mut out = String::with_capacity(target.len());
    let mut chars = target.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(d);
                chars.next();
            }
            if digits.is_empty() {
                out.push(c);
            } else {
                out.push_str("${");
                out.push_str(&digits);
                out.push('}');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Ordered validity rules. The first key that matches the whole label wins.
#[derive(Debug, Clone, Default)]
pub struct ValidityMap {
    rules: Vec<Rule>,
}

impl ValidityMap {
    /// Empty map; no label has a validity series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. `key` is a regular expression over the whole label
    /// (matched literally if it does not compile); `target` may reference
    /// capture groups as `$1` or `\1`.
    pub fn push(&mut self, key: &str, target: &str) {
        self.rules.push(Rule::new(key, target));
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for ValidityMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValidityMap::new();
        for (key, target) in iter {
            map.push(key.as_ref(), target.as_ref());
        }
        map
    }
}

impl ValidityLink for ValidityMap {
    fn lookup(&self, label: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(label))
    }
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(default)]
    valid_map: Map<String, JsonValue>,
}

/// The parts of dataset metadata a session uses.
#[derive(Debug, Clone, Default)]
pub struct DatasetMetadata {
    /// Validity links, in document order.
    pub validity: ValidityMap,
}

impl DatasetMetadata {
    /// Parse a metadata document. Unknown fields are ignored.
    pub fn from_json(content: &str) -> Result<Self, MetadataError> {
        let raw: RawMetadata = serde_json::from_str(content)?;
        let mut validity = ValidityMap::new();
        for (key, target) in &raw.valid_map {
            let target = target
                .as_str()
                .ok_or_else(|| MetadataError::InvalidValidityTarget(key.clone()))?;
            validity.push(key, target);
        }
        Ok(Self { validity })
    }

    /// Read and parse a metadata file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
