//! Result emission: the [`Resolved`] record handed back to callers.
//!
//! Maps every remaining option name to its resolved value, in declaration
//! order, alongside the residual arguments and any collected leftover flags.

use std::fmt;
use std::ops::Index;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::value::Value;

/// The outcome of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    values: IndexMap<String, Value>,
    residual: Vec<String>,
    leftovers: Vec<String>,
}

impl Resolved {
    pub(crate) fn new(
        values: IndexMap<String, Value>,
        residual: Vec<String>,
        leftovers: Vec<String>,
    ) -> Self {
        Self {
            values,
            residual,
            leftovers,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The value of a string option. An empty value supplied on the command
    /// line or in config stays `Some("")`; it is not treated as absent.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_integer()
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_float()
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.get(name)?.as_list()
    }

    pub fn pattern(&self, name: &str) -> Option<&Regex> {
        self.get(name)?.as_pattern()
    }

    pub fn timestamp(&self, name: &str) -> Option<&DateTime<FixedOffset>> {
        self.get(name)?.as_timestamp()
    }

    /// Name/value pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Positional arguments no option consumed, in order.
    pub fn residual(&self) -> &[String] {
        &self.residual
    }

    /// Unknown flags set aside in leftover mode, in the order they were met.
    pub fn leftovers(&self) -> &[String] {
        &self.leftovers
    }

    pub fn into_values(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl Index<&str> for Resolved {
    type Output = Value;

    /// Panics if `name` is not a resolved option.
    fn index(&self, name: &str) -> &Value {
        match self.values.get(name) {
            Some(value) => value,
            None => panic!("no resolved option named '{name}'"),
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}

/// Serializes as a flat map of option values; residual and leftovers are
/// not part of it.
impl Serialize for Resolved {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
