//! Typed option values and the coercion rules from each source into them.
//!
//! Command-line values arrive as text, config values as `toml::Value`, and
//! defaults as already-typed [`Value`]s. Every path ends in [`Value`] of the
//! option's declared [`OptionKind`]; anything that cannot be coerced yields a
//! reason string the resolver wraps into
//! [`OptfigError::InvalidValue`](crate::OptfigError::InvalidValue).

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::ser::{Serialize, Serializer};

use crate::types::OptionKind;

/// A resolved option value.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<String>),
    Pattern(Regex),
    Timestamp(DateTime<FixedOffset>),
}

impl Value {
    /// The runtime kind of this value, used for type inference.
    pub fn kind(&self) -> OptionKind {
        match self {
            Value::String(_) => OptionKind::String,
            Value::Integer(_) => OptionKind::Integer,
            Value::Float(_) => OptionKind::Float,
            Value::Boolean(_) => OptionKind::Boolean,
            Value::List(_) => OptionKind::StringArray,
            Value::Pattern(_) => OptionKind::Pattern,
            Value::Timestamp(_) => OptionKind::Timestamp,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Regex> {
        match self {
            Value::Pattern(re) => Some(re),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Convert an already-typed value to `kind`.
    ///
    /// Same-kind values pass through, integers widen to floats, strings are
    /// parsed with the text rules, and any scalar narrows to its display form
    /// when `kind` is `String`.
    pub(crate) fn coerce(self, kind: OptionKind) -> Result<Value, String> {
        if self.kind() == kind {
            return Ok(self);
        }
        match (self, kind) {
            (Value::Integer(i), OptionKind::Float) => Ok(Value::Float(i as f64)),
            (Value::String(s), kind) => parse_text(kind, &s),
            (Value::List(items), OptionKind::String) => Ok(Value::String(items.join(","))),
            (other, OptionKind::String) => Ok(Value::String(other.to_string())),
            (other, kind) => Err(format!("expected {kind}, got {}", other.kind())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => a.as_str() == b.as_str(),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::List(items) => f.write_str(&items.join(",")),
            Value::Pattern(re) => f.write_str(re.as_str()),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::List(items) => serializer.collect_seq(items),
            Value::Pattern(re) => serializer.serialize_str(re.as_str()),
            Value::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    &str => |v| Value::String(v.to_string()),
    String => |v| Value::String(v),
    i64 => |v| Value::Integer(v),
    i32 => |v| Value::Integer(i64::from(v)),
    u16 => |v| Value::Integer(i64::from(v)),
    u32 => |v| Value::Integer(i64::from(v)),
    f64 => |v| Value::Float(v),
    bool => |v| Value::Boolean(v),
    Vec<String> => |v| Value::List(v),
    Vec<&str> => |v| Value::List(v.into_iter().map(str::to_string).collect()),
    Regex => |v| Value::Pattern(v),
    DateTime<FixedOffset> => |v| Value::Timestamp(v),
    DateTime<Utc> => |v| Value::Timestamp(v.fixed_offset()),
}

/// Parse command-line text into a value of `kind`.
pub(crate) fn parse_text(kind: OptionKind, text: &str) -> Result<Value, String> {
    match kind {
        OptionKind::String => Ok(Value::String(text.to_string())),
        OptionKind::Integer => text
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("'{text}' is not an integer")),
        OptionKind::Float => text
            .trim()
            .replace('_', "")
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("'{text}' is not a number")),
        OptionKind::Boolean => parse_bool(text)
            .map(Value::Boolean)
            .ok_or_else(|| format!("'{text}' is not a boolean")),
        OptionKind::StringArray => Ok(Value::List(split_list(text))),
        OptionKind::Pattern => Regex::new(text)
            .map(Value::Pattern)
            .map_err(|e| e.to_string()),
        OptionKind::Timestamp => parse_timestamp(text).map(Value::Timestamp),
    }
}

/// Build a value of `kind` from repeated command-line occurrences.
pub(crate) fn from_list(kind: OptionKind, items: &[String]) -> Result<Value, String> {
    match kind {
        OptionKind::StringArray => Ok(Value::List(items.to_vec())),
        // Scalars take the last occurrence.
        other => match items.last() {
            Some(last) => parse_text(other, last),
            None => Err("no value given".to_string()),
        },
    }
}

/// Convert a config-file value into a value of `kind`.
pub(crate) fn from_toml(kind: OptionKind, value: &toml::Value) -> Result<Value, String> {
    match (value, kind) {
        (toml::Value::String(s), kind) => parse_text(kind, s),
        (toml::Value::Integer(i), OptionKind::Integer) => Ok(Value::Integer(*i)),
        (toml::Value::Integer(i), OptionKind::Float) => Ok(Value::Float(*i as f64)),
        (toml::Value::Float(x), OptionKind::Float) => Ok(Value::Float(*x)),
        (toml::Value::Boolean(b), OptionKind::Boolean) => Ok(Value::Boolean(*b)),
        (toml::Value::Array(items), OptionKind::StringArray) => items
            .iter()
            .map(|item| {
                toml_scalar(item)
                    .ok_or_else(|| "nested arrays and tables are not supported".to_string())
            })
            .collect::<Result<Vec<_>, String>>()
            .map(Value::List),
        (toml::Value::Array(_) | toml::Value::Table(_), kind) => {
            Err(format!("expected {kind}, got a {}", value.type_str()))
        }
        (scalar, kind) => match toml_scalar(scalar) {
            Some(text) => parse_text(kind, &text),
            None => Err(format!("expected {kind}, got a {}", value.type_str())),
        },
    }
}

/// Text form of a scalar config value; `None` for arrays and tables.
pub(crate) fn toml_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(x) => Some(x.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn split_list(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(',').map(str::to_string).collect()
}

fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, String> {
    let trimmed = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc().fixed_offset());
    }
    Err(format!("'{text}' is not a timestamp"))
}
