use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// The closed set of kinds an option value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    String,
    Integer,
    Float,
    Boolean,
    StringArray,
    Pattern,
    Timestamp,
}

impl OptionKind {
    /// Placeholder shown after the long flag in help output.
    pub fn placeholder(self) -> &'static str {
        match self {
            OptionKind::Integer | OptionKind::Float => "N",
            OptionKind::Boolean => "[BOOL]",
            OptionKind::StringArray => "VAL,..",
            OptionKind::Pattern => "REGEX",
            OptionKind::Timestamp => "T",
            OptionKind::String => "VAL",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, OptionKind::Integer | OptionKind::Float)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionKind::String => "string",
            OptionKind::Integer => "integer",
            OptionKind::Float => "float",
            OptionKind::Boolean => "boolean",
            OptionKind::StringArray => "array",
            OptionKind::Pattern => "pattern",
            OptionKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// Parses kind names, including the legacy integer aliases.
impl FromStr for OptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(OptionKind::String),
            "integer" | "int" | "fixnum" | "bignum" => Ok(OptionKind::Integer),
            "float" => Ok(OptionKind::Float),
            "boolean" | "bool" => Ok(OptionKind::Boolean),
            "array" | "list" => Ok(OptionKind::StringArray),
            "pattern" | "regexp" | "regex" => Ok(OptionKind::Pattern),
            "timestamp" | "time" => Ok(OptionKind::Timestamp),
            other => Err(format!("unknown option kind '{other}'")),
        }
    }
}

/// How an option's single-character alias is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortFlag {
    /// Derived from the first character of the option name.
    #[default]
    Auto,
    Explicit(char),
    Suppressed,
}

/// The compiled-in fallback for an option.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Value(Value),
    /// No default exists; a value must come from the command line or config.
    Required,
}

impl DefaultValue {
    pub fn is_required(&self) -> bool {
        matches!(self, DefaultValue::Required)
    }
}

/// Whether options may follow positional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Options are accepted anywhere on the command line.
    #[default]
    Permute,
    /// Option processing stops at the first positional argument.
    InOrder,
}
