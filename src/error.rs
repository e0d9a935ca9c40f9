use std::path::PathBuf;
use thiserror::Error;

/// Render an option name the way it appears on the command line.
pub(crate) fn long_flag(name: &str) -> String {
    name.replace('_', "-")
}

fn allowed_suffix(allowed: &Option<Vec<String>>) -> String {
    match allowed {
        Some(list) => format!(" (should be one of {})", list.join(",")),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum OptfigError {
    #[error("missing value for --{}", long_flag(.name))]
    MissingValue { name: String },

    #[error("invalid choice {value} for --{}{}", long_flag(.name), allowed_suffix(.allowed))]
    InvalidChoice {
        name: String,
        value: String,
        allowed: Option<Vec<String>>,
    },

    #[error("invalid value {value} for --{}: {reason}", long_flag(.name))]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("unknown option {token}")]
    UnknownOption { token: String },

    #[error("failed to read config {path}: {source}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("malformed declaration for '{name}': {reason}")]
    Malformed { name: String, reason: String },

    #[error("short flag -{flag} claimed by both '{first}' and '{second}'")]
    ShortFlagConflict {
        flag: char,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Cli(#[from] clap::Error),
}

impl OptfigError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        OptfigError::Malformed {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_formats_long_flag() {
        let err = OptfigError::MissingValue {
            name: "dry_run".into(),
        };
        assert_eq!(err.to_string(), "missing value for --dry-run");
    }

    #[test]
    fn invalid_choice_lists_allowed() {
        let err = OptfigError::InvalidChoice {
            name: "speed".into(),
            value: "medium".into(),
            allowed: Some(vec!["fast".into(), "slow".into()]),
        };
        assert_eq!(
            err.to_string(),
            "invalid choice medium for --speed (should be one of fast,slow)"
        );
    }

    #[test]
    fn invalid_choice_without_enumeration() {
        let err = OptfigError::InvalidChoice {
            name: "level".into(),
            value: "11".into(),
            allowed: None,
        };
        assert_eq!(err.to_string(), "invalid choice 11 for --level");
    }

    #[test]
    fn config_load_includes_path() {
        let err = OptfigError::ConfigLoad {
            path: "/missing/path".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/missing/path"));
    }
}
