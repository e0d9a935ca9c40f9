//! Config resource loading.
//!
//! A config resource is a flat key/value file. The format follows the
//! extension: `.json` is read with `serde_json`, `.yaml`/`.yml` with
//! `serde-saphyr`, and everything else is TOML. All of them land in a
//! `toml::Table` so the overlay sees one shape.
//!
//! There are two loading policies, picked by where the path came from:
//!
//! - [`load_config_file`] for a path the user passed explicitly. Any failure
//!   is fatal.
//! - [`load_default_config_file`] for a path that came from the option's
//!   default. A missing or unreadable file means "no config"; a file that
//!   reads fine but does not parse is still an error.

use std::path::{Path, PathBuf};

use toml::Table;
use tracing::debug;

use crate::error::OptfigError;

/// Load a config file that must exist.
pub fn load_config_file(path: &Path) -> Result<Table, OptfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| OptfigError::ConfigLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(path, &content)
}

/// Load a config file that may be absent. `Ok(None)` when it cannot be read.
pub fn load_default_config_file(path: &Path) -> Result<Option<Table>, OptfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(path, &content).map(Some),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "default config not readable, skipping");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension() else {
            return Format::Toml;
        };
        if ext.eq_ignore_ascii_case("json") {
            Format::Json
        } else if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Format::Yaml
        } else {
            Format::Toml
        }
    }
}

/// Parse config content, choosing the format by file extension.
pub fn parse_config(path: &Path, content: &str) -> Result<Table, OptfigError> {
    let parsed = match Format::from_path(path) {
        Format::Toml => toml::from_str::<Table>(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str::<Table>(content).map_err(|e| e.to_string()),
        Format::Yaml => serde_saphyr::from_str_with_options::<Table>(
            content,
            serde_saphyr::Options {
                strict_booleans: true,
                ..serde_saphyr::Options::default()
            },
        )
        .map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| OptfigError::ConfigParse {
        path: path.to_path_buf(),
        reason,
    })
}

/// `<platform config dir>/<app_name>.toml`, e.g. `~/.config/myapp/myapp.toml`
/// on Linux. `None` when no home directory can be determined.
pub fn platform_config_path(app_name: &str) -> Option<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", app_name)?;
    Some(proj.config_dir().join(format!("{app_name}.toml")))
}
