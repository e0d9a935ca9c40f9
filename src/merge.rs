//! Config overlay: pick the config path, load it, and fill `from_config` slots.
//!
//! The path is the config option's command-line value, else its default.
//! Config-sourced values never apply to the config option itself since this
//! runs before any config is loaded. A path typed by the user must load; a
//! defaulted path that is missing or unreadable means an empty config.

use std::path::PathBuf;

use toml::Table;
use tracing::debug;

use crate::error::OptfigError;
use crate::file;
use crate::set::OptionSet;
use crate::slots::PendingTable;
use crate::types::DefaultValue;

/// Where the config path came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigPath {
    Explicit(PathBuf),
    Defaulted(PathBuf),
}

/// Select the config path for `option` by source precedence. An empty path
/// means no config.
pub fn select_config_path(pending: &PendingTable, option: &str) -> Option<ConfigPath> {
    let slots = pending.get(option)?;
    let selected = match (&slots.from_commandline, &slots.from_default) {
        (Some(cli), _) => ConfigPath::Explicit(PathBuf::from(cli.text())),
        (None, DefaultValue::Value(v)) => ConfigPath::Defaulted(PathBuf::from(v.to_string())),
        (None, DefaultValue::Required) => return None,
    };
    match &selected {
        ConfigPath::Explicit(p) | ConfigPath::Defaulted(p) if p.as_os_str().is_empty() => None,
        _ => Some(selected),
    }
}

/// Run the whole overlay step for the designated config option.
pub fn overlay_config(
    set: &mut OptionSet,
    pending: &mut PendingTable,
    option: &str,
    keep_option: bool,
) -> Result<(), OptfigError> {
    let selected = select_config_path(pending, option);
    if !keep_option {
        set.remove(option);
        pending.remove(option);
    }

    let table = match selected {
        Some(ConfigPath::Explicit(path)) => {
            debug!(path = %path.display(), "loading config");
            file::load_config_file(&path)?
        }
        Some(ConfigPath::Defaulted(path)) => {
            debug!(path = %path.display(), "loading default config");
            file::load_default_config_file(&path)?.unwrap_or_default()
        }
        None => {
            debug!(option, "no config path");
            return Ok(());
        }
    };

    merge_table(set, pending, table);
    Ok(())
}

/// Copy every key that names an option into its `from_config` slot.
/// Keys may use hyphens in place of underscores; other keys are ignored.
pub fn merge_table(set: &OptionSet, pending: &mut PendingTable, table: Table) {
    for (key, value) in table {
        let name = if set.contains(&key) {
            key
        } else {
            key.replace('-', "_")
        };
        if !set.contains(&name) || !pending.record_config(&name, value) {
            debug!(key = %name, "ignoring config key with no matching option");
        }
    }
}
