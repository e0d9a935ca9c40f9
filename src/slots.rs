//! Per-option pending values, one slot per source.
//!
//! The table is owned by the parse pipeline and filled in three places: the
//! defaults when it is seeded, the command line after a successful parse,
//! and the config overlay. The resolver reads it once and never writes.

use indexmap::IndexMap;

use crate::set::OptionSet;
use crate::types::DefaultValue;

/// A value captured from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum CliValue {
    Single(String),
    /// Accumulated occurrences of an array option.
    Many(Vec<String>),
}

impl CliValue {
    /// The text of the value; repeated occurrences are comma-joined.
    pub fn text(&self) -> String {
        match self {
            CliValue::Single(s) => s.clone(),
            CliValue::Many(items) => items.join(","),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slots {
    pub from_commandline: Option<CliValue>,
    pub from_config: Option<toml::Value>,
    pub from_default: DefaultValue,
}

#[derive(Debug, Clone, Default)]
pub struct PendingTable {
    slots: IndexMap<String, Slots>,
}

impl PendingTable {
    /// One entry per option with only the default slot filled.
    pub fn seeded(set: &OptionSet) -> Self {
        let slots = set
            .iter()
            .map(|opt| {
                (
                    opt.name().to_string(),
                    Slots {
                        from_commandline: None,
                        from_config: None,
                        from_default: opt.default().clone(),
                    },
                )
            })
            .collect();
        Self { slots }
    }

    pub fn get(&self, name: &str) -> Option<&Slots> {
        self.slots.get(name)
    }

    pub fn record_commandline(&mut self, name: &str, value: CliValue) {
        if let Some(slots) = self.slots.get_mut(name) {
            slots.from_commandline = Some(value);
        }
    }

    /// Returns `false` when no option by that name exists.
    pub fn record_config(&mut self, name: &str, value: toml::Value) -> bool {
        match self.slots.get_mut(name) {
            Some(slots) => {
                slots.from_config = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.slots.shift_remove(name);
    }
}
