//! Value resolution: reduce each option's pending slots to one typed value.
//!
//! Operates on the pending table only, with no I/O. For each option, in
//! declaration order:
//!
//! 1. Select the first populated slot: command line, then config, then default
//! 2. A required default with nothing above it asks the missing-value handler,
//!    then fails with [`OptfigError::MissingValue`]
//! 3. Options with a choice set map the raw value through it
//! 4. Everything else is coerced to the option's declared kind
//!
//! The first failure stops resolution.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::OptfigError;
use crate::option::Opt;
use crate::set::OptionSet;
use crate::slots::{CliValue, PendingTable, Slots};
use crate::types::{DefaultValue, OptionKind};
use crate::value::{self, Value};

/// Consulted before reporting a missing value; `Some` substitutes a value.
pub type MissingHandler = dyn Fn(&str) -> Option<Value>;

enum Selected<'a> {
    CommandLine(&'a CliValue),
    Config(&'a toml::Value),
    Default(&'a Value),
    Substitute(Value),
    Required,
}

impl Selected<'_> {
    fn select(slots: &Slots) -> Selected<'_> {
        if let Some(cli) = &slots.from_commandline {
            return Selected::CommandLine(cli);
        }
        if let Some(config) = &slots.from_config {
            return Selected::Config(config);
        }
        match &slots.from_default {
            DefaultValue::Value(v) => Selected::Default(v),
            DefaultValue::Required => Selected::Required,
        }
    }

    /// Text form used for choice lookup and error messages.
    fn key(&self) -> String {
        match self {
            Selected::CommandLine(cli) => cli.text(),
            Selected::Config(config) => {
                value::toml_scalar(config).unwrap_or_else(|| config.to_string())
            }
            Selected::Default(v) => v.to_string(),
            Selected::Substitute(v) => v.to_string(),
            Selected::Required => String::new(),
        }
    }

    fn coerce(self, kind: OptionKind) -> Result<Value, String> {
        match self {
            Selected::CommandLine(CliValue::Single(text)) => value::parse_text(kind, text),
            Selected::CommandLine(CliValue::Many(items)) => value::from_list(kind, items),
            Selected::Config(config) => value::from_toml(kind, config),
            Selected::Default(v) => v.clone().coerce(kind),
            Selected::Substitute(v) => v.coerce(kind),
            Selected::Required => Err("no value".to_string()),
        }
    }
}

/// Resolve every option in `set`, in declaration order.
pub fn resolve(
    set: &OptionSet,
    pending: &PendingTable,
    on_missing: Option<&MissingHandler>,
) -> Result<IndexMap<String, Value>, OptfigError> {
    let mut resolved = IndexMap::with_capacity(set.len());
    for opt in set.iter() {
        let slots = pending
            .get(opt.name())
            .ok_or_else(|| OptfigError::MissingValue {
                name: opt.name().to_string(),
            })?;
        let value = resolve_one(opt, slots, on_missing)?;
        resolved.insert(opt.name().to_string(), value);
    }
    Ok(resolved)
}

fn resolve_one(
    opt: &Opt,
    slots: &Slots,
    on_missing: Option<&MissingHandler>,
) -> Result<Value, OptfigError> {
    let selected = match Selected::select(slots) {
        Selected::Required => match on_missing.and_then(|handler| handler(opt.name())) {
            Some(substitute) => Selected::Substitute(substitute),
            None => {
                return Err(OptfigError::MissingValue {
                    name: opt.name().to_string(),
                });
            }
        },
        other => other,
    };

    let key = selected.key();
    match opt.choices() {
        Some(choices) => choices.lookup(&key).map_err(|reason| {
            if let Some(reason) = reason {
                debug!(option = opt.name(), %reason, "validator rejected value");
            }
            OptfigError::InvalidChoice {
                name: opt.name().to_string(),
                value: key.clone(),
                allowed: choices.allowed(),
            }
        }),
        None => selected
            .coerce(opt.kind())
            .map_err(|reason| OptfigError::InvalidValue {
                name: opt.name().to_string(),
                value: key,
                reason,
            }),
    }
}
