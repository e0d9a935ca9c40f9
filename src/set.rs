//! Option Set construction and short-flag assignment.
//!
//! Declarations are merged by name (a later group replaces an earlier entry
//! but keeps its position), built into [`Opt`]s, then assigned short flags:
//!
//! 1. Explicit short flags are claimed first. Two explicit claims on the same
//!    letter fail with [`OptfigError::ShortFlagConflict`].
//! 2. Automatic candidates (first letter of the name) are claimed in
//!    declaration order; a candidate already taken is dropped and the option
//!    stays long-flag-only.
//! 3. Every first letter that ended up unclaimed is recorded as *blocked*, so
//!    the flag surface can turn `-x` into an explicit unknown-option failure.
//!
//! Two names that render to the same long flag (`dry_run` and `dry-run`) are
//! rejected as [`OptfigError::Malformed`].

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::error::OptfigError;
use crate::option::{Decl, Opt};
use crate::types::{OptionKind, ShortFlag};

/// The complete, ordered collection of options for one invocation.
///
/// Explicit short flags win over automatic ones regardless of order: an
/// earlier option asking for `-p` only by its first letter loses it to a
/// later option that names `-p` explicitly, and stays long-flag-only.
#[derive(Debug, Clone)]
pub struct OptionSet {
    options: IndexMap<String, Opt>,
    /// Claimed short flag → owning option name, in claim order.
    claims: IndexMap<char, String>,
    blocked: IndexSet<char>,
}

impl OptionSet {
    /// Build from ordered declaration groups; later groups override earlier
    /// ones by name.
    pub fn from_groups<I, G>(groups: I) -> Result<Self, OptfigError>
    where
        I: IntoIterator<Item = G>,
        G: IntoIterator<Item = (String, Decl)>,
    {
        let mut merged: IndexMap<String, Decl> = IndexMap::new();
        for group in groups {
            for (name, decl) in group {
                merged.insert(name, decl);
            }
        }

        let options = merged
            .into_iter()
            .map(|(name, decl)| Opt::new(&name, decl).map(|opt| (name, opt)))
            .collect::<Result<IndexMap<_, _>, _>>()?;
        check_long_flags(&options)?;

        let claims = assign_short_flags(&options)?;
        let blocked = options
            .keys()
            .filter_map(|name| name.chars().next())
            .filter(|c| c.is_ascii_alphanumeric() && *c != 'h' && !claims.contains_key(c))
            .collect();

        Ok(Self {
            options,
            claims,
            blocked,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Opt> {
        self.options.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Opt> {
        self.options.values()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// The short flag actually assigned to `name`, if it won its letter.
    pub fn short_flag(&self, name: &str) -> Option<char> {
        self.claims
            .iter()
            .find(|(_, owner)| owner.as_str() == name)
            .map(|(flag, _)| *flag)
    }

    /// First letters that map to no option and must fail as unknown.
    pub fn blocked_shorts(&self) -> impl Iterator<Item = char> + '_ {
        self.blocked.iter().copied()
    }

    /// Whether the option owning short `flag` consumes a value. Booleans
    /// only take one attached with `=`, so they do not.
    pub(crate) fn short_takes_value(&self, flag: char) -> bool {
        self.claims
            .get(&flag)
            .and_then(|owner| self.options.get(owner))
            .is_some_and(|opt| opt.kind() != OptionKind::Boolean)
    }

    /// Remove an option, releasing its short flag. Returns the removed option.
    pub(crate) fn remove(&mut self, name: &str) -> Option<Opt> {
        self.claims.retain(|_, owner| owner != name);
        self.options.shift_remove(name)
    }
}

fn check_long_flags(options: &IndexMap<String, Opt>) -> Result<(), OptfigError> {
    let mut seen: IndexMap<String, &str> = IndexMap::new();
    for opt in options.values() {
        if let Some(first) = seen.insert(opt.long_flag(), opt.name()) {
            return Err(OptfigError::malformed(
                opt.name(),
                format!("--{} is already used by '{first}'", opt.long_flag()),
            ));
        }
    }
    Ok(())
}

fn assign_short_flags(options: &IndexMap<String, Opt>) -> Result<IndexMap<char, String>, OptfigError> {
    let mut claims: IndexMap<char, String> = IndexMap::new();

    for opt in options.values() {
        if let ShortFlag::Explicit(flag) = opt.requested_short() {
            if let Some(first) = claims.get(&flag) {
                return Err(OptfigError::ShortFlagConflict {
                    flag,
                    first: first.clone(),
                    second: opt.name().to_string(),
                });
            }
            claims.insert(flag, opt.name().to_string());
        }
    }

    for opt in options.values() {
        if opt.requested_short() != ShortFlag::Auto {
            continue;
        }
        let Some(flag) = opt.short_candidate() else {
            continue;
        };
        match claims.get(&flag) {
            Some(owner) => trace!(option = opt.name(), flag = %flag, owner = %owner, "short flag taken, long form only"),
            None => {
                claims.insert(flag, opt.name().to_string());
            }
        }
    }

    Ok(claims)
}
