//! Parser driver: runs the tokenizer and, when asked, recovers from unknown
//! flags by moving them into a leftover list.
//!
//! Recovery is an explicit loop. Each failed attempt is classified; an
//! unknown flag (reported by clap, or a hit on a blocked short letter) is
//! stripped from the argument list and recorded, and the parse runs again
//! over what remains. Because slots are only recorded after a successful
//! parse, re-running from the start is the same as resuming.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgMatches, Command};
use tracing::debug;

use crate::cli;
use crate::error::OptfigError;
use crate::set::OptionSet;

/// Outcome of a successful parse.
#[derive(Debug)]
pub struct Parsed {
    pub matches: ArgMatches,
    /// Positional tokens, in order.
    pub residual: Vec<String>,
    /// Unknown flags collected in leftover mode, in the order they were met.
    pub leftovers: Vec<String>,
}

pub fn parse_args(
    cmd: &Command,
    set: &OptionSet,
    mut args: Vec<String>,
    collect_leftovers: bool,
) -> Result<Parsed, OptfigError> {
    let mut leftovers = Vec::new();

    loop {
        let offending = match cmd.clone().try_get_matches_from(&args) {
            Ok(matches) => match cli::blocked_hit(set, &matches) {
                None => {
                    let residual = cli::residual(&matches);
                    return Ok(Parsed {
                        matches,
                        residual,
                        leftovers,
                    });
                }
                Some(flag) => format!("-{flag}"),
            },
            Err(err) if err.kind() == ErrorKind::UnknownArgument => match invalid_arg(&err) {
                Some(token) => token,
                None => return Err(err.into()),
            },
            Err(err) => return Err(err.into()),
        };

        if !collect_leftovers {
            return Err(OptfigError::UnknownOption { token: offending });
        }
        match strip_token(&mut args, &offending, set) {
            Some(token) => {
                debug!(token = %token, "collected leftover token");
                leftovers.push(token);
            }
            None => return Err(OptfigError::UnknownOption { token: offending }),
        }
    }
}

fn invalid_arg(err: &clap::Error) -> Option<String> {
    match err.get(ContextKind::InvalidArg)? {
        ContextValue::String(arg) => Some(arg.clone()),
        _ => None,
    }
}

/// Remove the token clap reported as `offending` from `args`.
///
/// Long flags remove the whole token (`--name` or `--name=value`). A short
/// flag standing alone (`-x`) is preferred; otherwise its letter is taken out
/// of a cluster (`-vx`), looking only at letters before the first short that
/// takes a value, since the rest of that token is the value. Tokens after
/// `--` are never touched.
fn strip_token(args: &mut Vec<String>, offending: &str, set: &OptionSet) -> Option<String> {
    let end = args.iter().position(|a| a == "--").unwrap_or(args.len());

    if offending.starts_with("--") {
        let idx = args[..end].iter().position(|a| {
            a == offending
                || a.strip_prefix(offending)
                    .is_some_and(|rest| rest.starts_with('='))
        })?;
        return Some(args.remove(idx));
    }

    let flag = offending.strip_prefix('-')?.chars().next()?;
    let alone = format!("-{flag}");
    if let Some(idx) = args[..end].iter().position(|a| *a == alone) {
        return Some(args.remove(idx));
    }

    let (idx, at) = args[..end]
        .iter()
        .enumerate()
        .find_map(|(idx, a)| cluster_position(a, flag, set).map(|at| (idx, at)))?;
    let mut cluster = std::mem::take(&mut args[idx]);
    cluster.remove(at);
    args[idx] = cluster;
    Some(alone)
}

/// Byte offset of `flag` inside a short-flag cluster, if it is one of the
/// flags rather than part of an attached value.
fn cluster_position(token: &str, flag: char, set: &OptionSet) -> Option<usize> {
    let cluster = token.strip_prefix('-')?;
    if cluster.starts_with('-') {
        return None;
    }
    for (offset, c) in cluster.char_indices() {
        if c == flag {
            return Some(offset + 1);
        }
        if c == '=' || set.short_takes_value(c) {
            return None;
        }
    }
    None
}
