//! Declarative command-line options resolved from flags, a config file, and
//! compiled defaults.
//!
//! Declare each option once, with a default value, a bare kind, or a choice
//! set, and optfig generates the flag surface, parses the arguments, overlays
//! an optional config file, and hands back a typed, ordered record.
//!
//! ```ignore
//! let opts = Optfig::builder()
//!     .opt("host", "localhost")
//!     .opt("port", 8080)
//!     .opt("verbose", false)
//!     .parse_or_exit();
//!
//! let port = opts.integer("port");
//! ```
//!
//! That gives the program `--host`, `-p, --port` and `-v, --verbose`, with
//! `-h/--help` listing every default.
//!
//! # Declarations
//!
//! Each option is a name plus a [`Decl`], one constructor per shape:
//!
//! | Declaration | Meaning |
//! |---|---|
//! | `8080`, `"localhost"`, `false`, `Vec::<String>::new()` | concrete default, kind inferred |
//! | `OptionKind::Integer` | required, no default |
//! | `Decl::one_of(["fast", "slow"])` | enumeration, first entry is the default |
//! | `Decl::mapping([("low", 1), ("high", 10)])` | labels mapped to values |
//! | `Decl::validated(f)` | validator returning the canonical value |
//! | `OptionSpec::new()...` | everything spelled out |
//!
//! Declarations come in ordered groups ([`options()`](OptfigBuilder::options)).
//! A later group redeclaring a name replaces the earlier entry in place.
//!
//! # Short flags
//!
//! Every option asks for its first letter as a short flag unless it names
//! one explicitly or opts out. Explicit claims are assigned first; automatic
//! ones go in declaration order, and a letter already taken leaves the later
//! option long-only. `-h` always belongs to help. A first letter nobody ended
//! up owning is *blocked*: `-x` then fails as an unknown option instead of
//! being mistaken for something else.
//!
//! # Precedence
//!
//! ```text
//! Compiled default      the declaration
//!        ↑ overridden by
//! Config file           the designated config option's path
//!        ↑ overridden by
//! Command line          --name=value
//! ```
//!
//! The order holds regardless of declaration order.
//!
//! # Config file
//!
//! [`config_option()`](OptfigBuilder::config_option) designates the option
//! holding the config path. Files ending in `.json` are JSON, `.yaml` or
//! `.yml` are YAML, everything else is TOML; keys may spell underscores as
//! hyphens. A path given on the command line must load. A path that only came from the option's default
//! may be missing, which simply means no config. The config option itself is
//! dropped from the result unless
//! [`keep_config_option(true)`](OptfigBuilder::keep_config_option) is set.
//! [`platform_config_path()`] gives a conventional default.
//!
//! # Unknown flags
//!
//! An unknown flag is fatal unless
//! [`collect_leftovers(true)`](OptfigBuilder::collect_leftovers) is set, in
//! which case it is removed, recorded in [`Resolved::leftovers`], and parsing
//! carries on.
//!
//! # Error handling
//!
//! Everything fallible returns [`OptfigError`]. User-facing errors render as
//! a single line (`missing value for --name`,
//! `invalid choice medium for --speed (should be one of fast,slow)`).
//! [`parse_or_exit()`](OptfigBuilder::parse_or_exit) prints that line and
//! exits; help and usage go through clap.

pub mod error;
pub mod types;

mod builder;
mod cli;
mod driver;
mod file;
mod merge;
mod ops;
mod option;
mod resolve;
mod set;
mod slots;
mod value;

#[cfg(test)]
mod fixtures;

pub use builder::{Optfig, OptfigBuilder};
pub use error::OptfigError;
pub use file::{load_config_file, platform_config_path};
pub use ops::Resolved;
pub use option::{Choices, Decl, Opt, OptionSpec, ValidatorFn};
pub use resolve::MissingHandler;
pub use set::OptionSet;
pub use types::{DefaultValue, OptionKind, ParseMode, ShortFlag};
pub use value::Value;
