//! Flag surface generation on top of [clap](https://docs.rs/clap).
//!
//! clap is the tokenizer: every option becomes one [`Arg`] on a runtime-built
//! [`Command`], and after a successful parse [`record_matches`] copies the raw
//! matched text into the pending command-line slots. Nothing is typed by clap
//! itself; coercion happens in the resolver so every source shares one set
//! of rules and one error taxonomy.
//!
//! Besides the options, the command carries:
//!
//! - one hidden counting arg per blocked short letter (see
//!   [`OptionSet::blocked_shorts`]), reported back by [`blocked_hit`];
//! - a hidden trailing positional collecting residual arguments. In
//!   [`ParseMode::InOrder`] it is a trailing var-arg, so everything after the
//!   first positional is residual.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::option::Opt;
use crate::set::OptionSet;
use crate::slots::{CliValue, PendingTable};
use crate::types::{OptionKind, ParseMode};

const RESIDUAL_ID: &str = "__residual";

const BLOCKER_PREFIX: &str = "__blocked_";

fn blocker_id(flag: char) -> String {
    format!("{BLOCKER_PREFIX}{flag}")
}

/// Whether `name` would collide with one of the hidden args added here.
pub(crate) fn is_internal_id(name: &str) -> bool {
    name == RESIDUAL_ID || name.starts_with(BLOCKER_PREFIX)
}

/// Build the clap command for an option set.
pub fn build_command(set: &OptionSet, name: &str, about: Option<&str>, mode: ParseMode) -> Command {
    let mut cmd = Command::new(name.to_string())
        .no_binary_name(true)
        .infer_long_args(true)
        .args_override_self(true);
    if let Some(about) = about {
        cmd = cmd.about(about.to_string());
    }

    for opt in set.iter() {
        cmd = cmd.arg(option_arg(opt, set.short_flag(opt.name())));
    }

    for flag in set.blocked_shorts() {
        cmd = cmd.arg(
            Arg::new(blocker_id(flag))
                .short(flag)
                .hide(true)
                .action(ArgAction::Count),
        );
    }

    let residual = Arg::new(RESIDUAL_ID)
        .value_name("ARGS")
        .num_args(0..)
        .action(ArgAction::Append)
        .hide(true);
    let residual = match mode {
        ParseMode::Permute => residual,
        ParseMode::InOrder => residual.trailing_var_arg(true),
    };
    cmd.arg(residual)
}

fn option_arg(opt: &Opt, short: Option<char>) -> Arg {
    let mut arg = Arg::new(opt.name().to_string())
        .long(opt.long_flag())
        .value_name(opt.placeholder().to_string())
        .help(opt.help_text());
    if let Some(flag) = short {
        arg = arg.short(flag);
    }

    match opt.kind() {
        // `--flag`, `--flag=false`; never consumes the next token.
        OptionKind::Boolean => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        OptionKind::StringArray => arg.action(ArgAction::Append).value_delimiter(','),
        kind if kind.is_numeric() => arg.action(ArgAction::Set).allow_negative_numbers(true),
        _ => arg.action(ArgAction::Set),
    }
}

/// Copy every command-line occurrence into the pending table.
pub fn record_matches(set: &OptionSet, matches: &ArgMatches, pending: &mut PendingTable) {
    for opt in set.iter() {
        let id = opt.name();
        if matches.value_source(id) != Some(ValueSource::CommandLine) {
            continue;
        }
        let value = match opt.kind() {
            OptionKind::StringArray => CliValue::Many(
                matches
                    .get_many::<String>(id)
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
            ),
            _ => match matches.get_one::<String>(id) {
                Some(text) => CliValue::Single(text.clone()),
                None => continue,
            },
        };
        pending.record_commandline(id, value);
    }
}

/// The first blocked short letter that appeared on the command line.
pub fn blocked_hit(set: &OptionSet, matches: &ArgMatches) -> Option<char> {
    set.blocked_shorts()
        .find(|flag| matches.get_count(&blocker_id(*flag)) > 0)
}

/// Positional tokens no option consumed.
pub fn residual(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>(RESIDUAL_ID)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{decls, server_decls};
    use crate::option::{Decl, OptionSpec};

    fn set() -> OptionSet {
        OptionSet::from_groups([server_decls()]).unwrap()
    }

    fn matches(set: &OptionSet, args: &[&str]) -> ArgMatches {
        build_command(set, "test", None, ParseMode::Permute)
            .try_get_matches_from(args)
            .unwrap()
    }

    fn record(set: &OptionSet, args: &[&str]) -> PendingTable {
        let mut pending = PendingTable::seeded(set);
        record_matches(set, &matches(set, args), &mut pending);
        pending
    }

    fn cli(pending: &PendingTable, name: &str) -> Option<CliValue> {
        pending.get(name).unwrap().from_commandline.clone()
    }

    #[test]
    fn long_flag_with_equals() {
        let set = set();
        let pending = record(&set, &["--port=9000"]);
        assert_eq!(cli(&pending, "port"), Some(CliValue::Single("9000".into())));
        assert_eq!(cli(&pending, "host"), None);
    }

    #[test]
    fn short_flag_with_separate_value() {
        let set = set();
        let pending = record(&set, &["-p", "9000"]);
        assert_eq!(cli(&pending, "port"), Some(CliValue::Single("9000".into())));
    }

    #[test]
    fn negative_numbers_accepted() {
        let set = set();
        let pending = record(&set, &["--port", "-1"]);
        assert_eq!(cli(&pending, "port"), Some(CliValue::Single("-1".into())));
    }

    #[test]
    fn bare_boolean_records_true() {
        let set = set();
        let pending = record(&set, &["--verbose"]);
        assert_eq!(cli(&pending, "verbose"), Some(CliValue::Single("true".into())));
    }

    #[test]
    fn boolean_accepts_inline_value() {
        let set = set();
        let pending = record(&set, &["--verbose=false"]);
        assert_eq!(cli(&pending, "verbose"), Some(CliValue::Single("false".into())));
    }

    #[test]
    fn boolean_does_not_consume_next_token() {
        let set = set();
        let m = matches(&set, &["--verbose", "file.txt"]);
        assert_eq!(residual(&m), vec!["file.txt".to_string()]);
    }

    #[test]
    fn array_occurrences_accumulate() {
        let set = set();
        let pending = record(&set, &["--tags=a", "--tags=b,c"]);
        assert_eq!(
            cli(&pending, "tags"),
            Some(CliValue::Many(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn repeated_scalar_last_wins() {
        let set = set();
        let pending = record(&set, &["--port=1", "--port=2"]);
        assert_eq!(cli(&pending, "port"), Some(CliValue::Single("2".into())));
    }

    #[test]
    fn empty_string_value_accepted() {
        let set = set();
        let pending = record(&set, &["--host="]);
        assert_eq!(cli(&pending, "host"), Some(CliValue::Single(String::new())));
    }

    #[test]
    fn long_prefix_is_inferred() {
        let set = set();
        let pending = record(&set, &["--verb"]);
        assert_eq!(cli(&pending, "verbose"), Some(CliValue::Single("true".into())));
    }

    #[test]
    fn underscores_become_hyphens() {
        let set = OptionSet::from_groups([decls(vec![("dry_run", Decl::from(false))])]).unwrap();
        let pending = record(&set, &["--dry-run"]);
        assert_eq!(cli(&pending, "dry_run"), Some(CliValue::Single("true".into())));
    }

    #[test]
    fn blocked_letter_is_reported() {
        let set = OptionSet::from_groups([decls(vec![
            ("verbose", OptionSpec::new().default_value(false).short('V').into()),
        ])])
        .unwrap();
        let m = matches(&set, &["-v"]);
        assert_eq!(blocked_hit(&set, &m), Some('v'));
        let m = matches(&set, &["-V"]);
        assert_eq!(blocked_hit(&set, &m), None);
    }

    #[test]
    fn in_order_mode_stops_at_first_positional() {
        let set = set();
        let m = build_command(&set, "test", None, ParseMode::InOrder)
            .try_get_matches_from(["--port=1", "run", "--port=2"])
            .unwrap();
        assert_eq!(residual(&m), vec!["run".to_string(), "--port=2".to_string()]);
        assert_eq!(m.get_one::<String>("port").map(String::as_str), Some("1"));
    }

    #[test]
    fn permute_mode_accepts_options_after_positionals() {
        let set = set();
        let m = matches(&set, &["run", "--port=2"]);
        assert_eq!(residual(&m), vec!["run".to_string()]);
        assert_eq!(m.get_one::<String>("port").map(String::as_str), Some("2"));
    }

    #[test]
    fn help_text_shows_default_and_placeholder() {
        let set = set();
        let help = build_command(&set, "test", None, ParseMode::Permute)
            .render_help()
            .to_string();
        assert!(help.contains("-p, --port <N>"));
        assert!(help.contains("default: 8080"));
        assert!(!help.contains("__blocked"));
    }
}
