use clap::Command;
use tracing::debug;

use crate::cli;
use crate::driver;
use crate::error::OptfigError;
use crate::merge;
use crate::ops::Resolved;
use crate::option::Decl;
use crate::resolve::{self, MissingHandler};
use crate::set::OptionSet;
use crate::slots::PendingTable;
use crate::types::ParseMode;
use crate::value::Value;

/// Entry point for declaring and parsing options.
pub struct Optfig;

impl Optfig {
    pub fn builder() -> OptfigBuilder {
        OptfigBuilder::new()
    }
}

/// Builder for one parse: declarations plus the knobs that shape the run.
///
/// The pipeline behind [`parse_from()`](Self::parse_from):
///
/// - **Option set**: declaration groups are merged by name and given short
///   flags.
/// - **Parse**: the generated clap command tokenizes the arguments, with
///   optional [leftover collection](Self::collect_leftovers).
/// - **Config overlay**: when a [config option](Self::config_option) is
///   designated, its file fills the config slots.
/// - **Resolve**: each option takes its command-line, config, or default
///   value, in that order.
pub struct OptfigBuilder {
    name: Option<String>,
    about: Option<String>,
    groups: Vec<Vec<(String, Decl)>>,
    config_option: Option<String>,
    keep_config_option: bool,
    collect_leftovers: bool,
    mode: ParseMode,
    on_missing: Option<Box<MissingHandler>>,
}

impl OptfigBuilder {
    fn new() -> Self {
        Self {
            name: None,
            about: None,
            groups: Vec::new(),
            config_option: None,
            keep_config_option: false,
            collect_leftovers: false,
            mode: ParseMode::default(),
            on_missing: None,
        }
    }

    /// Program name shown in usage and help (default: the executable's name).
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// One-line description shown at the top of `--help`.
    pub fn about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }

    /// Add a group of declarations. A name declared again in a later group
    /// replaces the earlier declaration but keeps its position.
    pub fn options<I, K, D>(mut self, group: I) -> Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<Decl>,
    {
        self.groups.push(
            group
                .into_iter()
                .map(|(name, decl)| (name.into(), decl.into()))
                .collect(),
        );
        self
    }

    /// Add a single declaration.
    pub fn opt(self, name: &str, decl: impl Into<Decl>) -> Self {
        self.options([(name.to_string(), decl.into())])
    }

    /// Designate the option whose value is the config file path.
    pub fn config_option(mut self, name: &str) -> Self {
        self.config_option = Some(name.to_string());
        self
    }

    /// Keep the config option in the result (default: `false`, it is removed
    /// once the config is loaded).
    pub fn keep_config_option(mut self, keep: bool) -> Self {
        self.keep_config_option = keep;
        self
    }

    /// Set unknown flags aside instead of failing (default: `false`).
    /// Collected tokens are available from [`Resolved::leftovers`].
    pub fn collect_leftovers(mut self, collect: bool) -> Self {
        self.collect_leftovers = collect;
        self
    }

    /// Set the parse mode (default: [`ParseMode::Permute`]).
    pub fn mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Install a handler consulted before a required option is reported
    /// missing. Returning `Some` substitutes that value; it still goes
    /// through choice lookup and coercion.
    pub fn on_missing<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) -> Option<Value> + 'static,
    {
        self.on_missing = Some(Box::new(handler));
        self
    }

    fn effective_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "app".to_string())
    }

    /// Build the option set, checking that a designated config option exists.
    pub fn option_set(&self) -> Result<OptionSet, OptfigError> {
        let set = OptionSet::from_groups(self.groups.iter().cloned())?;
        if let Some(config) = &self.config_option
            && !set.contains(config)
        {
            return Err(OptfigError::malformed(
                config,
                "designated as the config option but never declared",
            ));
        }
        Ok(set)
    }

    /// The clap command that [`parse_from()`](Self::parse_from) tokenizes
    /// with. Useful for rendering help or generating completions.
    pub fn command(&self) -> Result<Command, OptfigError> {
        let set = self.option_set()?;
        Ok(cli::build_command(
            &set,
            &self.effective_name(),
            self.about.as_deref(),
            self.mode,
        ))
    }

    /// Parse `args` (program name excluded) and resolve every option.
    pub fn parse_from<I, T>(self, args: I) -> Result<Resolved, OptfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut set = self.option_set()?;
        let cmd = cli::build_command(
            &set,
            &self.effective_name(),
            self.about.as_deref(),
            self.mode,
        );
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let parsed = driver::parse_args(&cmd, &set, args, self.collect_leftovers)?;

        let mut pending = PendingTable::seeded(&set);
        cli::record_matches(&set, &parsed.matches, &mut pending);

        if let Some(config) = &self.config_option {
            merge::overlay_config(&mut set, &mut pending, config, self.keep_config_option)?;
        }

        let values = resolve::resolve(&set, &pending, self.on_missing.as_deref())?;
        debug!(
            options = values.len(),
            leftovers = parsed.leftovers.len(),
            "options resolved"
        );
        Ok(Resolved::new(values, parsed.residual, parsed.leftovers))
    }

    /// Parse the process arguments.
    pub fn parse(self) -> Result<Resolved, OptfigError> {
        let args: Vec<String> = std::env::args_os()
            .skip(1)
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.parse_from(args)
    }

    /// Parse the process arguments, exiting on failure.
    ///
    /// Help and usage errors exit through clap (status 0 for `--help`).
    /// Everything else prints one line to stderr and exits with status 1.
    pub fn parse_or_exit(self) -> Resolved {
        match self.parse() {
            Ok(resolved) => resolved,
            Err(OptfigError::Cli(err)) => err.exit(),
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{config_decls, server_decls};
    use crate::option::OptionSpec;
    use crate::types::OptionKind;
    use std::fs;
    use tempfile::TempDir;

    fn server() -> OptfigBuilder {
        Optfig::builder().name("server").options(server_decls())
    }

    fn with_config(path: &str) -> OptfigBuilder {
        Optfig::builder()
            .name("svc")
            .options(config_decls(path))
            .config_option("config")
            .on_missing(|name| (name == "name").then(|| Value::from("anon")))
    }

    #[test]
    fn defaults_when_nothing_supplied() {
        let r = server().parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(r.str("host"), Some("localhost"));
        assert_eq!(r.integer("port"), Some(8080));
        assert_eq!(r.boolean("verbose"), Some(false));
        assert_eq!(r.list("tags"), Some(&[][..]));
    }

    #[test]
    fn port_and_verbose_example() {
        let r = Optfig::builder()
            .opt("port", OptionKind::Integer)
            .opt("verbose", false)
            .parse_from(["--port=8080", "--verbose"])
            .unwrap();
        assert_eq!(r["port"], Value::Integer(8080));
        assert_eq!(r["verbose"], Value::Boolean(true));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn result_keeps_declaration_order() {
        let r = server().parse_from(["--verbose", "--host=h"]).unwrap();
        let names: Vec<&str> = r.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["host", "port", "verbose", "tags"]);
    }

    #[test]
    fn precedence_commandline_over_config_over_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svc.toml");
        fs::write(&path, "port = 3000\nspeed = \"slow\"\n").unwrap();
        let path = path.to_str().unwrap();

        let r = with_config(path).parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(r.integer("port"), Some(3000));
        assert_eq!(r.str("speed"), Some("slow"));

        let r = with_config(path).parse_from(["--port=9999"]).unwrap();
        assert_eq!(r.integer("port"), Some(9999));
        assert_eq!(r.str("speed"), Some("slow"));
    }

    #[test]
    fn precedence_ignores_declaration_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svc.toml");
        fs::write(&path, "port = 3000\n").unwrap();
        let r = Optfig::builder()
            .opt("port", 1)
            .opt("config", path.to_str().unwrap())
            .config_option("config")
            .parse_from(Vec::<String>::new())
            .unwrap();
        assert_eq!(r.integer("port"), Some(3000));
    }

    #[test]
    fn config_option_removed_from_result() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svc.toml");
        let r = with_config(path.to_str().unwrap())
            .parse_from(Vec::<String>::new())
            .unwrap();
        assert!(!r.contains("config"));
        assert_eq!(r.str("name"), Some("anon"));
    }

    #[test]
    fn config_option_kept_on_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svc.toml");
        let path = path.to_str().unwrap();
        let r = with_config(path)
            .keep_config_option(true)
            .parse_from(Vec::<String>::new())
            .unwrap();
        assert_eq!(r.str("config"), Some(path));
    }

    #[test]
    fn missing_default_config_is_not_an_error() {
        let r = with_config("./conf.yaml")
            .parse_from(Vec::<String>::new())
            .unwrap();
        assert_eq!(r.integer("port"), Some(8080));
        assert_eq!(r.str("speed"), Some("fast"));
    }

    #[test]
    fn missing_explicit_config_is_load_error() {
        let err = with_config("./conf.yaml")
            .parse_from(["--config=/missing/path"])
            .unwrap_err();
        assert!(matches!(err, OptfigError::ConfigLoad { .. }));
    }

    #[test]
    fn undeclared_config_option_is_malformed() {
        let err = Optfig::builder()
            .opt("port", 1)
            .config_option("config")
            .parse_from(Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, OptfigError::Malformed { .. }));
    }

    #[test]
    fn colliding_long_flags_fail_before_parsing() {
        let err = Optfig::builder()
            .opt("dry_run", false)
            .opt("dry-run", OptionSpec::new().default_value(true).no_short())
            .parse_from(Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, OptfigError::Malformed { .. }));
    }

    #[test]
    fn json_config_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svc.json");
        fs::write(&path, r#"{"port": 4000, "name": "from-json"}"#).unwrap();
        let r = with_config(path.to_str().unwrap())
            .parse_from(Vec::<String>::new())
            .unwrap();
        assert_eq!(r.integer("port"), Some(4000));
        assert_eq!(r.str("name"), Some("from-json"));
    }

    #[test]
    fn explicit_yaml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf.yaml");
        fs::write(&path, "port: 3000\nspeed: slow\n").unwrap();
        let arg = format!("--config={}", path.display());
        let r = with_config("./conf.yaml").parse_from([arg]).unwrap();
        assert_eq!(r.integer("port"), Some(3000));
        assert_eq!(r.str("speed"), Some("slow"));
    }

    #[test]
    fn empty_string_stays_a_string() {
        let r = server().parse_from(["--host="]).unwrap();
        assert_eq!(r.str("host"), Some(""));
    }

    #[test]
    fn required_never_supplied_is_missing() {
        let err = Optfig::builder()
            .opt("name", OptionKind::String)
            .parse_from(Vec::<String>::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "missing value for --name");
    }

    #[test]
    fn enumeration_choice() {
        let parse = |arg: &str| {
            Optfig::builder()
                .opt("speed", Decl::one_of(["fast", "slow"]))
                .parse_from([arg])
        };
        assert_eq!(parse("--speed=fast").unwrap().str("speed"), Some("fast"));
        let err = parse("--speed=medium").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid choice medium for --speed (should be one of fast,slow)"
        );
    }

    #[test]
    fn array_occurrences_accumulate() {
        let r = Optfig::builder()
            .opt("tag", Vec::<String>::new())
            .parse_from(["--tag=a", "--tag=b"])
            .unwrap();
        assert_eq!(r.list("tag"), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[test]
    fn leftovers_collected() {
        let r = server()
            .collect_leftovers(true)
            .parse_from(["--port=1", "--unknown=2", "file"])
            .unwrap();
        assert_eq!(r.integer("port"), Some(1));
        assert_eq!(r.leftovers(), ["--unknown=2"]);
        assert_eq!(r.residual(), ["file"]);
    }

    #[test]
    fn unknown_flag_fatal_by_default() {
        let err = server().parse_from(["--port=1", "--unknown"]).unwrap_err();
        assert!(matches!(err, OptfigError::UnknownOption { .. }));
    }

    #[test]
    fn shared_first_letter_first_declared_wins() {
        let b = Optfig::builder().opt("port", 1).opt("path", "/");
        let set = b.option_set().unwrap();
        assert_eq!(set.short_flag("port"), Some('p'));
        assert_eq!(set.short_flag("path"), None);

        let r = b.parse_from(["-p", "5", "--path=/tmp"]).unwrap();
        assert_eq!(r.integer("port"), Some(5));
        assert_eq!(r.str("path"), Some("/tmp"));
    }

    #[test]
    fn explicit_short_beats_earlier_auto() {
        let set = Optfig::builder()
            .opt("port", 1)
            .opt("path", OptionSpec::new().default_value("/").short('p'))
            .option_set()
            .unwrap();
        assert_eq!(set.short_flag("path"), Some('p'));
        assert_eq!(set.short_flag("port"), None);
    }

    #[test]
    fn later_group_overrides_earlier() {
        let r = server()
            .options([("port", 9)])
            .parse_from(Vec::<String>::new())
            .unwrap();
        assert_eq!(r.integer("port"), Some(9));
        let names: Vec<&str> = r.iter().map(|(k, _)| k).collect();
        assert_eq!(names[1], "port");
    }

    #[test]
    fn in_order_mode_leaves_later_flags_residual() {
        let r = server()
            .mode(ParseMode::InOrder)
            .parse_from(["--port=1", "run", "--port=2"])
            .unwrap();
        assert_eq!(r.integer("port"), Some(1));
        assert_eq!(r.residual(), ["run", "--port=2"]);
    }

    #[test]
    fn help_is_a_cli_error() {
        let err = server().parse_from(["--help"]).unwrap_err();
        assert!(matches!(err, OptfigError::Cli(_)));
    }

    #[test]
    fn command_renders_help() {
        let help = server()
            .about("Serve things")
            .command()
            .unwrap()
            .render_help()
            .to_string();
        assert!(help.contains("Serve things"));
        assert!(help.contains("--host <VAL>"));
    }
}
