//! # optfig demo application
//!
//! A small CLI that declares a handful of options with optfig and prints what
//! they resolved to. It exists to exercise the library by hand.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example optfig_demo -- --help
//! cargo run --example optfig_demo -- -p 9000 --verbose input.txt
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature               | How to exercise it                                              |
//! |-----------------------|-----------------------------------------------------------------|
//! | Compiled defaults     | `cargo run --example optfig_demo`                               |
//! | Config file (default) | Create `optfig-demo.toml` in the platform config dir            |
//! | Config file (explicit)| `cargo run --example optfig_demo -- --config ./demo.json`       |
//! | Enumeration choice    | `cargo run --example optfig_demo -- --color=teal` (fails)       |
//! | Mapping choice        | `cargo run --example optfig_demo -- --level=high`               |
//! | Array accumulation    | `cargo run --example optfig_demo -- --tag=a --tag=b,c`          |
//! | Leftover collection   | `cargo run --example optfig_demo -- --frobnicate`               |
//! | JSON output           | `cargo run --example optfig_demo -- --json`                     |
//! | Library logging       | `RUST_LOG=optfig=debug cargo run --example optfig_demo`         |

use optfig::{Decl, Optfig, OptionKind, OptionSpec, Resolved, Value, platform_config_path};
use tracing_subscriber::EnvFilter;

const APP: &str = "optfig-demo";

fn config_default() -> String {
    platform_config_path(APP)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_plain(resolved: &Resolved) {
    let width = resolved.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in resolved.iter() {
        println!("{key:<width$}  {value}");
    }
    if !resolved.residual().is_empty() {
        println!("\nresidual:  {}", resolved.residual().join(" "));
    }
    if !resolved.leftovers().is_empty() {
        println!("leftovers: {}", resolved.leftovers().join(" "));
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let resolved = Optfig::builder()
        .name(APP)
        .about("Print the options optfig resolved for this run")
        .options([
            ("config", Decl::from(config_default())),
            ("host", Decl::from("localhost")),
            ("port", Decl::from(8080)),
            ("verbose", Decl::from(false)),
            ("json", OptionSpec::new().default_value(false).no_short().into()),
            ("color", Decl::one_of(["yellow", "red", "green", "blue"])),
            ("level", Decl::mapping([("low", 1), ("mid", 5), ("high", 10)])),
            ("tag", Decl::from(Vec::<String>::new())),
            (
                "name",
                OptionSpec::new()
                    .kind(OptionKind::String)
                    .required()
                    .info("who to greet")
                    .into(),
            ),
        ])
        .config_option("config")
        .collect_leftovers(true)
        .on_missing(|name| match name {
            "name" => std::env::var("USER").ok().map(Value::from),
            _ => None,
        })
        .parse_or_exit();

    if resolved.boolean("json") == Some(true) {
        match serde_json::to_string_pretty(&resolved) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("failed to encode result: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if resolved.boolean("verbose") == Some(true) {
        println!("Resolved options for {APP}:\n");
    }
    print_plain(&resolved);
}
