#[cfg(test)]
pub mod test {
    use crate::option::Decl;
    use crate::types::OptionKind;

    pub fn decls(pairs: Vec<(&str, Decl)>) -> Vec<(String, Decl)> {
        pairs
            .into_iter()
            .map(|(name, decl)| (name.to_string(), decl))
            .collect()
    }

    /// A small server-style declaration group.
    pub fn server_decls() -> Vec<(String, Decl)> {
        decls(vec![
            ("host", Decl::from("localhost")),
            ("port", Decl::from(8080)),
            ("verbose", Decl::from(false)),
            ("tags", Decl::from(Vec::<String>::new())),
        ])
    }

    /// Declarations with a config option and a required value.
    pub fn config_decls(config_default: &str) -> Vec<(String, Decl)> {
        decls(vec![
            ("config", Decl::from(config_default)),
            ("name", Decl::from(OptionKind::String)),
            ("port", Decl::from(8080)),
            ("speed", Decl::one_of(["fast", "slow"])),
        ])
    }

    // -- Fixture for choice-mapping tests ----------------------------------------

    pub fn choice_decls() -> Vec<(String, Decl)> {
        decls(vec![
            ("speed", Decl::one_of(["fast", "slow"])),
            ("level", Decl::mapping([("low", 1), ("mid", 5), ("high", 10)])),
            (
                "ratio",
                Decl::validated(|raw| {
                    let n: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
                    if (0.0..=1.0).contains(&n) {
                        Ok(n.into())
                    } else {
                        Err(format!("{n} is outside 0..1"))
                    }
                }),
            ),
        ])
    }

    #[test]
    fn server_decls_keep_order() {
        let names: Vec<String> = server_decls().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["host", "port", "verbose", "tags"]);
    }
}
