//! The option model: one named, typed, defaultable, validatable setting.
//!
//! Callers describe an option with a [`Decl`], one constructor per shape:
//!
//! - a concrete default (`8080`, `"localhost"`, `false`, ...). The kind is
//!   inferred from the value.
//! - a bare [`OptionKind`]. The option is required.
//! - an enumeration ([`Decl::one_of`]) or a label→value mapping
//!   ([`Decl::mapping`]). The first entry becomes the default.
//! - a validator ([`Decl::validated`]), required unless a default is set.
//! - a fully spelled-out [`OptionSpec`] for anything else (explicit kind,
//!   short flag, placeholder, help text).
//!
//! Every shape funnels through [`OptionSpec::build`], which infers the kind,
//! checks the declaration for contradictions, and renders the help-facing
//! representation of the default.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use regex::Regex;

use crate::error::{OptfigError, long_flag};
use crate::types::{DefaultValue, OptionKind, ShortFlag};
use crate::value::Value;

/// A validator receives the raw value's text and returns the canonical value.
pub type ValidatorFn = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// The restricted domain an option may resolve to.
#[derive(Clone)]
pub enum Choices {
    /// Allowed values, matched by their display form.
    Enumeration(Vec<Value>),
    /// Labels the user types, mapped to the values they resolve to.
    Mapping(IndexMap<String, Value>),
    Validator(ValidatorFn),
}

impl Choices {
    /// Map a raw key to its canonical value.
    ///
    /// The error carries the validator's reason, if it gave one.
    pub fn lookup(&self, key: &str) -> Result<Value, Option<String>> {
        match self {
            Choices::Enumeration(values) => values
                .iter()
                .find(|v| v.to_string() == key)
                .cloned()
                .ok_or(None),
            Choices::Mapping(map) => map.get(key).cloned().ok_or(None),
            Choices::Validator(validate) => validate(key).map_err(Some),
        }
    }

    /// Display forms of the allowed keys; `None` when not enumerable.
    pub fn allowed(&self) -> Option<Vec<String>> {
        match self {
            Choices::Enumeration(values) => Some(values.iter().map(Value::to_string).collect()),
            Choices::Mapping(map) => Some(map.keys().cloned().collect()),
            Choices::Validator(_) => None,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Choices::Enumeration(values) => values.is_empty(),
            Choices::Mapping(map) => map.is_empty(),
            Choices::Validator(_) => false,
        }
    }

    /// The implicit default: the first enumerated key, stringified.
    fn first_key(&self) -> Option<Value> {
        match self {
            Choices::Enumeration(values) => values.first().map(|v| Value::String(v.to_string())),
            Choices::Mapping(map) => map.keys().next().map(|k| Value::String(k.clone())),
            Choices::Validator(_) => None,
        }
    }
}

impl fmt::Debug for Choices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choices::Enumeration(values) => f.debug_tuple("Enumeration").field(values).finish(),
            Choices::Mapping(map) => f.debug_tuple("Mapping").field(map).finish(),
            Choices::Validator(_) => f.write_str("Validator(..)"),
        }
    }
}

/// One option declaration as supplied by the caller.
#[derive(Clone)]
pub enum Decl {
    Default(Value),
    Required(OptionKind),
    Enumeration(Vec<Value>),
    Mapping(IndexMap<String, Value>),
    Validator(ValidatorFn),
    Spec(OptionSpec),
}

impl Decl {
    pub fn value(value: impl Into<Value>) -> Self {
        Decl::Default(value.into())
    }

    pub fn required(kind: OptionKind) -> Self {
        Decl::Required(kind)
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Decl::Enumeration(values.into_iter().map(Into::into).collect())
    }

    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Decl::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn validated<F>(validate: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Decl::Validator(Arc::new(validate))
    }
}

macro_rules! decl_from_default {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Decl {
                fn from(v: $ty) -> Self {
                    Decl::Default(Value::from(v))
                }
            }
        )*
    };
}

decl_from_default!(
    &str,
    String,
    i64,
    i32,
    u16,
    u32,
    f64,
    bool,
    Vec<String>,
    Vec<&str>,
    Regex,
    DateTime<FixedOffset>,
    DateTime<Utc>,
);

impl From<Value> for Decl {
    fn from(v: Value) -> Self {
        Decl::Default(v)
    }
}

impl From<OptionKind> for Decl {
    fn from(kind: OptionKind) -> Self {
        Decl::Required(kind)
    }
}

impl From<OptionSpec> for Decl {
    fn from(spec: OptionSpec) -> Self {
        Decl::Spec(spec)
    }
}

/// Explicit settings for an option. Unset fields are inferred at build time.
#[derive(Debug, Clone, Default)]
pub struct OptionSpec {
    default: Option<DefaultValue>,
    kind: Option<OptionKind>,
    short: ShortFlag,
    placeholder: Option<String>,
    info: Option<String>,
    choices: Option<Choices>,
}

impl OptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Mark the option as having no default.
    pub fn required(mut self) -> Self {
        self.default = Some(DefaultValue::Required);
        self
    }

    pub fn kind(mut self, kind: OptionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn short(mut self, flag: char) -> Self {
        self.short = ShortFlag::Explicit(flag);
        self
    }

    /// Register the option with a long flag only.
    pub fn no_short(mut self) -> Self {
        self.short = ShortFlag::Suppressed;
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    /// Help text template; `{default}` is replaced by the default's representation.
    pub fn info(mut self, template: &str) -> Self {
        self.info = Some(template.to_string());
        self
    }

    pub fn choices(mut self, choices: Choices) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Turn the declaration into a fully populated [`Opt`].
    pub fn build(self, name: &str) -> Result<Opt, OptfigError> {
        check_name(name)?;
        if let ShortFlag::Explicit(flag) = self.short {
            if flag == 'h' {
                return Err(OptfigError::malformed(name, "-h is reserved for help"));
            }
            if !flag.is_ascii_alphanumeric() {
                return Err(OptfigError::malformed(
                    name,
                    format!("short flag '{flag}' is not alphanumeric"),
                ));
            }
        }
        if self.choices.as_ref().is_some_and(Choices::is_empty) {
            return Err(OptfigError::malformed(name, "empty choice set"));
        }

        let default = match (self.default, &self.choices) {
            (Some(default), _) => default,
            (None, Some(choices)) => choices
                .first_key()
                .map_or(DefaultValue::Required, DefaultValue::Value),
            (None, None) => DefaultValue::Required,
        };

        let kind = match (self.kind, &self.choices, &default) {
            (Some(kind), _, _) => kind,
            (None, Some(_), _) => OptionKind::String,
            (None, None, DefaultValue::Value(v)) => v.kind(),
            (None, None, DefaultValue::Required) => OptionKind::String,
        };

        let default = match (default, &self.choices) {
            (DefaultValue::Value(v), Some(choices @ (Choices::Enumeration(_) | Choices::Mapping(_)))) => {
                if choices.lookup(&v.to_string()).is_err() {
                    return Err(OptfigError::malformed(
                        name,
                        format!("default {v} is not one of the choices"),
                    ));
                }
                DefaultValue::Value(v)
            }
            (DefaultValue::Value(v), None) => {
                let coerced = v.coerce(kind).map_err(|reason| {
                    OptfigError::malformed(name, format!("default does not fit kind: {reason}"))
                })?;
                DefaultValue::Value(coerced)
            }
            (other, _) => other,
        };

        let placeholder = match (self.placeholder, &self.choices) {
            (Some(placeholder), _) => placeholder,
            (None, Some(choices)) => match choices.allowed() {
                Some(allowed) => format!("{{{}}}", allowed.join(",")),
                None => kind.placeholder().to_string(),
            },
            (None, None) => kind.placeholder().to_string(),
        };

        Ok(Opt {
            name: name.to_string(),
            kind,
            default_repr: representation(&default),
            default,
            short: self.short,
            placeholder,
            info: self.info.unwrap_or_else(|| "{default}".to_string()),
            choices: self.choices,
        })
    }
}

impl From<Decl> for OptionSpec {
    fn from(decl: Decl) -> Self {
        match decl {
            Decl::Default(value) => OptionSpec::new().default_value(value),
            Decl::Required(kind) => OptionSpec::new().kind(kind).required(),
            Decl::Enumeration(values) => OptionSpec::new().choices(Choices::Enumeration(values)),
            Decl::Mapping(map) => OptionSpec::new().choices(Choices::Mapping(map)),
            Decl::Validator(validate) => OptionSpec::new().choices(Choices::Validator(validate)),
            Decl::Spec(spec) => spec,
        }
    }
}

fn check_name(name: &str) -> Result<(), OptfigError> {
    if name.is_empty() {
        return Err(OptfigError::malformed(name, "empty option name"));
    }
    if name == "help" {
        return Err(OptfigError::malformed(name, "--help is reserved"));
    }
    if crate::cli::is_internal_id(name) {
        return Err(OptfigError::malformed(name, "name is reserved for internal use"));
    }
    if name.starts_with(['-', '_']) || name.contains(|c: char| c == '=' || c.is_whitespace()) {
        return Err(OptfigError::malformed(
            name,
            "names may not start with '-' or '_', or contain '=' or whitespace",
        ));
    }
    Ok(())
}

/// Help-facing rendering of a default. Strings are quoted only when their
/// escaped form or trimmed form differs from the literal.
fn representation(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Required => "required".to_string(),
        DefaultValue::Value(Value::String(s)) => {
            let quoted = format!("{s:?}");
            let escaped = quoted
                .strip_prefix('"')
                .and_then(|q| q.strip_suffix('"'))
                .unwrap_or(&quoted);
            if !s.is_empty() && escaped == s && s.trim() == s {
                s.clone()
            } else {
                quoted
            }
        }
        DefaultValue::Value(v) => v.to_string(),
    }
}

/// A fully populated option.
#[derive(Debug, Clone)]
pub struct Opt {
    name: String,
    kind: OptionKind,
    default: DefaultValue,
    default_repr: String,
    short: ShortFlag,
    placeholder: String,
    info: String,
    choices: Option<Choices>,
}

impl Opt {
    pub fn new(name: &str, decl: impl Into<Decl>) -> Result<Self, OptfigError> {
        OptionSpec::from(decl.into()).build(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as a long flag, underscores replaced by hyphens.
    pub fn long_flag(&self) -> String {
        long_flag(&self.name)
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn default(&self) -> &DefaultValue {
        &self.default
    }

    pub fn default_repr(&self) -> &str {
        &self.default_repr
    }

    /// The short flag as requested; see [`OptionSet::short_flag`](crate::OptionSet::short_flag)
    /// for the flag actually assigned.
    pub fn requested_short(&self) -> ShortFlag {
        self.short
    }

    /// The automatic or explicit short flag candidate, before collision handling.
    pub(crate) fn short_candidate(&self) -> Option<char> {
        match self.short {
            ShortFlag::Explicit(flag) => Some(flag),
            ShortFlag::Suppressed => None,
            ShortFlag::Auto => self
                .name
                .chars()
                .next()
                .filter(|c| c.is_ascii_alphanumeric() && *c != 'h'),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn choices(&self) -> Option<&Choices> {
        self.choices.as_ref()
    }

    /// Rendered help: a `default: ` prelude for concrete defaults, then the
    /// info template with `{default}` substituted.
    pub fn help_text(&self) -> String {
        let prelude = match self.default {
            DefaultValue::Value(_) => "default: ",
            DefaultValue::Required => "",
        };
        format!(
            "{prelude}{}",
            self.info.replace("{default}", &self.default_repr)
        )
    }
}
