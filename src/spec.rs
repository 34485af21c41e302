//! The specification model: commands, options, positionals, arity.
//!
//! Everything here is constructed once via the builder methods and is
//! immutable afterwards — `CommandSpec::build` is the only place that can
//! fail, and it runs every invariant check from the specification up
//! front so the rest of the engine never has to.

use crate::config::ParserConfiguration;
use crate::error::Error;
use std::collections::{HashMap, HashSet};

/// Upper bound of an [`Arity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Max {
    Bounded(usize),
    Unbounded,
}

impl Max {
    pub(crate) fn as_usize(self) -> Option<usize> {
        match self {
            Max::Bounded(n) => Some(n),
            Max::Unbounded => None,
        }
    }
}

/// A `(min, max)` value-count constraint on an option or positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Max,
}

impl Arity {
    pub const ZERO: Arity = Arity {
        min: 0,
        max: Max::Bounded(0),
    };
    pub const EXACTLY_ONE: Arity = Arity {
        min: 1,
        max: Max::Bounded(1),
    };
    pub const ONE_OR_MORE: Arity = Arity {
        min: 1,
        max: Max::Unbounded,
    };
    pub const ZERO_OR_MORE: Arity = Arity {
        min: 0,
        max: Max::Unbounded,
    };

    /// Build an arbitrary arity, checking `min <= max`.
    pub fn new(min: usize, max: Max) -> Result<Self, Error> {
        if let Max::Bounded(hi) = max {
            if min > hi {
                return Err(Error::option_spec_invalid_arity(min, Some(hi)));
            }
        }
        Ok(Arity { min, max })
    }

    pub(crate) fn is_flag_shaped(self) -> bool {
        self.min == 0 && self.max == Max::Bounded(0)
    }
}

/// How repeated occurrences of the same option are merged into one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulationMode {
    First,
    Last,
    Count,
    Append,
    Extend,
    Merge,
    Error,
}

/// Variant-specific behavior of an option.
#[derive(Debug, Clone)]
pub enum OptionKind {
    Flag {
        negation_prefixes: HashSet<String>,
        negation_short: HashSet<char>,
    },
    Value,
    Dict {
        json_fallback: Option<String>,
        strict_structure: bool,
    },
}

/// A single option definition at one command level.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub(crate) canonical_name: String,
    pub(crate) long_names: Vec<String>,
    pub(crate) short_names: Vec<char>,
    pub(crate) arity: Arity,
    pub(crate) mode: AccumulationMode,
    pub(crate) greedy: bool,
    pub(crate) repeatable: bool,
    pub(crate) flatten: Option<bool>,
    pub(crate) kind: OptionKind,
}

impl OptionSpec {
    pub fn flag(canonical_name: impl Into<String>) -> OptionSpecBuilder {
        OptionSpecBuilder::new(
            canonical_name.into(),
            Arity::ZERO,
            OptionKind::Flag {
                negation_prefixes: HashSet::new(),
                negation_short: HashSet::new(),
            },
        )
    }

    pub fn value(canonical_name: impl Into<String>, arity: Arity) -> OptionSpecBuilder {
        OptionSpecBuilder::new(canonical_name.into(), arity, OptionKind::Value)
    }

    pub fn dict(canonical_name: impl Into<String>, arity: Arity) -> OptionSpecBuilder {
        OptionSpecBuilder::new(
            canonical_name.into(),
            arity,
            OptionKind::Dict {
                json_fallback: None,
                strict_structure: false,
            },
        )
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, OptionKind::Flag { .. })
    }

    pub fn is_dict(&self) -> bool {
        matches!(self.kind, OptionKind::Dict { .. })
    }
}

/// Builder for [`OptionSpec`]. `.build()` on [`CommandSpecBuilder`] runs
/// validation; individual setters never fail.
#[derive(Debug, Clone)]
pub struct OptionSpecBuilder {
    canonical_name: String,
    long_names: Vec<String>,
    short_names: Vec<char>,
    arity: Arity,
    mode: AccumulationMode,
    greedy: bool,
    repeatable: bool,
    flatten: Option<bool>,
    kind: OptionKind,
}

impl OptionSpecBuilder {
    fn new(canonical_name: String, arity: Arity, kind: OptionKind) -> Self {
        OptionSpecBuilder {
            canonical_name,
            long_names: Vec::new(),
            short_names: Vec::new(),
            arity,
            mode: AccumulationMode::Last,
            greedy: false,
            repeatable: true,
            flatten: None,
            kind,
        }
    }

    pub fn long(mut self, name: impl Into<String>) -> Self {
        self.long_names.push(name.into());
        self
    }

    pub fn short(mut self, name: char) -> Self {
        self.short_names.push(name);
        self
    }

    pub fn mode(mut self, mode: AccumulationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    /// Overrides `flatten_accumulated_values` for this option alone (spec
    /// §4.6's option → command → parser precedence for `APPEND`).
    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = Some(flatten);
        self
    }

    /// Only meaningful for [`OptionKind::Flag`]; ignored otherwise.
    pub fn negation_prefix(mut self, word: impl Into<String>) -> Self {
        if let OptionKind::Flag {
            negation_prefixes, ..
        } = &mut self.kind
        {
            negation_prefixes.insert(word.into());
        }
        self
    }

    pub fn negation_short(mut self, c: char) -> Self {
        if let OptionKind::Flag { negation_short, .. } = &mut self.kind {
            negation_short.insert(c);
        }
        self
    }

    /// Only meaningful for [`OptionKind::Dict`]; ignored otherwise.
    pub fn json_fallback(mut self, sibling_option: impl Into<String>) -> Self {
        if let OptionKind::Dict { json_fallback, .. } = &mut self.kind {
            *json_fallback = Some(sibling_option.into());
        }
        self
    }

    pub fn strict_structure(mut self, strict: bool) -> Self {
        if let OptionKind::Dict {
            strict_structure, ..
        } = &mut self.kind
        {
            *strict_structure = strict;
        }
        self
    }

    fn build(self) -> OptionSpec {
        OptionSpec {
            canonical_name: self.canonical_name,
            long_names: self.long_names,
            short_names: self.short_names,
            arity: self.arity,
            mode: self.mode,
            greedy: self.greedy,
            repeatable: self.repeatable,
            flatten: self.flatten,
            kind: self.kind,
        }
    }
}

/// Unnamed, order-sensitive positional argument slot.
#[derive(Debug, Clone)]
pub struct PositionalSpec {
    pub(crate) canonical_name: String,
    pub(crate) arity: Arity,
    pub(crate) greedy: bool,
}

impl PositionalSpec {
    pub fn new(canonical_name: impl Into<String>, arity: Arity) -> Self {
        PositionalSpec {
            canonical_name: canonical_name.into(),
            arity,
            greedy: false,
        }
    }

    pub fn greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }
}

/// Per-command overrides of [`ParserConfiguration`]. `None` means "inherit
/// from the parent" (or the global default, at the root).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub case_sensitive_options: Option<bool>,
    pub convert_underscores: Option<bool>,
    pub allow_abbreviated_options: Option<bool>,
    pub minimum_abbreviation_length: Option<usize>,
    pub allow_abbreviated_subcommands: Option<bool>,
    pub strict_options_before_positionals: Option<bool>,
    pub allow_negative_numbers: Option<bool>,
    pub argfile_prefix: Option<char>,
    pub flatten_accumulated_values: Option<bool>,
}

impl ConfigOverrides {
    pub(crate) fn apply(&self, base: &ParserConfiguration) -> ParserConfiguration {
        let mut out = base.clone();
        if let Some(v) = self.case_sensitive_options {
            out.case_sensitive_options = v;
        }
        if let Some(v) = self.convert_underscores {
            out.convert_underscores = v;
        }
        if let Some(v) = self.allow_abbreviated_options {
            out.allow_abbreviated_options = v;
        }
        if let Some(v) = self.minimum_abbreviation_length {
            out.minimum_abbreviation_length = v;
        }
        if let Some(v) = self.allow_abbreviated_subcommands {
            out.allow_abbreviated_subcommands = v;
        }
        if let Some(v) = self.strict_options_before_positionals {
            out.strict_options_before_positionals = v;
        }
        if let Some(v) = self.allow_negative_numbers {
            out.allow_negative_numbers = v;
        }
        if let Some(v) = self.argfile_prefix {
            out.argfile_prefix = v;
        }
        if let Some(v) = self.flatten_accumulated_values {
            out.flatten_accumulated_values = v;
        }
        out
    }
}

/// A command level: its options, positionals, and nested subcommands.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub(crate) canonical_name: String,
    pub(crate) options: Vec<OptionSpec>,
    pub(crate) positionals: Vec<PositionalSpec>,
    pub(crate) subcommands: Vec<CommandSpec>,
    pub(crate) config_overrides: ConfigOverrides,
}

impl CommandSpec {
    pub fn builder(canonical_name: impl Into<String>) -> CommandSpecBuilder {
        CommandSpecBuilder {
            canonical_name: canonical_name.into(),
            options: Vec::new(),
            positionals: Vec::new(),
            subcommands: Vec::new(),
            config_overrides: ConfigOverrides::default(),
        }
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn positionals(&self) -> &[PositionalSpec] {
        &self.positionals
    }

    pub fn subcommands(&self) -> &[CommandSpec] {
        &self.subcommands
    }
}

/// Builder for [`CommandSpec`]. [`Self::build`] runs every construction-time
/// invariant from spec §4.1 and fails with a [`crate::error::Error::Specification`]
/// variant on the first violation.
pub struct CommandSpecBuilder {
    canonical_name: String,
    options: Vec<OptionSpecBuilder>,
    positionals: Vec<PositionalSpec>,
    subcommands: Vec<CommandSpec>,
    config_overrides: ConfigOverrides,
}

impl CommandSpecBuilder {
    pub fn option(mut self, option: OptionSpecBuilder) -> Self {
        self.options.push(option);
        self
    }

    pub fn positional(mut self, positional: PositionalSpec) -> Self {
        self.positionals.push(positional);
        self
    }

    pub fn subcommand(mut self, command: CommandSpec) -> Self {
        self.subcommands.push(command);
        self
    }

    pub fn config_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.config_overrides = overrides;
        self
    }

    pub fn build(self) -> Result<CommandSpec, Error> {
        let options: Vec<OptionSpec> = self.options.into_iter().map(|b| b.build()).collect();
        validate_command(&self.canonical_name, &options, &self.subcommands)?;
        Ok(CommandSpec {
            canonical_name: self.canonical_name,
            options,
            positionals: self.positionals,
            subcommands: self.subcommands,
            config_overrides: self.config_overrides,
        })
    }
}

/// Every `(case_sensitive_options, convert_underscores)` pair a later
/// `parse()` call or subcommand [`ConfigOverrides`] could select. Validating
/// name uniqueness against all four up front means the uniqueness check spec
/// §4.1 asks for ("after applying the active normalizations") holds no
/// matter which config ends up active at parse time, instead of only the
/// config that happened to be in scope at `build()`.
const NAME_NORMALIZATIONS: [(bool, bool); 4] =
    [(true, true), (true, false), (false, true), (false, false)];

fn validate_command(
    command_name: &str,
    options: &[OptionSpec],
    subcommands: &[CommandSpec],
) -> Result<(), Error> {
    let subcommand_names: HashSet<&str> = subcommands
        .iter()
        .map(|c| c.canonical_name.as_str())
        .collect();

    for opt in options {
        if opt.long_names.is_empty() && opt.short_names.is_empty() {
            return Err(Error::option_spec(
                opt.canonical_name.clone(),
                "option must declare at least one long or short name",
            ));
        }

        if matches!(opt.kind, OptionKind::Flag { .. }) {
            if !opt.arity.is_flag_shaped() {
                return Err(Error::option_spec(
                    opt.canonical_name.clone(),
                    "flag options must have arity (0,0)",
                ));
            }
        } else if opt.arity.is_flag_shaped() {
            return Err(Error::option_spec(
                opt.canonical_name.clone(),
                "only flag options may have arity (0,0)",
            ));
        }

        for long in &opt.long_names {
            if long.is_empty() {
                return Err(Error::option_spec(
                    opt.canonical_name.clone(),
                    "long option names must be at least one character",
                ));
            }
            if !long.chars().next().unwrap().is_alphabetic() {
                return Err(Error::option_spec(
                    opt.canonical_name.clone(),
                    "long option names must begin with a letter",
                ));
            }
            if !long.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
                return Err(Error::option_spec(
                    opt.canonical_name.clone(),
                    "long option names may only contain letters, digits, '-' and '_'",
                ));
            }
            if subcommand_names.contains(long.as_str()) {
                return Err(Error::option_spec(
                    opt.canonical_name.clone(),
                    format!("long name '{long}' collides with a subcommand name"),
                ));
            }
        }

        for &short in &opt.short_names {
            if !short.is_alphabetic() {
                return Err(Error::option_spec(
                    opt.canonical_name.clone(),
                    "short option names must be exactly one letter",
                ));
            }
        }

        if let OptionKind::Dict { json_fallback, .. } = &opt.kind {
            if let Some(sibling) = json_fallback {
                if !options.iter().any(|o| &o.canonical_name == sibling) {
                    return Err(Error::option_spec(
                        opt.canonical_name.clone(),
                        format!("json_fallback option '{sibling}' does not exist at this command level"),
                    ));
                }
            }
        }
    }

    validate_long_name_uniqueness(options)?;
    validate_short_name_uniqueness(options)?;

    let mut seen_commands: HashSet<&str> = HashSet::new();
    for sub in subcommands {
        if !seen_commands.insert(&sub.canonical_name) {
            return Err(Error::command_spec(
                command_name.to_string(),
                format!("subcommand name '{}' is declared more than once", sub.canonical_name),
            ));
        }
    }

    Ok(())
}

/// Two long names that only differ by case or by `-`/`_` still collide once
/// a `ParserConfiguration` folds them together, silently making one option
/// unreachable at parse time. Checked against every normalization in
/// [`NAME_NORMALIZATIONS`], not just whatever happens to be the default.
fn validate_long_name_uniqueness(options: &[OptionSpec]) -> Result<(), Error> {
    for (case_sensitive, convert_underscores) in NAME_NORMALIZATIONS {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for opt in options {
            for long in &opt.long_names {
                let normalized = crate::resolver::normalize_name(long, case_sensitive, convert_underscores);
                match seen.get(normalized.as_str()) {
                    Some(&other) if other != opt.canonical_name => {
                        return Err(Error::option_spec(
                            opt.canonical_name.clone(),
                            format!(
                                "long name '{long}' collides with option '{other}' when \
                                 case_sensitive_options={case_sensitive} and \
                                 convert_underscores={convert_underscores} (both normalize to '{normalized}')"
                            ),
                        ));
                    }
                    _ => {
                        seen.insert(normalized, &opt.canonical_name);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Same as [`validate_long_name_uniqueness`] but for short names, which only
/// fold on case (a single letter has no underscores to convert).
fn validate_short_name_uniqueness(options: &[OptionSpec]) -> Result<(), Error> {
    for case_sensitive in [true, false] {
        let mut seen: HashMap<char, &str> = HashMap::new();
        for opt in options {
            for &short in &opt.short_names {
                let normalized = crate::resolver::normalize_short(short, case_sensitive);
                match seen.get(&normalized) {
                    Some(&other) if other != opt.canonical_name => {
                        return Err(Error::option_spec(
                            opt.canonical_name.clone(),
                            format!(
                                "short name '-{short}' collides with option '{other}' when \
                                 case_sensitive_options={case_sensitive} (both normalize to '-{normalized}')"
                            ),
                        ));
                    }
                    _ => {
                        seen.insert(normalized, &opt.canonical_name);
                    }
                }
            }
        }
    }
    Ok(())
}
