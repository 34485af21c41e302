//! Name resolution (spec §4.2): turning a user-supplied name into a
//! canonical option or subcommand, honoring case/underscore normalization
//! and unique-prefix abbreviation. Built once per command level and reused
//! for every parse against that level — the lookup tables are immutable
//! after [`Resolver::build`] returns.

use crate::config::ParserConfiguration;
use crate::spec::{CommandSpec, OptionKind};
use std::collections::HashMap;

/// Normalize a long option or subcommand name under a given `(case_sensitive,
/// convert_underscores)` pair. Takes the booleans directly, rather than a
/// [`ParserConfiguration`], so [`crate::spec::validate_command`] can probe
/// every normalization combination a later `parse()` call could possibly
/// select, not just whatever config happens to be active right now.
pub(crate) fn normalize_name(name: &str, case_sensitive: bool, convert_underscores: bool) -> String {
    let mut s = name.to_string();
    if !case_sensitive {
        s = s.to_lowercase();
    }
    if convert_underscores {
        s = s.replace('_', "-");
    }
    s
}

fn normalize(name: &str, config: &ParserConfiguration) -> String {
    normalize_name(name, config.case_sensitive_options, config.convert_underscores)
}

/// Normalize a short option letter the same way `normalize_name` does for
/// case, since a short name has no underscores to fold.
pub(crate) fn normalize_short(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        c
    } else {
        c.to_ascii_lowercase()
    }
}

pub(crate) enum LongResolution {
    Unique { canonical: String, negated: bool },
    Ambiguous(Vec<String>),
    NotFound,
}

pub(crate) enum ShortResolution {
    Unique { canonical: String, negated: bool },
    NotFound,
}

pub(crate) enum SubcommandResolution {
    Unique(String),
    Ambiguous(Vec<String>),
    NotFound,
}

struct NegationEntry {
    normalized_prefix: String,
    normalized_long: String,
    canonical: String,
}

/// Cached, normalized lookup tables for one [`CommandSpec`] level.
pub(crate) struct Resolver {
    long_exact: HashMap<String, String>,
    long_all: Vec<(String, String)>,
    short_exact: HashMap<char, String>,
    negations: Vec<NegationEntry>,
    negation_short: HashMap<char, String>,
    subcommand_exact: HashMap<String, String>,
    subcommand_all: Vec<(String, String)>,
}

impl Resolver {
    pub(crate) fn build(spec: &CommandSpec, config: &ParserConfiguration) -> Self {
        let mut long_exact = HashMap::new();
        let mut long_all = Vec::new();
        let mut short_exact = HashMap::new();
        let mut negations = Vec::new();
        let mut negation_short = HashMap::new();

        for opt in spec.options() {
            for long in &opt.long_names {
                let norm = normalize(long, config);
                long_exact.insert(norm.clone(), opt.canonical_name.clone());
                long_all.push((norm, opt.canonical_name.clone()));
            }
            for &short in &opt.short_names {
                let norm = normalize_short(short, config.case_sensitive_options);
                short_exact.insert(norm, opt.canonical_name.clone());
            }
            if let OptionKind::Flag {
                negation_prefixes,
                negation_short: neg_short,
            } = &opt.kind
            {
                for prefix in negation_prefixes {
                    let normalized_prefix = normalize(prefix, config);
                    for long in &opt.long_names {
                        negations.push(NegationEntry {
                            normalized_prefix: normalized_prefix.clone(),
                            normalized_long: normalize(long, config),
                            canonical: opt.canonical_name.clone(),
                        });
                    }
                }
                for &c in neg_short {
                    let norm = normalize_short(c, config.case_sensitive_options);
                    negation_short.insert(norm, opt.canonical_name.clone());
                }
            }
        }

        let mut subcommand_exact = HashMap::new();
        let mut subcommand_all = Vec::new();
        for sub in spec.subcommands() {
            let norm = normalize(&sub.canonical_name, config);
            subcommand_exact.insert(norm.clone(), sub.canonical_name.clone());
            subcommand_all.push((norm, sub.canonical_name.clone()));
        }

        log::trace!(
            "built resolver for '{}': {} long names, {} short names, {} subcommands",
            spec.canonical_name(),
            long_exact.len(),
            short_exact.len(),
            subcommand_exact.len()
        );

        Resolver {
            long_exact,
            long_all,
            short_exact,
            negations,
            negation_short,
            subcommand_exact,
            subcommand_all,
        }
    }

    pub(crate) fn resolve_long(&self, user_name: &str, config: &ParserConfiguration) -> LongResolution {
        let normalized = normalize(user_name, config);

        if let Some(canonical) = self.long_exact.get(&normalized) {
            return LongResolution::Unique {
                canonical: canonical.clone(),
                negated: false,
            };
        }

        for entry in &self.negations {
            let combined = format!("{}-{}", entry.normalized_prefix, entry.normalized_long);
            if combined == normalized {
                return LongResolution::Unique {
                    canonical: entry.canonical.clone(),
                    negated: true,
                };
            }
        }

        if config.allow_abbreviated_options
            && normalized.len() >= config.minimum_abbreviation_length
        {
            let mut matched_canonicals: Vec<&str> = Vec::new();
            let mut matched_names: Vec<&str> = Vec::new();
            for (norm, canonical) in &self.long_all {
                if norm.starts_with(&normalized) {
                    matched_names.push(norm.as_str());
                    if !matched_canonicals.contains(&canonical.as_str()) {
                        matched_canonicals.push(canonical.as_str());
                    }
                }
            }
            match matched_canonicals.len() {
                0 => {}
                1 => {
                    return LongResolution::Unique {
                        canonical: matched_canonicals[0].to_string(),
                        negated: false,
                    }
                }
                _ => {
                    let mut names: Vec<String> = matched_names.iter().map(|s| s.to_string()).collect();
                    names.sort();
                    names.dedup();
                    return LongResolution::Ambiguous(names);
                }
            }
        }

        LongResolution::NotFound
    }

    pub(crate) fn resolve_short(&self, c: char, config: &ParserConfiguration) -> ShortResolution {
        let norm = normalize_short(c, config.case_sensitive_options);
        if let Some(canonical) = self.short_exact.get(&norm) {
            return ShortResolution::Unique {
                canonical: canonical.clone(),
                negated: false,
            };
        }
        if let Some(canonical) = self.negation_short.get(&norm) {
            return ShortResolution::Unique {
                canonical: canonical.clone(),
                negated: true,
            };
        }
        ShortResolution::NotFound
    }

    pub(crate) fn resolve_subcommand(
        &self,
        user_name: &str,
        config: &ParserConfiguration,
    ) -> SubcommandResolution {
        let normalized = normalize(user_name, config);

        if let Some(canonical) = self.subcommand_exact.get(&normalized) {
            return SubcommandResolution::Unique(canonical.clone());
        }

        if config.allow_abbreviated_subcommands
            && normalized.len() >= config.minimum_abbreviation_length
        {
            let mut matched: Vec<&str> = Vec::new();
            for (norm, canonical) in &self.subcommand_all {
                if norm.starts_with(&normalized) && !matched.contains(&canonical.as_str()) {
                    matched.push(canonical.as_str());
                }
            }
            match matched.len() {
                0 => {}
                1 => return SubcommandResolution::Unique(matched[0].to_string()),
                _ => {
                    let mut names: Vec<String> = matched.iter().map(|s| s.to_string()).collect();
                    names.sort();
                    return SubcommandResolution::Ambiguous(names);
                }
            }
        }

        SubcommandResolution::NotFound
    }

    pub(crate) fn has_subcommands(&self) -> bool {
        !self.subcommand_exact.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{CommandSpec, OptionSpec};
    use pretty_assertions::assert_eq;

    fn config(mutate: impl FnOnce(&mut ParserConfiguration)) -> ParserConfiguration {
        let mut c = ParserConfiguration::default();
        mutate(&mut c);
        c
    }

    #[test]
    fn exact_long_match_wins_over_abbreviation() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("verbose").long("verbose"))
            .option(OptionSpec::flag("verify").long("verify"))
            .build()
            .unwrap();
        let cfg = config(|c| c.allow_abbreviated_options = true);
        let resolver = Resolver::build(&spec, &cfg);
        match resolver.resolve_long("verbose", &cfg) {
            LongResolution::Unique { canonical, negated } => {
                assert_eq!(canonical, "verbose");
                assert!(!negated);
            }
            _ => panic!("expected exact match"),
        }
    }

    #[test]
    fn unique_abbreviation_resolves() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("verbose").long("verbose"))
            .build()
            .unwrap();
        let cfg = config(|c| c.allow_abbreviated_options = true);
        let resolver = Resolver::build(&spec, &cfg);
        match resolver.resolve_long("verb", &cfg) {
            LongResolution::Unique { canonical, .. } => assert_eq!(canonical, "verbose"),
            _ => panic!("expected unique abbreviation"),
        }
    }

    #[test]
    fn ambiguous_abbreviation_lists_every_match() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("verbose").long("verbose"))
            .option(OptionSpec::flag("version").long("version"))
            .build()
            .unwrap();
        let cfg = config(|c| c.allow_abbreviated_options = true);
        let resolver = Resolver::build(&spec, &cfg);
        match resolver.resolve_long("ver", &cfg) {
            LongResolution::Ambiguous(matched) => {
                assert_eq!(matched, vec!["verbose".to_string(), "version".to_string()])
            }
            _ => panic!("expected ambiguity"),
        }
    }

    #[test]
    fn case_insensitive_long_match() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("verbose").long("Verbose"))
            .build()
            .unwrap();
        let cfg = config(|c| c.case_sensitive_options = false);
        let resolver = Resolver::build(&spec, &cfg);
        match resolver.resolve_long("VERBOSE", &cfg) {
            LongResolution::Unique { canonical, .. } => assert_eq!(canonical, "verbose"),
            _ => panic!("expected case-insensitive match"),
        }
    }

    #[test]
    fn underscore_and_dash_are_equivalent_when_configured() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("dry_run").long("dry_run"))
            .build()
            .unwrap();
        let cfg = config(|c| c.convert_underscores = true);
        let resolver = Resolver::build(&spec, &cfg);
        match resolver.resolve_long("dry-run", &cfg) {
            LongResolution::Unique { canonical, .. } => assert_eq!(canonical, "dry_run"),
            _ => panic!("expected underscore/dash equivalence"),
        }
    }

    #[test]
    fn negation_prefix_resolves_to_the_flag_negated() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("color").long("color").negation_prefix("no"))
            .build()
            .unwrap();
        let cfg = ParserConfiguration::default();
        let resolver = Resolver::build(&spec, &cfg);
        match resolver.resolve_long("no-color", &cfg) {
            LongResolution::Unique { canonical, negated } => {
                assert_eq!(canonical, "color");
                assert!(negated);
            }
            _ => panic!("expected negated resolution"),
        }
    }

    #[test]
    fn short_name_case_folds_when_case_insensitive() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("verbose").short('v'))
            .build()
            .unwrap();
        let cfg = config(|c| c.case_sensitive_options = false);
        let resolver = Resolver::build(&spec, &cfg);
        match resolver.resolve_short('V', &cfg) {
            ShortResolution::Unique { canonical, .. } => assert_eq!(canonical, "verbose"),
            _ => panic!("expected case-folded short match"),
        }
    }

    #[test]
    fn short_name_is_case_sensitive_by_default() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("verbose").short('v'))
            .build()
            .unwrap();
        let cfg = ParserConfiguration::default();
        let resolver = Resolver::build(&spec, &cfg);
        assert!(matches!(resolver.resolve_short('V', &cfg), ShortResolution::NotFound));
    }

    #[test]
    fn subcommand_abbreviation_resolves_uniquely() {
        let spec = CommandSpec::builder("git")
            .subcommand(CommandSpec::builder("commit").build().unwrap())
            .subcommand(CommandSpec::builder("checkout").build().unwrap())
            .build()
            .unwrap();
        let cfg = config(|c| c.allow_abbreviated_subcommands = true);
        let resolver = Resolver::build(&spec, &cfg);
        match resolver.resolve_subcommand("comm", &cfg) {
            SubcommandResolution::Unique(name) => assert_eq!(name, "commit"),
            _ => panic!("expected unique subcommand abbreviation"),
        }
    }

    #[test]
    fn unknown_long_name_is_not_found() {
        let spec = CommandSpec::builder("app")
            .option(OptionSpec::flag("verbose").long("verbose"))
            .build()
            .unwrap();
        let cfg = ParserConfiguration::default();
        let resolver = Resolver::build(&spec, &cfg);
        assert!(matches!(resolver.resolve_long("nope", &cfg), LongResolution::NotFound));
    }
}
