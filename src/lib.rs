//! Flagrant: a specification-driven command-line argument parser.
//!
//! A caller builds a [`CommandSpec`] describing the options, positionals and
//! subcommands a program accepts, then calls [`parse`] against an argv. The
//! result is a [`ParseResult`] tree — one node per command level reached —
//! carrying whatever options, positionals and trailing tokens were scanned.
//!
//! This crate performs syntactic analysis only: it classifies tokens,
//! resolves names, consumes and accumulates values, groups positionals and
//! dispatches into subcommands. It does not render help text, generate shell
//! completions, convert or validate values beyond their raw strings, read
//! environment variables or config files, or invoke a host's command
//! handlers. See `SPEC_FULL.md` in the repository root for the full
//! breakdown.
//!
//! ```
//! use flagrant::{Arity, CommandSpec, OptionSpec};
//!
//! let spec = CommandSpec::builder("demo")
//!     .option(OptionSpec::flag("verbose").long("verbose").short('v'))
//!     .option(OptionSpec::value("output", Arity::EXACTLY_ONE).long("output").short('o'))
//!     .build()
//!     .unwrap();
//!
//! let argv: Vec<String> = vec!["-v".into(), "--output=dist/".into()];
//! let result = flagrant::parse(&spec, &argv, None).unwrap();
//! assert_eq!(result.option("output").unwrap().as_single(), Some("dist/"));
//! ```

mod accumulate;
mod argfile;
mod classify;
mod config;
mod consume;
mod dict;
mod engine;
mod error;
mod positional;
mod resolver;
mod result;
mod spec;

pub use config::ParserConfiguration;
pub use dict::{DictNode, Segment};
pub use error::{DictErrorKind, Error, OptionErrorKind, PositionalErrorKind};
pub use result::{OptionValue, ParseResult};
pub use spec::{
    AccumulationMode, Arity, CommandSpec, CommandSpecBuilder, ConfigOverrides, Max, OptionKind,
    OptionSpec, OptionSpecBuilder, PositionalSpec,
};

/// Parse `argv` against `spec`, expanding `@file` arguments first.
///
/// `config` overrides the default [`ParserConfiguration`] at the root level;
/// subcommands layer their own [`ConfigOverrides`] on top of whatever they
/// inherit. Returns the first [`Error`] encountered — parsing is fail-fast
/// and never accumulates more than one error.
pub fn parse(
    spec: &CommandSpec,
    argv: &[String],
    config: Option<ParserConfiguration>,
) -> Result<ParseResult, Error> {
    let config = spec.config_overrides.apply(&config.unwrap_or_default());
    let expanded = argfile::expand(argv, &config)?;
    log::debug!("parsing {} token(s) against command '{}'", expanded.len(), spec.canonical_name());
    engine::run(spec, &config, &[spec.canonical_name().to_string()], &expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(spec: CommandSpecBuilder) -> CommandSpec {
        spec.build().expect("valid spec")
    }

    #[test]
    fn scenario_mixed_options_and_positionals() {
        let spec = build(
            CommandSpec::builder("cp")
                .option(OptionSpec::flag("recursive").long("recursive").short('r'))
                .positional(PositionalSpec::new("sources", Arity::ONE_OR_MORE))
                .positional(PositionalSpec::new("destination", Arity::EXACTLY_ONE)),
        );
        let argv: Vec<String> = vec!["-r".into(), "a".into(), "b".into(), "c".into(), "d".into()];
        let result = parse(&spec, &argv, None).unwrap();
        assert_eq!(result.option("recursive").unwrap().as_bool(), Some(true));
        assert_eq!(result.positional("sources").unwrap(), ["a", "b", "c"]);
        assert_eq!(result.positional("destination").unwrap(), ["d"]);
    }

    #[test]
    fn scenario_end_of_options_delimiter() {
        let spec = build(
            CommandSpec::builder("run")
                .option(OptionSpec::flag("verbose").long("verbose"))
                .positional(PositionalSpec::new("args", Arity::ZERO_OR_MORE)),
        );
        let argv: Vec<String> = vec!["--".into(), "--verbose".into(), "file.txt".into()];
        let result = parse(&spec, &argv, None).unwrap();
        assert!(result.option("verbose").is_none());
        assert_eq!(result.trailing(), ["--verbose", "file.txt"]);
    }

    #[test]
    fn scenario_short_cluster_with_attached_value() {
        let spec = build(
            CommandSpec::builder("tar")
                .option(OptionSpec::flag("all").short('a'))
                .option(OptionSpec::flag("backup").short('b'))
                .option(OptionSpec::flag("compress").short('c'))
                .option(OptionSpec::value("output", Arity::EXACTLY_ONE).short('o')),
        );
        let argv: Vec<String> = vec!["-abcofile.txt".into()];
        let result = parse(&spec, &argv, None).unwrap();
        assert_eq!(result.option("all").unwrap().as_bool(), Some(true));
        assert_eq!(result.option("backup").unwrap().as_bool(), Some(true));
        assert_eq!(result.option("compress").unwrap().as_bool(), Some(true));
        assert_eq!(result.option("output").unwrap().as_single(), Some("file.txt"));
    }

    #[test]
    fn scenario_ambiguous_abbreviation_is_reported() {
        let spec = build(
            CommandSpec::builder("app")
                .option(OptionSpec::flag("verbose").long("verbose"))
                .option(OptionSpec::flag("version").long("version"))
                .config_overrides(ConfigOverrides {
                    allow_abbreviated_options: Some(true),
                    ..Default::default()
                }),
        );
        let argv: Vec<String> = vec!["--ver".into()];
        let err = parse(&spec, &argv, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Option {
                kind: OptionErrorKind::AmbiguousOption { .. },
                ..
            }
        ));
    }

    #[test]
    fn scenario_negation_flag_rejects_inline_value() {
        let spec = build(CommandSpec::builder("app").option(
            OptionSpec::flag("color").long("color").negation_prefix("no"),
        ));
        let argv: Vec<String> = vec!["--no-color=bright".into()];
        let err = parse(&spec, &argv, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Option {
                kind: OptionErrorKind::FlagWithValue { .. },
                ..
            }
        ));
    }

    #[test]
    fn negation_flag_without_value_is_recorded_as_negated() {
        let spec = build(CommandSpec::builder("app").option(
            OptionSpec::flag("color").long("color").negation_prefix("no"),
        ));
        let argv: Vec<String> = vec!["--no-color".into()];
        let result = parse(&spec, &argv, None).unwrap();
        assert_eq!(result.option("color").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn subcommand_dispatch_splits_args_at_the_boundary() {
        let spec = build(
            CommandSpec::builder("git")
                .option(OptionSpec::flag("verbose").long("verbose"))
                .subcommand(build(
                    CommandSpec::builder("commit")
                        .option(OptionSpec::value("message", Arity::EXACTLY_ONE).long("message").short('m')),
                )),
        );
        let argv: Vec<String> = vec!["--verbose".into(), "commit".into(), "-m".into(), "hi".into()];
        let result = parse(&spec, &argv, None).unwrap();
        assert_eq!(result.args(), argv[..2]);
        let child = result.subcommand().unwrap();
        assert_eq!(child.command(), "commit");
        assert_eq!(child.option("message").unwrap().as_single(), Some("hi"));
    }

    #[test]
    fn unknown_option_is_reported_with_position() {
        let spec = build(CommandSpec::builder("app").option(OptionSpec::flag("verbose").long("verbose")));
        let argv: Vec<String> = vec!["--nope".into()];
        let err = parse(&spec, &argv, None).unwrap_err();
        match err {
            Error::Option { kind: OptionErrorKind::UnknownOption, position, .. } => assert_eq!(position, 0),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dict_option_builds_nested_tree_from_repeated_pairs() {
        let spec = build(CommandSpec::builder("app").option(
            OptionSpec::dict("set", Arity::ONE_OR_MORE).long("set").mode(AccumulationMode::Merge),
        ));
        let argv: Vec<String> = vec!["--set".into(), "db.host=localhost".into(), "db.port=5432".into()];
        let result = parse(&spec, &argv, None).unwrap();
        match result.option("set").unwrap() {
            OptionValue::Tree(DictNode::Map(m)) => match &m["db"] {
                DictNode::Map(inner) => {
                    assert_eq!(inner["host"], DictNode::Leaf("localhost".into()));
                    assert_eq!(inner["port"], DictNode::Leaf("5432".into()));
                }
                _ => panic!("expected nested map"),
            },
            other => panic!("unexpected value: {other:?}"),
        }
    }
}
