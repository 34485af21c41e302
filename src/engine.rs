//! The single-pass scan loop (spec §4.8, §4.9): classify each token, resolve
//! it against the current command level, consume and accumulate its value if
//! it takes one, and recurse into a subcommand the moment one is found. This
//! is the one place that ties the classifier, resolver, consumer,
//! accumulator and positional grouper together.

use crate::accumulate::{self, AccumError};
use crate::classify::{self, is_negative_number, TokenShape};
use crate::config::ParserConfiguration;
use crate::consume::consume;
use crate::dict::{self, DictNode};
use crate::error::{DictErrorKind, Error, OptionErrorKind, PositionalErrorKind};
use crate::positional::{self, PositionalGroupError};
use crate::resolver::{LongResolution, Resolver, ShortResolution, SubcommandResolution};
use crate::result::{OptionValue, ParseResult};
use crate::spec::{CommandSpec, OptionKind, OptionSpec};
use std::collections::HashMap;

pub(crate) fn run(
    spec: &CommandSpec,
    config: &ParserConfiguration,
    path: &[String],
    tail: &[String],
) -> Result<ParseResult, Error> {
    let resolver = Resolver::build(spec, config);
    let any_positional_defined = !spec.positionals().is_empty();

    let mut options: HashMap<String, OptionValue> = HashMap::new();
    let mut positional_queue: Vec<String> = Vec::new();
    let mut trailing: Vec<String> = Vec::new();
    let mut seen_positional = false;
    let mut after_end_of_options = false;
    let mut i = 0usize;

    log::trace!("entering command '{}' with {} token(s)", spec.canonical_name(), tail.len());

    while i < tail.len() {
        let token = tail[i].as_str();

        if after_end_of_options {
            trailing.push(token.to_string());
            i += 1;
            continue;
        }

        if token == "--" {
            after_end_of_options = true;
            i += 1;
            continue;
        }

        if config.strict_options_before_positionals && seen_positional {
            positional_queue.push(token.to_string());
            i += 1;
            continue;
        }

        if token == "-" {
            positional_queue.push(token.to_string());
            seen_positional = true;
            i += 1;
            continue;
        }

        if config.allow_negative_numbers && any_positional_defined && is_negative_number(token) {
            positional_queue.push(token.to_string());
            seen_positional = true;
            i += 1;
            continue;
        }

        match classify::classify(token) {
            TokenShape::LongOpt { name, inline_value } => {
                let consumed = handle_long(
                    spec,
                    config,
                    &resolver,
                    &mut options,
                    path,
                    tail,
                    i,
                    name,
                    inline_value,
                    any_positional_defined,
                )?;
                i += consumed;
                continue;
            }
            TokenShape::ShortCluster { chars } => {
                let consumed = handle_short_cluster(
                    spec,
                    config,
                    &resolver,
                    &mut options,
                    path,
                    tail,
                    i,
                    chars,
                    any_positional_defined,
                )?;
                i += consumed;
                continue;
            }
            TokenShape::EndOfOptions | TokenShape::LoneDash => {
                unreachable!("handled by the '--'/'-' checks above")
            }
            TokenShape::Word(_) => {}
        }

        if resolver.has_subcommands() {
            match resolver.resolve_subcommand(token, config) {
                SubcommandResolution::Unique(canonical) => {
                    return dispatch_subcommand(
                        spec, config, path, tail, i, &canonical, options, positional_queue,
                        trailing,
                    );
                }
                SubcommandResolution::Ambiguous(_matched) => {
                    return Err(Error::UnknownSubcommand {
                        subcommand: token.to_string(),
                        path: path.to_vec(),
                        args: tail.to_vec(),
                        position: i,
                    });
                }
                SubcommandResolution::NotFound => {}
            }
        }

        positional_queue.push(token.to_string());
        seen_positional = true;
        i += 1;
    }

    let positionals = positional::group(&positional_queue, spec.positionals()).map_err(|e| {
        positional_error(e, path, tail)
    })?;

    apply_json_fallbacks(spec, path, tail, &mut options)?;

    Ok(ParseResult {
        command: spec.canonical_name().to_string(),
        args: tail.to_vec(),
        options,
        positionals,
        trailing,
        subcommand: None,
    })
}

fn find_option<'a>(spec: &'a CommandSpec, canonical: &str) -> &'a OptionSpec {
    spec.options()
        .iter()
        .find(|o| o.canonical_name() == canonical)
        .expect("resolver only returns canonical names present in the spec")
}

fn find_subcommand<'a>(spec: &'a CommandSpec, canonical: &str) -> &'a CommandSpec {
    spec.subcommands()
        .iter()
        .find(|c| c.canonical_name() == canonical)
        .expect("resolver only returns canonical names present in the spec")
}

#[allow(clippy::too_many_arguments)]
fn handle_long(
    spec: &CommandSpec,
    config: &ParserConfiguration,
    resolver: &Resolver,
    options: &mut HashMap<String, OptionValue>,
    path: &[String],
    tail: &[String],
    i: usize,
    name: &str,
    inline: Option<&str>,
    any_positional_defined: bool,
) -> Result<usize, Error> {
    match resolver.resolve_long(name, config) {
        LongResolution::NotFound => Err(option_error(
            OptionErrorKind::UnknownOption,
            name.to_string(),
            path,
            tail,
            i,
        )),
        LongResolution::Ambiguous(matched) => Err(option_error(
            OptionErrorKind::AmbiguousOption { matched },
            name.to_string(),
            path,
            tail,
            i,
        )),
        LongResolution::Unique { canonical, negated } => {
            let opt = find_option(spec, &canonical);
            if opt.is_flag() {
                if let Some(value) = inline {
                    let kind = if negated {
                        OptionErrorKind::FlagWithValue {
                            received: value.to_string(),
                        }
                    } else {
                        OptionErrorKind::ValueNotAllowed {
                            received: value.to_string(),
                        }
                    };
                    return Err(option_error(kind, canonical, path, tail, i));
                }
                accumulate_flag_into(options, opt, &canonical, !negated, path, tail, i)?;
                Ok(1)
            } else {
                let (values, consumed_extra) = if let Some(value) = inline {
                    (vec![value.to_string()], 0)
                } else {
                    let subcommand_names_contains = |s: &str| {
                        matches!(resolver.resolve_subcommand(s, config), SubcommandResolution::Unique(_))
                    };
                    consume(
                        &tail[i + 1..],
                        opt.arity.max.as_usize(),
                        opt.greedy,
                        config.allow_negative_numbers,
                        any_positional_defined,
                        subcommand_names_contains,
                    )
                };
                if values.len() < opt.arity.min {
                    return Err(option_error(
                        OptionErrorKind::MissingValue {
                            required: (opt.arity.min, opt.arity.max.as_usize()),
                            received: values.len(),
                        },
                        canonical,
                        path,
                        tail,
                        i,
                    ));
                }
                accumulate_values_into(options, opt, &canonical, values, config, path, tail, i)?;
                Ok(1 + consumed_extra)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_short_cluster(
    spec: &CommandSpec,
    config: &ParserConfiguration,
    resolver: &Resolver,
    options: &mut HashMap<String, OptionValue>,
    path: &[String],
    tail: &[String],
    i: usize,
    chars: &str,
    any_positional_defined: bool,
) -> Result<usize, Error> {
    for (byte_idx, c) in chars.char_indices() {
        match resolver.resolve_short(c, config) {
            ShortResolution::NotFound => {
                return Err(option_error(
                    OptionErrorKind::UnknownOption,
                    format!("-{c}"),
                    path,
                    tail,
                    i,
                ));
            }
            ShortResolution::Unique { canonical, negated } => {
                let opt = find_option(spec, &canonical);
                if opt.is_flag() {
                    accumulate_flag_into(options, opt, &canonical, !negated, path, tail, i)?;
                    continue;
                }

                let remainder_start = byte_idx + c.len_utf8();
                let remainder = &chars[remainder_start..];
                let (values, consumed_extra) = if let Some(inline) = remainder.strip_prefix('=') {
                    (vec![inline.to_string()], 0)
                } else if !remainder.is_empty() {
                    (vec![remainder.to_string()], 0)
                } else {
                    let subcommand_names_contains = |s: &str| {
                        matches!(resolver.resolve_subcommand(s, config), SubcommandResolution::Unique(_))
                    };
                    consume(
                        &tail[i + 1..],
                        opt.arity.max.as_usize(),
                        opt.greedy,
                        config.allow_negative_numbers,
                        any_positional_defined,
                        subcommand_names_contains,
                    )
                };

                if values.len() < opt.arity.min {
                    return Err(option_error(
                        OptionErrorKind::MissingValue {
                            required: (opt.arity.min, opt.arity.max.as_usize()),
                            received: values.len(),
                        },
                        canonical,
                        path,
                        tail,
                        i,
                    ));
                }
                accumulate_values_into(options, opt, &canonical, values, config, path, tail, i)?;
                return Ok(1 + consumed_extra);
            }
        }
    }

    Ok(1)
}

fn accumulate_flag_into(
    options: &mut HashMap<String, OptionValue>,
    opt: &OptionSpec,
    canonical: &str,
    present: bool,
    path: &[String],
    tail: &[String],
    i: usize,
) -> Result<(), Error> {
    if !opt.repeatable && options.contains_key(canonical) {
        return Err(option_error(
            OptionErrorKind::NotRepeatable {
                received: tail[i].clone(),
            },
            canonical.to_string(),
            path,
            tail,
            i,
        ));
    }
    let existing = options.get(canonical).cloned();
    let updated = accumulate::accumulate_flag(opt.mode, existing, present).map_err(|e| {
        accum_error_to_option_error(e, canonical, &tail[i], path, tail, i)
    })?;
    options.insert(canonical.to_string(), updated);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn accumulate_values_into(
    options: &mut HashMap<String, OptionValue>,
    opt: &OptionSpec,
    canonical: &str,
    values: Vec<String>,
    config: &ParserConfiguration,
    path: &[String],
    tail: &[String],
    i: usize,
) -> Result<(), Error> {
    if !opt.repeatable && options.contains_key(canonical) {
        return Err(option_error(
            OptionErrorKind::NotRepeatable {
                received: tail[i].clone(),
            },
            canonical.to_string(),
            path,
            tail,
            i,
        ));
    }

    if opt.is_dict() {
        let mut tree = DictNode::Map(std::collections::BTreeMap::new());
        let strict_structure = matches!(
            opt.kind,
            OptionKind::Dict { strict_structure: true, .. }
        );
        for raw in &values {
            let (segments, value) = dict::parse_pair(raw).map_err(|kind| {
                dict_error(kind, canonical, path, tail, i)
            })?;
            dict::insert(&mut tree, &segments, value, strict_structure).map_err(|kind| {
                dict_error(kind, canonical, path, tail, i)
            })?;
        }
        let existing = options.get(canonical).cloned();
        let updated = accumulate::accumulate_dict(opt.mode, existing, tree).map_err(|e| {
            accum_error_to_option_error(e, canonical, &tail[i], path, tail, i)
        })?;
        options.insert(canonical.to_string(), updated);
    } else {
        let scalar_shaped = opt.arity.max.as_usize() == Some(1);
        let existing = options.get(canonical).cloned();
        let flatten = opt.flatten.unwrap_or(config.flatten_accumulated_values);
        let updated = accumulate::accumulate_value(opt.mode, existing, values, scalar_shaped, flatten)
        .map_err(|e| accum_error_to_option_error(e, canonical, &tail[i], path, tail, i))?;
        options.insert(canonical.to_string(), updated);
    }
    Ok(())
}

fn accum_error_to_option_error(
    _e: AccumError,
    canonical: &str,
    raw_token: &str,
    path: &[String],
    tail: &[String],
    i: usize,
) -> Error {
    option_error(
        OptionErrorKind::NotRepeatable {
            received: raw_token.to_string(),
        },
        canonical.to_string(),
        path,
        tail,
        i,
    )
}

fn option_error(
    kind: OptionErrorKind,
    option: String,
    path: &[String],
    tail: &[String],
    position: usize,
) -> Error {
    Error::Option {
        kind,
        option,
        path: path.to_vec(),
        args: tail.to_vec(),
        position,
    }
}

fn dict_error(kind: DictErrorKind, option: &str, path: &[String], tail: &[String], position: usize) -> Error {
    Error::DictParse {
        kind,
        option: option.to_string(),
        path: path.to_vec(),
        args: tail.to_vec(),
        position,
    }
}

fn positional_error(err: PositionalGroupError, path: &[String], tail: &[String]) -> Error {
    // `tail.len()` is one past the last valid index into `args` — spec §8
    // requires `position` to always be a valid index, so the last token is
    // the closest-available offender to blame these post-scan errors on.
    let position = tail.len().saturating_sub(1);
    match err {
        PositionalGroupError::Missing {
            name,
            required,
            received,
        } => Error::Positional {
            kind: PositionalErrorKind::MissingValue { required, received },
            positional: name,
            path: path.to_vec(),
            args: tail.to_vec(),
            position,
        },
        PositionalGroupError::Unexpected { name, received } => Error::Positional {
            kind: PositionalErrorKind::UnexpectedValue { received },
            positional: name,
            path: path.to_vec(),
            args: tail.to_vec(),
            position,
        },
    }
}

/// A `Dict` option may declare a sibling `Value` option that accepts a whole
/// JSON document as an alternative way to populate the same tree. Once the
/// main scan is done, fold any JSON the sibling collected into the dict's
/// tree — last-write-wins at the leaf, same as any other `MERGE`.
fn apply_json_fallbacks(
    spec: &CommandSpec,
    path: &[String],
    tail: &[String],
    options: &mut HashMap<String, OptionValue>,
) -> Result<(), Error> {
    for opt in spec.options() {
        let OptionKind::Dict { json_fallback: Some(sibling), .. } = &opt.kind else {
            continue;
        };
        let Some(sibling_value) = options.get(sibling).cloned() else {
            continue;
        };
        let raw_values: Vec<String> = match sibling_value {
            OptionValue::Single(s) => vec![s],
            OptionValue::Sequence(v) => v,
            _ => continue,
        };

        let mut incoming = DictNode::Map(std::collections::BTreeMap::new());
        for raw in raw_values {
            // Folded in after the main scan, so there's no token position to
            // blame — attribute it to the last token in `args`, the closest
            // valid index (spec §8 requires `position` to always be one).
            let parsed = dict::from_json(&raw).map_err(|kind| {
                dict_error(kind, opt.canonical_name(), path, tail, tail.len().saturating_sub(1))
            })?;
            dict::merge(&mut incoming, parsed);
        }

        match options.get_mut(opt.canonical_name()) {
            Some(OptionValue::Tree(existing)) => dict::merge(existing, incoming),
            _ => {
                options.insert(opt.canonical_name().to_string(), OptionValue::Tree(incoming));
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn dispatch_subcommand(
    spec: &CommandSpec,
    config: &ParserConfiguration,
    path: &[String],
    tail: &[String],
    i: usize,
    canonical: &str,
    mut options: HashMap<String, OptionValue>,
    positional_queue: Vec<String>,
    trailing: Vec<String>,
) -> Result<ParseResult, Error> {
    let own_args = tail[..=i].to_vec();
    let positionals = positional::group(&positional_queue, spec.positionals())
        .map_err(|e| positional_error(e, path, tail))?;

    apply_json_fallbacks(spec, path, tail, &mut options)?;

    let child_spec = find_subcommand(spec, canonical);
    let child_config = child_spec.config_overrides.apply(config);
    let mut child_path = path.to_vec();
    child_path.push(child_spec.canonical_name().to_string());

    let child_result = run(child_spec, &child_config, &child_path, &tail[i + 1..])?;

    Ok(ParseResult {
        command: spec.canonical_name().to_string(),
        args: own_args,
        options,
        positionals,
        trailing,
        subcommand: Some(Box::new(child_result)),
    })
}
