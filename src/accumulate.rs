//! Merging repeated option occurrences into one result slot (spec §4.6).
//! Each function here implements exactly one row × column of the
//! accumulation table; the engine decides which to call based on the
//! option's variant.

use crate::dict;
use crate::dict::DictNode;
use crate::result::OptionValue;
use crate::spec::AccumulationMode;

pub(crate) enum AccumError {
    NotRepeatable,
}

pub(crate) fn accumulate_flag(
    mode: AccumulationMode,
    existing: Option<OptionValue>,
    present: bool,
) -> Result<OptionValue, AccumError> {
    let new_val = if present {
        OptionValue::FlagPresent
    } else {
        OptionValue::FlagNegated
    };
    match mode {
        AccumulationMode::First => Ok(existing.unwrap_or(new_val)),
        AccumulationMode::Last => Ok(new_val),
        AccumulationMode::Count => match existing {
            Some(OptionValue::Count(n)) => Ok(OptionValue::Count(n + 1)),
            _ => Ok(OptionValue::Count(1)),
        },
        AccumulationMode::Error => match existing {
            None => Ok(new_val),
            Some(_) => Err(AccumError::NotRepeatable),
        },
        // Append/Extend/Merge have no defined meaning for flags; spec's table
        // leaves them blank for the Flag column, so we fall back to Last.
        AccumulationMode::Append | AccumulationMode::Extend | AccumulationMode::Merge => {
            Ok(new_val)
        }
    }
}

fn shape(values: Vec<String>, scalar_shaped: bool) -> OptionValue {
    if scalar_shaped && values.len() == 1 {
        OptionValue::Single(values.into_iter().next().unwrap())
    } else {
        OptionValue::Sequence(values)
    }
}

pub(crate) fn accumulate_value(
    mode: AccumulationMode,
    existing: Option<OptionValue>,
    new_values: Vec<String>,
    scalar_shaped: bool,
    flatten: bool,
) -> Result<OptionValue, AccumError> {
    match mode {
        AccumulationMode::First => Ok(existing.unwrap_or_else(|| shape(new_values, scalar_shaped))),
        AccumulationMode::Last => Ok(shape(new_values, scalar_shaped)),
        AccumulationMode::Extend => {
            let mut flat = match existing {
                Some(OptionValue::Sequence(v)) => v,
                Some(OptionValue::Single(s)) => vec![s],
                _ => Vec::new(),
            };
            flat.extend(new_values);
            Ok(OptionValue::Sequence(flat))
        }
        AccumulationMode::Append => {
            if flatten {
                let mut flat = match existing {
                    Some(OptionValue::Sequence(v)) => v,
                    Some(OptionValue::Single(s)) => vec![s],
                    _ => Vec::new(),
                };
                flat.extend(new_values);
                Ok(OptionValue::Sequence(flat))
            } else {
                let mut nested = match existing {
                    Some(OptionValue::NestedSequence(v)) => v,
                    Some(OptionValue::Sequence(v)) => vec![v],
                    Some(OptionValue::Single(s)) => vec![vec![s]],
                    _ => Vec::new(),
                };
                nested.push(new_values);
                Ok(OptionValue::NestedSequence(nested))
            }
        }
        AccumulationMode::Error => match existing {
            None => Ok(shape(new_values, scalar_shaped)),
            Some(_) => Err(AccumError::NotRepeatable),
        },
        // Count/Merge have no defined meaning for Value options.
        AccumulationMode::Count | AccumulationMode::Merge => Ok(shape(new_values, scalar_shaped)),
    }
}

pub(crate) fn accumulate_dict(
    mode: AccumulationMode,
    existing: Option<OptionValue>,
    new_tree: DictNode,
) -> Result<OptionValue, AccumError> {
    match mode {
        AccumulationMode::First => Ok(existing.unwrap_or(OptionValue::Tree(new_tree))),
        AccumulationMode::Last => Ok(OptionValue::Tree(new_tree)),
        AccumulationMode::Merge => match existing {
            Some(OptionValue::Tree(mut base)) => {
                dict::merge(&mut base, new_tree);
                Ok(OptionValue::Tree(base))
            }
            _ => Ok(OptionValue::Tree(new_tree)),
        },
        AccumulationMode::Error => match existing {
            None => Ok(OptionValue::Tree(new_tree)),
            Some(_) => Err(AccumError::NotRepeatable),
        },
        AccumulationMode::Count | AccumulationMode::Append | AccumulationMode::Extend => {
            Ok(OptionValue::Tree(new_tree))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn last_is_idempotent() {
        let once = accumulate_value(AccumulationMode::Last, None, vec!["v".into()], true, false).unwrap();
        let twice = accumulate_value(AccumulationMode::Last, Some(once.clone()), vec!["v".into()], true, false).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn extend_is_monotone() {
        let a = accumulate_value(AccumulationMode::Extend, None, vec!["a".into()], false, false).unwrap();
        let b = accumulate_value(AccumulationMode::Extend, Some(a), vec!["b".into()], false, false).unwrap();
        assert_eq!(b, OptionValue::Sequence(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn append_nests_by_default() {
        let a = accumulate_value(AccumulationMode::Append, None, vec!["a".into()], false, false).unwrap();
        let b = accumulate_value(AccumulationMode::Append, Some(a), vec!["b".into()], false, false).unwrap();
        assert_eq!(
            b,
            OptionValue::NestedSequence(vec![vec!["a".into()], vec!["b".into()]])
        );
    }

    #[test]
    fn append_flattens_when_configured() {
        let a = accumulate_value(AccumulationMode::Append, None, vec!["a".into()], false, true).unwrap();
        let b = accumulate_value(AccumulationMode::Append, Some(a), vec!["b".into()], false, true).unwrap();
        assert_eq!(b, OptionValue::Sequence(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn error_mode_rejects_second_occurrence() {
        let a = accumulate_flag(AccumulationMode::Error, None, true).unwrap();
        let err = accumulate_flag(AccumulationMode::Error, Some(a), true);
        assert!(matches!(err, Err(AccumError::NotRepeatable)));
    }

    #[test]
    fn count_increments() {
        let a = accumulate_flag(AccumulationMode::Count, None, true).unwrap();
        let b = accumulate_flag(AccumulationMode::Count, Some(a), true).unwrap();
        assert_eq!(b, OptionValue::Count(2));
    }
}
