//! Positional grouping (spec §4.7): distributing the scanned positional
//! queue across the declared positional specs, reserving room for the
//! minima of later specs so an early unbounded positional doesn't starve
//! them.

use crate::spec::{Max, PositionalSpec};
use std::collections::HashMap;

pub(crate) enum PositionalGroupError {
    Missing {
        name: String,
        required: (usize, Option<usize>),
        received: Vec<String>,
    },
    Unexpected {
        name: String,
        received: Vec<String>,
    },
}

const IMPLICIT_POSITIONAL_NAME: &str = "args";

pub(crate) fn group(
    queue: &[String],
    specs: &[PositionalSpec],
) -> Result<HashMap<String, Vec<String>>, PositionalGroupError> {
    if specs.is_empty() {
        let mut result = HashMap::new();
        result.insert(IMPLICIT_POSITIONAL_NAME.to_string(), queue.to_vec());
        return Ok(result);
    }

    let mut result = HashMap::new();
    let mut cursor = 0usize;
    let mut remaining = queue.len();

    for (i, spec) in specs.iter().enumerate() {
        let lo = spec.arity.min;
        let hi = spec.arity.max.as_usize();

        let take = if spec.greedy {
            remaining
        } else {
            let reserved: usize = specs[i + 1..].iter().map(|s| s.arity.min).sum();
            let available = remaining.saturating_sub(reserved);
            let hi_or_available = hi.unwrap_or(available);
            hi_or_available.min(lo.max(available))
        };

        if take < lo {
            return Err(PositionalGroupError::Missing {
                name: spec.canonical_name.clone(),
                required: (lo, hi),
                received: queue[cursor..cursor + take].to_vec(),
            });
        }

        result.insert(spec.canonical_name.clone(), queue[cursor..cursor + take].to_vec());
        cursor += take;
        remaining -= take;
    }

    if remaining > 0 {
        let last = specs.last().expect("non-empty specs checked above");
        let received = queue[cursor..].to_vec();
        return Err(PositionalGroupError::Unexpected {
            name: last.canonical_name.clone(),
            received,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Arity;
    use pretty_assertions::assert_eq;

    fn pos(name: &str, arity: Arity) -> PositionalSpec {
        PositionalSpec::new(name, arity)
    }

    #[test]
    fn reserves_room_for_a_later_minimum() {
        let specs = vec![
            pos("sources", Arity::ONE_OR_MORE),
            pos("destination", Arity::EXACTLY_ONE),
        ];
        let queue = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        let result = group(&queue, &specs).unwrap();
        assert_eq!(result["sources"], vec!["a", "b", "c"]);
        assert_eq!(result["destination"], vec!["d"]);
    }

    #[test]
    fn no_specs_uses_implicit_args() {
        let queue = vec!["a".into(), "b".into()];
        let result = group(&queue, &[]).unwrap();
        assert_eq!(result[IMPLICIT_POSITIONAL_NAME], queue);
    }

    #[test]
    fn missing_required_value_is_reported() {
        let specs = vec![pos("input", Arity::EXACTLY_ONE)];
        let err = group(&[], &specs).unwrap_err();
        assert!(matches!(err, PositionalGroupError::Missing { required: (1, Some(1)), .. }));
    }

    #[test]
    fn surplus_is_attributed_to_last_spec() {
        let specs = vec![pos("input", Arity::EXACTLY_ONE)];
        let queue = vec!["a".into(), "b".into(), "c".into()];
        let err = group(&queue, &specs).unwrap_err();
        match err {
            PositionalGroupError::Unexpected { name, received } => {
                assert_eq!(name, "input");
                assert_eq!(received, vec!["b".to_string(), "c".to_string()]);
            }
            _ => panic!("expected Unexpected"),
        }
    }

    #[test]
    fn greedy_positional_takes_everything_at_its_turn() {
        let specs = vec![
            pos("first", Arity::EXACTLY_ONE),
            { let mut p = pos("rest", Arity::ZERO_OR_MORE); p.greedy = true; p },
        ];
        let queue = vec!["a".into(), "b".into(), "c".into()];
        let result = group(&queue, &specs).unwrap();
        assert_eq!(result["first"], vec!["a"]);
        assert_eq!(result["rest"], vec!["b", "c"]);
    }
}
