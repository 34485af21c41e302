//! The value consumer (spec §4.5): given the tokens following an option
//! occurrence, pull as many as its arity and the stopping conditions allow.
//! Shared by `Value` and `Dict` options alike — the dict structural grammar
//! runs afterward, over whatever raw tokens this collects.

use crate::classify::is_negative_number;

/// Collects values from the front of `tokens` and returns `(values,
/// consumed)`, where `consumed` is how many tokens of `tokens` were used
/// (so the caller can advance its own cursor). Stops, in order, at: the
/// arity maximum (unless `greedy`), `--`, a token that looks like an option
/// (unless it parses as a negative number and negative numbers are both
/// allowed and meaningful here), or a token that names a subcommand at the
/// current level.
pub(crate) fn consume(
    tokens: &[String],
    arity_max: Option<usize>,
    greedy: bool,
    allow_negative_numbers: bool,
    any_positional_defined: bool,
    is_subcommand_name: impl Fn(&str) -> bool,
) -> (Vec<String>, usize) {
    let mut out = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        let token = &tokens[idx];

        if token == "--" {
            break;
        }

        if !greedy {
            if let Some(max) = arity_max {
                if out.len() >= max {
                    break;
                }
            }

            if token.len() > 1 && token.starts_with('-') {
                let reads_as_negative_number =
                    allow_negative_numbers && any_positional_defined && is_negative_number(token);
                if !reads_as_negative_number {
                    break;
                }
            }

            if is_subcommand_name(token) {
                break;
            }
        }

        out.push(token.clone());
        idx += 1;
    }

    (out, idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_subcommands(_: &str) -> bool {
        false
    }

    #[test]
    fn stops_at_arity_max() {
        let tokens = vec!["a".into(), "b".into(), "c".into()];
        let (values, consumed) = consume(&tokens, Some(2), false, false, false, no_subcommands);
        assert_eq!(values, vec!["a", "b"]);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn stops_at_option_like_token() {
        let tokens = vec!["a".into(), "--flag".into()];
        let (values, consumed) = consume(&tokens, None, false, false, false, no_subcommands);
        assert_eq!(values, vec!["a"]);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn stops_at_double_dash() {
        let tokens = vec!["a".into(), "--".into(), "b".into()];
        let (values, consumed) = consume(&tokens, None, false, false, false, no_subcommands);
        assert_eq!(values, vec!["a"]);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn negative_numbers_count_as_values_when_allowed() {
        let tokens = vec!["-12".into(), "-3.5".into()];
        let (values, consumed) = consume(&tokens, None, false, true, true, no_subcommands);
        assert_eq!(values, vec!["-12", "-3.5"]);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn greedy_ignores_the_arity_cap_and_option_shape() {
        let tokens = vec!["a".into(), "--looks-like-a-flag".into(), "--".into(), "b".into()];
        let (values, consumed) = consume(&tokens, Some(1), true, false, false, no_subcommands);
        assert_eq!(values, vec!["a", "--looks-like-a-flag"]);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn stops_before_a_subcommand_name() {
        let tokens = vec!["a".into(), "build".into()];
        let (values, consumed) = consume(&tokens, None, false, false, false, |s| s == "build");
        assert_eq!(values, vec!["a"]);
        assert_eq!(consumed, 1);
    }
}
