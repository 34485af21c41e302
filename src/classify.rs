//! Context-free token shape recognition (spec §9's redesign hint: "pattern
//! matched classifier over a token enum"). Anything that needs the
//! specification tree — subcommand names, the positional-defined check for
//! negative numbers — lives in [`crate::engine`], which is the only place
//! with access to both a token and the spec it's being matched against.

/// The shape a single argv token takes, independent of any specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenShape<'a> {
    EndOfOptions,
    LoneDash,
    LongOpt {
        name: &'a str,
        inline_value: Option<&'a str>,
    },
    ShortCluster {
        chars: &'a str,
    },
    Word(&'a str),
}

pub(crate) fn classify(token: &str) -> TokenShape<'_> {
    if token == "--" {
        TokenShape::EndOfOptions
    } else if token == "-" {
        TokenShape::LoneDash
    } else if let Some(rest) = token.strip_prefix("--") {
        match rest.split_once('=') {
            Some((name, value)) => TokenShape::LongOpt {
                name,
                inline_value: Some(value),
            },
            None => TokenShape::LongOpt {
                name: rest,
                inline_value: None,
            },
        }
    } else if token.len() >= 2 && token.starts_with('-') {
        TokenShape::ShortCluster { chars: &token[1..] }
    } else {
        TokenShape::Word(token)
    }
}

/// `-?\d+(\.\d+)?` without pulling in a regex dependency for one predicate.
pub(crate) fn is_negative_number(token: &str) -> bool {
    let Some(rest) = token.strip_prefix('-') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    let mut parts = rest.splitn(2, '.');
    let int_part = parts.next().unwrap();
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if let Some(frac_part) = parts.next() {
        if frac_part.is_empty() || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    true
}
