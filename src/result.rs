//! The parse result model (spec §3). Everything here is built once by the
//! engine and never mutated afterwards; there is deliberately no setter on
//! any public field, matching spec §3's "constructed per-invocation and
//! never mutated" lifecycle and the "Immutability" testable property of
//! spec §8.

use crate::dict::DictNode;
use std::collections::HashMap;

/// The value recorded for one option, shaped by its variant and
/// accumulation mode (spec §9's redesign hint).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionValue {
    FlagPresent,
    FlagNegated,
    Count(u64),
    Single(String),
    Sequence(Vec<String>),
    NestedSequence(Vec<Vec<String>>),
    Tree(DictNode),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::FlagPresent => Some(true),
            OptionValue::FlagNegated => Some(false),
            _ => None,
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            OptionValue::Single(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[String]> {
        match self {
            OptionValue::Sequence(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

/// An immutable, structured parse outcome for one command level.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ParseResult {
    pub(crate) command: String,
    pub(crate) args: Vec<String>,
    pub(crate) options: HashMap<String, OptionValue>,
    pub(crate) positionals: HashMap<String, Vec<String>>,
    pub(crate) trailing: Vec<String>,
    pub(crate) subcommand: Option<Box<ParseResult>>,
}

impl ParseResult {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The exact slice of the original argv consumed at this command level.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn options(&self) -> &HashMap<String, OptionValue> {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    pub fn positionals(&self) -> &HashMap<String, Vec<String>> {
        &self.positionals
    }

    pub fn positional(&self, name: &str) -> Option<&[String]> {
        self.positionals.get(name).map(|v| v.as_slice())
    }

    pub fn trailing(&self) -> &[String] {
        &self.trailing
    }

    pub fn subcommand(&self) -> Option<&ParseResult> {
        self.subcommand.as_deref()
    }
}
