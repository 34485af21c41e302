//! The error taxonomy (spec §7). Every variant here corresponds to exactly
//! one entry in the specification's taxonomy; none are collapsed or
//! invented. Parsing is fail-fast: the engine returns the first [`Error`]
//! it encounters and never accumulates more than one.

use serde_json::json;

/// The root of the flagrant error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parser configuration: {0}")]
    Configuration(String),

    #[error("option '{option}' is invalid: {message}")]
    OptionSpecification { option: String, message: String },

    #[error("command '{command}' is invalid: {message}")]
    CommandSpecification { command: String, message: String },

    #[error("{kind}")]
    Option {
        kind: OptionErrorKind,
        option: String,
        path: Vec<String>,
        args: Vec<String>,
        position: usize,
    },

    #[error("{kind}")]
    Positional {
        kind: PositionalErrorKind,
        positional: String,
        path: Vec<String>,
        args: Vec<String>,
        position: usize,
    },

    #[error("unknown subcommand '{subcommand}'")]
    UnknownSubcommand {
        subcommand: String,
        path: Vec<String>,
        args: Vec<String>,
        position: usize,
    },

    #[error("argument file '{token}' was not found")]
    ArgFileNotFound { token: String, position: usize },

    #[error("argument file '{token}' could not be read: {message}")]
    ArgFileReadError {
        token: String,
        position: usize,
        message: String,
    },

    #[error("argument file expansion of '{token}' exceeded the recursion depth limit")]
    ArgFileCycle { token: String, position: usize },

    #[error("{kind}")]
    DictParse {
        kind: DictErrorKind,
        option: String,
        path: Vec<String>,
        args: Vec<String>,
        position: usize,
    },
}

#[derive(Debug, Clone)]
pub enum OptionErrorKind {
    MissingValue { required: (usize, Option<usize>), received: usize },
    ValueNotAllowed { received: String },
    NotRepeatable { received: String },
    UnknownOption,
    AmbiguousOption { matched: Vec<String> },
    FlagWithValue { received: String },
}

impl std::fmt::Display for OptionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionErrorKind::MissingValue { required, received } => write!(
                f,
                "option requires between {} and {:?} values, got {received}",
                required.0, required.1
            ),
            OptionErrorKind::ValueNotAllowed { received } => {
                write!(f, "option does not take a value, got '{received}'")
            }
            OptionErrorKind::NotRepeatable { received } => {
                write!(f, "option '{received}' cannot be repeated")
            }
            OptionErrorKind::UnknownOption => write!(f, "unknown option"),
            OptionErrorKind::AmbiguousOption { matched } => {
                write!(f, "ambiguous option, matches {}", matched.join(", "))
            }
            OptionErrorKind::FlagWithValue { received } => {
                write!(f, "flag does not accept a value, got '{received}'")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum PositionalErrorKind {
    MissingValue { required: (usize, Option<usize>), received: Vec<String> },
    UnexpectedValue { received: Vec<String> },
}

impl std::fmt::Display for PositionalErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionalErrorKind::MissingValue { required, received } => write!(
                f,
                "expected between {} and {:?} positional values, got {}",
                required.0,
                required.1,
                received.len()
            ),
            PositionalErrorKind::UnexpectedValue { received } => {
                write!(f, "unexpected positional values: {}", received.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum DictErrorKind {
    UnescapedBracket { token: String },
    IndexOutOfBoundsPolicy { token: String },
    StrictStructureConflict { token: String },
    JsonFallbackParseFailure { message: String },
}

impl std::fmt::Display for DictErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictErrorKind::UnescapedBracket { token } => {
                write!(f, "unescaped '[' or ']' in dict key '{token}'")
            }
            DictErrorKind::IndexOutOfBoundsPolicy { token } => {
                write!(f, "bracket index in '{token}' violates the index policy")
            }
            DictErrorKind::StrictStructureConflict { token } => write!(
                f,
                "'{token}' conflicts with strict_structure: key shape mismatch"
            ),
            DictErrorKind::JsonFallbackParseFailure { message } => {
                write!(f, "json fallback value failed to parse: {message}")
            }
        }
    }
}

impl Error {
    pub(crate) fn option_spec(option: String, message: impl Into<String>) -> Self {
        Error::OptionSpecification {
            option,
            message: message.into(),
        }
    }

    pub(crate) fn command_spec(command: String, message: impl Into<String>) -> Self {
        Error::CommandSpecification {
            command,
            message: message.into(),
        }
    }

    pub(crate) fn option_spec_invalid_arity(min: usize, max: Option<usize>) -> Self {
        Error::OptionSpecification {
            option: String::new(),
            message: format!("arity min {min} is greater than max {max:?}"),
        }
    }

    /// A structured, language-agnostic view of the error, suitable for a
    /// caller to render its own message or suggestion from. Mirrors spec
    /// §3's `ErrorContext`.
    pub fn context(&self) -> serde_json::Value {
        match self {
            Error::Configuration(message) => json!({ "message": message }),
            Error::OptionSpecification { option, message } => {
                json!({ "option": option, "message": message })
            }
            Error::CommandSpecification { command, message } => {
                json!({ "command": command, "message": message })
            }
            Error::Option {
                kind,
                option,
                path,
                args,
                position,
            } => {
                let mut ctx = json!({
                    "option": option,
                    "path": path,
                    "args": args,
                    "position": position,
                });
                merge_option_kind(&mut ctx, kind);
                ctx
            }
            Error::Positional {
                kind,
                positional,
                path,
                args,
                position,
            } => {
                let mut ctx = json!({
                    "positional": positional,
                    "path": path,
                    "args": args,
                    "position": position,
                });
                merge_positional_kind(&mut ctx, kind);
                ctx
            }
            Error::UnknownSubcommand {
                subcommand,
                path,
                args,
                position,
            } => json!({
                "subcommand": subcommand,
                "path": path,
                "args": args,
                "position": position,
            }),
            Error::ArgFileNotFound { token, position } => {
                json!({ "token": token, "position": position })
            }
            Error::ArgFileReadError {
                token,
                position,
                message,
            } => json!({ "token": token, "position": position, "message": message }),
            Error::ArgFileCycle { token, position } => {
                json!({ "token": token, "position": position })
            }
            Error::DictParse {
                kind,
                option,
                path,
                args,
                position,
            } => {
                let mut ctx = json!({
                    "option": option,
                    "path": path,
                    "args": args,
                    "position": position,
                });
                merge_dict_kind(&mut ctx, kind);
                ctx
            }
        }
    }
}

fn merge_option_kind(ctx: &mut serde_json::Value, kind: &OptionErrorKind) {
    let obj = ctx.as_object_mut().expect("context is always an object");
    match kind {
        OptionErrorKind::MissingValue { required, received } => {
            obj.insert("required_min".into(), json!(required.0));
            obj.insert("required_max".into(), json!(required.1));
            obj.insert("received".into(), json!(received));
        }
        OptionErrorKind::ValueNotAllowed { received } => {
            obj.insert("received".into(), json!(received));
        }
        OptionErrorKind::NotRepeatable { received } => {
            obj.insert("received".into(), json!(received));
        }
        OptionErrorKind::UnknownOption => {}
        OptionErrorKind::AmbiguousOption { matched } => {
            obj.insert("matched".into(), json!(matched));
        }
        OptionErrorKind::FlagWithValue { received } => {
            obj.insert("received".into(), json!(received));
        }
    }
}

fn merge_positional_kind(ctx: &mut serde_json::Value, kind: &PositionalErrorKind) {
    let obj = ctx.as_object_mut().expect("context is always an object");
    match kind {
        PositionalErrorKind::MissingValue { required, received } => {
            obj.insert("required_min".into(), json!(required.0));
            obj.insert("required_max".into(), json!(required.1));
            obj.insert("received".into(), json!(received));
        }
        PositionalErrorKind::UnexpectedValue { received } => {
            obj.insert("received".into(), json!(received));
        }
    }
}

fn merge_dict_kind(ctx: &mut serde_json::Value, kind: &DictErrorKind) {
    let obj = ctx.as_object_mut().expect("context is always an object");
    match kind {
        DictErrorKind::UnescapedBracket { token }
        | DictErrorKind::IndexOutOfBoundsPolicy { token }
        | DictErrorKind::StrictStructureConflict { token } => {
            obj.insert("token".into(), json!(token));
        }
        DictErrorKind::JsonFallbackParseFailure { message } => {
            obj.insert("message".into(), json!(message));
        }
    }
}
