use thiserror::Error;

use crate::api::{CommandParser, OptionSpec, Registries};
use crate::matcher::*;
use crate::model::{Namespace, Value};
use crate::parser::narg::distribute;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// The fatal errors of a parse.
/// The first error encountered aborts the entire parse; no partial result is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A type handler rejected its raw token.
    #[error("{name} must be {expected}.")]
    TypeCoercion { name: String, expected: String },

    #[error("missing required option '{name}'.")]
    MissingRequiredOption { name: String },

    /// Also raised for a `+` argument with no remaining tokens, regardless of `required`.
    #[error("missing required argument '{name}'{}.", describe_need(.need))]
    MissingRequiredArgument { name: String, need: Option<usize> },

    #[error("unknown command '{0}'.")]
    UnknownCommand(String),

    #[error("unknown option '{0}'.")]
    UnknownOption(String),

    #[error("option '{0}' requires a value.")]
    MissingOptionValue(String),

    #[error("option '{0}' does not take a value.")]
    UnexpectedOptionValue(String),

    #[error("unknown action '{0}'.")]
    UnknownAction(String),

    /// Raised by custom type/action handlers and executors.
    #[error("{0}")]
    Custom(String),

    /// Not a failure: `-h`/`--help` was given.
    /// Carries the rendered help message.
    #[error("{0}")]
    HelpRequested(String),
}

fn describe_need(need: &Option<usize>) -> String {
    match need {
        Some(n) => format!(" (need: {n})"),
        None => String::default(),
    }
}

impl ParseError {
    /// Abort the parse with a domain specific message.
    ///
    /// ### Example
    /// ```
    /// # use argtree_core as argtree;
    /// use argtree::{CommandParser, OptionSettings, ParseError, Value};
    ///
    /// let parser = CommandParser::new("program").option(
    ///     "--port",
    ///     "",
    ///     OptionSettings::new().value_type_with(|raw, target| match raw.parse::<u16>() {
    ///         Ok(port) if port > 1024 => Ok(Some(Value::Int(port as i64))),
    ///         _ => Err(ParseError::custom(format!("{} must be an unprivileged port.", target.display_name()))),
    ///     }),
    /// );
    ///
    /// let error = parser.parse_argv(&["--port", "80"]).unwrap_err();
    /// assert_eq!(error.to_string(), "PORT must be an unprivileged port.");
    /// ```
    pub fn custom(message: impl Into<String>) -> Self {
        ParseError::Custom(message.into())
    }

    /// The process exit code for this outcome: `0` for help, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ParseError::HelpRequested(_) => 0,
            _ => 1,
        }
    }
}

impl From<ScanError> for ParseError {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::UnknownOption(flag) => ParseError::UnknownOption(flag),
            ScanError::MissingValue(flag) => ParseError::MissingOptionValue(flag),
            ScanError::UnexpectedValue(flag) => ParseError::UnexpectedOptionValue(flag),
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Action {
    Continue(Namespace),
    PrintHelp,
}

/// The resolution of a single command node (no sub-command delegation).
pub(crate) struct Parser<'a> {
    node: &'a CommandParser,
}

impl<'a> std::fmt::Debug for Parser<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser{..}").finish()
    }
}

impl<'a> Parser<'a> {
    pub(crate) fn new(node: &'a CommandParser) -> Self {
        Self { node }
    }

    pub(crate) fn consume(&self, tokens: &[&str]) -> Result<Action, ParseError> {
        let registries = self.node.registries();
        let options = self.node.options();

        // 1. Scan the raw tokens into option occurrences & positionals.
        let configs = options
            .iter()
            .map(|option| OptionConfig::new(option.flags().to_vec(), value_mode(registries, option)))
            .collect();
        let scan = TokenScanner::new(configs).scan(tokens)?;

        if scan.help {
            return Ok(Action::PrintHelp);
        }

        let mut memo = Namespace::default();

        // 2. Resolve each occurrence, in encounter order, into the memo.
        for Occurrence { option, value } in scan.occurrences {
            resolve_occurrence(registries, &options[option], value, &mut memo)?;
        }

        // 3. Enforce required options & fill in the option defaults.
        apply_option_defaults(options, &mut memo)?;

        // 4. Distribute the positionals across the arguments.
        let remaining = distribute(registries, self.node.arguments(), scan.positionals, &mut memo)?;

        if !self.node.commands().is_empty() {
            if let Some(token) = remaining.into_iter().next() {
                return Err(ParseError::UnknownCommand(token));
            }
        }

        Ok(Action::Continue(memo))
    }
}

pub(crate) fn value_mode(registries: &Registries, option: &OptionSpec) -> ValueMode {
    match registries.resolve_action(option.settings().action_ref()) {
        Some((_, needs_input)) if needs_input.is_needed() => {
            if option.settings().is_required() {
                ValueMode::Required
            } else {
                ValueMode::Optional
            }
        }
        _ => ValueMode::Flag,
    }
}

/// Run the type then the action of `option` for one occurrence.
/// An absent action result leaves the destination untouched.
fn resolve_occurrence(
    registries: &Registries,
    option: &OptionSpec,
    raw: Option<String>,
    memo: &mut Namespace,
) -> Result<(), ParseError> {
    let settings = option.settings();
    let coerced = match (raw, registries.resolve_type(settings.type_ref())) {
        (Some(raw), Some(type_handler)) => type_handler(&raw, &option.target())?,
        (Some(raw), None) => Some(Value::Str(raw)),
        (None, _) => None,
    };
    let (action_handler, _) = registries
        .resolve_action(settings.action_ref())
        .ok_or_else(|| ParseError::UnknownAction(settings.action_ref().name().to_string()))?;

    #[cfg(feature = "tracing_debug")]
    {
        debug!(
            "Resolving '{dest}' with {action:?}: {coerced:?}.",
            dest = option.dest(),
            action = settings.action_ref(),
        );
    }

    if let Some(value) = action_handler(coerced, memo.get(option.dest()), settings)? {
        memo.insert(option.dest(), value);
    }

    Ok(())
}

fn apply_option_defaults(options: &[OptionSpec], memo: &mut Namespace) -> Result<(), ParseError> {
    for option in options {
        if memo.contains(option.dest()) {
            continue;
        }

        if option.settings().is_required() {
            return Err(ParseError::MissingRequiredOption {
                name: option.dest().to_ascii_uppercase(),
            });
        }

        if let Some(default) = option.settings().get_default() {
            memo.insert(option.dest(), default.clone());
        }
    }

    Ok(())
}
