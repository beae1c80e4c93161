use thiserror::Error;

/// How an option consumes a value from the Cli.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ValueMode {
    /// Never takes a value.
    Flag,
    /// Takes the next token, unless it looks like an option.
    Optional,
    /// Always takes the next token.
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionConfig {
    flags: Vec<String>,
    mode: ValueMode,
}

impl OptionConfig {
    pub(crate) fn new(flags: Vec<String>, mode: ValueMode) -> Self {
        Self { flags, mode }
    }

    pub(crate) fn flags(&self) -> &[String] {
        &self.flags
    }

    pub(crate) fn mode(&self) -> ValueMode {
        self.mode
    }
}

/// A recognized option occurrence: the index of the option config, and its raw value (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Occurrence {
    pub option: usize,
    pub value: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Scan {
    pub occurrences: Vec<Occurrence>,
    pub positionals: Vec<String>,
    pub help: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ScanError {
    #[error("unknown option '{0}'.")]
    UnknownOption(String),

    #[error("option '{0}' requires a value.")]
    MissingValue(String),

    #[error("option '{0}' does not take a value.")]
    UnexpectedValue(String),
}
