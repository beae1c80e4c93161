use crate::api::{ActionFn, CommandParser, NeedsInput, Target, TypeFn};
use crate::constant::DEFAULT_ACTION;
use crate::model::{Nargs, Value};
use crate::parser::ParseError;

/// Reference to the coercion applied to a parameter's raw tokens.
pub enum TypeRef {
    /// Looked up by name: node-local registry, then the shared registry.
    /// An unknown name coerces by identity.
    Named(String),
    Custom(TypeFn),
}

impl std::fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "Named({name})"),
            TypeRef::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Reference to the accumulation applied to an option's coerced values.
pub enum ActionRef {
    /// Looked up by name: node-local registry, then the shared registry.
    Named(String),
    Custom {
        handler: ActionFn,
        needs_input: NeedsInput,
    },
}

impl ActionRef {
    pub(crate) fn name(&self) -> &str {
        match self {
            ActionRef::Named(name) => name.as_str(),
            ActionRef::Custom { .. } => "<custom>",
        }
    }
}

impl std::fmt::Debug for ActionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionRef::Named(name) => write!(f, "Named({name})"),
            ActionRef::Custom { needs_input, .. } => {
                write!(f, "Custom(needs_input={needs_input:?})")
            }
        }
    }
}

impl Default for ActionRef {
    fn default() -> Self {
        ActionRef::Named(DEFAULT_ACTION.to_string())
    }
}

/// The settings of an option: `{dest, action, type, metavar, required, default, const, choices}`.
///
/// ### Example
/// ```
/// # use argtree_core as argtree;
/// use argtree::{CommandParser, OptionSettings, Value};
///
/// let parser = CommandParser::new("program")
///     .option("-a", "append mode", OptionSettings::new().dest("mode").action("store_const").constant("a"))
///     .option("-w", "write mode", OptionSettings::new().dest("mode").action("store_const").constant("w"));
///
/// let namespace = parser.parse_argv(&["-a", "-w"]).unwrap();
/// assert_eq!(namespace.get("mode"), Some(&Value::from("w")));
/// ```
#[derive(Debug, Default)]
pub struct OptionSettings {
    dest: Option<String>,
    action: ActionRef,
    value_type: Option<TypeRef>,
    metavar: Option<String>,
    required: bool,
    default: Option<Value>,
    constant: Option<Value>,
    choices: Option<Vec<String>>,
}

impl OptionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store under `dest` instead of the key derived from the flags.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest.replace(dest.into());
        self
    }

    /// Use the named action (default: `store`).
    pub fn action(mut self, name: impl Into<String>) -> Self {
        self.action = ActionRef::Named(name.into());
        self
    }

    /// Use a custom action function.
    pub fn action_with(
        mut self,
        handler: impl Fn(Option<Value>, Option<&Value>, &OptionSettings) -> Result<Option<Value>, ParseError>
            + 'static,
        needs_input: impl Into<NeedsInput>,
    ) -> Self {
        self.action = ActionRef::Custom {
            handler: Box::new(handler),
            needs_input: needs_input.into(),
        };
        self
    }

    /// Use the named type (default: identity).
    pub fn value_type(mut self, name: impl Into<String>) -> Self {
        self.value_type.replace(TypeRef::Named(name.into()));
        self
    }

    /// Use a custom type function.
    pub fn value_type_with(
        mut self,
        handler: impl Fn(&str, &Target<'_>) -> Result<Option<Value>, ParseError> + 'static,
    ) -> Self {
        self.value_type.replace(TypeRef::Custom(Box::new(handler)));
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar.replace(metavar.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// The value used when the parameter is absent from the Cli.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default.replace(value.into());
        self
    }

    /// The value written by `store_const` and `append_const`.
    pub fn constant(mut self, value: impl Into<Value>) -> Self {
        self.constant.replace(value.into());
        self
    }

    /// The values accepted by the `choice` type.
    pub fn choices<S: Into<String>>(mut self, choices: impl IntoIterator<Item = S>) -> Self {
        self.choices
            .replace(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn get_dest(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    pub fn get_metavar(&self) -> Option<&str> {
        self.metavar.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn get_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn get_constant(&self) -> Option<&Value> {
        self.constant.as_ref()
    }

    pub fn get_choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    pub(crate) fn action_ref(&self) -> &ActionRef {
        &self.action
    }

    pub(crate) fn type_ref(&self) -> Option<&TypeRef> {
        self.value_type.as_ref()
    }
}

/// The settings of an argument: `{dest, narg, metavar, type, required, default}`.
///
/// ### Example
/// ```
/// # use argtree_core as argtree;
/// use argtree::{ArgumentSettings, CommandParser, Nargs, Value};
///
/// let parser = CommandParser::new("program")
///     .argument("a", "", ArgumentSettings::new().value_type("int"))
///     .argument("b", "", ArgumentSettings::new().nargs(Nargs::AtLeastOne));
///
/// let namespace = parser.parse_argv(&["12", "x", "y"]).unwrap();
/// assert_eq!(namespace.get("a"), Some(&Value::Int(12)));
/// assert_eq!(namespace.get("b"), Some(&Value::from(vec!["x", "y"])));
/// ```
#[derive(Debug, Default)]
pub struct ArgumentSettings {
    dest: Option<String>,
    nargs: Nargs,
    metavar: Option<String>,
    value_type: Option<TypeRef>,
    required: bool,
    default: Option<Value>,
}

impl ArgumentSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store under `dest` instead of the argument name.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest.replace(dest.into());
        self
    }

    pub fn nargs(mut self, nargs: impl Into<Nargs>) -> Self {
        self.nargs = nargs.into();
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar.replace(metavar.into());
        self
    }

    /// Use the named type (default: identity).
    pub fn value_type(mut self, name: impl Into<String>) -> Self {
        self.value_type.replace(TypeRef::Named(name.into()));
        self
    }

    /// Use a custom type function.
    pub fn value_type_with(
        mut self,
        handler: impl Fn(&str, &Target<'_>) -> Result<Option<Value>, ParseError> + 'static,
    ) -> Self {
        self.value_type.replace(TypeRef::Custom(Box::new(handler)));
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// The value used when the parameter is absent from the Cli.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default.replace(value.into());
        self
    }

    pub fn get_nargs(&self) -> Nargs {
        self.nargs
    }

    pub fn get_metavar(&self) -> Option<&str> {
        self.metavar.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn get_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn type_ref(&self) -> Option<&TypeRef> {
        self.value_type.as_ref()
    }
}

/// One or more flag spellings for an option.
pub trait IntoFlags {
    fn into_flags(self) -> Vec<String>;
}

impl IntoFlags for &str {
    fn into_flags(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoFlags for String {
    fn into_flags(self) -> Vec<String> {
        vec![self]
    }
}

impl<const N: usize> IntoFlags for [&str; N] {
    fn into_flags(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoFlags for &[&str] {
    fn into_flags(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoFlags for Vec<String> {
    fn into_flags(self) -> Vec<String> {
        self
    }
}

#[derive(Debug)]
pub(crate) struct OptionSpec {
    flags: Vec<String>,
    dest: String,
    help: String,
    settings: OptionSettings,
}

impl OptionSpec {
    pub(crate) fn new(flags: Vec<String>, help: String, settings: OptionSettings) -> Self {
        // A spelling is cut at the first separator: "-f, --file" declares just "-f".
        let flags: Vec<String> = flags
            .into_iter()
            .map(|flag| {
                flag.split(|c: char| c == ',' || c.is_whitespace())
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        let dest = match settings.get_dest() {
            Some(dest) => dest.to_string(),
            None => derive_dest(&flags),
        };

        Self {
            flags,
            dest,
            help,
            settings,
        }
    }

    pub(crate) fn flags(&self) -> &[String] {
        &self.flags
    }

    pub(crate) fn dest(&self) -> &str {
        &self.dest
    }

    pub(crate) fn help(&self) -> &str {
        &self.help
    }

    pub(crate) fn settings(&self) -> &OptionSettings {
        &self.settings
    }

    pub(crate) fn target(&self) -> Target<'_> {
        Target::new(
            &self.dest,
            self.settings.get_metavar(),
            self.settings.get_choices(),
        )
    }
}

// The first long spelling wins, then the first short spelling upper-cased, then the first bare spelling.
fn derive_dest(flags: &[String]) -> String {
    let mut long = None;
    let mut bare = None;
    let mut short = None;

    for flag in flags {
        if let Some(name) = flag.strip_prefix("--") {
            long.get_or_insert_with(|| name.to_string());
        } else if let Some(name) = flag.strip_prefix('-') {
            short.get_or_insert_with(|| name.to_ascii_uppercase());
        } else {
            bare.get_or_insert_with(|| flag.clone());
        }
    }

    long.or(short).or(bare).unwrap_or_default()
}

#[derive(Debug)]
pub(crate) struct ArgumentSpec {
    name: String,
    dest: String,
    help: String,
    settings: ArgumentSettings,
}

impl ArgumentSpec {
    pub(crate) fn new(name: String, help: String, settings: ArgumentSettings) -> Self {
        let dest = settings.dest.clone().unwrap_or_else(|| name.clone());
        Self {
            name,
            dest,
            help,
            settings,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn dest(&self) -> &str {
        &self.dest
    }

    pub(crate) fn help(&self) -> &str {
        &self.help
    }

    pub(crate) fn settings(&self) -> &ArgumentSettings {
        &self.settings
    }

    pub(crate) fn target(&self) -> Target<'_> {
        Target::new(&self.dest, self.settings.get_metavar(), None)
    }
}

#[derive(Debug)]
pub(crate) struct CommandSpec {
    name: String,
    help: String,
    parser: CommandParser,
}

impl CommandSpec {
    pub(crate) fn new(name: String, help: String, parser: CommandParser) -> Self {
        Self { name, help, parser }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn help(&self) -> &str {
        &self.help
    }

    pub(crate) fn parser(&self) -> &CommandParser {
        &self.parser
    }
}
