use std::rc::Rc;

use crate::api::{
    ArgumentSettings, ArgumentSpec, CommandSpec, IntoFlags, NeedsInput, OptionSettings,
    OptionSpec, Registries, Registry, Target,
};
use crate::model::{Namespace, Value};
use crate::parser::{dispatch, run_with_interface, ConsoleInterface, ParseError, Printer};

/// Invoked with the resolved namespace of a command node.
/// Its `Ok` value replaces the namespace as the result of the parse.
pub type ExecFn = Box<dyn Fn(Namespace) -> Result<Namespace, ParseError>>;

/// A command node: the options, arguments, and sub-commands it declares, along with the registries used to resolve them.
///
/// Sub-commands are themselves full `CommandParser`s, declared via [`CommandParser::command`].
///
/// ### Example
/// ```
/// # use argtree_core as argtree;
/// use argtree::{ArgumentSettings, CommandParser, Nargs, OptionSettings, Value};
///
/// let parser = CommandParser::new("program")
///     .option(["-v", "--verbose"], "Verbosity.", OptionSettings::new().action("count"))
///     .argument("a", "The first.", ArgumentSettings::new().value_type("int"))
///     .argument("b", "The rest.", ArgumentSettings::new().nargs(Nargs::AtLeastOne));
///
/// let namespace = parser.parse_argv(&["-vv", "12", "x", "y"]).unwrap();
/// assert_eq!(namespace.get("verbose"), Some(&Value::Int(2)));
/// assert_eq!(namespace.get("a"), Some(&Value::Int(12)));
/// assert_eq!(namespace.get("b"), Some(&Value::from(vec!["x", "y"])));
/// ```
pub struct CommandParser {
    program: String,
    description: Option<String>,
    usage: Option<String>,
    addition: Option<String>,
    options: Vec<OptionSpec>,
    arguments: Vec<ArgumentSpec>,
    commands: Vec<CommandSpec>,
    executor: Option<ExecFn>,
    registries: Registries,
}

impl CommandParser {
    /// Create a command parser, backed by the builtin types and actions.
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_registry(program, Rc::new(Registry::default()))
    }

    /// Create a command parser backed by the `registry`.
    /// The registry is shared (read-only) by every sub-command declared from this parser.
    pub fn with_registry(program: impl Into<String>, registry: Rc<Registry>) -> Self {
        Self {
            program: program.into(),
            description: None,
            usage: None,
            addition: None,
            options: Vec::default(),
            arguments: Vec::default(),
            commands: Vec::default(),
            executor: None,
            registries: Registries::new(registry),
        }
    }

    /// Document the description for this command.
    /// If repeated, only the final description will apply.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description.replace(description.into());
        self
    }

    /// Replace the generated usage summary in the help message.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage.replace(usage.into());
        self
    }

    /// Document trailing text for the help message, displayed after the options.
    pub fn addition(mut self, addition: impl Into<String>) -> Self {
        self.addition.replace(addition.into());
        self
    }

    /// Declare an option, spelled by one or more `flags`.
    ///
    /// A flag is a long `--name`, a short `-n`, or a bare word matched literally.
    /// Unless set via [`OptionSettings::dest`], the destination is derived from the flags:
    /// the long spelling, otherwise the bare spelling, otherwise the upper-cased short spelling.
    ///
    /// ### Example
    /// ```
    /// # use argtree_core as argtree;
    /// use argtree::{CommandParser, OptionSettings, Value};
    ///
    /// let parser = CommandParser::new("program")
    ///     .option(["-a", "--append"], "", OptionSettings::new().action("append"));
    ///
    /// let namespace = parser.parse_argv(&["-a", "1", "-a", "2"]).unwrap();
    /// assert_eq!(namespace.get("append"), Some(&Value::from(vec!["1", "2"])));
    /// ```
    pub fn option(mut self, flags: impl IntoFlags, help: impl Into<String>, settings: OptionSettings) -> Self {
        self.options
            .push(OptionSpec::new(flags.into_flags(), help.into(), settings));
        self
    }

    /// Declare a positional argument.
    /// Positional tokens are distributed across the arguments in the order they are declared.
    pub fn argument(
        mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        settings: ArgumentSettings,
    ) -> Self {
        self.arguments
            .push(ArgumentSpec::new(name.into(), help.into(), settings));
        self
    }

    /// Declare a sub-command, configured via `setup`.
    ///
    /// When the first token matches `name` (exactly), the remaining tokens are delegated to the sub-command.
    /// The sub-command shares this parser's registry, but not its node-local types and actions.
    ///
    /// ### Example
    /// ```
    /// # use argtree_core as argtree;
    /// use argtree::{ArgumentSettings, CommandParser, Value};
    ///
    /// let parser = CommandParser::new("program")
    ///     .command("init", "Initialize a project.", |sub| {
    ///         sub.argument("path", "", ArgumentSettings::new())
    ///     });
    ///
    /// let namespace = parser.parse_argv(&["init", "here"]).unwrap();
    /// assert_eq!(namespace.get("path"), Some(&Value::from("here")));
    /// ```
    pub fn command(
        mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        setup: impl FnOnce(CommandParser) -> CommandParser,
    ) -> Self {
        let name = name.into();
        let child = CommandParser::with_registry(
            format!("{} {name}", self.program),
            Rc::clone(self.registries.global()),
        );
        self.commands
            .push(CommandSpec::new(name, help.into(), setup(child)));
        self
    }

    /// Register (or override) a type for this node only.
    pub fn register_type(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&str, &Target<'_>) -> Result<Option<Value>, ParseError> + 'static,
    ) -> Self {
        self.registries
            .local_mut()
            .insert_type(name, Box::new(handler));
        self
    }

    /// Register (or override) an action for this node only.
    pub fn register_action(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(Option<Value>, Option<&Value>, &OptionSettings) -> Result<Option<Value>, ParseError>
            + 'static,
        needs_input: impl Into<NeedsInput>,
    ) -> Self {
        self.registries
            .local_mut()
            .insert_action(name, Box::new(handler), needs_input.into());
        self
    }

    /// Register the executor, invoked with the resolved namespace of this node.
    ///
    /// ### Example
    /// ```
    /// # use argtree_core as argtree;
    /// use argtree::{ArgumentSettings, CommandParser, Value};
    ///
    /// let parser = CommandParser::new("program")
    ///     .argument("a", "", ArgumentSettings::new().value_type("int"))
    ///     .exec(|mut namespace| {
    ///         let doubled = namespace.get("a").and_then(Value::as_int).unwrap_or_default() * 2;
    ///         namespace.insert("doubled", doubled);
    ///         Ok(namespace)
    ///     });
    ///
    /// let namespace = parser.parse_argv(&["4"]).unwrap();
    /// assert_eq!(namespace.get("doubled"), Some(&Value::Int(8)));
    /// ```
    pub fn exec(
        mut self,
        executor: impl Fn(Namespace) -> Result<Namespace, ParseError> + 'static,
    ) -> Self {
        self.executor.replace(Box::new(executor));
        self
    }

    /// The display name of this node: the path of command names from the root.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Find the first sub-command declared as `name`.
    pub fn sub_command(&self, name: &str) -> Option<&CommandParser> {
        self.commands
            .iter()
            .find(|command| command.name() == name)
            .map(CommandSpec::parser)
    }

    /// Render the help message of this node.
    pub fn help(&self) -> String {
        Printer::terminal().render(self)
    }

    /// Parse the `tokens` (not including the program name).
    ///
    /// The first error encountered aborts the whole parse.
    /// A help request surfaces as [`ParseError::HelpRequested`].
    pub fn parse_argv(&self, tokens: &[&str]) -> Result<Namespace, ParseError> {
        dispatch(self, tokens, None)
    }

    /// Parse the `tokens`, additionally recording the matched top-level command name under `key`.
    ///
    /// ### Example
    /// ```
    /// # use argtree_core as argtree;
    /// use argtree::{CommandParser, Value};
    ///
    /// let parser = CommandParser::new("program")
    ///     .command("init", "", |sub| sub)
    ///     .command("build", "", |sub| sub);
    ///
    /// let namespace = parser.parse_argv_with_command(&["build"], "command").unwrap();
    /// assert_eq!(namespace.get("command"), Some(&Value::from("build")));
    /// ```
    pub fn parse_argv_with_command(&self, tokens: &[&str], key: &str) -> Result<Namespace, ParseError> {
        dispatch(self, tokens, Some(key))
    }

    /// Parse the `tokens`, reporting help and errors on the console.
    /// Fails with the exit code: `0` after displaying help, `1` after displaying an error.
    pub fn run(&self, tokens: &[&str]) -> Result<Namespace, i32> {
        run_with_interface(self, tokens, &ConsoleInterface::default())
    }

    /// Parse the process arguments ([`std::env::args`]), reporting help and errors on the console.
    /// On failure, exits the process (via [`std::process::exit`]).
    pub fn parse(&self) -> Namespace {
        let arguments: Vec<String> = std::env::args().skip(1).collect();
        let tokens: Vec<&str> = arguments.iter().map(AsRef::as_ref).collect();

        match self.run(tokens.as_slice()) {
            Ok(namespace) => namespace,
            Err(exit_code) => std::process::exit(exit_code),
        }
    }

    pub(crate) fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub(crate) fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub(crate) fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub(crate) fn executor(&self) -> Option<&ExecFn> {
        self.executor.as_ref()
    }

    pub(crate) fn registries(&self) -> &Registries {
        &self.registries
    }

    pub(crate) fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn get_usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub(crate) fn get_addition(&self) -> Option<&str> {
        self.addition.as_deref()
    }
}

impl std::fmt::Debug for CommandParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandParser")
            .field("program", &self.program)
            .field("options", &self.options)
            .field("arguments", &self.arguments)
            .field("commands", &self.commands)
            .field("executor", &self.executor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Nargs;
    use crate::test::assert_contains;

    #[test]
    fn command_parser_empty() {
        let parser = CommandParser::new("program");
        assert_eq!(parser.parse_argv(empty::slice()).unwrap(), Namespace::default());
        assert_eq!(parser.program(), "program");
    }

    #[test]
    fn command_parser_declarations() {
        let parser = CommandParser::new("program")
            .option("-a", "", OptionSettings::new())
            .option(["-b", "--bee"], "", OptionSettings::new())
            .argument("c", "", ArgumentSettings::new())
            .command("d", "", |sub| sub);
        assert_eq!(parser.options().len(), 2);
        assert_eq!(parser.options()[1].dest(), "bee");
        assert_eq!(parser.arguments().len(), 1);
        assert_eq!(parser.commands().len(), 1);
        assert!(parser.executor().is_none());
    }

    #[test]
    fn command_parser_metadata() {
        let parser = CommandParser::new("program")
            .description("--discarded--")
            .description("Does things.")
            .usage("program [stuff]")
            .addition("The end.");
        assert_eq!(parser.get_description(), Some("Does things."));
        assert_eq!(parser.get_usage(), Some("program [stuff]"));
        assert_eq!(parser.get_addition(), Some("The end."));
    }

    #[test]
    fn sub_command_lookup() {
        let parser = CommandParser::new("program")
            .command("init", "", |sub| sub.argument("first", "", ArgumentSettings::new()))
            .command("init", "", |sub| sub.argument("second", "", ArgumentSettings::new()))
            .command("build", "", |sub| sub.command("all", "", |sub| sub));

        let init = parser.sub_command("init").unwrap();
        assert_eq!(init.program(), "program init");
        assert_eq!(init.arguments()[0].dest(), "first");

        let all = parser.sub_command("build").unwrap().sub_command("all").unwrap();
        assert_eq!(all.program(), "program build all");

        assert!(parser.sub_command("Init").is_none());
        assert!(parser.sub_command("missing").is_none());
    }

    #[test]
    fn sub_command_shares_global_registry() {
        let registry = Registry::default().register_type("upper", |raw, _| {
            Ok(Some(Value::from(raw.to_uppercase())))
        });
        let parser = CommandParser::with_registry("program", Rc::new(registry))
            .register_type("local", |_, _| Ok(Some(Value::from("local"))))
            .command("sub", "", |sub| {
                sub.argument("a", "", ArgumentSettings::new().value_type("upper"))
                    .argument("b", "", ArgumentSettings::new().value_type("local"))
            })
            .argument("b", "", ArgumentSettings::new().value_type("local"));

        let namespace = parser.parse_argv(&["sub", "x", "y"]).unwrap();
        assert_eq!(namespace.get("a"), Some(&Value::from("X")));
        // Local types don't flow down to sub-commands, so the identity applies.
        assert_eq!(namespace.get("b"), Some(&Value::from("y")));

        let namespace = parser.parse_argv(&["y"]).unwrap();
        assert_eq!(namespace.get("b"), Some(&Value::from("local")));
    }

    #[test]
    fn local_overrides_global() {
        let parser = CommandParser::new("program")
            .register_action("store", |_, _, _| Ok(Some(Value::from("overridden"))), true)
            .register_type("int", |raw, _| Ok(Some(Value::from(format!("int:{raw}")))))
            .option("-a", "", OptionSettings::new())
            .argument("b", "", ArgumentSettings::new().value_type("int"));
        let namespace = parser.parse_argv(&["-a", "x", "12"]).unwrap();
        assert_eq!(namespace.get("A"), Some(&Value::from("overridden")));
        assert_eq!(namespace.get("b"), Some(&Value::from("int:12")));
    }

    #[test]
    fn exec_replaces_result() {
        let parser = CommandParser::new("program")
            .argument("a", "", ArgumentSettings::new())
            .exec(|_| Ok([("replaced", true)].into_iter().collect()));
        let namespace = parser.parse_argv(&["x"]).unwrap();
        assert_eq!(namespace.get("replaced"), Some(&Value::Bool(true)));
        assert!(!namespace.contains("a"));
    }

    #[test]
    fn exec_error() {
        let parser = CommandParser::new("program")
            .exec(|_| Err(ParseError::custom("nope")));
        assert_eq!(
            parser.parse_argv(&[]).unwrap_err(),
            ParseError::Custom("nope".to_string())
        );
    }

    #[test]
    fn help_message() {
        let parser = CommandParser::new("program")
            .argument("items", "Things.", ArgumentSettings::new().nargs(Nargs::Any));
        let message = parser.help();
        assert_contains!(message, "usage: program [-h] [items...]");
        assert_contains!(message, "Things.");

        assert_eq!(
            parser.parse_argv(&["--help"]).unwrap_err(),
            ParseError::HelpRequested(message)
        );
    }

    #[test]
    fn debug_format() {
        let parser = CommandParser::new("program").exec(Ok);
        assert_contains!(format!("{parser:?}"), "program");
        assert_contains!(format!("{parser:?}"), "executor: true");
    }
}
