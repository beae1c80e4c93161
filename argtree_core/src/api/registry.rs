use std::collections::HashMap;
use std::rc::Rc;

use crate::api::{ActionRef, OptionSettings, TypeRef};
use crate::model::Value;
use crate::parser::ParseError;

/// Coerce a raw token into a value.
/// Returning `Ok(None)` signals the absent value; returning `Err` aborts the parse.
pub type TypeFn = Box<dyn Fn(&str, &Target<'_>) -> Result<Option<Value>, ParseError>>;

/// Combine a newly coerced option value with the currently accumulated value for the same destination.
///
/// The arguments are: the coerced value (absent when the option was given without one), the current value, and the option's settings.
/// Returning `Ok(None)` leaves the destination untouched.
pub type ActionFn =
    Box<dyn Fn(Option<Value>, Option<&Value>, &OptionSettings) -> Result<Option<Value>, ParseError>>;

/// Render the metavar of an option whose action takes an input value.
pub type MetavarFn = Box<dyn Fn(&str) -> String>;

/// Whether an action consumes an input value from the Cli.
///
/// This drives both the token scanner (does the option take a value) and the usage display.
pub enum NeedsInput {
    No,
    /// Takes a value, displayed as the upper-cased metavar.
    Yes,
    /// Takes a value, displayed via the provided formatter.
    Format(MetavarFn),
}

impl NeedsInput {
    pub fn is_needed(&self) -> bool {
        !matches!(self, NeedsInput::No)
    }

    pub(crate) fn format(&self, metavar: &str) -> Option<String> {
        match self {
            NeedsInput::No => None,
            NeedsInput::Yes => Some(metavar.to_ascii_uppercase()),
            NeedsInput::Format(formatter) => Some(formatter(metavar)),
        }
    }
}

impl From<bool> for NeedsInput {
    fn from(value: bool) -> Self {
        if value {
            NeedsInput::Yes
        } else {
            NeedsInput::No
        }
    }
}

impl std::fmt::Debug for NeedsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeedsInput::No => write!(f, "No"),
            NeedsInput::Yes => write!(f, "Yes"),
            NeedsInput::Format(_) => write!(f, "Format(..)"),
        }
    }
}

/// The parameter a type handler is coercing for.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    dest: &'a str,
    metavar: Option<&'a str>,
    choices: Option<&'a [String]>,
}

impl<'a> Target<'a> {
    pub(crate) fn new(dest: &'a str, metavar: Option<&'a str>, choices: Option<&'a [String]>) -> Self {
        Self {
            dest,
            metavar,
            choices,
        }
    }

    pub fn dest(&self) -> &str {
        self.dest
    }

    pub fn metavar(&self) -> Option<&str> {
        self.metavar
    }

    pub fn choices(&self) -> Option<&[String]> {
        self.choices
    }

    /// The name used in error messages: the metavar, falling back to the destination, upper-cased.
    pub fn display_name(&self) -> String {
        self.metavar.unwrap_or(self.dest).to_ascii_uppercase()
    }
}

pub(crate) struct ActionEntry {
    pub(crate) handler: ActionFn,
    pub(crate) needs_input: NeedsInput,
}

/// A table of named types and actions.
///
/// [`Registry::default`] is preloaded with the builtins:
/// * types `string`, `int`, `float`, `choice`,
/// * actions `store`, `store_const`, `store_true`, `store_false`, `append`, `append_const`, `count`.
///
/// A registry is the shared (global) tier of lookups for every [`CommandParser`](crate::CommandParser) in a tree.
/// Once handed to a parser it is read-only.
///
/// ### Example
/// ```
/// # use argtree_core as argtree;
/// use argtree::{CommandParser, OptionSettings, Registry, Value};
/// use std::rc::Rc;
///
/// let registry = Registry::default().register_type("upper", |raw, _| {
///     Ok(Some(Value::from(raw.to_uppercase())))
/// });
/// let parser = CommandParser::with_registry("program", Rc::new(registry))
///     .option("--name", "", OptionSettings::new().value_type("upper"));
///
/// let namespace = parser.parse_argv(&["--name", "abc"]).unwrap();
/// assert_eq!(namespace.get("name"), Some(&Value::from("ABC")));
/// ```
pub struct Registry {
    types: HashMap<String, TypeFn>,
    actions: HashMap<String, ActionEntry>,
}

impl Registry {
    /// A registry without any types or actions.
    pub fn empty() -> Self {
        Self {
            types: HashMap::default(),
            actions: HashMap::default(),
        }
    }

    /// Register (or replace) a named type.
    pub fn register_type(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&str, &Target<'_>) -> Result<Option<Value>, ParseError> + 'static,
    ) -> Self {
        self.insert_type(name, Box::new(handler));
        self
    }

    /// Register (or replace) a named action.
    pub fn register_action(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(Option<Value>, Option<&Value>, &OptionSettings) -> Result<Option<Value>, ParseError>
            + 'static,
        needs_input: impl Into<NeedsInput>,
    ) -> Self {
        self.insert_action(name, Box::new(handler), needs_input.into());
        self
    }

    pub(crate) fn insert_type(&mut self, name: impl Into<String>, handler: TypeFn) {
        self.types.insert(name.into(), handler);
    }

    pub(crate) fn insert_action(
        &mut self,
        name: impl Into<String>,
        handler: ActionFn,
        needs_input: NeedsInput,
    ) {
        self.actions.insert(
            name.into(),
            ActionEntry {
                handler,
                needs_input,
            },
        );
    }

    pub(crate) fn type_handler(&self, name: &str) -> Option<&TypeFn> {
        self.types.get(name)
    }

    pub(crate) fn action(&self, name: &str) -> Option<&ActionEntry> {
        self.actions.get(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::empty()
            .register_action("store", store, true)
            .register_action("store_const", store_const, false)
            .register_action("store_true", |_, _, _| Ok(Some(Value::Bool(true))), false)
            .register_action("store_false", |_, _, _| Ok(Some(Value::Bool(false))), false)
            .register_action("append", append, true)
            .register_action("append_const", append_const, false)
            .register_action("count", count, false)
            .register_type("string", string_type)
            .register_type("int", int_type)
            .register_type("float", float_type)
            .register_type("choice", choice_type)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&String> = self.types.keys().collect();
        types.sort();
        let mut actions: Vec<&String> = self.actions.keys().collect();
        actions.sort();
        f.debug_struct("Registry")
            .field("types", &types)
            .field("actions", &actions)
            .finish()
    }
}

/// The two-tier lookup of a single node: node-local overrides first, then the shared registry.
pub(crate) struct Registries {
    global: Rc<Registry>,
    local: Registry,
}

impl Registries {
    pub(crate) fn new(global: Rc<Registry>) -> Self {
        Self {
            global,
            local: Registry::empty(),
        }
    }

    pub(crate) fn global(&self) -> &Rc<Registry> {
        &self.global
    }

    pub(crate) fn local_mut(&mut self) -> &mut Registry {
        &mut self.local
    }

    /// Resolve the type handler for a parameter.
    /// `None` means the identity coercion.
    pub(crate) fn resolve_type<'a>(&'a self, type_ref: Option<&'a TypeRef>) -> Option<&'a TypeFn> {
        match type_ref {
            None => None,
            Some(TypeRef::Named(name)) => self
                .local
                .type_handler(name)
                .or_else(|| self.global.type_handler(name)),
            Some(TypeRef::Custom(handler)) => Some(handler),
        }
    }

    /// Resolve the action handler (and its input requirement) for an option.
    /// `None` means the action name is unknown to both tiers.
    pub(crate) fn resolve_action<'a>(
        &'a self,
        action_ref: &'a ActionRef,
    ) -> Option<(&'a ActionFn, &'a NeedsInput)> {
        match action_ref {
            ActionRef::Named(name) => self
                .local
                .action(name)
                .or_else(|| self.global.action(name))
                .map(|entry| (&entry.handler, &entry.needs_input)),
            ActionRef::Custom {
                handler,
                needs_input,
            } => Some((handler, needs_input)),
        }
    }
}

fn store(
    value: Option<Value>,
    _current: Option<&Value>,
    _settings: &OptionSettings,
) -> Result<Option<Value>, ParseError> {
    Ok(value)
}

fn store_const(
    _value: Option<Value>,
    _current: Option<&Value>,
    settings: &OptionSettings,
) -> Result<Option<Value>, ParseError> {
    Ok(settings.get_constant().cloned())
}

fn append(
    value: Option<Value>,
    current: Option<&Value>,
    _settings: &OptionSettings,
) -> Result<Option<Value>, ParseError> {
    match value {
        Some(value) => Ok(Some(push(current, value))),
        None => Ok(None),
    }
}

fn append_const(
    _value: Option<Value>,
    current: Option<&Value>,
    settings: &OptionSettings,
) -> Result<Option<Value>, ParseError> {
    match settings.get_constant() {
        Some(constant) => Ok(Some(push(current, constant.clone()))),
        None => Ok(current.cloned()),
    }
}

fn count(
    _value: Option<Value>,
    current: Option<&Value>,
    _settings: &OptionSettings,
) -> Result<Option<Value>, ParseError> {
    match current {
        Some(Value::Int(n)) => Ok(Some(Value::Int(n + 1))),
        _ => Ok(Some(Value::Int(1))),
    }
}

fn push(current: Option<&Value>, value: Value) -> Value {
    let mut items = match current {
        Some(Value::List(items)) => items.clone(),
        _ => Vec::default(),
    };
    items.push(value);
    Value::List(items)
}

fn string_type(raw: &str, _target: &Target<'_>) -> Result<Option<Value>, ParseError> {
    if raw.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::Str(raw.to_string())))
    }
}

fn int_type(raw: &str, target: &Target<'_>) -> Result<Option<Value>, ParseError> {
    let expected = match integer_prefix(raw) {
        Some(prefix) => match prefix.parse::<i64>() {
            Ok(i) => return Ok(Some(Value::Int(i))),
            Err(_) => format!("an integer between {} and {}", i64::MIN, i64::MAX),
        },
        None => "an integer".to_string(),
    };

    Err(ParseError::TypeCoercion {
        name: target.display_name(),
        expected,
    })
}

fn float_type(raw: &str, target: &Target<'_>) -> Result<Option<Value>, ParseError> {
    match leading_float(raw) {
        Some(x) => Ok(Some(Value::Float(x))),
        None => Err(ParseError::TypeCoercion {
            name: target.display_name(),
            expected: "a float".to_string(),
        }),
    }
}

fn choice_type(raw: &str, target: &Target<'_>) -> Result<Option<Value>, ParseError> {
    if let Some(choices) = target.choices() {
        if !choices.iter().any(|choice| choice == raw) {
            return Err(ParseError::TypeCoercion {
                name: target.display_name(),
                expected: format!("one of {{{}}}", choices.join(", ")),
            });
        }
    }

    Ok(Some(Value::Str(raw.to_string())))
}

// The leading signed digits of `raw`: "12b" gives "12", "b12" gives nothing.
fn integer_prefix(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_start();
    let sign = usize::from(trimmed.starts_with(|c: char| c == '+' || c == '-'));
    let end = trimmed[sign..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| i + sign)
        .unwrap_or(trimmed.len());

    if end == sign {
        return None;
    }

    Some(&trimmed[..end])
}

fn leading_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let mut digits = digits_from(end);
    end += digits;

    if bytes.get(end) == Some(&b'.') {
        let fraction = digits_from(end + 1);
        digits += fraction;
        end += 1 + fraction;
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exponent = end + 1;

        if matches!(bytes.get(exponent), Some(b'+') | Some(b'-')) {
            exponent += 1;
        }

        let exponent_digits = digits_from(exponent);

        if exponent_digits > 0 {
            end = exponent + exponent_digits;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn target() -> Target<'static> {
        Target::new("value", None, None)
    }

    #[rstest]
    #[case("12", Some("12"))]
    #[case("12b", Some("12"))]
    #[case("  7", Some("7"))]
    #[case("-3", Some("-3"))]
    #[case("+3", Some("+3"))]
    #[case("007", Some("007"))]
    #[case("99999999999999999999x", Some("99999999999999999999"))]
    #[case("b12", None)]
    #[case("", None)]
    #[case("-", None)]
    fn integer_prefix_of(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(integer_prefix(raw), expected);
    }

    #[rstest]
    #[case("12b", 12)]
    #[case("+3", 3)]
    #[case("007", 7)]
    #[case("-9223372036854775808", i64::MIN)]
    #[case("9223372036854775807", i64::MAX)]
    fn int_type_prefix(#[case] raw: &str, #[case] expected: i64) {
        assert_eq!(int_type(raw, &target()).unwrap(), Some(Value::Int(expected)));
    }

    #[rstest]
    #[case("99999999999999999999")]
    #[case("-9223372036854775809")]
    #[case("9223372036854775808abc")]
    fn int_type_out_of_range(#[case] raw: &str) {
        assert_matches!(
            int_type(raw, &target()),
            Err(ParseError::TypeCoercion { name, expected }) => {
                assert_eq!(name, "VALUE");
                assert_eq!(
                    expected,
                    "an integer between -9223372036854775808 and 9223372036854775807"
                );
            }
        );
    }

    #[rstest]
    #[case("1.5", Some(1.5))]
    #[case("1.5abc", Some(1.5))]
    #[case("-2", Some(-2.0))]
    #[case(".25", Some(0.25))]
    #[case("3.", Some(3.0))]
    #[case("1e3", Some(1000.0))]
    #[case("1e", Some(1.0))]
    #[case("2E-1x", Some(0.2))]
    #[case(".", None)]
    #[case("abc", None)]
    #[case("", None)]
    fn leading_float_prefix(#[case] raw: &str, #[case] expected: Option<f64>) {
        assert_eq!(leading_float(raw), expected);
    }

    #[test]
    fn string_type_empty_is_absent() {
        assert_eq!(string_type("", &target()).unwrap(), None);
        assert_eq!(
            string_type("abc", &target()).unwrap(),
            Some(Value::from("abc"))
        );
    }

    #[test]
    fn int_type_invalid() {
        let target = Target::new("count", Some("num"), None);
        assert_matches!(
            int_type("x", &target),
            Err(ParseError::TypeCoercion { name, expected }) => {
                assert_eq!(name, "NUM");
                assert_eq!(expected, "an integer");
            }
        );
    }

    #[test]
    fn float_type_invalid() {
        assert_matches!(
            float_type("x", &target()),
            Err(ParseError::TypeCoercion { name, .. }) => {
                assert_eq!(name, "VALUE");
            }
        );
    }

    #[rstest]
    #[case("a", true)]
    #[case("b", true)]
    #[case("c", false)]
    #[case("", false)]
    fn choice_type_membership(#[case] raw: &str, #[case] accepted: bool) {
        let choices = vec!["a".to_string(), "b".to_string()];
        let target = Target::new("mode", None, Some(choices.as_slice()));
        let result = choice_type(raw, &target);

        if accepted {
            assert_eq!(result.unwrap(), Some(Value::from(raw)));
        } else {
            assert_matches!(result, Err(ParseError::TypeCoercion { name, expected }) => {
                assert_eq!(name, "MODE");
                assert_eq!(expected, "one of {a, b}");
            });
        }
    }

    #[test]
    fn choice_type_without_choices() {
        assert_eq!(
            choice_type("anything", &target()).unwrap(),
            Some(Value::from("anything"))
        );
    }

    #[test]
    fn builtin_actions() {
        let registry = Registry::default();
        let settings = OptionSettings::new().constant("k");
        let invoke = |name: &str, value: Option<Value>, current: Option<&Value>| {
            (registry.action(name).unwrap().handler)(value, current, &settings).unwrap()
        };

        assert_eq!(invoke("store", Some(Value::from("x")), None), Some(Value::from("x")));
        assert_eq!(invoke("store", None, Some(&Value::from("x"))), None);
        assert_eq!(invoke("store_const", None, None), Some(Value::from("k")));
        assert_eq!(invoke("store_true", None, None), Some(Value::Bool(true)));
        assert_eq!(invoke("store_false", None, None), Some(Value::Bool(false)));
        assert_eq!(
            invoke("append", Some(Value::from("2")), Some(&Value::from(vec!["1"]))),
            Some(Value::from(vec!["1", "2"]))
        );
        assert_eq!(invoke("append", None, None), None);
        assert_eq!(
            invoke("append_const", None, Some(&Value::from(vec!["k"]))),
            Some(Value::from(vec!["k", "k"]))
        );
        assert_eq!(invoke("count", None, None), Some(Value::Int(1)));
        assert_eq!(invoke("count", None, Some(&Value::Int(4))), Some(Value::Int(5)));
    }

    #[test]
    fn append_const_without_constant() {
        let registry = Registry::default();
        let handler = &registry.action("append_const").unwrap().handler;
        let settings = OptionSettings::new();

        assert_eq!(handler(None, None, &settings).unwrap(), None);
        assert_eq!(
            handler(None, Some(&Value::from(vec!["a"])), &settings).unwrap(),
            Some(Value::from(vec!["a"]))
        );
    }

    #[rstest]
    #[case("store", true)]
    #[case("store_const", false)]
    #[case("store_true", false)]
    #[case("store_false", false)]
    #[case("append", true)]
    #[case("append_const", false)]
    #[case("count", false)]
    fn builtin_needs_input(#[case] name: &str, #[case] expected: bool) {
        let registry = Registry::default();
        assert_eq!(registry.action(name).unwrap().needs_input.is_needed(), expected);
    }

    #[test]
    fn needs_input_format() {
        assert_eq!(NeedsInput::No.format("file"), None);
        assert_eq!(NeedsInput::Yes.format("file"), Some("FILE".to_string()));
        let custom = NeedsInput::Format(Box::new(|m: &str| format!("<{m}>")));
        assert_eq!(custom.format("file"), Some("<file>".to_string()));
    }

    #[test]
    fn registries_local_before_global() {
        let global = Registry::default()
            .register_type("shout", |raw, _| Ok(Some(Value::from(format!("{raw}!")))));
        let mut registries = Registries::new(Rc::new(global));
        registries.local_mut().insert_type(
            "int",
            Box::new(|_: &str, _: &Target<'_>| Ok(Some(Value::from("local")))),
        );
        let target = target();

        let local = TypeRef::Named("int".to_string());
        let handler = registries.resolve_type(Some(&local)).unwrap();
        assert_eq!(handler("1", &target).unwrap(), Some(Value::from("local")));

        let global = TypeRef::Named("shout".to_string());
        let handler = registries.resolve_type(Some(&global)).unwrap();
        assert_eq!(handler("hi", &target).unwrap(), Some(Value::from("hi!")));

        let unknown = TypeRef::Named("unknown".to_string());
        assert!(registries.resolve_type(Some(&unknown)).is_none());
        assert!(registries.resolve_type(None).is_none());
    }

    #[test]
    fn registries_unknown_action() {
        let registries = Registries::new(Rc::new(Registry::default()));
        assert!(registries
            .resolve_action(&ActionRef::Named("split".to_string()))
            .is_none());
        assert!(registries
            .resolve_action(&ActionRef::Named("store".to_string()))
            .is_some());
    }
}
