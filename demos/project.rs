use std::rc::Rc;

use argtree::{
    ArgumentSettings, CommandParser, Nargs, NeedsInput, OptionSettings, ParseError, Registry,
    Value,
};

fn main() {
    // Shared by every command in the tree.
    let registry = Registry::default()
        .register_type("identifier", |raw, target| {
            if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                Ok(Some(Value::from(raw)))
            } else {
                Err(ParseError::custom(format!(
                    "{} must be an identifier.",
                    target.display_name()
                )))
            }
        })
        .register_action(
            "define",
            |value, current, _| {
                let definition = match value.as_ref().and_then(Value::as_str) {
                    Some(definition) if definition.contains('=') => definition.to_string(),
                    Some(definition) => format!("{definition}=1"),
                    None => return Ok(None),
                };
                let mut definitions = current
                    .and_then(Value::as_list)
                    .map(<[Value]>::to_vec)
                    .unwrap_or_default();
                definitions.push(Value::from(definition));
                Ok(Some(Value::List(definitions)))
            },
            NeedsInput::Format(Box::new(|metavar: &str| format!("{}[=VALUE]", metavar.to_ascii_uppercase()))),
        );

    let parser = CommandParser::with_registry("project", Rc::new(registry))
        .description("Manage a project.")
        .option(["-q", "--quiet"], "Suppress output.", OptionSettings::new().action("store_true"))
        .command("init", "Create a new project.", |sub| {
            sub.argument(
                "name",
                "The project name.",
                ArgumentSettings::new().value_type("identifier").required(true),
            )
            .argument("path", "Where to create it.", ArgumentSettings::new().default_value("."))
        })
        .command("build", "Build the project.", |sub| {
            sub.option(
                ["-D", "--define"],
                "Define a build variable.",
                OptionSettings::new().action("define").metavar("name"),
            )
            .option(
                ["-j", "--jobs"],
                "The number of parallel jobs.",
                OptionSettings::new().value_type("int").default_value(1),
            )
            .option(
                "--profile",
                "The build profile.",
                OptionSettings::new()
                    .value_type("choice")
                    .choices(["debug", "release"])
                    .default_value("debug"),
            )
            .argument(
                "targets",
                "The targets to build (all, when none are given).",
                ArgumentSettings::new().nargs(Nargs::Any).value_type("identifier"),
            )
            .exec(|mut namespace| {
                let targets = namespace.get("targets").and_then(Value::as_list).map_or(0, <[Value]>::len);

                if targets == 0 {
                    namespace.insert("targets", vec!["all"]);
                }

                Ok(namespace)
            })
        })
        .command("run", "Run a project binary.", |sub| {
            sub.argument("binary", "The binary to run.", ArgumentSettings::new().required(true))
                .argument("args", "Arguments for the binary.", ArgumentSettings::new().nargs(Nargs::Any))
        });

    let namespace = parser.parse();
    let mut entries: Vec<(&String, &Value)> = namespace.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (dest, value) in entries {
        println!("{dest}: {value}");
    }
}
