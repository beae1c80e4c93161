use terminal_size::{terminal_size, Width};

use crate::api::{ArgumentSpec, CommandParser, OptionSpec, Registries};
use crate::constant::*;
use crate::model::Nargs;
use crate::parser::interface::{
    ColumnRenderer, LeftWidth, MiddleWidth, PaddingWidth, TotalWidth, MINIMUM_MIDDLE_WIDTH,
};

// Used in place of the terminal width when it cannot be determined.
const FALLBACK_TOTAL_WIDTH: usize = 100;
const PADDING_WIDTH: usize = 3;
const MAIN_INDENT: usize = 1;
// An integer narg of at least this many is summarized rather than repeated.
const REPEAT_LIMIT: usize = 5;

/// Renders the usage & help message of a single command node.
pub(crate) struct Printer {
    terminal_width: Option<usize>,
}

impl Printer {
    pub(crate) fn terminal() -> Self {
        let terminal_width = if let Some((Width(terminal_width), _)) = terminal_size() {
            Some(terminal_width as usize)
        } else {
            None
        };

        Self::new(terminal_width)
    }

    pub(crate) fn new(terminal_width: Option<usize>) -> Self {
        Self { terminal_width }
    }

    pub(crate) fn render(&self, node: &CommandParser) -> String {
        let registries = node.registries();
        let mut summary = vec![format!("[-{HELP_SHORT}]")];
        let mut option_rows = vec![(format!("-{HELP_SHORT}, --{HELP_NAME}"), HELP_MESSAGE.to_string())];
        let mut argument_rows = Vec::default();
        let mut command_rows = Vec::default();

        if !node.commands().is_empty() {
            let names: Vec<&str> = node.commands().iter().map(|command| command.name()).collect();
            summary.push(format!("{{{}}}", names.join(",")));

            for command in node.commands() {
                command_rows.push((command.name().to_string(), command.help().to_string()));
            }
        }

        for option in node.options() {
            let (usage, flags) = option_grammar(registries, option);
            summary.push(usage);
            option_rows.push((flags, option.help().to_string()));
        }

        for argument in node.arguments() {
            summary.push(argument_grammar(argument));
            let name = argument.settings().get_metavar().unwrap_or(argument.name());
            argument_rows.push((name.to_string(), argument.help().to_string()));
        }

        let rows = command_rows.iter().chain(argument_rows.iter()).chain(option_rows.iter());
        let left_column_width = rows.clone().map(|(left, _)| left.len()).max().unwrap_or_default();
        let middle_column_width = rows.map(|(_, middle)| middle.len()).max().unwrap_or_default() + MAIN_INDENT;
        let renderer = ColumnRenderer::guided(
            PaddingWidth::new(PADDING_WIDTH),
            LeftWidth::new(left_column_width),
            MiddleWidth::new(std::cmp::max(middle_column_width, MINIMUM_MIDDLE_WIDTH)),
            TotalWidth(self.terminal_width.unwrap_or(FALLBACK_TOTAL_WIDTH)),
        );

        let mut lines = match node.get_usage() {
            Some(usage) => vec![format!("usage: {usage}")],
            None => vec![format!("usage: {} {}", node.program(), summary.join(" "))],
        };

        if let Some(description) = node.get_description() {
            lines.push(String::default());
            lines.push(description.to_string());
        }

        for (title, rows) in [
            ("commands:", &command_rows),
            ("arguments:", &argument_rows),
            ("options:", &option_rows),
        ] {
            if rows.is_empty() {
                continue;
            }

            lines.push(String::default());
            lines.push(title.to_string());

            for (left, middle) in rows {
                lines.extend(renderer.render(MAIN_INDENT, left, middle));
            }
        }

        if let Some(addition) = node.get_addition() {
            lines.push(String::default());
            lines.push(addition.to_string());
        }

        lines.join("\n")
    }
}

/// The usage summary entry and the listed flags of an option.
fn option_grammar(registries: &Registries, option: &OptionSpec) -> (String, String) {
    let settings = option.settings();
    let metavar = registries
        .resolve_action(settings.action_ref())
        .and_then(|(_, needs_input)| needs_input.format(settings.get_metavar().unwrap_or(option.dest())));
    let first = option.flags().first().cloned().unwrap_or_default();
    let mut flags = option.flags().join(", ");
    let required = settings.is_required();

    let usage = match metavar {
        Some(metavar) => {
            if required {
                flags.push_str(&format!(" <{metavar}>"));
                format!("{first} {metavar}")
            } else {
                flags.push_str(&format!(" [{metavar}]"));
                format!("[{first} {metavar}]")
            }
        }
        None if required => first,
        None => format!("[{first}]"),
    };

    (usage, flags)
}

fn argument_grammar(argument: &ArgumentSpec) -> String {
    let settings = argument.settings();
    let metavar = settings.get_metavar().unwrap_or(argument.name());
    let grammar = match settings.get_nargs() {
        Nargs::Optional | Nargs::Precisely(1) => metavar.to_string(),
        Nargs::Any | Nargs::AtLeastOne => format!("{metavar}..."),
        Nargs::Precisely(count) if count < REPEAT_LIMIT => vec![metavar; count].join(" "),
        Nargs::Precisely(count) => format!("{metavar}{{{count}}}"),
    };

    if !settings.is_required() || settings.get_nargs() == Nargs::AtLeastOne {
        format!("[{grammar}]")
    } else {
        grammar
    }
}
