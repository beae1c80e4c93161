use crate::api::CommandParser;
use crate::model::Namespace;
use crate::parser::base::*;
use crate::parser::interface::UserInterface;
use crate::parser::printer::Printer;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// Resolve the `tokens` against `node`, delegating to the first sub-command named by the leading token.
///
/// Delegation is transparent: the sub-command's result is returned verbatim.
/// When `command_key` is set, the delegated command's name is recorded under it.
pub(crate) fn dispatch(
    node: &CommandParser,
    tokens: &[&str],
    command_key: Option<&str>,
) -> Result<Namespace, ParseError> {
    if let Some(first) = tokens.first() {
        if let Some(command) = node.commands().iter().find(|command| command.name() == *first) {
            #[cfg(feature = "tracing_debug")]
            {
                debug!(
                    "Delegating to '{}' with {:?}.",
                    command.parser().program(),
                    &tokens[1..]
                );
            }

            let mut namespace = dispatch(command.parser(), &tokens[1..], None)?;

            if let Some(key) = command_key {
                namespace.insert(key, command.name());
            }

            return Ok(namespace);
        }
    }

    #[cfg(feature = "tracing_debug")]
    {
        debug!("Resolving '{}' with {tokens:?}.", node.program());
    }

    match Parser::new(node).consume(tokens)? {
        Action::PrintHelp => Err(ParseError::HelpRequested(Printer::terminal().render(node))),
        Action::Continue(namespace) => match node.executor() {
            Some(executor) => executor(namespace),
            None => Ok(namespace),
        },
    }
}

/// Resolve the `tokens` against `node`, reporting help and errors through the `user_interface`.
pub(crate) fn run_with_interface(
    node: &CommandParser,
    tokens: &[&str],
    user_interface: &(impl UserInterface + ?Sized),
) -> Result<Namespace, i32> {
    match dispatch(node, tokens, None) {
        Ok(namespace) => Ok(namespace),
        Err(ParseError::HelpRequested(message)) => {
            user_interface.print(message);
            Err(0)
        }
        Err(error) => {
            let exit_code = error.exit_code();
            user_interface.print_error(error);
            Err(exit_code)
        }
    }
}
