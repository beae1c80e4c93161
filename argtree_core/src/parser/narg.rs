use std::collections::VecDeque;

use crate::api::{ArgumentSpec, Registries};
use crate::model::{Namespace, Nargs, Value};
use crate::parser::ParseError;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// Distribute the positional tokens across `arguments`, in declaration order.
///
/// Each argument greedily takes what its nargs asks for: a variadic (`*`/`+`) takes every remaining token,
/// starving any argument declared after it.
/// Returns the tokens no argument took.
pub(crate) fn distribute(
    registries: &Registries,
    arguments: &[ArgumentSpec],
    tokens: Vec<String>,
    memo: &mut Namespace,
) -> Result<Vec<String>, ParseError> {
    let mut tokens: VecDeque<String> = tokens.into();

    for argument in arguments {
        let settings = argument.settings();
        let dest = argument.dest();
        let target = argument.target();
        let type_handler = registries.resolve_type(settings.type_ref());
        let coerce = |raw: String| -> Result<Option<Value>, ParseError> {
            match type_handler {
                Some(handler) => handler(&raw, &target),
                None => Ok(Some(Value::Str(raw))),
            }
        };

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Distributing to '{dest}' ({nargs}): {tokens:?}.",
                nargs = settings.get_nargs()
            );
        }

        match settings.get_nargs() {
            Nargs::Optional | Nargs::Precisely(1) => {
                if let Some(raw) = tokens.pop_front() {
                    if let Some(value) = coerce(raw)? {
                        memo.insert(dest, value);
                    }
                }
            }
            Nargs::Any => {
                let values = drain_all(&mut tokens, &coerce)?;
                memo.insert(dest, Value::List(values));
            }
            Nargs::AtLeastOne => {
                if tokens.is_empty() {
                    return Err(missing(argument, None));
                }

                let values = drain_all(&mut tokens, &coerce)?;
                memo.insert(dest, Value::List(values));
            }
            Nargs::Precisely(count) => {
                let mut values = Vec::with_capacity(count);

                for _ in 0..count {
                    match tokens.pop_front() {
                        Some(raw) => values.push(Value::from(coerce(raw)?)),
                        None if settings.is_required() => {
                            return Err(missing(argument, Some(count)));
                        }
                        None => values.push(Value::Missing),
                    }
                }

                memo.insert(dest, Value::List(values));
            }
        }

        // An absent value or an empty list both count as unset.
        let unset = memo.get(dest).map_or(true, Value::is_empty_list);

        if unset {
            if settings.is_required() {
                return Err(missing(argument, None));
            }

            if let Some(default) = settings.get_default() {
                memo.insert(dest, default.clone());
            }
        }
    }

    Ok(tokens.into())
}

fn drain_all(
    tokens: &mut VecDeque<String>,
    coerce: &impl Fn(String) -> Result<Option<Value>, ParseError>,
) -> Result<Vec<Value>, ParseError> {
    tokens
        .drain(..)
        .map(|raw| coerce(raw).map(Value::from))
        .collect()
}

fn missing(argument: &ArgumentSpec, need: Option<usize>) -> ParseError {
    ParseError::MissingRequiredArgument {
        name: argument.dest().to_ascii_uppercase(),
        need,
    }
}
