mod base;
mod interface;
mod middleware;
mod narg;
mod printer;

pub use base::ParseError;
pub(crate) use base::{Action, Parser};
pub(crate) use interface::*;
pub(crate) use middleware::*;
pub(crate) use printer::Printer;
