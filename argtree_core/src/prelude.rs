//! Traits which, typically, may be imported without concern: `use argtree::prelude::*`.

pub use crate::api::IntoFlags;
pub use crate::model::{Namespace, Nargs, Value};
