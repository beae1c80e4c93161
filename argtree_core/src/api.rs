mod core;
mod parameter;
mod registry;

pub use self::core::*;
pub use parameter::*;
pub use registry::*;
