//! `argtree` is a declarative command line parser for Rust, in the style of `argparse`.
//!
//! A program declares a tree of command nodes.
//! Each node carries options, positional arguments, and nested sub-commands, each resolved through pluggable *types* and *actions*.
//! Parsing produces a single [`Namespace`]: a mapping from destination keys to dynamically typed [`Value`]s.
//!
//! `argtree` prioritizes the following design concerns:
//! * *Declarative configuration*:
//! The entire Cli is described up front, via a fluent builder Api.
//! * *Pluggable resolution*:
//! Coercion (types) and accumulation (actions) are named, overridable functions.
//! The builtins cover the common cases: `store`, `store_const`, `store_true`, `store_false`, `append`, `append_const`, `count`; `string`, `int`, `float`, `choice`.
//! * *Sub-command paradigm*:
//! A sub-command is itself a full command node, so sub-commands nest arbitrarily deep.
//! * *Fail fast*:
//! The first error aborts the parse; there are no partial results.
//!
//! # Usage
//! ```no_run
#![doc = include_str!("../demos/summer.rs")]
//! ```
//!
//! This generates the following Cli program:
//! ```console
//! $ summer -h
//! usage: summer [-h] [item...]
//!
//! Sum the items.
//!
//! arguments:
//!  item         The items to sum.
//!
//! options:
//!  -h, --help   Show this help message and exit.
//!
//! $ summer 1 2 3
//! Sum: 6
//!
//! $ summer
//! Parse error: missing required argument 'ITEM'.
//!
//! $ summer 1 blah
//! Parse error: ITEM must be an integer.
//! ```
//!
//! # Options
//! An option is declared with one or more flags: a long `--name`, a short `-n`, or a bare word matched literally.
//! Short flags may be clustered (`-vvv`), and values may be given inline (`--name=value`, `-nvalue`).
//!
//! Options resolve through their *action*, which combines the (typed) value with what was previously accumulated at the same destination.
//! ```
//! use argtree::{CommandParser, OptionSettings, Value};
//!
//! let parser = CommandParser::new("program")
//!     .option(["-v", "--verbose"], "", OptionSettings::new().action("count"))
//!     .option("-r", "", OptionSettings::new().dest("mode").action("store_const").constant(1))
//!     .option("-w", "", OptionSettings::new().dest("mode").action("store_const").constant(2));
//!
//! let namespace = parser.parse_argv(&["-vv", "-r", "--verbose", "-w"]).unwrap();
//! assert_eq!(namespace.get("verbose"), Some(&Value::Int(3)));
//! assert_eq!(namespace.get("mode"), Some(&Value::Int(2)));
//! ```
//!
//! # Arguments
//! Positional tokens are distributed across the arguments in declaration order, by each argument's [`Nargs`].
//! Note that a variadic argument (`*` or `+`) takes every remaining token, so any argument declared after it receives nothing.
//! ```
//! use argtree::{ArgumentSettings, CommandParser, Nargs, Value};
//!
//! let parser = CommandParser::new("program")
//!     .argument("a", "", ArgumentSettings::new().value_type("int"))
//!     .argument("b", "", ArgumentSettings::new().nargs(Nargs::AtLeastOne));
//!
//! let namespace = parser.parse_argv(&["12", "x", "y"]).unwrap();
//! assert_eq!(namespace.get("a"), Some(&Value::Int(12)));
//! assert_eq!(namespace.get("b"), Some(&Value::from(vec!["x", "y"])));
//! ```
//!
//! # Sub-commands
//! ```
//! use argtree::{CommandParser, OptionSettings, Value};
//!
//! let parser = CommandParser::new("program")
//!     .command("init", "Initialize.", |sub| {
//!         sub.option("--bare", "", OptionSettings::new().action("store_true"))
//!     });
//!
//! let namespace = parser.parse_argv_with_command(&["init", "--bare"], "command").unwrap();
//! assert_eq!(namespace.get("command"), Some(&Value::from("init")));
//! assert_eq!(namespace.get("bare"), Some(&Value::Bool(true)));
//! ```
//!
//! # Features
//! * `tracing_debug`: emit debug level [tracing](https://docs.rs/tracing) of the parse.

pub use argtree_core::*;
