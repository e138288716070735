#[macro_use]
mod macros;
mod parse;
pub use parse::{parse, Error};
pub mod ast;

/// Directive introducing a module line, e.g. `#Module Command AS trim`.
pub const MODULE_DIRECTIVE: &str = "#Module";
/// Keyword separating a module type from its label in a module directive.
pub const LABEL_KEYWORD: &str = "AS";
