//! Expand s-expressions embedded in ordinary text.
//!
//! The preprocessor copies its input to its output unchanged, except where
//! the [`MARKER`] identifier appears. The marker is followed by a single
//! parenthesized s-expression which is parsed and replaced in the output by
//! a call-expression rendering of that expression:
//!
//! ```text
//! prefix __sexpr (var { int n } (plus (a) (b))) suffix
//! ```
//!
//! becomes
//!
//! ```text
//! prefix int n (plus (a, b)); suffix
//! ```
//!
//! # Syntax
//!
//! - **Lists** are sequences of expressions, delimited by `(` and `)` and
//!   separated by whitespace.
//!
//! - **Atoms** are runs of text. Bare atoms stop at whitespace, parentheses,
//!   `"`, `{` and `#`. Quoted atoms run from one `"` to the next and keep both
//!   quote characters. Brace blocks run from `{` to the matching `}`, may nest,
//!   and keep everything between the outermost braces (trimmed of surrounding
//!   whitespace). There are no escape sequences.
//!
//! - **Comments** begin with a `#` and extend to the end of the line.
//!
//! Malformed input never fails to parse: unbalanced lists, quotes and brace
//! blocks simply end at the end of the input.
//!
//! # Rewriting
//!
//! A list `(head arg ...)` is rendered as `head (arg, ...)`. At the outermost
//! position of an expansion, lists headed by one of the [`SpecialForm`]
//! keywords are rendered as statements instead; see [`rewrite`].

pub(crate) mod escape;
pub mod expr;
pub mod form;
pub(crate) mod lexer;
pub mod parser;
pub mod printer;
pub mod rewrite;
pub mod scanner;

pub use expr::Expr;
pub use form::SpecialForm;
pub use parser::{parse, parse_invocation, Parsed, MAX_DEPTH};
pub use printer::{to_string, to_string_pretty};
pub use rewrite::{RewriteError, Rewriter};
pub use scanner::{preprocess, preprocess_str, ScanError, Scanner, Summary, MARKER};
