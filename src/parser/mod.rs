//! Parser for the policy language
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind
//!     ↓
//! Parser → Forest of typed definitions, each node with its Layout
//! ```
//!
//! The three entry points share one tokenizer and one grammar:
//! [`parse_file`] for whole files, [`parse_union`] for element lists
//! supplied by jobs and [`parse_definition`] for inline definitions.

#[allow(clippy::module_inception)]
mod parser;

mod lexer;
mod syntax_kind;

pub use lexer::{Lexer, Token, tokenize};
pub use parser::{parse_definition, parse_file, parse_union};
pub use syntax_kind::SyntaxKind;
