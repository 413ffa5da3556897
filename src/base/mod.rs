//! Foundation types shared by the parser, the tree model and the printer.
//!
//! - [`Span`] - byte range into the original source text
//! - [`Position`], [`LineIndex`] - line/column conversion for diagnostics
//!
//! This module has NO dependencies on other crate modules.

mod position;

pub use position::{LineIndex, Position};
pub use text_size::{TextRange, TextSize};

/// A byte range into the source text a node was parsed from.
pub type Span = TextRange;
