//! # netspoc-edit
//!
//! Format-preserving editing engine for Netspoc policy repositories, and
//! the job interpreter driving it.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! job       → JSON change requests applied as tree edits
//!   ↓
//! project   → Repository loading, name index, atomic write back
//!   ↓
//! syntax    → Tree model, canonical order, edits, layout-preserving printer
//!   ↓
//! parser    → Logos lexer, recursive-descent parser
//!   ↓
//! base      → Primitives (Span, TextSize, Position)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → project → job)
// ============================================================================

/// Foundation types: Span, TextSize, line/column positions
pub mod base;

/// Errors shared by every layer
pub mod error;

/// Parser: Logos lexer, recursive-descent parser
pub mod parser;

/// Syntax: tree model, ordering rules, edits and printer
pub mod syntax;

/// Repository: file discovery, name index, write back
pub mod project;

/// Job interpreter: decode and apply change requests
pub mod job;

pub use base::{LineIndex, Position, Span, TextRange, TextSize};
pub use error::{PolicyError, Result};
pub use job::{Job, apply, run};
pub use project::{PolicyFile, RepoConfig, Repository};
