//! SWIFT MT field engine.
//!
//! Decomposes the raw text of a tagged MT field (`:61:`, `:59F:`, `:98C:`)
//! into ordered components according to a table-driven [`FieldSpec`], and
//! serializes the components back into wire text. The main entry points are
//! [`Field::parse_new`] for parsing and [`Field::serialize`] for output;
//! [`builtin::tables`] provides a representative set of field specs.

#![warn(missing_docs)]

/// Built-in field tables and hook registry.
pub mod builtin;
/// Best-effort conversion between component text and typed values.
pub mod coerce;
/// Error types for the field facade.
pub mod error;
/// Field facade: typed, label-aware access to parsed components.
pub mod field;
/// Field grammar: tokenizer, strategies, hooks, serializer.
pub mod grammar;
/// Structured (JSON) import and export of fields.
pub mod json;
/// Raw tag values and table lookups.
pub mod tag;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Facade
pub use field::{Field, ParseOutcome};
pub use tag::{Tag, TablesExt, parse_tags};

// Errors
pub use error::FieldError;

// Grammar
pub use grammar::emit::serialize_components;
pub use grammar::hooks::{FnHook, HookRegistry, ParseHook};
pub use grammar::parser::{ParseContext, ParseResult, parse_components};

// Coercion
pub use coerce::Currency;

// Diagnostics (re-exported from the diagnostics crate)
pub use grammar::diag::{Diagnostic, Severity, Span, codes};

// Tables
pub use grammar::tables::{
    Capability, ComponentKind, ComponentSpec, FieldSpec, FieldTables, Strategy,
};
