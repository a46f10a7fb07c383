//! Built-in field tables and hooks.
//!
//! The embedded table covers a representative set of field families: plain
//! references, fixed-width amounts, account-plus-lines parties, numbered
//! party lines, narratives, the statement line, and generic qualifier
//! fields. Callers with a full table load their own with
//! [`FieldTables::from_json_str`].

use std::sync::{Arc, LazyLock};

use crate::grammar::{
    hooks::HookRegistry,
    tables::{FieldSpec, FieldTables},
};

/// JSON source of the built-in field table.
pub const FIELDS_JSON: &str = include_str!("../data/fields.json");

static TABLES: LazyLock<FieldTables> = LazyLock::new(|| {
    FieldTables::from_json_str(FIELDS_JSON)
        .expect("embedded data/fields.json is invalid, this is a build bug")
});

static HOOKS: LazyLock<HookRegistry> = LazyLock::new(HookRegistry::builtin);

/// The built-in field table, parsed and validated on first use.
pub fn tables() -> &'static FieldTables {
    &TABLES
}

/// The built-in hook registry.
pub fn hooks() -> &'static HookRegistry {
    &HOOKS
}

/// A built-in spec by field name.
pub fn spec(name: &str) -> Option<Arc<FieldSpec>> {
    TABLES.spec(name).map(Arc::clone)
}
