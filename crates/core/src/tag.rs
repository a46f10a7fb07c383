use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builtin;
use crate::error::FieldError;
use crate::field::Field;
use crate::grammar::{hooks::HookRegistry, tables::FieldTables};

/// A raw `(name, value)` pair as it appears in a message block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Field name including letter option (`"59F"`).
    pub name: String,
    /// Raw value, line breaks included.
    pub value: String,
}

impl Tag {
    /// Create a tag.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}:{}", self.name, self.value)
    }
}

/// Field construction from [`FieldTables`] by name.
pub trait TablesExt {
    /// An empty field of the named type, using the built-in hooks.
    fn field(&self, name: &str) -> Result<Field, FieldError>;

    /// An empty field of the named type, resolving hooks from `hooks`.
    fn field_with_hooks(&self, name: &str, hooks: &HookRegistry) -> Result<Field, FieldError>;

    /// A field parsed from a tag, looked up by the tag's name.
    fn field_for(&self, tag: &Tag) -> Result<Field, FieldError>;
}

impl TablesExt for FieldTables {
    fn field(&self, name: &str) -> Result<Field, FieldError> {
        self.field_with_hooks(name, builtin::hooks())
    }

    fn field_with_hooks(&self, name: &str, hooks: &HookRegistry) -> Result<Field, FieldError> {
        let spec = self
            .spec(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
        Field::with_hooks(Arc::clone(spec), hooks)
    }

    fn field_for(&self, tag: &Tag) -> Result<Field, FieldError> {
        let spec = self
            .spec(&tag.name)
            .ok_or_else(|| FieldError::UnknownField(tag.name.clone()))?;
        Field::from_tag(Arc::clone(spec), tag)
    }
}

/// Parse each tag independently; one result per tag, in order.
pub fn parse_tags(
    tags: &[Tag],
    tables: &FieldTables,
    hooks: &HookRegistry,
) -> Vec<Result<Field, FieldError>> {
    tags.iter()
        .map(|tag| {
            let spec = tables
                .spec(&tag.name)
                .ok_or_else(|| FieldError::UnknownField(tag.name.clone()))?;
            Field::from_tag_with_hooks(Arc::clone(spec), tag, hooks)
        })
        .collect()
}
