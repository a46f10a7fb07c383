//! Structured import/export.
//!
//! A field maps to a flat JSON object: `"name"` plus one camelCase key per
//! present component (`{"name": "32A", "date": "231015", ...}`). Import also
//! accepts component labels and aliases, case-insensitively.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::builtin;
use crate::error::FieldError;
use crate::field::Field;
use crate::grammar::{hooks::HookRegistry, tables::FieldSpec};

/// Key holding the field name in structured records.
const NAME_KEY: &str = "name";

impl Field {
    /// Export the present components keyed by their camelCase label.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(NAME_KEY.into(), Value::String(self.name().to_string()));
        for (spec, value) in self.spec().components.iter().zip(self.components()) {
            if let Some(v) = value {
                map.insert(spec.json_key(), Value::String(v.clone()));
            }
        }
        Value::Object(map)
    }

    /// Build a field from a structured record, using the built-in hooks.
    pub fn from_json(spec: Arc<FieldSpec>, map: &Map<String, Value>) -> Result<Self, FieldError> {
        Self::from_json_with_hooks(spec, builtin::hooks(), map)
    }

    /// [`Field::from_json`] with an explicit hook registry.
    pub fn from_json_with_hooks(
        spec: Arc<FieldSpec>,
        hooks: &HookRegistry,
        map: &Map<String, Value>,
    ) -> Result<Self, FieldError> {
        let mut field = Self::with_hooks(spec, hooks)?;
        field.apply_json(map)?;
        Ok(field)
    }

    /// Apply a structured record on top of the current components.
    ///
    /// Alias keys are applied before canonical ones, so when both name the
    /// same component the canonical key wins. Unknown keys are ignored;
    /// `null` clears a component; numbers and booleans are stored as text.
    pub fn apply_json(&mut self, map: &Map<String, Value>) -> Result<(), FieldError> {
        if let Some(Value::String(name)) = map.get(NAME_KEY)
            && name != self.name()
        {
            return Err(FieldError::TagMismatch {
                expected: self.name().to_string(),
                found: name.clone(),
            });
        }

        let spec = Arc::clone(self.spec());
        let mut aliased = Vec::new();
        let mut canonical = Vec::new();
        for (key, value) in map {
            if key == NAME_KEY {
                continue;
            }
            let Some(index) = spec.label_index(key) else {
                continue;
            };
            let Some(component) = spec.component(index) else {
                continue;
            };
            let is_canonical = key.eq_ignore_ascii_case(&component.json_key())
                || key.eq_ignore_ascii_case(&component.label);
            if is_canonical {
                canonical.push((index, value));
            } else {
                aliased.push((index, value));
            }
        }

        for (index, value) in aliased.into_iter().chain(canonical) {
            match value {
                Value::String(s) => self.set(index, s.as_str())?,
                Value::Number(n) => self.set(index, n.to_string())?,
                Value::Bool(b) => self.set(index, b.to_string())?,
                Value::Null => self.clear(index)?,
                Value::Array(_) | Value::Object(_) => {}
            }
        }
        Ok(())
    }
}
