//! The field facade.
//!
//! A [`Field`] is one generic type for every MT field: its behavior comes
//! from the shared [`FieldSpec`] and, for custom grammars, the hook resolved
//! from a [`HookRegistry`] at construction. Component indices are 1-based.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::builtin;
use crate::coerce::{self, Currency};
use crate::error::FieldError;
use crate::grammar::{
    diag::{Diagnostic, Severity},
    emit,
    hooks::{HookRegistry, ParseHook},
    parser,
    tables::{Capability, ComponentKind, DateFormat, FieldSpec, TimeFormat},
    tokens,
};
use crate::tag::Tag;

/// Diagnostics from one [`Field::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseOutcome {
    /// Lenient-parse diagnostics, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    /// True when nothing worse than info was reported.
    pub fn is_clean(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| matches!(d.severity, Severity::Error | Severity::Warn))
    }

    /// True when an error-level diagnostic was reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// One field instance: an ordered set of optional component values.
#[derive(Clone)]
pub struct Field {
    spec: Arc<FieldSpec>,
    hook: Option<Arc<dyn ParseHook>>,
    components: Vec<Option<String>>,
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.spec.name)
            .field("components", &self.components)
            .finish()
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.spec.name == other.spec.name && self.components == other.components
    }
}

impl Eq for Field {}

// ── Construction ────────────────────────────────────────────────────────

impl Field {
    /// An empty field using the built-in hooks.
    pub fn new(spec: Arc<FieldSpec>) -> Result<Self, FieldError> {
        Self::with_hooks(spec, builtin::hooks())
    }

    /// An empty field resolving its hook from `hooks`.
    ///
    /// Fails with [`FieldError::UnknownHook`] when the spec's custom
    /// strategy names a hook the registry does not have.
    pub fn with_hooks(spec: Arc<FieldSpec>, hooks: &HookRegistry) -> Result<Self, FieldError> {
        let hook = hooks.resolve(&spec)?;
        let components = vec![None; spec.component_count()];
        Ok(Self {
            spec,
            hook,
            components,
        })
    }

    /// A field parsed from `raw` with the built-in hooks. Parse diagnostics
    /// are discarded; use [`Field::parse`] to see them.
    pub fn parse_new(spec: Arc<FieldSpec>, raw: &str) -> Result<Self, FieldError> {
        let mut field = Self::new(spec)?;
        field.parse(raw);
        Ok(field)
    }

    /// A field parsed from a tag whose name must match the spec.
    pub fn from_tag(spec: Arc<FieldSpec>, tag: &Tag) -> Result<Self, FieldError> {
        Self::from_tag_with_hooks(spec, tag, builtin::hooks())
    }

    /// [`Field::from_tag`] with an explicit hook registry.
    pub fn from_tag_with_hooks(
        spec: Arc<FieldSpec>,
        tag: &Tag,
        hooks: &HookRegistry,
    ) -> Result<Self, FieldError> {
        if tag.name != spec.name {
            return Err(FieldError::TagMismatch {
                expected: spec.name.clone(),
                found: tag.name.clone(),
            });
        }
        let mut field = Self::with_hooks(spec, hooks)?;
        field.parse(&tag.value);
        Ok(field)
    }
}

// ── Parse / serialize ───────────────────────────────────────────────────

impl Field {
    /// Replace every component with the result of parsing `raw`.
    pub fn parse(&mut self, raw: &str) -> ParseOutcome {
        let result = parser::parse_components(&self.spec, self.hook.as_deref(), raw);
        self.components = result.components;
        ParseOutcome {
            diagnostics: result.diagnostics,
        }
    }

    /// Wire text of the current components.
    pub fn serialize(&self) -> String {
        emit::serialize_components(&self.spec, self.hook.as_deref(), &self.components)
    }

    /// Alias for [`Field::serialize`].
    pub fn value(&self) -> String {
        self.serialize()
    }

    /// This field as a raw tag.
    pub fn as_tag(&self) -> Tag {
        Tag::new(self.spec.name.clone(), self.serialize())
    }
}

// ── Component access ────────────────────────────────────────────────────

impl Field {
    /// 0-based slot for a 1-based index.
    fn slot(&self, index: usize) -> Result<usize, FieldError> {
        if index == 0 || index > self.components.len() {
            return Err(FieldError::IndexOutOfRange {
                field: self.spec.name.clone(),
                index,
                count: self.components.len(),
            });
        }
        Ok(index - 1)
    }

    fn index_of(&self, label: &str) -> Result<usize, FieldError> {
        self.spec
            .label_index(label)
            .ok_or_else(|| FieldError::UnknownLabel {
                field: self.spec.name.clone(),
                label: label.to_string(),
            })
    }

    /// Value of a component.
    pub fn get(&self, index: usize) -> Result<Option<&str>, FieldError> {
        let i = self.slot(index)?;
        Ok(self.components[i].as_deref())
    }

    /// Set a component.
    pub fn set(&mut self, index: usize, value: impl Into<String>) -> Result<(), FieldError> {
        let i = self.slot(index)?;
        self.components[i] = Some(value.into());
        Ok(())
    }

    /// Unset a component.
    pub fn clear(&mut self, index: usize) -> Result<(), FieldError> {
        let i = self.slot(index)?;
        self.components[i] = None;
        Ok(())
    }

    /// Value of the component with this label, key, or alias.
    pub fn get_by_label(&self, label: &str) -> Result<Option<&str>, FieldError> {
        let index = self.index_of(label)?;
        self.get(index)
    }

    /// Set the component with this label, key, or alias.
    pub fn set_by_label(&mut self, label: &str, value: impl Into<String>) -> Result<(), FieldError> {
        let index = self.index_of(label)?;
        self.set(index, value)
    }

    /// All component slots, in order.
    pub fn components(&self) -> &[Option<String>] {
        &self.components
    }

    /// Whether every component is unset.
    pub fn is_empty(&self) -> bool {
        self.components.iter().all(Option::is_none)
    }
}

// ── Typed accessors ─────────────────────────────────────────────────────

impl Field {
    fn kind(&self, index: usize) -> Option<ComponentKind> {
        self.spec.kind(index)
    }

    /// Year of the first full date, used to complete `MMDD` dates.
    fn reference_year(&self) -> Option<i32> {
        self.spec
            .components
            .iter()
            .zip(&self.components)
            .find_map(|(c, v)| match (c.kind, v.as_deref()) {
                (ComponentKind::Date { format }, Some(text)) if format != DateFormat::Mmdd => {
                    coerce::to_date(text, format, None).map(|d| d.year())
                }
                _ => None,
            })
    }

    fn date_format(&self, index: usize, text: &str) -> Option<DateFormat> {
        match self.kind(index) {
            Some(ComponentKind::Date { format }) => Some(format),
            _ => match text.len() {
                8 => Some(DateFormat::Yyyymmdd),
                6 => Some(DateFormat::Yymmdd),
                _ => None,
            },
        }
    }

    /// Component as an unsigned integer.
    pub fn get_int(&self, index: usize) -> Result<Option<i64>, FieldError> {
        Ok(self.get(index)?.and_then(coerce::to_int))
    }

    /// Component as an amount (comma decimal separator).
    pub fn get_decimal(&self, index: usize) -> Result<Option<Decimal>, FieldError> {
        Ok(self.get(index)?.and_then(coerce::to_decimal))
    }

    /// Component as a date, in the component's declared format (or guessed
    /// from its length for non-date components).
    pub fn get_date(&self, index: usize) -> Result<Option<NaiveDate>, FieldError> {
        let Some(text) = self.get(index)? else {
            return Ok(None);
        };
        Ok(self
            .date_format(index, text)
            .and_then(|format| coerce::to_date(text, format, self.reference_year())))
    }

    /// Component as a time of day.
    pub fn get_time(&self, index: usize) -> Result<Option<NaiveTime>, FieldError> {
        let Some(text) = self.get(index)? else {
            return Ok(None);
        };
        let format = match self.kind(index) {
            Some(ComponentKind::Time { format }) => format,
            _ if text.len() == 6 => TimeFormat::Hhmmss,
            _ => TimeFormat::Hhmm,
        };
        Ok(coerce::to_time(text, format))
    }

    /// Component as a currency code.
    pub fn get_currency(&self, index: usize) -> Result<Option<Currency>, FieldError> {
        Ok(self.get(index)?.and_then(coerce::to_currency))
    }

    /// Store an integer.
    pub fn set_int(&mut self, index: usize, value: i64) -> Result<(), FieldError> {
        self.set(index, value.to_string())
    }

    /// Store an amount in wire form (`1234,5`).
    pub fn set_decimal(&mut self, index: usize, value: &Decimal) -> Result<(), FieldError> {
        self.set(index, coerce::format_decimal(value))
    }

    /// Store a date in the component's format (`YYMMDD` for non-date kinds).
    pub fn set_date(&mut self, index: usize, value: NaiveDate) -> Result<(), FieldError> {
        let format = match self.kind(index) {
            Some(ComponentKind::Date { format }) => format,
            _ => DateFormat::Yymmdd,
        };
        self.set(index, coerce::format_date(value, format))
    }

    /// Store a time in the component's format (`HHMM` for non-time kinds).
    pub fn set_time(&mut self, index: usize, value: NaiveTime) -> Result<(), FieldError> {
        let format = match self.kind(index) {
            Some(ComponentKind::Time { format }) => format,
            _ => TimeFormat::Hhmm,
        };
        self.set(index, coerce::format_time(value, format))
    }

    /// Store a currency code.
    pub fn set_currency(&mut self, index: usize, value: &Currency) -> Result<(), FieldError> {
        self.set(index, value.as_str())
    }
}

// ── Introspection ───────────────────────────────────────────────────────

impl Field {
    /// The shared specification.
    pub fn spec(&self) -> &Arc<FieldSpec> {
        &self.spec
    }

    /// Field name including letter option (`"59F"`).
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Numeric part of the name (`"59"`).
    pub fn number(&self) -> &str {
        self.spec.number()
    }

    /// Letter option (`Some('F')` for `"59F"`).
    pub fn letter_option(&self) -> Option<char> {
        self.spec.letter_option()
    }

    /// Number of components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Whether the component may be absent.
    pub fn is_optional(&self, index: usize) -> Result<bool, FieldError> {
        let i = self.slot(index)?;
        Ok(self.spec.components[i].optional)
    }

    /// Label of the component.
    pub fn label(&self, index: usize) -> Result<&str, FieldError> {
        let i = self.slot(index)?;
        Ok(&self.spec.components[i].label)
    }

    /// Structured-data key of the component.
    pub fn json_key(&self, index: usize) -> Result<String, FieldError> {
        let i = self.slot(index)?;
        Ok(self.spec.components[i].json_key())
    }

    /// 1-based index of a label, key, or alias (case-insensitive).
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.spec.label_index(name)
    }

    /// Whether the first component is a qualifier.
    pub fn is_generic(&self) -> bool {
        self.spec.generic
    }

    /// The qualifier of a generic field.
    pub fn qualifier(&self) -> Option<&str> {
        if !self.spec.generic {
            return None;
        }
        self.components.first().and_then(|c| c.as_deref())
    }

    /// The data source scheme of a generic field that declares one.
    pub fn dss(&self) -> Option<&str> {
        if !self.spec.dss {
            return None;
        }
        self.components.get(1).and_then(|c| c.as_deref())
    }
}

// ── Multi-line helpers ──────────────────────────────────────────────────

impl Field {
    /// Lines of the serialized value.
    pub fn lines(&self) -> Vec<String> {
        tokens::lines(&self.serialize())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Line `n` (1-based) of the serialized value.
    pub fn line(&self, n: usize) -> Option<String> {
        n.checked_sub(1).and_then(|i| self.lines().into_iter().nth(i))
    }

    /// Lines `start..=end` (1-based) of the serialized value, clamped to
    /// what exists.
    pub fn lines_between(&self, start: usize, end: usize) -> Vec<String> {
        if start == 0 || end < start {
            return Vec::new();
        }
        self.lines()
            .into_iter()
            .skip(start - 1)
            .take(end - start + 1)
            .collect()
    }
}

// ── Capabilities ────────────────────────────────────────────────────────

impl Field {
    /// Whether the spec declares or implies a capability.
    pub fn supports(&self, capability: Capability) -> bool {
        self.spec.supports(capability)
    }

    fn indices_of(&self, pred: fn(&ComponentKind) -> bool) -> impl Iterator<Item = usize> + '_ {
        self.spec
            .components
            .iter()
            .enumerate()
            .filter(move |(_, c)| pred(&c.kind))
            .map(|(i, _)| i + 1)
    }

    /// Every amount component that converts.
    pub fn amounts(&self) -> Vec<Decimal> {
        self.indices_of(|k| matches!(k, ComponentKind::Decimal))
            .filter_map(|i| self.get_decimal(i).ok().flatten())
            .collect()
    }

    /// Every date component that converts.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.indices_of(|k| matches!(k, ComponentKind::Date { .. }))
            .filter_map(|i| self.get_date(i).ok().flatten())
            .collect()
    }

    /// The first currency component that converts.
    pub fn currency(&self) -> Option<Currency> {
        self.indices_of(|k| matches!(k, ComponentKind::CurrencyCode))
            .find_map(|i| self.get_currency(i).ok().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tables::{ComponentSpec, OverflowPolicy, Strategy};

    fn narrative() -> Arc<FieldSpec> {
        let components = (1..=4)
            .map(|i| ComponentSpec::new(format!("Narrative {i}"), ComponentKind::PlainText).optional())
            .collect();
        Arc::new(FieldSpec::new(
            "72",
            components,
            Strategy::Lines {
                start: 1,
                account: false,
                overflow: OverflowPolicy::Drop,
            },
        ))
    }

    #[test]
    fn index_bounds_are_errors() {
        let mut f = Field::new(narrative()).expect("builds");
        assert!(matches!(
            f.get(0),
            Err(FieldError::IndexOutOfRange { index: 0, count: 4, .. })
        ));
        assert!(f.set(5, "x").is_err());
        assert!(f.clear(5).is_err());
        assert!(f.label(5).is_err());
        assert_eq!(f.get(4), Ok(None));
    }

    #[test]
    fn debug_shows_name_and_components() {
        let mut f = Field::new(narrative()).expect("builds");
        f.set(1, "A").expect("in range");
        let text = format!("{f:?}");
        assert!(text.contains("\"72\""), "{text}");
        assert!(text.contains("Some(\"A\")"), "{text}");
    }

    #[test]
    fn line_helpers() {
        let f = Field::parse_new(narrative(), "A\r\nB\r\nC").expect("builds");
        assert_eq!(f.lines(), vec!["A", "B", "C"]);
        assert_eq!(f.line(2).as_deref(), Some("B"));
        assert_eq!(f.line(0), None);
        assert_eq!(f.line(9), None);
        assert_eq!(f.lines_between(2, 9), vec!["B", "C"]);
        assert!(f.lines_between(3, 2).is_empty());
    }

    #[test]
    fn outcome_cleanliness() {
        let info = Diagnostic::info("X", "i", None);
        let warn = Diagnostic::warn("X", "w", None);
        assert!(ParseOutcome::default().is_clean());
        assert!(
            ParseOutcome {
                diagnostics: vec![info]
            }
            .is_clean()
        );
        let o = ParseOutcome {
            diagnostics: vec![warn],
        };
        assert!(!o.is_clean());
        assert!(!o.has_errors());
    }
}
