//! SWIFT MT field specification tables.
//!
//! Defines the immutable, per-field-type metadata the parsing engine is
//! driven by: component layout (labels, kinds, optionality, aliases), the
//! strategy used to distribute a raw value over the components, and the
//! [`FieldTables`] container the specs are deserialized into.
//!
//! A [`FieldSpec`] is created once per field type and shared read-only
//! (`Arc<FieldSpec>`) by every field instance of that type.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Current format version for the field table JSON schema.
pub const TABLE_FORMAT_VERSION: &str = "1.0.0";

// ─── Errors ─────────────────────────────────────────────────────────────────

/// A field specification that violates the table invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// The field name is empty.
    #[error("field name must not be empty")]
    EmptyName,

    /// The field declares no components.
    #[error("field {field}: at least one component is required")]
    NoComponents {
        /// Field name.
        field: String,
    },

    /// Two components resolve to the same label, key, or alias.
    #[error("field {field}: label or alias '{label}' is declared more than once")]
    DuplicateLabel {
        /// Field name.
        field: String,
        /// The conflicting label (lowercased).
        label: String,
    },

    /// The strategy does not fit the declared components.
    #[error("field {field}: invalid strategy: {reason}")]
    InvalidStrategy {
        /// Field name.
        field: String,
        /// Human-readable explanation.
        reason: String,
    },
}

/// Errors that can occur when loading field tables.
#[derive(Debug, Error)]
pub enum TablesError {
    /// JSON deserialization failed.
    #[error("invalid field table JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field specification failed validation.
    #[error(transparent)]
    InvalidSpec(#[from] SpecError),

    /// The same field name appears twice.
    #[error("field {0} is declared more than once")]
    DuplicateField(String),

    /// The table was produced for an incompatible format version.
    #[error("unsupported table format version {found} (expected {expected})")]
    UnsupportedFormat {
        /// Version found in the table.
        found: String,
        /// Version this crate understands.
        expected: &'static str,
    },
}

// ─── Component kinds ────────────────────────────────────────────────────────

/// Wire layout of a date component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DateFormat {
    /// Two-digit year, month, day (`6!n`).
    #[serde(rename = "YYMMDD")]
    Yymmdd,
    /// Four-digit year, month, day (`8!n`).
    #[serde(rename = "YYYYMMDD")]
    Yyyymmdd,
    /// Month and day without a year (`4!n`).
    #[serde(rename = "MMDD")]
    Mmdd,
}

impl DateFormat {
    /// Number of digits the date occupies on the wire.
    pub fn width(self) -> usize {
        match self {
            DateFormat::Yymmdd => 6,
            DateFormat::Yyyymmdd => 8,
            DateFormat::Mmdd => 4,
        }
    }
}

/// Wire layout of a time component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFormat {
    /// Hours and minutes (`4!n`).
    #[serde(rename = "HHMM")]
    Hhmm,
    /// Hours, minutes, seconds (`6!n`).
    #[serde(rename = "HHMMSS")]
    Hhmmss,
}

impl TimeFormat {
    /// Number of digits the time occupies on the wire.
    pub fn width(self) -> usize {
        match self {
            TimeFormat::Hhmm => 4,
            TimeFormat::Hhmmss => 6,
        }
    }
}

/// The value type of a component. Drives typed accessors and the width of
/// numeric groups in stacked-numeric grammars.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComponentKind {
    /// Free text.
    #[default]
    PlainText,
    /// Whole number.
    Integer,
    /// Amount or rate using the comma decimal separator.
    Decimal,
    /// Calendar date.
    Date {
        /// Wire layout.
        format: DateFormat,
    },
    /// Time of day.
    Time {
        /// Wire layout.
        format: TimeFormat,
    },
    /// ISO 4217 currency code.
    CurrencyCode,
    /// A narrative line continuing the previous component.
    NarrativeContinuation,
}

impl ComponentKind {
    /// Fixed digit width of numeric date/time kinds, `None` otherwise.
    pub fn numeric_width(self) -> Option<usize> {
        match self {
            ComponentKind::Date { format } => Some(format.width()),
            ComponentKind::Time { format } => Some(format.width()),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::PlainText => write!(f, "text"),
            ComponentKind::Integer => write!(f, "integer"),
            ComponentKind::Decimal => write!(f, "decimal"),
            ComponentKind::Date { format } => write!(f, "date({format:?})"),
            ComponentKind::Time { format } => write!(f, "time({format:?})"),
            ComponentKind::CurrencyCode => write!(f, "currency"),
            ComponentKind::NarrativeContinuation => write!(f, "narrative"),
        }
    }
}

/// Metadata for a single component slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Human-readable label (e.g., `"Value Date"`).
    pub label: String,
    /// Value type.
    #[serde(default)]
    pub kind: ComponentKind,
    /// Whether the component may be absent in a well-formed value.
    #[serde(default)]
    pub optional: bool,
    /// Alternate label names accepted by lookups and JSON import.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ComponentSpec {
    /// A mandatory component with the given label and kind.
    pub fn new(label: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            label: label.into(),
            kind,
            optional: false,
            aliases: Vec::new(),
        }
    }

    /// Mark the component optional (builder pattern).
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Add an alternate label (builder pattern).
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// The camelCase key used for this component in structured data.
    pub fn json_key(&self) -> String {
        json_key(&self.label)
    }
}

/// Convert a label such as `"Reference for the Account Owner"` into its
/// camelCase structured-data key (`"referenceForTheAccountOwner"`).
pub fn json_key(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for (i, word) in label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let lower = word.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

// ─── Strategies ─────────────────────────────────────────────────────────────

/// What the line strategy does with lines beyond the last component.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OverflowPolicy {
    /// Excess lines are discarded (and reported).
    #[default]
    Drop,
    /// Excess lines are appended to the last component, joined by line breaks.
    MergeIntoLast,
}

/// How a built-in hook distributes the value part of a field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValueLayout {
    /// The whole value goes to one component.
    #[default]
    Single,
    /// The value is split on `/`; the last component takes the remainder.
    Slashed,
    /// The value is a run of digits split by the widths of the component kinds.
    Stacked,
}

/// The algorithm that distributes a raw value over the components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Strategy {
    /// One line per component.
    Lines {
        /// 1-based component receiving the first line.
        #[serde(default = "default_start")]
        start: usize,
        /// Component 1 holds an optional `/account` first line.
        #[serde(default)]
        account: bool,
        /// Treatment of lines beyond the last component.
        #[serde(default)]
        overflow: OverflowPolicy,
    },
    /// `code/value` pairs, one per line, with an optional unprefixed head.
    Delimited {
        /// Pair delimiter.
        #[serde(default = "default_delimiter")]
        delimiter: char,
        /// Component 1 holds a first line that starts with the delimiter.
        #[serde(default)]
        head: bool,
    },
    /// Successive fixed-length substrings.
    #[serde(rename_all = "camelCase")]
    FixedWidth {
        /// Cumulative end offsets, one per fixed component.
        offsets: Vec<usize>,
        /// A final component takes everything after the last offset.
        #[serde(default)]
        rest: bool,
    },
    /// A named hand-written grammar from the hook registry.
    Custom {
        /// Registry name of the hook.
        hook: String,
        /// Layout parameter for built-in hooks.
        #[serde(default)]
        layout: ValueLayout,
    },
}

fn default_start() -> usize {
    1
}

fn default_delimiter() -> char {
    '/'
}

/// Capabilities a field may support, queried instead of static typing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// The value spans multiple lines.
    MultiLine,
    /// At least one component is an amount.
    Amount,
    /// At least one component is a date.
    Date,
    /// At least one component is a currency code.
    Currency,
    /// The first component is a caller-supplied qualifier.
    GenericQualifier,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 5] = [
        Capability::MultiLine,
        Capability::Amount,
        Capability::Date,
        Capability::Currency,
        Capability::GenericQualifier,
    ];

    /// Name as written in table JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::MultiLine => "multiLine",
            Capability::Amount => "amount",
            Capability::Date => "date",
            Capability::Currency => "currency",
            Capability::GenericQualifier => "genericQualifier",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── FieldSpec ──────────────────────────────────────────────────────────────

/// Immutable metadata for one field type (e.g. `"59F"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Field code including letter option (e.g., `"59F"`).
    pub name: String,
    /// Human-readable field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered component slots.
    pub components: Vec<ComponentSpec>,
    /// Distribution strategy.
    pub strategy: Strategy,
    /// Symbolic description of the grammar shape. Documentation only.
    #[serde(default)]
    pub parser_pattern: String,
    /// Validation pattern consumed by external validators.
    #[serde(default)]
    pub validator_pattern: String,
    /// The first component is a qualifier.
    #[serde(default)]
    pub generic: bool,
    /// Component 2 is a data source scheme (generic fields only).
    #[serde(default)]
    pub dss: bool,
    /// Explicitly declared capabilities, in addition to derived ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,

    /// Lowercased label / key / alias → 0-based index (lazily initialized).
    #[serde(skip)]
    label_index: OnceLock<HashMap<String, usize>>,
}

impl FieldSpec {
    /// Create a spec with empty patterns and no generic qualifier.
    pub fn new(name: impl Into<String>, components: Vec<ComponentSpec>, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            description: None,
            components,
            strategy,
            parser_pattern: String::new(),
            validator_pattern: String::new(),
            generic: false,
            dss: false,
            capabilities: Vec::new(),
            label_index: OnceLock::new(),
        }
    }

    /// Mark the field generic, optionally with a data source scheme component.
    pub fn with_generic(mut self, dss: bool) -> Self {
        self.generic = true;
        self.dss = dss;
        self
    }

    /// Set the symbolic parser and validator patterns.
    pub fn with_patterns(mut self, parser: impl Into<String>, validator: impl Into<String>) -> Self {
        self.parser_pattern = parser.into();
        self.validator_pattern = validator.into();
        self
    }

    /// Declare an additional capability.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Number of component slots.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Component metadata by 1-based index.
    pub fn component(&self, index: usize) -> Option<&ComponentSpec> {
        index.checked_sub(1).and_then(|i| self.components.get(i))
    }

    /// Component kind by 1-based index.
    pub fn kind(&self, index: usize) -> Option<ComponentKind> {
        self.component(index).map(|c| c.kind)
    }

    /// Whether the component at the 1-based index is optional.
    pub fn is_optional(&self, index: usize) -> Option<bool> {
        self.component(index).map(|c| c.optional)
    }

    /// Label of the component at the 1-based index.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.component(index).map(|c| c.label.as_str())
    }

    /// Structured-data key of the component at the 1-based index.
    pub fn json_key(&self, index: usize) -> Option<String> {
        self.component(index).map(ComponentSpec::json_key)
    }

    /// Resolve a label, camelCase key, or alias (case-insensitive) to its
    /// 1-based component index.
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.label_map()
            .get(&name.to_ascii_lowercase())
            .map(|&i| i + 1)
    }

    /// Returns the cached lookup map, building it on first access.
    fn label_map(&self) -> &HashMap<String, usize> {
        self.label_index.get_or_init(|| {
            let mut m = HashMap::new();
            for (i, c) in self.components.iter().enumerate() {
                m.entry(c.label.to_ascii_lowercase()).or_insert(i);
            }
            for (i, c) in self.components.iter().enumerate() {
                m.entry(c.json_key().to_ascii_lowercase()).or_insert(i);
                for alias in &c.aliases {
                    m.entry(alias.to_ascii_lowercase()).or_insert(i);
                    m.entry(json_key(alias).to_ascii_lowercase()).or_insert(i);
                }
            }
            m
        })
    }

    /// Numeric part of the field name (`"59"` for `"59F"`).
    pub fn number(&self) -> &str {
        let end = self
            .name
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.name.len());
        &self.name[..end]
    }

    /// Letter option of the field name (`Some('F')` for `"59F"`).
    pub fn letter_option(&self) -> Option<char> {
        let rest = &self.name[self.number().len()..];
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
            _ => None,
        }
    }

    /// Whether the field supports a capability, either declared or derived
    /// from its components and strategy.
    pub fn supports(&self, capability: Capability) -> bool {
        if self.capabilities.contains(&capability) {
            return true;
        }
        let any_kind = |pred: fn(&ComponentKind) -> bool| self.components.iter().any(|c| pred(&c.kind));
        match capability {
            Capability::MultiLine => matches!(
                self.strategy,
                Strategy::Lines { .. } | Strategy::Delimited { .. }
            ),
            Capability::Amount => any_kind(|k| matches!(k, ComponentKind::Decimal)),
            Capability::Date => any_kind(|k| matches!(k, ComponentKind::Date { .. })),
            Capability::Currency => any_kind(|k| matches!(k, ComponentKind::CurrencyCode)),
            Capability::GenericQualifier => self.generic,
        }
    }

    /// Check the table invariants for this spec.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.name.is_empty() {
            return Err(SpecError::EmptyName);
        }
        let count = self.components.len();
        if count == 0 {
            return Err(SpecError::NoComponents {
                field: self.name.clone(),
            });
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        for (i, c) in self.components.iter().enumerate() {
            let mut names = vec![c.label.to_ascii_lowercase(), c.json_key().to_ascii_lowercase()];
            for alias in &c.aliases {
                names.push(alias.to_ascii_lowercase());
                names.push(json_key(alias).to_ascii_lowercase());
            }
            names.dedup();
            for n in names {
                if let Some(&prev) = seen.get(&n)
                    && prev != i
                {
                    return Err(SpecError::DuplicateLabel {
                        field: self.name.clone(),
                        label: n,
                    });
                }
                seen.insert(n, i);
            }
        }

        let invalid = |reason: String| SpecError::InvalidStrategy {
            field: self.name.clone(),
            reason,
        };

        match &self.strategy {
            Strategy::Lines { start, account, .. } => {
                if *start == 0 || *start > count {
                    return Err(invalid(format!("start {start} outside 1..={count}")));
                }
                if *account && *start < 2 {
                    return Err(invalid(
                        "account line requires lines to start at component 2 or later".into(),
                    ));
                }
            }
            Strategy::Delimited { head, .. } => {
                let paired = count - usize::from(*head);
                if paired == 0 || paired % 2 != 0 {
                    return Err(invalid(format!(
                        "{paired} paired components; pairs need an even, non-zero count"
                    )));
                }
            }
            Strategy::FixedWidth { offsets, rest } => {
                if offsets.is_empty() || offsets[0] == 0 {
                    return Err(invalid("offsets must be non-empty and start above 0".into()));
                }
                if offsets.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(invalid("offsets must be strictly increasing".into()));
                }
                let expected = offsets.len() + usize::from(*rest);
                if expected != count {
                    return Err(invalid(format!(
                        "layout describes {expected} components but {count} are declared"
                    )));
                }
            }
            Strategy::Custom { hook, .. } => {
                if hook.is_empty() {
                    return Err(invalid("custom strategy needs a hook name".into()));
                }
            }
        }

        if self.dss && (!self.generic || count < 3) {
            return Err(invalid(
                "a data source scheme needs a generic field with at least 3 components".into(),
            ));
        }
        Ok(())
    }
}

// ─── FieldTables ────────────────────────────────────────────────────────────

/// Top-level container for all known field specifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTables {
    /// Version of the field declarations (e.g. a standards release).
    pub schema_version: String,
    /// Table format version for compatibility checks.
    #[serde(default = "default_format_version")]
    pub format_version: String,
    /// All known field specifications.
    pub fields: Vec<Arc<FieldSpec>>,

    /// Cached map from field name → index into `fields` (lazily initialized).
    #[serde(skip)]
    by_name: OnceLock<HashMap<String, usize>>,
}

fn default_format_version() -> String {
    TABLE_FORMAT_VERSION.to_string()
}

impl FieldTables {
    /// Create tables from already-built specs.
    pub fn new(schema_version: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            schema_version: schema_version.into(),
            format_version: TABLE_FORMAT_VERSION.to_string(),
            fields: fields.into_iter().map(Arc::new).collect(),
            by_name: OnceLock::new(),
        }
    }

    /// Deserialize and validate tables from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, TablesError> {
        let tables: FieldTables = serde_json::from_str(json)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Validate every spec and check for duplicate names.
    pub fn validate(&self) -> Result<(), TablesError> {
        let major = |v: &str| v.split('.').next().map(str::to_owned);
        if major(&self.format_version) != major(TABLE_FORMAT_VERSION) {
            return Err(TablesError::UnsupportedFormat {
                found: self.format_version.clone(),
                expected: TABLE_FORMAT_VERSION,
            });
        }
        let mut names = std::collections::HashSet::new();
        for spec in &self.fields {
            spec.validate()?;
            if !names.insert(spec.name.as_str()) {
                return Err(TablesError::DuplicateField(spec.name.clone()));
            }
        }
        Ok(())
    }

    fn name_map(&self) -> &HashMap<String, usize> {
        self.by_name.get_or_init(|| {
            self.fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name.clone(), i))
                .collect()
        })
    }

    /// Look up a spec by field name (e.g. `"59F"`).
    pub fn spec(&self, name: &str) -> Option<&Arc<FieldSpec>> {
        self.name_map().get(name).map(|&i| &self.fields[i])
    }

    /// Names of all fields, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
