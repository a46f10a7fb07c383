//! Shared test helpers for `mt_fields_core` integration tests.

#![allow(unreachable_pub)]

use std::sync::{Arc, LazyLock};

use mt_fields_core::grammar::tables::{ComponentKind, ComponentSpec, OverflowPolicy, Strategy};
use mt_fields_core::{Diagnostic, Field, FieldSpec, FieldTables, ParseOutcome, builtin};

/// Built-in tables, validated once per test binary.
#[allow(dead_code)]
pub static TABLES: LazyLock<&'static FieldTables> = LazyLock::new(builtin::tables);

/// Look up a built-in spec, panicking on unknown names.
#[allow(dead_code)]
pub fn spec(name: &str) -> Arc<FieldSpec> {
    builtin::spec(name).unwrap_or_else(|| panic!("no built-in spec for field {name}"))
}

/// Parse `raw` as the named built-in field.
#[allow(dead_code)]
pub fn parse(name: &str, raw: &str) -> (Field, ParseOutcome) {
    let mut field = Field::new(spec(name)).expect("built-in field constructs");
    let outcome = field.parse(raw);
    (field, outcome)
}

/// Assert `serialize(parse(raw)) == raw` with a clean outcome.
#[allow(dead_code)]
pub fn assert_roundtrip(name: &str, raw: &str) {
    let (field, outcome) = parse(name, raw);
    assert!(
        outcome.is_clean(),
        "field {name}: unexpected diagnostics for {raw:?}: {:?}",
        outcome.diagnostics
    );
    assert_eq!(
        field.serialize(),
        raw,
        "\n--- Round-trip failed for field {name} ---\nComponents: {:?}\n",
        field.components()
    );
}

/// Diagnostic codes, in order.
#[allow(dead_code)]
pub fn diag_codes(outcome: &ParseOutcome) -> Vec<String> {
    outcome.diagnostics.iter().map(|d| d.id.to_string()).collect()
}

/// Find first diagnostic with the given code.
#[allow(dead_code)]
pub fn find_diag<'a>(issues: &'a [Diagnostic], code: &str) -> &'a Diagnostic {
    issues
        .iter()
        .find(|d| &*d.id == code)
        .unwrap_or_else(|| panic!("expected diagnostic {code}"))
}

/// Components as `Option<&str>`, for compact assertions.
#[allow(dead_code)]
pub fn values(field: &Field) -> Vec<Option<&str>> {
    field.components().iter().map(|c| c.as_deref()).collect()
}

/// An all-optional plain-text field with the given strategy.
#[allow(dead_code)]
pub fn plain_spec(name: &str, count: usize, strategy: Strategy) -> Arc<FieldSpec> {
    let components = (1..=count)
        .map(|i| ComponentSpec::new(format!("Component {i}"), ComponentKind::PlainText).optional())
        .collect();
    let spec = FieldSpec::new(name, components, strategy);
    spec.validate().expect("test spec is valid");
    Arc::new(spec)
}

/// An all-optional narrative field of `count` lines.
#[allow(dead_code)]
pub fn narrative_spec(count: usize, overflow: OverflowPolicy) -> Arc<FieldSpec> {
    plain_spec(
        "NARR",
        count,
        Strategy::Lines {
            start: 1,
            account: false,
            overflow,
        },
    )
}
