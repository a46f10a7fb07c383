//! Custom parse hooks: statement line, generic qualifier fields, and
//! caller-registered hooks.

mod common;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use common::{assert_roundtrip, diag_codes, parse, values};
use mt_fields_core::grammar::emit::concat_present;
use mt_fields_core::grammar::scan::MarkerThenCode;
use mt_fields_core::grammar::tables::ValueLayout;
use mt_fields_core::{
    ComponentKind, ComponentSpec, Field, FieldError, FieldSpec, FnHook, HookRegistry, ParseContext,
    Strategy, codes,
};
use rust_decimal::Decimal;

// ── Ambiguous marker ────────────────────────────────────────────────────

fn marker_registry() -> HookRegistry {
    HookRegistry::new().with(
        "marker",
        FnHook::new(
            |raw: &str, ctx: &mut ParseContext<'_>| {
                let m = MarkerThenCode::scan(raw);
                ctx.set_nonempty(1, m.marker);
                ctx.set_nonempty(2, &raw[m.marker_end..]);
            },
            |_spec: &FieldSpec, components: &[Option<String>]| concat_present(components),
        ),
    )
}

fn marker_spec() -> Arc<FieldSpec> {
    Arc::new(FieldSpec::new(
        "MRK",
        vec![
            ComponentSpec::new("Marker", ComponentKind::PlainText),
            ComponentSpec::new("Remainder", ComponentKind::PlainText),
        ],
        Strategy::Custom {
            hook: "marker".into(),
            layout: ValueLayout::Single,
        },
    ))
}

#[test]
fn r_prefix_selects_two_character_marker() {
    let mut field = Field::with_hooks(marker_spec(), &marker_registry()).expect("constructs");
    let outcome = field.parse("RC123,45");
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(field.get(1), Ok(Some("RC")));
    assert_eq!(field.get(2), Ok(Some("123,45")));
    assert_eq!(field.serialize(), "RC123,45");
}

#[test]
fn other_prefix_selects_one_character_marker() {
    let mut field = Field::with_hooks(marker_spec(), &marker_registry()).expect("constructs");
    field.parse("D100,");
    assert_eq!(field.get(1), Ok(Some("D")));
    assert_eq!(field.get(2), Ok(Some("100,")));
    assert_eq!(field.serialize(), "D100,");
}

#[test]
fn unknown_hook_is_a_construction_error() {
    assert!(matches!(
        Field::new(marker_spec()),
        Err(FieldError::UnknownHook { ref hook, .. }) if hook == "marker"
    ));
}

// ── Statement line (61) ─────────────────────────────────────────────────

#[test]
fn statement_line_full() {
    let raw = "2310151016C1000,NTRFNONREF//8951234\r\nSUPPLEMENTARY INFO";
    let (field, outcome) = parse("61", raw);
    assert!(outcome.is_clean(), "{:?}", outcome.diagnostics);
    assert_eq!(
        values(&field),
        vec![
            Some("231015"),
            Some("1016"),
            Some("C"),
            None,
            Some("1000,"),
            Some("N"),
            Some("TRF"),
            Some("NONREF"),
            Some("8951234"),
            Some("SUPPLEMENTARY INFO"),
        ]
    );
    assert_eq!(field.serialize(), raw);
}

#[test]
fn statement_line_reversal_marker_takes_two_characters() {
    let (field, _) = parse("61", "231015RC500,00S202REF123");
    assert_eq!(field.get(3), Ok(Some("RC")));
    assert_eq!(field.get(4), Ok(None));
    assert_eq!(field.get(5), Ok(Some("500,00")));
    assert_eq!(field.get(6), Ok(Some("S")));
    assert_eq!(field.get(7), Ok(Some("202")));
    assert_eq!(field.get(8), Ok(Some("REF123")));
}

#[test]
fn reversal_prefix_before_a_digit_stays_one_character() {
    let (field, _) = parse("61", "231015R1000,NTRFREF");
    assert_eq!(field.get(3), Ok(Some("R")));
    assert_eq!(field.get(4), Ok(None));
    assert_eq!(field.get(5), Ok(Some("1000,")));
    assert_eq!(field.get(6), Ok(Some("N")));
    assert_eq!(field.get(7), Ok(Some("TRF")));
    assert_eq!(field.serialize(), "231015R1000,NTRFREF");
}

#[test]
fn statement_line_debit_with_funds_code() {
    let (field, outcome) = parse("61", "231015DR2500,NCHGNONREF");
    assert!(outcome.is_clean());
    assert_eq!(field.get(3), Ok(Some("D")));
    assert_eq!(field.get(4), Ok(Some("R")));
    assert_eq!(field.get(5), Ok(Some("2500,")));
}

#[test]
fn statement_line_roundtrips() {
    for raw in [
        "231015C1000,NTRFNONREF",
        "2310151016D25,5NCHGREF//INST",
        "231015ECR1,FMSCOWNER\r\nDETAILS",
        "231015RD0,S999X//Y\r\n",
    ] {
        assert_roundtrip("61", raw);
    }
}

#[test]
fn statement_line_typed_values() {
    let (field, _) = parse("61", "2310151016C1000,25NTRFNONREF");
    assert_eq!(field.get_date(1), Ok(NaiveDate::from_ymd_opt(2023, 10, 15)));
    assert_eq!(field.get_date(2), Ok(NaiveDate::from_ymd_opt(2023, 10, 16)));
    assert_eq!(field.get_decimal(5), Ok(Some(Decimal::new(100025, 2))));
    assert_eq!(field.amounts(), vec![Decimal::new(100025, 2)]);
    assert_eq!(field.dates().len(), 2);
}

#[test]
fn statement_line_missing_parts_are_reported() {
    let (field, outcome) = parse("61", "231015");
    assert_eq!(field.get(1), Ok(Some("231015")));
    let codes_found = diag_codes(&outcome);
    assert!(codes_found.iter().all(|c| c == codes::PARSE_MISSING_MANDATORY));
    // mark, amount, transaction type, identification code, owner reference
    assert_eq!(codes_found.len(), 5);
}

#[test]
fn statement_line_extra_lines_are_dropped() {
    let (field, outcome) = parse("61", "231015C1,NTRFREF\r\nSUPP\r\nEXTRA");
    assert_eq!(field.get(10), Ok(Some("SUPP")));
    assert_eq!(diag_codes(&outcome), vec![codes::PARSE_EXCESS_CONTENT]);
}

// ── Generic qualifier fields ────────────────────────────────────────────

#[test]
fn qualified_date() {
    let (field, outcome) = parse("98A", ":TRAD//20231015");
    assert!(outcome.is_clean());
    assert!(field.is_generic());
    assert_eq!(field.qualifier(), Some("TRAD"));
    assert_eq!(field.dss(), None);
    assert_eq!(field.get_date(2), Ok(NaiveDate::from_ymd_opt(2023, 10, 15)));
    assert_eq!(field.serialize(), ":TRAD//20231015");
}

#[test]
fn qualified_stacked_date_time() {
    let (field, outcome) = parse("98C", ":PREP//20231015103000");
    assert!(outcome.is_clean());
    assert_eq!(field.get(2), Ok(Some("20231015")));
    assert_eq!(field.get(3), Ok(Some("103000")));
    assert_eq!(field.get_time(3), Ok(NaiveTime::from_hms_opt(10, 30, 0)));
    assert_eq!(field.serialize(), ":PREP//20231015103000");
}

#[test]
fn qualified_stacked_trailing_content_is_reported() {
    let (_, outcome) = parse("98C", ":PREP//20231015103000X");
    assert_eq!(diag_codes(&outcome), vec![codes::PARSE_UNCONSUMED_CONTENT]);
    let span = outcome.diagnostics[0].span.expect("span");
    assert_eq!((span.start, span.end), (21, 22));
}

#[test]
fn qualified_with_data_source_scheme() {
    let (field, _) = parse("22F", ":SFRE/ABCD1234/DAIL");
    assert_eq!(field.qualifier(), Some("SFRE"));
    assert_eq!(field.dss(), Some("ABCD1234"));
    assert_eq!(field.get(3), Ok(Some("DAIL")));
    assert_roundtrip("22F", ":SFRE/ABCD1234/DAIL");
    assert_roundtrip("22F", ":SFRE//DAIL");
    assert_roundtrip("95R", ":DEAG/CRST/123456");
}

#[test]
fn qualified_slashed_value() {
    let (field, outcome) = parse("36B", ":SETT//FAMT/1000,");
    assert!(outcome.is_clean());
    assert_eq!(field.get(2), Ok(Some("FAMT")));
    assert_eq!(field.get(3), Ok(Some("1000,")));
    assert_eq!(field.amounts(), vec![Decimal::new(1000, 0)]);
    assert_eq!(field.serialize(), ":SETT//FAMT/1000,");
}

#[test]
fn qualified_multiline_narrative() {
    assert_roundtrip("70E", ":ADTX//LINE ONE\r\nLINE TWO");
    assert_roundtrip("97A", ":SAFE//1234567890");
    assert_roundtrip("95P", ":BUYR//ABCDBEBBXXX");
}

#[test]
fn qualified_without_colon_is_tolerated() {
    let (field, outcome) = parse("98A", "TRAD//20231015");
    assert_eq!(diag_codes(&outcome), vec![codes::PARSE_UNEXPECTED_TOKEN]);
    assert_eq!(field.qualifier(), Some("TRAD"));
    assert_eq!(field.serialize(), ":TRAD//20231015");
}

#[test]
fn qualified_scheme_on_field_without_one() {
    let (field, outcome) = parse("97A", ":SAFE/XYZ/123");
    assert_eq!(diag_codes(&outcome), vec![codes::PARSE_UNEXPECTED_TOKEN]);
    let span = outcome.diagnostics[0].span.expect("span");
    assert_eq!((span.start, span.end), (6, 9));
    assert_eq!(field.get(2), Ok(Some("123")));
}

#[test]
fn qualified_missing_value_separator() {
    let (field, outcome) = parse("97A", ":SAFE");
    assert_eq!(field.qualifier(), Some("SAFE"));
    assert_eq!(
        diag_codes(&outcome),
        vec![codes::PARSE_UNEXPECTED_TOKEN, codes::PARSE_MISSING_MANDATORY]
    );
}
