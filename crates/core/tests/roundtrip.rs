//! Round-trip law: `serialize(parse(raw)) == raw` for well-formed values,
//! checked on generated input for each field family.

mod common;

use common::{narrative_spec, parse};
use mt_fields_core::Field;
use mt_fields_core::grammar::tables::OverflowPolicy;
use proptest::prelude::*;

fn narrative_lines(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Z0-9 .,-]{0,35}", 1..=max)
}

fn amount() -> impl Strategy<Value = String> {
    ("[0-9]{1,12}", "[0-9]{0,2}").prop_map(|(int, frac)| format!("{int},{frac}"))
}

fn statement_line() -> impl Strategy<Value = String> {
    let marks = prop::sample::select(vec!["C", "D", "RC", "RD", "EC", "ED"]);
    (
        "[0-9]{6}",
        proptest::option::of("[0-9]{4}"),
        marks,
        proptest::option::of("[A-Z]"),
        amount(),
        "[NSF]",
        "[A-Z0-9]{3}",
        "[A-Z0-9]{1,16}",
        proptest::option::of("[A-Z0-9]{1,16}"),
        proptest::option::of("[A-Z0-9 ]{0,34}"),
    )
        .prop_map(
            |(date, entry, mark, funds, amount, tx, id, owner, inst, supp)| {
                let mut s = format!(
                    "{date}{}{mark}{}{amount}{tx}{id}{owner}",
                    entry.unwrap_or_default(),
                    funds.unwrap_or_default()
                );
                if let Some(inst) = inst {
                    s.push_str("//");
                    s.push_str(&inst);
                }
                if let Some(supp) = supp {
                    s.push_str("\r\n");
                    s.push_str(&supp);
                }
                s
            },
        )
}

fn party_lines() -> impl Strategy<Value = String> {
    (
        proptest::option::of("[A-Z0-9]{1,34}"),
        prop::collection::vec(("[1-8]", "[A-Z0-9 /]{0,33}"), 1..=4),
    )
        .prop_map(|(account, pairs)| {
            let mut lines: Vec<String> = Vec::new();
            if let Some(account) = account {
                lines.push(format!("/{account}"));
            }
            lines.extend(pairs.into_iter().map(|(n, v)| format!("{n}/{v}")));
            lines.join("\r\n")
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn narrative_roundtrips(lines in narrative_lines(6)) {
        let raw = lines.join("\r\n");
        let (field, _) = parse("72", &raw);
        prop_assert_eq!(field.serialize(), raw);
    }

    #[test]
    fn merged_overflow_roundtrips(lines in narrative_lines(12)) {
        let raw = lines.join("\r\n");
        let mut field = Field::new(narrative_spec(4, OverflowPolicy::MergeIntoLast)).expect("constructs");
        field.parse(&raw);
        prop_assert_eq!(field.serialize(), raw);
    }

    #[test]
    fn fixed_width_amount_roundtrips(
        date in "[0-9]{6}",
        currency in "[A-Z]{3}",
        amount in amount(),
    ) {
        let raw = format!("{date}{currency}{amount}");
        let (field, outcome) = parse("32A", &raw);
        prop_assert!(outcome.is_clean());
        prop_assert_eq!(field.serialize(), raw);
    }

    #[test]
    fn party_lines_roundtrip(raw in party_lines()) {
        let (field, outcome) = parse("59F", &raw);
        prop_assert!(outcome.diagnostics.iter().all(|d| d.id != "MT1103"));
        prop_assert_eq!(field.serialize(), raw);
    }

    #[test]
    fn statement_line_roundtrips(raw in statement_line()) {
        let (field, outcome) = parse("61", &raw);
        prop_assert!(outcome.is_clean(), "{:?}", outcome.diagnostics);
        prop_assert_eq!(field.serialize(), raw);
    }

    #[test]
    fn stacked_qualified_roundtrips(qual in "[A-Z]{4}", date in "[0-9]{8}", time in "[0-9]{6}") {
        let raw = format!(":{qual}//{date}{time}");
        let (field, outcome) = parse("98C", &raw);
        prop_assert!(outcome.is_clean());
        prop_assert_eq!(field.serialize(), raw);
    }

    #[test]
    fn qualified_with_optional_scheme_roundtrips(
        qual in "[A-Z]{4}",
        scheme in proptest::option::of("[A-Z0-9]{1,8}"),
        indicator in "[A-Z]{4}",
    ) {
        let raw = format!(":{qual}/{}/{indicator}", scheme.unwrap_or_default());
        let (field, outcome) = parse("22F", &raw);
        prop_assert!(outcome.is_clean());
        prop_assert_eq!(field.serialize(), raw);
    }

    #[test]
    fn slashed_qualified_roundtrips(qual in "[A-Z]{4}", code in "[A-Z]{4}", amount in amount()) {
        let raw = format!(":{qual}//{code}/{amount}");
        let (field, _) = parse("36B", &raw);
        prop_assert_eq!(field.serialize(), raw);
    }

    #[test]
    fn serialization_is_idempotent(lines in narrative_lines(6)) {
        let (field, _) = parse("70", &lines.join("\r\n"));
        let once = field.serialize();
        prop_assert_eq!(field.serialize(), once.clone());
        let (again, _) = parse("70", &once);
        prop_assert_eq!(again.serialize(), once);
    }

    #[test]
    fn unset_tail_emits_no_trailing_breaks(k in 1usize..=6, text in "[A-Z]{1,35}") {
        let mut field = Field::new(common::spec("72")).expect("constructs");
        for i in 1..=k {
            field.set(i, text.as_str()).expect("in range");
        }
        let out = field.serialize();
        prop_assert!(!out.ends_with("\r\n"));
        prop_assert_eq!(out.matches("\r\n").count(), k - 1);
    }
}
