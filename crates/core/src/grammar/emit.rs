//! Serializer: rebuilds wire text from component slots.
//!
//! Each default strategy has an inverse here; custom strategies delegate to
//! their hook. Unset trailing components never produce delimiters or line
//! breaks, and fixed-width components are emitted exactly as stored (no
//! re-padding).

use super::{
    hooks::ParseHook,
    tables::{FieldSpec, Strategy},
    tokens::CRLF,
};

// ── Public API ──────────────────────────────────────────────────────────

/// Serialize components according to the spec's strategy.
///
/// `Custom` strategies need their `hook`; without one the present
/// components are concatenated.
pub fn serialize_components(
    spec: &FieldSpec,
    hook: Option<&dyn ParseHook>,
    components: &[Option<String>],
) -> String {
    match &spec.strategy {
        Strategy::Lines { account, .. } => emit_lines(components, *account),
        Strategy::Delimited { delimiter, head } => emit_delimited(components, *delimiter, *head),
        Strategy::FixedWidth { .. } => concat_present(components),
        Strategy::Custom { .. } => match hook {
            Some(h) => h.serialize(spec, components),
            None => concat_present(components),
        },
    }
}

/// Concatenate the present components.
pub fn concat_present(components: &[Option<String>]) -> String {
    components.iter().flatten().map(String::as_str).collect()
}

/// Join components up to the last present one with `sep`. Interior unset
/// components become empty strings so positions are kept.
pub fn join_present(components: &[Option<String>], sep: &str) -> String {
    let Some(last) = components.iter().rposition(Option::is_some) else {
        return String::new();
    };
    components[..=last]
        .iter()
        .map(|c| c.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(sep)
}

// ── Strategy inverses ───────────────────────────────────────────────────

/// One line per present component; interior unset components are skipped.
fn emit_lines(components: &[Option<String>], account: bool) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(components.len());
    for (i, c) in components.iter().enumerate() {
        let Some(v) = c else { continue };
        if account && i == 0 {
            lines.push(format!("/{v}"));
        } else {
            lines.push(v.clone());
        }
    }
    lines.join(CRLF)
}

/// `/head`, then one `code/value` line per pair with either side present.
fn emit_delimited(components: &[Option<String>], delim: char, head: bool) -> String {
    let mut lines: Vec<String> = Vec::new();
    let pairs = if head {
        if let Some(Some(v)) = components.first() {
            lines.push(format!("{delim}{v}"));
        }
        components.get(1..).unwrap_or_default()
    } else {
        components
    };

    for pair in pairs.chunks(2) {
        let code = pair.first().and_then(|c| c.as_deref());
        let value = pair.get(1).and_then(|c| c.as_deref());
        match (code, value) {
            (None, None) => {}
            (code, Some(value)) => lines.push(format!("{}{delim}{value}", code.unwrap_or_default())),
            (Some(code), None) if pair.len() == 2 => lines.push(format!("{code}{delim}")),
            (Some(code), None) => lines.push(code.to_string()),
        }
    }
    lines.join(CRLF)
}
