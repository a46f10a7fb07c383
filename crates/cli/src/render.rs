//! Terminal rendering: ariadne diagnostics against the raw value, component
//! tables, and field declarations.
//!
//! Commands that print JSON build their documents themselves; everything here
//! is for the pretty format.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Fmt, IndexType, Label, Report, ReportKind, Source};
use mt_fields_core::grammar::tables::{OverflowPolicy, ValueLayout};
use mt_fields_core::{Field, FieldSpec, Strategy};
use mt_fields_diagnostics::{Diagnostic, Severity};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or detect from whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            // Default: pretty for interactive terminals, JSON for pipes
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: &Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warn => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Blue,
        _ => Color::White,
    }
}

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|c| !c.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

// ── Diagnostics ─────────────────────────────────────────────────────────

/// Render diagnostics to stderr.
///
/// Diagnostics with a span are drawn against the raw value (spans are byte
/// offsets); the rest are printed as standalone messages.
pub(crate) fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default()
        .with_compact(false)
        .with_index_type(IndexType::Byte);
    let mut cache = (filename, Source::from(source));

    for diag in diagnostics {
        if let Some(span) = &diag.span {
            // Clamp span to source length to avoid panics on truncated input.
            let start = span.start.min(source.len());
            let end = span.end.min(source.len()).max(start);

            let mut builder = Report::build(report_kind(&diag.severity), (filename, start..end))
                .with_code(diag.id.as_ref())
                .with_message(&diag.message)
                .with_config(config);

            // The label names the component when the parser knew it.
            let label_msg = context_note(diag).unwrap_or_else(|| diag.message.clone());
            builder = builder.with_label(
                Label::new((filename, start..end))
                    .with_message(label_msg)
                    .with_color(severity_color(&diag.severity)),
            );
            if let Some(explanation) = diag.explain() {
                builder = builder.with_help(explanation);
            }

            builder.finish().eprint(&mut cache).ok();
        } else {
            eprintln!("{}[{}]: {}", diag.severity, diag.id, diag.message);
            if let Some(note) = context_note(diag) {
                eprintln!("  = note: {note}");
            }
            if let Some(explanation) = diag.explain() {
                eprintln!("  = help: {explanation}");
            }
        }
    }
}

/// Print a coloured summary line showing error/warning/info counts.
///
/// Example: `2 errors, 1 warning, 1 info`
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    let (mut errors, mut warnings, mut infos) = (0usize, 0usize, 0usize);
    for d in diagnostics {
        match d.severity {
            Severity::Error => errors += 1,
            Severity::Warn => warnings += 1,
            Severity::Info => infos += 1,
            _ => warnings += 1,
        }
    }

    if errors + warnings + infos == 0 {
        return;
    }

    let mut parts = Vec::new();
    if errors > 0 {
        let s = if errors == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{errors} error{s}").fg(Color::Red)));
    }
    if warnings > 0 {
        let s = if warnings == 1 { "" } else { "s" };
        parts.push(format!(
            "{}",
            format!("{warnings} warning{s}").fg(Color::Yellow)
        ));
    }
    if infos > 0 {
        parts.push(format!("{}", format!("{infos} info").fg(Color::Blue)));
    }
    eprintln!("{}", parts.join(", "));
}

// ── Fields ──────────────────────────────────────────────────────────────

/// Print the component table of a parsed field to stdout.
///
/// Multi-line values are printed with continuation lines indented under the
/// value column.
pub(crate) fn print_components(field: &Field) {
    let spec = field.spec();
    let width = spec
        .components
        .iter()
        .map(|c| c.label.len())
        .max()
        .unwrap_or(0);

    println!("{}", format!(":{}:", field.name()).fg(Color::Cyan));
    for (i, (component, value)) in spec.components.iter().zip(field.components()).enumerate() {
        let Some(value) = value else {
            println!(
                "{:>3}  {:<width$}  {}",
                i + 1,
                component.label,
                "-".fg(Color::White)
            );
            continue;
        };
        let mut lines = value.split("\r\n");
        let first = lines.next().unwrap_or_default();
        println!("{:>3}  {:<width$}  {first}", i + 1, component.label);
        for line in lines {
            println!("{:>3}  {:<width$}  {line}", "", "");
        }
    }
}

/// Print a field declaration to stdout.
pub(crate) fn print_spec(spec: &FieldSpec, supports: &[&str]) {
    println!(
        "{} {}",
        spec.name.as_str().fg(Color::Cyan),
        spec.description.as_deref().unwrap_or_default()
    );
    println!("strategy: {}", strategy_summary(&spec.strategy));
    if !spec.parser_pattern.is_empty() {
        println!("pattern:  {}", spec.parser_pattern);
    }
    if !supports.is_empty() {
        println!("supports: {}", supports.join(", "));
    }

    let width = spec
        .components
        .iter()
        .map(|c| c.label.len())
        .max()
        .unwrap_or(0);
    for (i, c) in spec.components.iter().enumerate() {
        let presence = if c.optional { "optional" } else { "mandatory" };
        let mut line = format!(
            "{:>3}  {:<width$}  {:<16} {:<9} {}",
            i + 1,
            c.label,
            c.kind.to_string(),
            presence,
            c.json_key()
        );
        if !c.aliases.is_empty() {
            line.push_str(&format!("  (aka {})", c.aliases.join(", ")));
        }
        println!("{}", line.trim_end());
    }
}

/// One-line description of a distribution strategy.
pub(crate) fn strategy_summary(strategy: &Strategy) -> String {
    match strategy {
        Strategy::Lines {
            start,
            account,
            overflow,
        } => {
            let mut s = format!("lines from {start}");
            if *account {
                s.push_str(", account");
            }
            if *overflow == OverflowPolicy::MergeIntoLast {
                s.push_str(", merge");
            }
            s
        }
        Strategy::Delimited { delimiter, head } => {
            if *head {
                format!("pairs on '{delimiter}', head")
            } else {
                format!("pairs on '{delimiter}'")
            }
        }
        Strategy::FixedWidth { offsets, rest } => {
            let cols: Vec<String> = offsets.iter().map(ToString::to_string).collect();
            let rest = if *rest { "+rest" } else { "" };
            format!("fixed [{}]{rest}", cols.join(","))
        }
        Strategy::Custom { hook, layout } => match layout {
            ValueLayout::Single => format!("hook {hook}"),
            ValueLayout::Slashed => format!("hook {hook}, slashed"),
            ValueLayout::Stacked => format!("hook {hook}, stacked"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_fields_core::builtin;

    #[test]
    fn strategy_summaries() {
        let summary = |name: &str| {
            let spec = builtin::spec(name).expect("built-in");
            strategy_summary(&spec.strategy)
        };
        assert_eq!(summary("59"), "lines from 2, account");
        assert_eq!(summary("79"), "lines from 1, merge");
        assert_eq!(summary("59F"), "pairs on '/', head");
        assert_eq!(summary("32A"), "fixed [6,9]+rest");
        assert_eq!(summary("61"), "hook statementLine");
        assert_eq!(summary("98C"), "hook qualified, stacked");
    }

    #[test]
    fn explicit_format_wins() {
        assert_eq!(Format::resolve_or_detect(Some("json")), Format::Json);
        assert_eq!(Format::resolve_or_detect(Some("pretty")), Format::Pretty);
    }
}
