mod render;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mt_fields_core::{Capability, Field, FieldTables, TablesExt, builtin};
use mt_fields_diagnostics::{self as diag, Diagnostic, Severity, Span, codes};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::render::{
    Format, print_components, print_spec, print_summary, render_diagnostics, strategy_summary,
};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "mtf",
    version,
    about = "SWIFT MT field toolkit: parse, round-trip check, and describe field values"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Path to a field table JSON file. When omitted, the built-in table is
    /// used.
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    /// Log table resolution and per-command activity to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Keep line endings as read instead of normalizing LF to CRLF.
    #[arg(long, global = true)]
    keep_line_endings: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse a raw field value and print its components.
    Parse {
        /// Field name including letter option (e.g. 32A).
        tag: String,
        /// File holding the raw value; reads stdin when omitted or "-".
        file: Option<String>,
    },

    /// Parse a raw value, serialize it again, and compare (exit 1 on mismatch).
    Roundtrip {
        /// Field name including letter option (e.g. 59F).
        tag: String,
        /// File holding the raw value; reads stdin when omitted or "-".
        file: Option<String>,
    },

    /// Show the declaration of a field: components, strategy, capabilities.
    Describe {
        /// Field name including letter option.
        tag: String,
    },

    /// List every field in the table.
    List,

    /// Explain a diagnostic ID (e.g. MT1101).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let format = Format::resolve_or_detect(cli.output.as_deref());

    let owned = load_tables(cli.tables.as_deref())?;
    let tables = match &owned {
        Some(t) => t,
        None => builtin::tables(),
    };
    let input = InputOptions {
        keep_line_endings: cli.keep_line_endings,
    };

    match cli.cmd {
        Cmd::Parse { tag, file } => cmd_parse(tables, &tag, file.as_deref(), input, format)?,
        Cmd::Roundtrip { tag, file } => {
            cmd_roundtrip(tables, &tag, file.as_deref(), input, format)?
        }
        Cmd::Describe { tag } => cmd_describe(tables, &tag, format)?,
        Cmd::List => cmd_list(tables, format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("mtf=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_parse(
    tables: &FieldTables,
    tag: &str,
    file: Option<&str>,
    input: InputOptions,
    format: Format,
) -> Result<()> {
    let raw = read_raw(file, input)?;
    let mut field = tables.field(tag)?;
    let outcome = field.parse(&raw);
    debug!(
        field = tag,
        bytes = raw.len(),
        diagnostics = outcome.diagnostics.len(),
        "parsed"
    );

    match format {
        Format::Json => {
            // Single valid JSON object to stdout.
            let out = serde_json::json!({
                "field": field.to_json(),
                "components": component_rows(&field),
                "diagnostics": outcome.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Components to stdout, diagnostics to stderr.
            print_components(&field);
            render_diagnostics(&raw, display_name(file), &outcome.diagnostics);
            print_summary(&outcome.diagnostics);
        }
    }

    exit_on_errors(&outcome.diagnostics);
    Ok(())
}

fn cmd_roundtrip(
    tables: &FieldTables,
    tag: &str,
    file: Option<&str>,
    input: InputOptions,
    format: Format,
) -> Result<()> {
    let raw = read_raw(file, input)?;
    let mut field = tables.field(tag)?;
    let mut diagnostics = field.parse(&raw).diagnostics;
    let serialized = field.serialize();
    let ok = serialized == raw;
    if !ok {
        diagnostics.push(mismatch_diagnostic(tag, &raw, &serialized));
    }
    info!(field = tag, ok, "round-trip");

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": ok,
                "input": raw,
                "output": serialized,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics(&raw, display_name(file), &diagnostics);
            print_summary(&diagnostics);
            if ok {
                eprintln!("round-trip ok");
            } else {
                println!("{serialized}");
            }
        }
    }

    exit_on_errors(&diagnostics);
    Ok(())
}

fn cmd_describe(tables: &FieldTables, tag: &str, format: Format) -> Result<()> {
    let spec = tables
        .spec(tag)
        .with_context(|| format!("unknown field {tag}"))?;
    let supports: Vec<&str> = Capability::ALL
        .into_iter()
        .filter(|&c| spec.supports(c))
        .map(Capability::as_str)
        .collect();

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "spec": spec,
                "supports": supports,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => print_spec(spec, &supports),
    }
    Ok(())
}

fn cmd_list(tables: &FieldTables, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let fields: Vec<_> = tables
                .fields
                .iter()
                .map(|spec| {
                    serde_json::json!({
                        "name": spec.name,
                        "description": spec.description,
                        "components": spec.component_count(),
                        "strategy": strategy_summary(&spec.strategy),
                    })
                })
                .collect();
            let out = serde_json::json!({
                "schemaVersion": tables.schema_version,
                "fields": fields,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            for spec in &tables.fields {
                println!(
                    "{:<5} {:>2}  {:<22} {}",
                    spec.name,
                    spec.component_count(),
                    strategy_summary(&spec.strategy),
                    spec.description.as_deref().unwrap_or_default()
                );
            }
            eprintln!("{} fields ({})", tables.len(), tables.schema_version);
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let text = diag::explain(id);
            let out = serde_json::json!({
                "id": id,
                "explanation": text,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Explanation is the expected output, so it goes to stdout.
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{}: (no explanation available)", id);
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct InputOptions {
    keep_line_endings: bool,
}

/// Load tables from an explicit path; `None` means use the built-in table.
fn load_tables(path: Option<&Path>) -> Result<Option<FieldTables>> {
    let Some(path) = path else {
        debug!("using built-in field table");
        return Ok(None);
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read tables file '{}'", path.display()))?;
    let tables = FieldTables::from_json_str(&json)
        .with_context(|| format!("failed to load tables file '{}'", path.display()))?;
    info!(
        path = %path.display(),
        fields = tables.len(),
        schema = %tables.schema_version,
        "loaded field table"
    );
    Ok(Some(tables))
}

/// Read a raw value from `file` or stdin and prepare it for parsing.
fn read_raw(file: Option<&str>, options: InputOptions) -> Result<String> {
    let text = match file.filter(|&f| f != "-") {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read '{path}'"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    Ok(prepare_raw(&text, options))
}

/// Drop one trailing line terminator and, unless asked not to, normalize
/// line endings to CRLF.
fn prepare_raw(text: &str, options: InputOptions) -> String {
    let text = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text);
    if options.keep_line_endings {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

fn display_name(file: Option<&str>) -> &str {
    file.filter(|&f| f != "-").unwrap_or("<stdin>")
}

/// Build the MT1201 diagnostic spanning from the first differing byte.
fn mismatch_diagnostic(tag: &str, raw: &str, serialized: &str) -> Diagnostic {
    let common = raw
        .bytes()
        .zip(serialized.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    let start = (0..=common)
        .rev()
        .find(|&i| raw.is_char_boundary(i))
        .unwrap_or(0);
    Diagnostic::with_default_severity(
        codes::ROUNDTRIP_MISMATCH,
        format!("field {tag}: serialized value differs from input at byte {start}"),
        Some(Span::new(start, raw.len())),
    )
}

/// Component rows for JSON output, unset components included.
fn component_rows(field: &Field) -> Vec<serde_json::Value> {
    field
        .spec()
        .components
        .iter()
        .zip(field.components())
        .enumerate()
        .map(|(i, (spec, value))| {
            serde_json::json!({
                "index": i + 1,
                "label": spec.label,
                "key": spec.json_key(),
                "kind": spec.kind.to_string(),
                "optional": spec.optional,
                "value": value,
            })
        })
        .collect()
}

/// Exit with code 1 if any diagnostic is an error.
/// Warnings and info do not cause a non-zero exit.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error))
    {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NORMALIZE: InputOptions = InputOptions {
        keep_line_endings: false,
    };
    const KEEP: InputOptions = InputOptions {
        keep_line_endings: true,
    };

    #[test]
    fn prepare_raw_strips_one_terminator() {
        assert_eq!(prepare_raw("A\n", NORMALIZE), "A");
        assert_eq!(prepare_raw("A\r\n", NORMALIZE), "A");
        assert_eq!(prepare_raw("A\n\n", NORMALIZE), "A\r\n");
        assert_eq!(prepare_raw("A", NORMALIZE), "A");
    }

    #[test]
    fn prepare_raw_normalizes_line_endings() {
        assert_eq!(prepare_raw("A\nB\r\nC\n", NORMALIZE), "A\r\nB\r\nC");
        assert_eq!(prepare_raw("A\nB\n", KEEP), "A\nB");
    }

    #[test]
    fn mismatch_starts_at_first_difference() {
        let d = mismatch_diagnostic("70", "AB\r\nCD\r\nEF", "AB\r\nCD");
        assert_eq!(d.id, codes::ROUNDTRIP_MISMATCH);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.span, Some(Span::new(6, 10)));
    }
}
