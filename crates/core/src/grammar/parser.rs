//! Component distribution: the three default strategies and the dispatch
//! to custom hooks.
//!
//! Parsing is lenient. Nothing here fails or panics on malformed content;
//! whatever could not be placed is reported as a [`Diagnostic`] with a span
//! into the raw value, and the affected components stay unset.

use super::{
    diag::{Diagnostic, Span, codes},
    hooks::ParseHook,
    tables::{FieldSpec, OverflowPolicy, Strategy},
    tokens::{self, CRLF},
};

/// Components and diagnostics produced by one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParseResult {
    /// One slot per declared component, in order.
    pub components: Vec<Option<String>>,
    /// Lenient-parse diagnostics (recoveries, dropped content).
    pub diagnostics: Vec<Diagnostic>,
}

// ─── Parse context ──────────────────────────────────────────────────────────

/// Write access to the component slots of one field during a parse.
///
/// Strategies and [`ParseHook`]s receive a context instead of the field
/// itself: it holds exactly `component_count` slots, so nothing can resize
/// them, and it collects diagnostics tagged with the field name.
pub struct ParseContext<'a> {
    spec: &'a FieldSpec,
    raw: &'a str,
    components: Vec<Option<String>>,
    diagnostics: Vec<Diagnostic>,
    /// First component left unset because the input ended early.
    truncated_from: Option<usize>,
}

impl<'a> ParseContext<'a> {
    /// A context with every slot unset.
    pub fn new(spec: &'a FieldSpec, raw: &'a str) -> Self {
        Self {
            spec,
            raw,
            components: vec![None; spec.component_count()],
            diagnostics: Vec::new(),
            truncated_from: None,
        }
    }

    /// The field specification being parsed against.
    pub fn spec(&self) -> &'a FieldSpec {
        self.spec
    }

    /// The raw value being parsed.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Number of component slots.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Current value of a component (1-based).
    pub fn get(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.components.get(i))
            .and_then(|c| c.as_deref())
    }

    /// Store a value at a 1-based index, as-is (an empty string is a present
    /// value). Returns `false` and stores nothing when out of range.
    pub fn set(&mut self, index: usize, value: impl Into<String>) -> bool {
        match index.checked_sub(1).and_then(|i| self.components.get_mut(i)) {
            Some(slot) => {
                *slot = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// Store a value only when it is non-empty.
    pub fn set_nonempty(&mut self, index: usize, value: &str) -> bool {
        !value.is_empty() && self.set(index, value)
    }

    /// Append `value` to a component, separated by a line break. An unset
    /// component simply takes `value`.
    pub fn append_line(&mut self, index: usize, value: &str) -> bool {
        match index.checked_sub(1).and_then(|i| self.components.get_mut(i)) {
            Some(Some(existing)) => {
                existing.push_str(CRLF);
                existing.push_str(value);
                true
            }
            Some(slot @ None) => {
                *slot = Some(value.to_string());
                true
            }
            None => false,
        }
    }

    /// Record that the input ended before component `index`; the missing
    /// components from there on are not reported individually.
    pub fn mark_truncated(&mut self, index: usize) {
        self.truncated_from = Some(self.truncated_from.map_or(index, |t| t.min(index)));
    }

    /// Record a diagnostic with the code's default severity, tagged with the
    /// field name.
    pub fn report(&mut self, id: &'static str, message: impl Into<String>, span: Option<Span>) {
        let d = Diagnostic::with_default_severity(id, message, span)
            .with_context(ctx!("field" => self.spec.name.as_str()));
        self.diagnostics.push(d);
    }

    /// Record a diagnostic about a specific component.
    pub fn report_component(
        &mut self,
        id: &'static str,
        index: usize,
        message: impl Into<String>,
        span: Option<Span>,
    ) {
        let label = self.spec.label(index).unwrap_or_default();
        let d = Diagnostic::with_default_severity(id, message, span).with_context(ctx!(
            "field" => self.spec.name.as_str(),
            "component" => index.to_string(),
            "label" => label,
        ));
        self.diagnostics.push(d);
    }

    /// Record an arbitrary diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Report mandatory components the parse left unset.
    fn check_mandatory(&mut self) {
        let limit = self.truncated_from.unwrap_or(usize::MAX);
        let missing: Vec<usize> = (1..=self.components.len())
            .filter(|&i| i < limit)
            .filter(|&i| self.components[i - 1].is_none())
            .filter(|&i| self.spec.is_optional(i) == Some(false))
            .collect();
        for i in missing {
            let label = self.spec.label(i).unwrap_or_default().to_string();
            self.report_component(
                codes::PARSE_MISSING_MANDATORY,
                i,
                format!("mandatory component {i} ({label}) is missing"),
                None,
            );
        }
    }

    fn finish(self) -> ParseResult {
        ParseResult {
            components: self.components,
            diagnostics: self.diagnostics,
        }
    }
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Distribute a raw value over the components of `spec`.
///
/// The strategy comes from the spec. `Custom` strategies run `hook`; when
/// none is supplied the whole value is reported as unconsumed. An empty raw
/// value yields all components unset and no diagnostics.
pub fn parse_components(spec: &FieldSpec, hook: Option<&dyn ParseHook>, raw: &str) -> ParseResult {
    let mut ctx = ParseContext::new(spec, raw);
    if raw.is_empty() {
        return ctx.finish();
    }

    match &spec.strategy {
        Strategy::Lines {
            start,
            account,
            overflow,
        } => distribute_lines(&mut ctx, *start, *account, *overflow),
        Strategy::Delimited { delimiter, head } => distribute_delimited(&mut ctx, *delimiter, *head),
        Strategy::FixedWidth { offsets, rest } => distribute_fixed(&mut ctx, offsets, *rest),
        Strategy::Custom { hook: name, .. } => match hook {
            Some(h) => h.parse(raw, &mut ctx),
            None => ctx.report(
                codes::PARSE_UNCONSUMED_CONTENT,
                format!("no parse hook '{name}' available; value left unparsed"),
                Some(Span::new(0, raw.len())),
            ),
        },
    }

    ctx.check_mandatory();
    ctx.finish()
}

// ─── Line distribution ──────────────────────────────────────────────────────

/// Line *i* goes to component `start + i`. With `account`, a first line
/// beginning with `/` fills component 1 instead (one slash stripped).
fn distribute_lines(ctx: &mut ParseContext<'_>, start: usize, account: bool, overflow: OverflowPolicy) {
    let raw = ctx.raw();
    let count = ctx.component_count();
    let lines = tokens::lines_indexed(raw);
    let mut rest = lines.as_slice();

    if account
        && let Some(&(_, first)) = rest.first()
        && first.starts_with('/')
    {
        ctx.set(1, tokens::drop_leading(first, '/', 1));
        rest = &rest[1..];
    }

    let mut index = start;
    for (n, &(offset, line)) in rest.iter().enumerate() {
        if index <= count {
            ctx.set(index, line);
            index += 1;
            continue;
        }
        match overflow {
            OverflowPolicy::MergeIntoLast => {
                ctx.append_line(count, line);
            }
            OverflowPolicy::Drop => {
                let dropped = rest.len() - n;
                ctx.report(
                    codes::PARSE_EXCESS_CONTENT,
                    format!(
                        "{dropped} line{} beyond component {count} dropped",
                        if dropped == 1 { "" } else { "s" }
                    ),
                    Some(Span::new(offset, raw.len())),
                );
                break;
            }
        }
    }
}

// ─── Delimiter distribution ─────────────────────────────────────────────────

/// Each line is a `code<delim>value` pair filling two consecutive
/// components. With `head`, a first line starting with the delimiter fills
/// component 1 and pairs start at component 2.
fn distribute_delimited(ctx: &mut ParseContext<'_>, delim: char, head: bool) {
    let count = ctx.component_count();
    let lines = tokens::lines_indexed(ctx.raw());
    let mut rest = lines.as_slice();
    let mut next = 1;

    if head {
        if let Some(&(_, first)) = rest.first()
            && first.starts_with(delim)
        {
            ctx.set(1, tokens::drop_leading(first, delim, 1));
            rest = &rest[1..];
        }
        next = 2;
    }

    for &(offset, line) in rest {
        let span = Some(Span::new(offset, offset + line.len()));
        match tokens::split_once_token(line, delim) {
            (code, Some(value)) if next < count => {
                ctx.set(next, code);
                ctx.set(next + 1, value);
                next += 2;
            }
            (_, Some(_)) => ctx.report(
                codes::PARSE_EXCESS_CONTENT,
                format!("pair beyond component {count} dropped"),
                span,
            ),
            (token, None) => ctx.report(
                codes::PARSE_UNPAIRED_TOKEN,
                format!("'{token}' has no '{delim}' delimiter; dropped"),
                span,
            ),
        }
    }
}

// ─── Fixed-width distribution ───────────────────────────────────────────────

/// Component *k* is `raw[offsets[k-2]..offsets[k-1]]` (implicit 0 start),
/// present only when the input reaches `offsets[k-1]`. With `rest`, the last
/// component takes whatever follows the last offset.
fn distribute_fixed(ctx: &mut ParseContext<'_>, offsets: &[usize], rest: bool) {
    let raw = ctx.raw();
    let len = raw.len();
    let count = ctx.component_count();
    let mut prev = 0usize;

    for (k, &end) in offsets.iter().enumerate() {
        let index = k + 1;
        if len < end {
            ctx.mark_truncated(index);
            ctx.report_component(
                codes::PARSE_TRUNCATED,
                index,
                format!("value ends at byte {len}; components {index}..={count} unset"),
                Some(Span::empty(len)),
            );
            if prev < len {
                ctx.report_component(
                    codes::PARSE_UNCONSUMED_CONTENT,
                    index,
                    format!(
                        "partial component {index} ignored ({} of {} bytes)",
                        len - prev,
                        end - prev
                    ),
                    Some(Span::new(prev, len)),
                );
            }
            return;
        }
        let end = tokens::next_char_boundary(raw, end).max(prev);
        ctx.set(index, &raw[prev..end]);
        prev = end;
    }

    let tail = &raw[prev..];
    if tail.is_empty() {
        return;
    }
    if rest {
        ctx.set(count, tail);
    } else {
        ctx.report(
            codes::PARSE_UNCONSUMED_CONTENT,
            format!("{} bytes beyond the last component ignored", tail.len()),
            Some(Span::new(prev, len)),
        );
    }
}
