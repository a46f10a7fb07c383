//! Custom parse hooks: the escape hatch for grammars the default
//! strategies cannot express positionally.
//!
//! A field whose strategy is `Custom { hook, .. }` is parsed and serialized
//! by the [`ParseHook`] registered under that name in a [`HookRegistry`].
//! Two hooks are built in:
//!
//! - [`STATEMENT_LINE`] (field 61), built on the scanners in [`super::scan`];
//! - [`QUALIFIED`], the generic `:QUAL/[DSS]/value` fields.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    diag::{Span, codes},
    emit,
    parser::ParseContext,
    scan::{MarkerThenCode, SlashSplit, StackedNumeric},
    tables::{ComponentKind, FieldSpec, Strategy, ValueLayout},
    tokens::{self, CRLF},
};
use crate::error::FieldError;

/// Registry name of the statement line hook.
pub const STATEMENT_LINE: &str = "statementLine";
/// Registry name of the generic qualifier hook.
pub const QUALIFIED: &str = "qualified";

/// A hand-written grammar for one field family.
///
/// `parse` gets exclusive write access to the component slots through the
/// [`ParseContext`]; `serialize` must be its inverse so that well-formed
/// values round-trip.
pub trait ParseHook: Send + Sync {
    /// Distribute `raw` over the components.
    fn parse(&self, raw: &str, ctx: &mut ParseContext<'_>);

    /// Rebuild wire text from the components.
    fn serialize(&self, spec: &FieldSpec, components: &[Option<String>]) -> String;
}

// ─── Closure hooks ──────────────────────────────────────────────────────────

/// A [`ParseHook`] built from two closures.
pub struct FnHook<P, S> {
    parse: P,
    serialize: S,
}

impl<P, S> FnHook<P, S>
where
    P: Fn(&str, &mut ParseContext<'_>) + Send + Sync,
    S: Fn(&FieldSpec, &[Option<String>]) -> String + Send + Sync,
{
    /// Wrap a parse closure and its inverse.
    pub fn new(parse: P, serialize: S) -> Self {
        Self { parse, serialize }
    }
}

impl<P, S> ParseHook for FnHook<P, S>
where
    P: Fn(&str, &mut ParseContext<'_>) + Send + Sync,
    S: Fn(&FieldSpec, &[Option<String>]) -> String + Send + Sync,
{
    fn parse(&self, raw: &str, ctx: &mut ParseContext<'_>) {
        (self.parse)(raw, ctx)
    }

    fn serialize(&self, spec: &FieldSpec, components: &[Option<String>]) -> String {
        (self.serialize)(spec, components)
    }
}

// ─── Registry ───────────────────────────────────────────────────────────────

/// Named parse hooks. Cloning shares the hooks.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Arc<dyn ParseHook>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

impl HookRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in hooks.
    pub fn builtin() -> Self {
        let mut r = Self::new();
        r.register(STATEMENT_LINE, StatementLine);
        r.register(QUALIFIED, Qualified);
        r
    }

    /// Register a hook, returning the one it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        hook: impl ParseHook + 'static,
    ) -> Option<Arc<dyn ParseHook>> {
        self.hooks.insert(name.into(), Arc::new(hook))
    }

    /// Register a hook (builder pattern).
    pub fn with(mut self, name: impl Into<String>, hook: impl ParseHook + 'static) -> Self {
        self.register(name, hook);
        self
    }

    /// Look up a hook by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ParseHook>> {
        self.hooks.get(name).map(Arc::clone)
    }

    /// Whether a hook is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The hook a spec needs, if its strategy is custom.
    pub fn resolve(&self, spec: &FieldSpec) -> Result<Option<Arc<dyn ParseHook>>, FieldError> {
        match &spec.strategy {
            Strategy::Custom { hook, .. } => match self.get(hook) {
                Some(h) => Ok(Some(h)),
                None => Err(FieldError::UnknownHook {
                    field: spec.name.clone(),
                    hook: hook.clone(),
                }),
            },
            _ => Ok(None),
        }
    }
}

// ─── Statement line (61) ────────────────────────────────────────────────────

/// Field 61:
/// `ValueDate(6!n) [EntryDate(4!n)] Mark(2a) [FundsCode(1!a)] Amount(15d)
/// TxType(1!a) IdCode(3!c) OwnerRef(16x) [//InstitutionRef(16x)]
/// [CRLF Supplementary(34x)]`.
///
/// Components, in order: value date, entry date, mark, funds code, amount,
/// transaction type, identification code, owner reference, institution
/// reference, supplementary details.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementLine;

impl ParseHook for StatementLine {
    fn parse(&self, raw: &str, ctx: &mut ParseContext<'_>) {
        let lines = tokens::lines_indexed(raw);
        let Some(&(_, line)) = lines.first() else {
            return;
        };

        let dates = StackedNumeric::scan(line, &[6, 4]);
        for (i, group) in dates.groups.iter().enumerate() {
            ctx.set(1 + i, *group);
        }
        let mut pos = dates.end;

        let mark = MarkerThenCode::scan(&line[pos..]);
        ctx.set_nonempty(3, mark.marker);
        ctx.set_nonempty(4, mark.code);
        pos += mark.end;

        let amount_len = line[pos..]
            .bytes()
            .take_while(|b| b.is_ascii_digit() || *b == b',')
            .count();
        ctx.set_nonempty(5, &line[pos..pos + amount_len]);
        pos += amount_len;

        let (tx_type, rest) = tokens::take_chars(&line[pos..], 1);
        ctx.set_nonempty(6, tx_type);
        let (id_code, rest) = tokens::take_chars(rest, 3);
        ctx.set_nonempty(7, id_code);

        let (owner, institution) = SlashSplit::double(rest);
        ctx.set_nonempty(8, owner);
        if let Some(institution) = institution {
            ctx.set(9, institution);
        }

        if let Some(&(_, supplementary)) = lines.get(1) {
            ctx.set(10, supplementary);
        }
        if let Some(&(offset, _)) = lines.get(2) {
            ctx.report(
                codes::PARSE_EXCESS_CONTENT,
                format!("{} lines after the supplementary details dropped", lines.len() - 2),
                Some(Span::new(offset, raw.len())),
            );
        }
    }

    fn serialize(&self, _spec: &FieldSpec, components: &[Option<String>]) -> String {
        let part = |i: usize| components.get(i).and_then(|c| c.as_deref());
        let mut out: String = (0..8).filter_map(part).collect();
        if let Some(institution) = part(8) {
            out.push_str("//");
            out.push_str(institution);
        }
        if let Some(supplementary) = part(9) {
            out.push_str(CRLF);
            out.push_str(supplementary);
        }
        out
    }
}

// ─── Generic qualifier fields ───────────────────────────────────────────────

/// Generic fields: `:Qualifier/[DSS]/value`.
///
/// Component 1 is the qualifier; when the spec declares a data source
/// scheme, component 2 holds it. The value part fills the remaining
/// components according to the strategy's [`ValueLayout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Qualified;

fn layout_of(spec: &FieldSpec) -> ValueLayout {
    match &spec.strategy {
        Strategy::Custom { layout, .. } => *layout,
        _ => ValueLayout::Single,
    }
}

fn first_value_index(spec: &FieldSpec) -> usize {
    2 + usize::from(spec.dss)
}

impl ParseHook for Qualified {
    fn parse(&self, raw: &str, ctx: &mut ParseContext<'_>) {
        let spec = ctx.spec();
        let body = match raw.strip_prefix(':') {
            Some(body) => body,
            None => {
                ctx.report(
                    codes::PARSE_UNEXPECTED_TOKEN,
                    "generic field value should start with ':'",
                    Some(Span::empty(0)),
                );
                raw
            }
        };
        let base = raw.len() - body.len();
        let split = SlashSplit::qualified(body);
        ctx.set_nonempty(1, split.head);

        if let Some(scheme) = split.scheme {
            if spec.dss {
                ctx.set_nonempty(2, scheme);
            } else {
                let start = split.head.len() + 1;
                ctx.report(
                    codes::PARSE_UNEXPECTED_TOKEN,
                    format!("field {} has no data source scheme; '{scheme}' ignored", spec.name),
                    Some(Span::new(start, start + scheme.len()).shifted(base)),
                );
            }
        }

        let Some(value) = split.tail else {
            ctx.report(
                codes::PARSE_UNEXPECTED_TOKEN,
                "expected '//' or '/scheme/' after the qualifier",
                Some(Span::empty(raw.len())),
            );
            return;
        };
        if value.is_empty() {
            return;
        }
        distribute_value(ctx, value, base + split.tail_offset);
    }

    fn serialize(&self, spec: &FieldSpec, components: &[Option<String>]) -> String {
        if components.iter().all(Option::is_none) {
            return String::new();
        }
        let part = |i: usize| components.get(i).and_then(|c| c.as_deref());
        let mut out = String::from(":");
        out.push_str(part(0).unwrap_or_default());
        out.push('/');
        if spec.dss {
            out.push_str(part(1).unwrap_or_default());
        }
        out.push('/');

        let values = components.get(first_value_index(spec) - 1..).unwrap_or_default();
        match layout_of(spec) {
            ValueLayout::Slashed => out.push_str(&emit::join_present(values, "/")),
            ValueLayout::Single | ValueLayout::Stacked => out.push_str(&emit::concat_present(values)),
        }
        out
    }
}

/// Spread the value part of a generic field over components `first..`.
fn distribute_value(ctx: &mut ParseContext<'_>, value: &str, offset: usize) {
    let spec = ctx.spec();
    let first = first_value_index(spec);
    let count = ctx.component_count();
    if first > count {
        ctx.report(
            codes::PARSE_UNCONSUMED_CONTENT,
            format!("field {} declares no value component", spec.name),
            Some(Span::new(0, value.len()).shifted(offset)),
        );
        return;
    }

    match layout_of(spec) {
        ValueLayout::Single => {
            ctx.set(first, value);
        }
        ValueLayout::Slashed => {
            for (k, part) in value.splitn(count - first + 1, '/').enumerate() {
                ctx.set(first + k, part);
            }
        }
        ValueLayout::Stacked => {
            let widths: Vec<usize> = (first..=count)
                .map(|i| {
                    spec.kind(i)
                        .and_then(ComponentKind::numeric_width)
                        .unwrap_or(usize::MAX)
                })
                .collect();
            let stack = StackedNumeric::scan(value, &widths);
            for (k, group) in stack.groups.iter().enumerate() {
                ctx.set(first + k, *group);
            }
            if stack.end < value.len() {
                ctx.report(
                    codes::PARSE_UNCONSUMED_CONTENT,
                    format!("'{}' after the numeric groups ignored", &value[stack.end..]),
                    Some(Span::new(stack.end, value.len()).shifted(offset)),
                );
            }
        }
    }
}
