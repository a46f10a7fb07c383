/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// Re-exports from the diagnostics crate.
pub mod diag;
/// Serializer: reconstructs wire text from components.
pub mod emit;
/// Custom parse hooks and the hook registry.
pub mod hooks;
/// Default distribution strategies and the parse context.
pub mod parser;
/// Shared scanning state machines for context-sensitive grammars.
pub mod scan;
/// Re-exports of spec tables types used by the parser and serializer.
pub mod tables;
/// Tokenizer primitives.
pub mod tokens;
