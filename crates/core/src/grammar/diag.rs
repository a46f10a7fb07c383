pub use mt_fields_diagnostics::{Diagnostic, Severity, Span, codes, explain};
