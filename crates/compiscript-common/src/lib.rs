//! Shared primitives for the Compiscript compiler pipeline: source spans,
//! line/column rendering, and the structured diagnostic model used by the
//! scanner, parser, checker, and TAC generator.

pub mod diagnostics;
pub mod position;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCode, Severity};
pub use position::{LineMap, Position};
pub use span::{Span, Spanned};
