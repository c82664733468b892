//! Structured diagnostics shared by the scanner, parser, checker, and CLI.

use crate::span::Span;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Stable diagnostic codes. Kept as an enum (rather than raw strings) so
/// match arms in the checker are exhaustive and callers can match on them
/// without string comparison.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCode {
    SyntaxError,
    UnknownSymbol,
    DuplicateSymbol,
    TypeMismatch,
    NotNumeric,
    NotBoolean,
    NotComparable,
    AssignToConst,
    InvalidLValue,
    ArityMismatch,
    UnknownMember,
    MissingReturn,
    UnboundBreakContinue,
    DeadCode,
    BadConstructor,
    UnknownArrayLength,
}

impl DiagnosticCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::SyntaxError => "SyntaxError",
            DiagnosticCode::UnknownSymbol => "UnknownSymbol",
            DiagnosticCode::DuplicateSymbol => "DuplicateSymbol",
            DiagnosticCode::TypeMismatch => "TypeMismatch",
            DiagnosticCode::NotNumeric => "NotNumeric",
            DiagnosticCode::NotBoolean => "NotBoolean",
            DiagnosticCode::NotComparable => "NotComparable",
            DiagnosticCode::AssignToConst => "AssignToConst",
            DiagnosticCode::InvalidLValue => "InvalidLValue",
            DiagnosticCode::ArityMismatch => "ArityMismatch",
            DiagnosticCode::UnknownMember => "UnknownMember",
            DiagnosticCode::MissingReturn => "MissingReturn",
            DiagnosticCode::UnboundBreakContinue => "UnboundBreakContinue",
            DiagnosticCode::DeadCode => "DeadCode",
            DiagnosticCode::BadConstructor => "BadConstructor",
            DiagnosticCode::UnknownArrayLength => "UnknownArrayLength",
        }
    }

    /// `DeadCode` is the only warning-level code; everything else is an error.
    pub const fn default_severity(self) -> Severity {
        match self {
            DiagnosticCode::DeadCode => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self { severity: Severity::Error, code, message: message.into(), span }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self { severity: Severity::Warning, code, message: message.into(), span }
    }

    /// Build a diagnostic using the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self { severity: code.default_severity(), code, message: message.into(), span }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// An ordered, append-only collector. The checker and generator never
/// short-circuit on the first diagnostic; they push and continue.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::error(code, message, span));
    }

    pub fn warning(&mut self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::warning(code, message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn extend(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}
