//! Semantic analyzer for Compiscript (§4.3): a two-pass walk over each
//! scope that collects declarations before checking bodies, computing
//! types and pushing structured diagnostics as it goes. Never aborts on
//! the first error — the whole program is always walked.

mod classes;
mod declarations;
mod expr;
mod return_check;
mod stmt;
mod type_ref;

use compiscript_common::DiagnosticBag;
use compiscript_parser::Program;
use compiscript_symbols::SymbolTable;

/// Per-compile checker state: the symbol table under construction, the
/// diagnostics collected so far, and the stack of enclosing class names
/// (for typing `this`; scopes themselves don't carry a class name).
pub(crate) struct Checker {
    table: SymbolTable,
    diags: DiagnosticBag,
    class_stack: Vec<String>,
}

impl Checker {
    fn new() -> Self {
        let mut table = SymbolTable::new();
        declarations::register_builtins(&mut table);
        Self { table, diags: DiagnosticBag::new(), class_stack: Vec::new() }
    }
}

/// Checks a parsed program, returning the populated symbol table and the
/// diagnostics collected. The caller should not proceed to TAC generation
/// when `diagnostics.has_errors()` (§4.5).
pub fn check(program: &Program) -> (SymbolTable, DiagnosticBag) {
    let mut checker = Checker::new();
    stmt::check_top_level(&mut checker, &program.items);
    tracing::debug!(diagnostics = checker.diags.len(), errors = checker.diags.has_errors(), "checked program");
    (checker.table, checker.diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compiscript_common::DiagnosticCode;

    fn check_src(src: &str) -> DiagnosticBag {
        let (program, parse_diags) = compiscript_parser::parse(src);
        assert!(parse_diags.is_empty(), "unexpected parse diagnostics: {parse_diags:?}");
        check(&program).1
    }

    #[test]
    fn well_typed_program_has_no_diagnostics() {
        let diags = check_src("let x: integer = 10; let y: integer = x + 5;");
        assert!(diags.is_empty(), "{:?}", diags.into_vec());
    }

    #[test]
    fn scenario_s6_reports_exactly_three_errors() {
        let diags = check_src("const y: string = 42; z = 5; break;");
        let codes: Vec<_> = diags.iter().map(|d| d.code).collect();
        assert_eq!(codes.len(), 3, "{codes:?}");
        assert_eq!(codes[0], DiagnosticCode::TypeMismatch);
        assert_eq!(codes[1], DiagnosticCode::UnknownSymbol);
        assert_eq!(codes[2], DiagnosticCode::UnboundBreakContinue);
    }

    #[test]
    fn foreach_over_array_literal_has_no_diagnostics() {
        let diags = check_src("let a: integer[] = [1,2,3]; foreach (x in a) { print(x); }");
        assert!(diags.is_empty(), "{:?}", diags.into_vec());
    }

    /// A `foreach` iterable without a statically-known length (here, a
    /// function parameter) is rejected at check time rather than letting a
    /// checked program crash TAC generation (no IR primitive queries an
    /// array's runtime length, §3.4).
    #[test]
    fn foreach_over_parameter_without_known_length_is_rejected() {
        let diags =
            check_src("function sum(xs: integer[]): integer { let t: integer = 0; foreach (x in xs) { t = t + x; } return t; }");
        let codes: Vec<_> = diags.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![DiagnosticCode::UnknownArrayLength], "{codes:?}");
    }
}
