//! Declaration-pass helpers shared by the top-level program, blocks, and
//! class bodies (§4.3 Strategy): registering functions/parameters/builtins
//! into the symbol table ahead of body checking.

use crate::return_check::must_return;
use crate::Checker;
use compiscript_common::DiagnosticCode;
use compiscript_parser::{FuncDeclStmt, Param};
use compiscript_symbols::{BuiltinSymbol, FunctionSymbol, ParameterSymbol, ScopeKind, Symbol, SymbolId, SymbolTable};
use compiscript_types::{FunctionSig, Type};

/// Registers the only builtin the language defines (§3.2): `print(any):
/// Void`. `print` is parsed as its own statement kind rather than a call
/// expression, so this entry exists to satisfy the symbol-table shape the
/// spec describes rather than to drive argument checking — `Print` accepts
/// any expression type directly in `stmt.rs`.
pub(crate) fn register_builtins(table: &mut SymbolTable) {
    let signature = FunctionSig::new(vec![Type::Void], Type::Void);
    let _ = table.declare(Symbol::Builtin(BuiltinSymbol { name: "print".to_string(), signature }));
}

/// Declares a free function's signature (§4.3 declaration pass) so sibling
/// functions — declared earlier or later in the same scope — can call it,
/// enabling mutual recursion. The body is checked separately, after every
/// sibling declaration in the scope has been registered.
pub(crate) fn declare_function_signature(
    checker: &mut Checker,
    decl: &FuncDeclStmt,
    enclosing_class: Option<String>,
) -> Option<SymbolId> {
    let params = decl
        .params
        .iter()
        .enumerate()
        .map(|(slot_index, p)| {
            let ty = checker.resolve_type(&p.param_type);
            ParameterSymbol { name: p.name.clone(), ty, slot_index, span: p.span }
        })
        .collect();
    let return_type = decl.return_type.as_ref().map(|t| checker.resolve_type(t)).unwrap_or(Type::Void);
    let symbol = Symbol::Function(FunctionSymbol { name: decl.name.clone(), params, return_type, enclosing_class, span: decl.span });
    match checker.table.declare(symbol) {
        Ok(id) => Some(id),
        Err(_dup) => {
            checker.diags.error(
                DiagnosticCode::DuplicateSymbol,
                format!("'{}' is already declared in this scope", decl.name),
                decl.span,
            );
            None
        }
    }
}

/// Declares a function or method's parameters as `Parameter` symbols in the
/// scope currently pushed for its body (§3.2).
pub(crate) fn declare_parameters(checker: &mut Checker, params: &[Param]) {
    for (slot_index, p) in params.iter().enumerate() {
        let ty = checker.resolve_type(&p.param_type);
        let symbol = Symbol::Parameter(ParameterSymbol { name: p.name.clone(), ty, slot_index, span: p.span });
        if checker.table.declare(symbol).is_err() {
            checker.diags.error(
                DiagnosticCode::DuplicateSymbol,
                format!("parameter '{}' is already declared", p.name),
                p.span,
            );
        }
    }
}

/// Checks a free function's body against its own return type (§4.3 Return-
/// path analysis): pushes the function scope, declares its parameters,
/// walks the body, then requires a must-return proof for non-`Void`
/// functions.
pub(crate) fn check_function_body(checker: &mut Checker, decl: &FuncDeclStmt) {
    let return_type = decl.return_type.as_ref().map(|t| checker.resolve_type(t)).unwrap_or(Type::Void);
    checker.table.push(ScopeKind::Function);
    checker.table.push_function_context(return_type.clone());
    declare_parameters(checker, &decl.params);
    crate::stmt::check_stmt_list(checker, &decl.body.stmts);
    if return_type != Type::Void && !must_return(&decl.body.stmts) {
        checker.diags.error(
            DiagnosticCode::MissingReturn,
            format!("function '{}' does not return a value of type {return_type} on every path", decl.name),
            decl.span,
        );
    }
    checker.table.pop_function_context();
    checker.table.pop();
}
