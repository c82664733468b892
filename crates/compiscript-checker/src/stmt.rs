//! Statement checking: the two-pass declaration/body walk over a scope's
//! statement list (§4.3 Strategy), and the per-statement typing rules.

use crate::classes::{check_class_bodies, declare_class_signatures};
use crate::declarations::declare_function_signature;
use crate::return_check::is_block_terminator;
use crate::Checker;
use compiscript_common::{DiagnosticCode, Span};
use compiscript_parser::{
    Block, ClassDeclStmt, DoWhileStmt, ForInit, ForStmt, ForeachStmt, FuncDeclStmt, IfStmt, ReturnStmt, Stmt, SwitchStmt, VarDeclStmt,
    WhileStmt,
};
use compiscript_symbols::{ScopeKind, Symbol, VariableSymbol};
use compiscript_types::Type;

/// Entry point for the program's top-level statements. The whole program is
/// treated as an implicit `Void`-returning entry (§3.4), so a bare `return;`
/// at top level is valid and `return <expr>;` there is a type error rather
/// than "return outside a function".
pub(crate) fn check_top_level(checker: &mut Checker, items: &[Stmt]) {
    checker.table.push_function_context(Type::Void);
    check_stmt_list(checker, items);
    checker.table.pop_function_context();
}

/// The two-pass walk shared by the program body, every block, and every
/// switch case body (§4.3 Strategy): a declaration pass registers every
/// function and class textually present in `stmts` before any body is
/// checked, so mutual recursion and forward references resolve regardless
/// of source order; a body pass then type-checks each statement in source
/// order, declaring variables/consts as their declaration point is reached
/// and warning on anything reachable only through a statement that already
/// terminates the block.
pub(crate) fn check_stmt_list(checker: &mut Checker, stmts: &[Stmt]) {
    let funcs: Vec<&FuncDeclStmt> = stmts
        .iter()
        .filter_map(|s| match s {
            Stmt::FuncDecl(f) => Some(f),
            _ => None,
        })
        .collect();
    let classes: Vec<&ClassDeclStmt> = stmts
        .iter()
        .filter_map(|s| match s {
            Stmt::ClassDecl(c) => Some(c),
            _ => None,
        })
        .collect();

    for f in &funcs {
        declare_function_signature(checker, f, None);
    }
    declare_class_signatures(checker, &classes);

    let mut terminated = false;
    for stmt in stmts {
        if terminated {
            checker.diags.warning(DiagnosticCode::DeadCode, "unreachable code", stmt.span());
        }
        check_stmt(checker, stmt);
        if is_block_terminator(stmt) {
            terminated = true;
        }
    }
}

fn check_stmt(checker: &mut Checker, stmt: &Stmt) {
    match stmt {
        Stmt::VarDecl(v) => check_var_decl(checker, v, false),
        Stmt::ConstDecl(v) => check_var_decl(checker, v, true),
        Stmt::FuncDecl(f) => crate::declarations::check_function_body(checker, f),
        Stmt::ClassDecl(c) => check_class_bodies(checker, std::slice::from_ref(c)),
        Stmt::Block(b) => check_block(checker, b),
        Stmt::If(i) => check_if(checker, i),
        Stmt::While(w) => check_while(checker, w),
        Stmt::DoWhile(d) => check_do_while(checker, d),
        Stmt::For(f) => check_for(checker, f),
        Stmt::Foreach(f) => check_foreach(checker, f),
        Stmt::Switch(s) => check_switch(checker, s),
        Stmt::Break(span) => check_break(checker, *span),
        Stmt::Continue(span) => check_continue(checker, *span),
        Stmt::Return(r) => check_return(checker, r),
        Stmt::ExprStmt(e) => {
            checker.check_expr(&e.expr);
        }
        Stmt::Print(p) => {
            checker.check_expr(&p.expr);
        }
    }
}

fn check_var_decl(checker: &mut Checker, decl: &VarDeclStmt, is_const: bool) {
    let declared_type = decl.declared_type.as_ref().map(|t| checker.resolve_type(t));
    let init_type = decl.init.as_ref().map(|e| checker.check_expr(e));

    let ty = match (&declared_type, &init_type) {
        (Some(declared), Some(init)) => {
            if !compiscript_types::assignable(&checker.table, init, declared) {
                checker.diags.error(
                    DiagnosticCode::TypeMismatch,
                    format!("cannot assign {init} to declared type {declared}"),
                    decl.span,
                );
            }
            declared.clone()
        }
        (Some(declared), None) => declared.clone(),
        (None, Some(init)) => init.clone(),
        (None, None) => {
            checker.diags.error(
                DiagnosticCode::TypeMismatch,
                format!("declaration of '{}' needs either a type annotation or an initializer", decl.name),
                decl.span,
            );
            Type::Void
        }
    };

    let known_array_len = match &decl.init {
        Some(compiscript_parser::Expr::ArrayLit(elems, _)) => Some(elems.len()),
        _ => None,
    };
    let symbol = Symbol::Variable(VariableSymbol {
        name: decl.name.clone(),
        ty,
        is_const,
        initialized: decl.init.is_some(),
        span: decl.span,
        known_array_len,
    });
    if checker.table.declare(symbol).is_err() {
        checker.diags.error(
            DiagnosticCode::DuplicateSymbol,
            format!("'{}' is already declared in this scope", decl.name),
            decl.span,
        );
    }
}

fn check_block(checker: &mut Checker, block: &Block) {
    checker.table.push(ScopeKind::Block);
    check_stmt_list(checker, &block.stmts);
    checker.table.pop();
}

fn check_if(checker: &mut Checker, stmt: &IfStmt) {
    let cond_ty = checker.check_expr(&stmt.cond);
    if cond_ty != Type::Bool {
        checker.diags.error(DiagnosticCode::NotBoolean, format!("'if' condition must be boolean, found {cond_ty}"), stmt.cond.span());
    }
    check_stmt(checker, &stmt.then_branch);
    if let Some(else_branch) = &stmt.else_branch {
        check_stmt(checker, else_branch);
    }
}

fn check_while(checker: &mut Checker, stmt: &WhileStmt) {
    let cond_ty = checker.check_expr(&stmt.cond);
    if cond_ty != Type::Bool {
        checker.diags.error(DiagnosticCode::NotBoolean, format!("'while' condition must be boolean, found {cond_ty}"), stmt.cond.span());
    }
    checker.table.push_loop(Some(String::new()), String::new());
    check_stmt(checker, &stmt.body);
    checker.table.pop_loop();
}

fn check_do_while(checker: &mut Checker, stmt: &DoWhileStmt) {
    checker.table.push_loop(Some(String::new()), String::new());
    check_stmt(checker, &stmt.body);
    checker.table.pop_loop();
    let cond_ty = checker.check_expr(&stmt.cond);
    if cond_ty != Type::Bool {
        checker.diags.error(DiagnosticCode::NotBoolean, format!("'do-while' condition must be boolean, found {cond_ty}"), stmt.cond.span());
    }
}

fn check_for(checker: &mut Checker, stmt: &ForStmt) {
    checker.table.push(ScopeKind::Block);
    match &stmt.init {
        ForInit::VarDecl(v) => check_var_decl(checker, v, false),
        ForInit::Expr(e) => {
            checker.check_expr(e);
        }
        ForInit::None => {}
    }
    if let Some(cond) = &stmt.cond {
        let cond_ty = checker.check_expr(cond);
        if cond_ty != Type::Bool {
            checker.diags.error(DiagnosticCode::NotBoolean, format!("'for' condition must be boolean, found {cond_ty}"), cond.span());
        }
    }
    if let Some(step) = &stmt.step {
        checker.check_expr(step);
    }
    checker.table.push_loop(Some(String::new()), String::new());
    check_stmt(checker, &stmt.body);
    checker.table.pop_loop();
    checker.table.pop();
}

/// `foreach` desugars to an integer-indexed `for` loop at generation time
/// (§4.4), and the IR has no instruction to query an array's length at
/// runtime (§3.4) — the generator can only bound that loop with a length it
/// already knows statically. So a `foreach` iterable must be an identifier
/// bound (directly or through `let`/`const` re-declaration) to an array
/// literal; anything else — a parameter, a field, a call result — is
/// rejected here rather than passing checking and then crashing generation.
fn check_foreach(checker: &mut Checker, stmt: &ForeachStmt) {
    let iterable_ty = checker.check_expr(&stmt.iterable);
    let elem_ty = match iterable_ty {
        Type::Array(elem) => *elem,
        other => {
            checker.diags.error(DiagnosticCode::TypeMismatch, format!("'foreach' requires an array, found {other}"), stmt.span);
            Type::Void
        }
    };
    if elem_ty != Type::Void {
        match known_array_len(checker, &stmt.iterable) {
            Some(_) => {}
            None => {
                checker.diags.error(
                    DiagnosticCode::UnknownArrayLength,
                    "'foreach' requires an array whose length is known at compile time (a variable initialized directly from an array literal)",
                    stmt.span,
                );
            }
        }
    }
    checker.table.push(ScopeKind::Block);
    let _ = checker.table.declare(Symbol::Variable(VariableSymbol {
        name: stmt.binding.clone(),
        ty: elem_ty,
        is_const: false,
        initialized: true,
        span: stmt.span,
        known_array_len: None,
    }));
    checker.table.push_loop(Some(String::new()), String::new());
    check_stmt(checker, &stmt.body);
    checker.table.pop_loop();
    checker.table.pop();
}

/// The statically-known length of `expr`, if any — currently only resolved
/// for a plain identifier naming a variable declared with
/// `known_array_len` set (§4.4 "Array literal").
fn known_array_len(checker: &Checker, expr: &compiscript_parser::Expr) -> Option<usize> {
    match expr {
        compiscript_parser::Expr::Identifier(name, _) => match checker.table.lookup(name) {
            Some(id) => match checker.table.symbol(id) {
                Symbol::Variable(v) => v.known_array_len,
                _ => None,
            },
            None => None,
        },
        _ => None,
    }
}

/// `switch` requires every case (and a mandatory `default`) to end with an
/// explicit `break` or `return` — implicit fall-through is rejected as a
/// checker error rather than silently accepted (open question #2; see
/// DESIGN.md). `break` inside a `switch` pushes a break-only loop frame
/// (§4.2) so a bare `continue` inside a `switch` not itself nested in a
/// loop still fails to resolve.
fn check_switch(checker: &mut Checker, stmt: &SwitchStmt) {
    let disc_ty = checker.check_expr(&stmt.discriminant);
    checker.table.push_loop(None, String::new());
    for case in &stmt.cases {
        if let Some(value) = &case.value {
            if !matches!(value, compiscript_parser::Expr::Literal(..)) {
                checker.diags.error(DiagnosticCode::TypeMismatch, "case values must be compile-time literals", value.span());
            }
            let case_ty = checker.check_expr(value);
            if compiscript_types::promotion::unify_equality(&disc_ty, &case_ty).is_err() {
                checker.diags.error(
                    DiagnosticCode::TypeMismatch,
                    format!("case value type {case_ty} is not comparable to the switch expression's type {disc_ty}"),
                    value.span(),
                );
            }
        }
        checker.table.push(ScopeKind::Block);
        check_stmt_list(checker, &case.body);
        checker.table.pop();
        if !case.body.iter().any(is_block_terminator) {
            checker.diags.error(
                DiagnosticCode::MissingReturn,
                "a switch case must end with 'break' or 'return' (implicit fall-through is not allowed)",
                case.span,
            );
        }
    }
    checker.table.pop_loop();
}

fn check_break(checker: &mut Checker, span: Span) {
    if checker.table.innermost_loop().is_none() {
        checker.diags.error(DiagnosticCode::UnboundBreakContinue, "'break' used outside of a loop or switch", span);
    }
}

fn check_continue(checker: &mut Checker, span: Span) {
    if checker.table.innermost_continuable_loop().is_none() {
        checker.diags.error(DiagnosticCode::UnboundBreakContinue, "'continue' used outside of a loop", span);
    }
}

fn check_return(checker: &mut Checker, stmt: &ReturnStmt) {
    let actual = stmt.value.as_ref().map(|e| checker.check_expr(e));
    let expected = checker
        .table
        .current_return_type()
        .cloned()
        .expect("a return context is always active: the top-level program pushes an implicit Void one");
    match (&actual, &expected) {
        (None, Type::Void) => {}
        (None, _) => {
            checker.diags.error(DiagnosticCode::TypeMismatch, format!("function must return a value of type {expected}"), stmt.span);
        }
        (Some(actual_ty), _) => {
            if !compiscript_types::assignable(&checker.table, actual_ty, &expected) {
                checker.diags.error(
                    DiagnosticCode::TypeMismatch,
                    format!("cannot return {actual_ty} from a function declared to return {expected}"),
                    stmt.span,
                );
            }
        }
    }
}
