//! Class declaration and body checking (§3.2, §4.3).
//!
//! Classes are always registered in the global scope regardless of where
//! they're textually declared, mirroring [`compiscript_symbols::SymbolTable::find_class`]
//! which only ever searches from the global scope — a class is a
//! program-wide name, not a block-scoped one. Checking proceeds in three
//! passes over a list of sibling class declarations: placeholder-declare
//! every name (so siblings can reference each other as field/member types
//! and parents regardless of source order), fill in each class's real
//! fields and methods, then validate parents/constructors/overrides once
//! every sibling is fully known. Method bodies are checked separately, after
//! every class in the program's declaration passes have completed.

use crate::declarations::declare_parameters;
use crate::return_check::must_return;
use crate::Checker;
use compiscript_common::DiagnosticCode;
use compiscript_parser::{ClassDeclStmt, ClassMember, FuncDeclStmt};
use compiscript_symbols::{ClassSymbol, ScopeKind, Symbol, SymbolId};
use compiscript_types::{self as types, FunctionSig, Type};
use indexmap::IndexMap;

pub(crate) fn declare_class_signatures(checker: &mut Checker, classes: &[&ClassDeclStmt]) {
    let global = checker.table.global_scope();
    let mut ids: Vec<Option<SymbolId>> = Vec::with_capacity(classes.len());
    for class in classes {
        let placeholder = ClassSymbol {
            name: class.name.clone(),
            parent: class.parent.clone(),
            own_fields: IndexMap::new(),
            own_methods: IndexMap::new(),
            span: class.span,
        };
        match checker.table.declare_class(global, placeholder) {
            Ok(id) => ids.push(Some(id)),
            Err(_dup) => {
                checker.diags.error(
                    DiagnosticCode::DuplicateSymbol,
                    format!("'{}' is already declared in this scope", class.name),
                    class.span,
                );
                ids.push(None);
            }
        }
    }

    for (class, id) in classes.iter().zip(&ids) {
        let Some(id) = id else { continue };
        let mut own_fields = IndexMap::new();
        let mut own_methods = IndexMap::new();
        for member in &class.members {
            match member {
                ClassMember::Field(f) => {
                    let ty = checker.resolve_type(&f.field_type);
                    if own_fields.insert(f.name.clone(), ty).is_some() {
                        checker.diags.error(
                            DiagnosticCode::DuplicateSymbol,
                            format!("duplicate field '{}' in class '{}'", f.name, class.name),
                            f.span,
                        );
                    }
                }
                ClassMember::Method(m) => {
                    let params = m.func.params.iter().map(|p| checker.resolve_type(&p.param_type)).collect();
                    let return_type = m.func.return_type.as_ref().map(|t| checker.resolve_type(t)).unwrap_or(Type::Void);
                    let sig = FunctionSig::new(params, return_type);
                    if own_methods.insert(m.func.name.clone(), sig).is_some() {
                        checker.diags.error(
                            DiagnosticCode::DuplicateSymbol,
                            format!("duplicate method '{}' in class '{}'", m.func.name, class.name),
                            m.func.span,
                        );
                    }
                }
            }
        }
        *checker.table.symbol_mut(*id) = Symbol::Class(ClassSymbol {
            name: class.name.clone(),
            parent: class.parent.clone(),
            own_fields,
            own_methods,
            span: class.span,
        });
    }

    for (class, id) in classes.iter().zip(&ids) {
        if id.is_none() {
            continue;
        }
        if let Some(parent) = &class.parent {
            if parent == &class.name {
                checker.diags.error(DiagnosticCode::TypeMismatch, format!("class '{}' cannot extend itself", class.name), class.span);
            } else if !checker.table.class_exists(parent) {
                checker.diags.error(DiagnosticCode::UnknownSymbol, format!("unknown parent class '{parent}'"), class.span);
            }
        }
        let has_constructor = types::member_lookup(&checker.table, &class.name, "constructor").is_some();
        if !has_constructor {
            checker.diags.error(
                DiagnosticCode::BadConstructor,
                format!("class '{}' must declare a constructor or inherit one", class.name),
                class.span,
            );
        }
        check_override_compatibility(checker, class);
    }
}

/// A method that shares its name with an ancestor's method must keep the
/// same arity, parameter types, and a covariantly-compatible return type;
/// anything else is a `TypeMismatch` rather than a silent shadow.
fn check_override_compatibility(checker: &mut Checker, class: &ClassDeclStmt) {
    let Some(parent_name) = &class.parent else { return };
    let Some(own_methods) = checker.table.find_class(&class.name).map(|c| c.own_methods.clone()) else { return };
    for (method_name, sig) in &own_methods {
        if method_name == "constructor" {
            continue;
        }
        let Some(Type::Function(parent_sig)) = types::member_lookup(&checker.table, parent_name, method_name) else { continue };
        let arity_ok = parent_sig.params.len() == sig.params.len();
        let params_ok = arity_ok && parent_sig.params.iter().zip(&sig.params).all(|(a, b)| a == b);
        let return_ok = types::assignable(&checker.table, &sig.return_type, &parent_sig.return_type);
        if !arity_ok || !params_ok || !return_ok {
            checker.diags.error(
                DiagnosticCode::TypeMismatch,
                format!("method '{method_name}' overrides '{parent_name}.{method_name}' with an incompatible signature"),
                class.span,
            );
        }
    }
}

/// Checks every method body of each class in `classes`, with `this` typed
/// to the enclosing class (§3.2) and fields/sibling methods visible through
/// the usual member-lookup path rather than as ordinary scoped symbols.
pub(crate) fn check_class_bodies(checker: &mut Checker, classes: &[&ClassDeclStmt]) {
    for class in classes {
        checker.class_stack.push(class.name.clone());
        checker.table.push(ScopeKind::Class);
        for member in &class.members {
            if let ClassMember::Method(m) = member {
                check_method_body(checker, &m.func);
            }
        }
        checker.table.pop();
        checker.class_stack.pop();
    }
}

fn check_method_body(checker: &mut Checker, func: &FuncDeclStmt) {
    let return_type = func.return_type.as_ref().map(|t| checker.resolve_type(t)).unwrap_or(Type::Void);
    checker.table.push(ScopeKind::Function);
    checker.table.push_function_context(return_type.clone());
    declare_parameters(checker, &func.params);
    crate::stmt::check_stmt_list(checker, &func.body.stmts);
    if return_type != Type::Void && !must_return(&func.body.stmts) {
        checker.diags.error(
            DiagnosticCode::MissingReturn,
            format!("method '{}' does not return a value of type {return_type} on every path", func.name),
            func.span,
        );
    }
    checker.table.pop_function_context();
    checker.table.pop();
}
