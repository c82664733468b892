//! Builds the generator's own symbol table by mirroring the checker's
//! declaration pass (`compiscript_checker`'s `declarations.rs`/`classes.rs`)
//! without diagnostics: by the time a tree reaches the generator, it has
//! already passed `compiscript_checker::check` with zero errors, so every
//! name here is assumed to resolve and every class hierarchy is assumed
//! acyclic. Reusing `compiscript_symbols::SymbolTable` directly (rather
//! than inventing a second table type) keeps class/member lookup identical
//! to the checker's.

use compiscript_parser::{ClassDeclStmt, ClassMember, FuncDeclStmt, Stmt, TypeAnnotation};
use compiscript_symbols::{ClassSymbol, FunctionSymbol, ParameterSymbol, Symbol, SymbolTable};
use compiscript_types::{FunctionSig, Type};
use indexmap::IndexMap;

/// Resolves a parsed type annotation the same way `compiscript_checker`'s
/// `type_ref.rs` does, minus the `UnknownSymbol` diagnostic for a dangling
/// class reference — there is none, since the checker already validated it.
pub(crate) fn resolve_type(annotation: &TypeAnnotation) -> Type {
    match annotation {
        TypeAnnotation::Named(name, _) => match name.as_str() {
            "integer" => Type::Int,
            "float" => Type::Float,
            "boolean" => Type::Bool,
            "string" => Type::String,
            "void" => Type::Void,
            other => Type::class(other),
        },
        TypeAnnotation::Array(elem, _) => Type::array(resolve_type(elem)),
    }
}

/// Registers every function and class declared directly in `stmts` into the
/// table's current scope (functions) or global scope (classes), so that
/// lowering a scope's body can resolve forward/mutually-recursive
/// references the same way the checker's two-pass walk does.
pub(crate) fn declare_scope_signatures(table: &mut SymbolTable, stmts: &[Stmt]) {
    for stmt in stmts {
        match stmt {
            Stmt::FuncDecl(f) => declare_function(table, f, None),
            Stmt::ClassDecl(c) => declare_class(table, c),
            _ => {}
        }
    }
}

fn declare_function(table: &mut SymbolTable, decl: &FuncDeclStmt, enclosing_class: Option<String>) {
    let params = decl
        .params
        .iter()
        .enumerate()
        .map(|(slot_index, p)| ParameterSymbol { name: p.name.clone(), ty: resolve_type(&p.param_type), slot_index, span: p.span })
        .collect();
    let return_type = decl.return_type.as_ref().map(resolve_type).unwrap_or(Type::Void);
    let _ = table.declare(Symbol::Function(FunctionSymbol { name: decl.name.clone(), params, return_type, enclosing_class, span: decl.span }));
}

fn declare_class(table: &mut SymbolTable, class: &ClassDeclStmt) {
    let global = table.global_scope();
    let mut own_fields = IndexMap::new();
    let mut own_methods = IndexMap::new();
    for member in &class.members {
        match member {
            ClassMember::Field(f) => {
                own_fields.insert(f.name.clone(), resolve_type(&f.field_type));
            }
            ClassMember::Method(m) => {
                let params = m.func.params.iter().map(|p| resolve_type(&p.param_type)).collect();
                let return_type = m.func.return_type.as_ref().map(resolve_type).unwrap_or(Type::Void);
                own_methods.insert(m.func.name.clone(), FunctionSig::new(params, return_type));
            }
        }
    }
    let _ = table.declare_class(
        global,
        ClassSymbol { name: class.name.clone(), parent: class.parent.clone(), own_fields, own_methods, span: class.span },
    );
}

/// The nearest class in `class_name`'s parent chain (including itself) that
/// actually declares `member`, for qualifying a method call to the class
/// that defines it (`call Class.method`, not the static receiver type).
pub(crate) fn defining_class(table: &SymbolTable, class_name: &str, member: &str) -> Option<String> {
    let mut current = class_name.to_string();
    let mut guard = 0usize;
    loop {
        let class = table.find_class(&current)?;
        if class.own_fields.contains_key(member) || class.own_methods.contains_key(member) {
            return Some(current);
        }
        current = class.parent.clone()?;
        guard += 1;
        if guard > 1024 {
            return None;
        }
    }
}
