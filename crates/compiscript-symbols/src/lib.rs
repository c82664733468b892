//! Scoped symbol table for the Compiscript checker (§3.2, §3.3, §4.2).

mod scope;
mod symbol;
mod table;

pub use scope::{ScopeData, ScopeId, ScopeKind};
pub use symbol::{BuiltinSymbol, ClassSymbol, FunctionSymbol, ParameterSymbol, Symbol, SymbolId, VariableSymbol};
pub use table::{DuplicateSymbol, LoopContext, SymbolTable};

#[cfg(test)]
mod tests {
    use super::*;
    use compiscript_common::Span;
    use compiscript_types::Type;

    fn var(name: &str, ty: Type) -> Symbol {
        Symbol::Variable(VariableSymbol {
            name: name.to_string(),
            ty,
            is_const: false,
            initialized: true,
            span: Span::dummy(),
            known_array_len: None,
        })
    }

    #[test]
    fn duplicate_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Int)).unwrap();
        let err = table.declare(var("x", Type::Float)).unwrap_err();
        assert_eq!(err.name, "x");
    }

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Int)).unwrap();
        table.push(ScopeKind::Block);
        table.declare(var("x", Type::String)).unwrap();
        let id = table.lookup("x").unwrap();
        assert_eq!(table.symbol(id).value_type(), Type::String);
        table.pop();
        let id = table.lookup("x").unwrap();
        assert_eq!(table.symbol(id).value_type(), Type::Int);
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let mut table = SymbolTable::new();
        table.declare(var("g", Type::Bool)).unwrap();
        table.push(ScopeKind::Function);
        table.push(ScopeKind::Block);
        assert!(table.lookup("g").is_some());
        assert!(table.lookup_local("g").is_none());
    }

    #[test]
    fn loop_stack_tracks_innermost_context() {
        let mut table = SymbolTable::new();
        assert!(table.innermost_loop().is_none());
        table.push_loop(Some("Ltest".into()), "Lend".into());
        assert_eq!(table.innermost_loop().unwrap().break_label, "Lend");
        table.push_loop(None, "Lswitch_end".into());
        assert_eq!(table.innermost_loop().unwrap().break_label, "Lswitch_end");
        // continue skips the switch's break-only frame
        assert_eq!(table.innermost_continuable_loop().unwrap().break_label, "Lend");
        table.pop_loop();
        table.pop_loop();
        assert!(table.innermost_loop().is_none());
    }

    #[test]
    fn resolved_fields_flattens_inheritance() {
        let mut table = SymbolTable::new();
        let mut animal_fields = indexmap::IndexMap::new();
        animal_fields.insert("name".to_string(), Type::String);
        table
            .declare_class(
                table.global_scope(),
                ClassSymbol {
                    name: "Animal".into(),
                    parent: None,
                    own_fields: animal_fields,
                    own_methods: indexmap::IndexMap::new(),
                    span: Span::dummy(),
                },
            )
            .unwrap();
        let mut dog_fields = indexmap::IndexMap::new();
        dog_fields.insert("breed".to_string(), Type::String);
        table
            .declare_class(
                table.global_scope(),
                ClassSymbol {
                    name: "Dog".into(),
                    parent: Some("Animal".into()),
                    own_fields: dog_fields,
                    own_methods: indexmap::IndexMap::new(),
                    span: Span::dummy(),
                },
            )
            .unwrap();
        let fields = table.resolved_fields("Dog");
        assert_eq!(fields.get("name"), Some(&Type::String));
        assert_eq!(fields.get("breed"), Some(&Type::String));
    }
}
