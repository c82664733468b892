//! The symbol table: scope stack, declare/lookup, the loop-context stack
//! for `break`/`continue`, and the return-context stack for `return` (§4.2).

use crate::scope::{ScopeData, ScopeId, ScopeKind};
use crate::symbol::{ClassSymbol, Symbol, SymbolId};
use compiscript_types::{ClassHierarchy, Type};
use indexmap::IndexMap;

#[derive(Debug)]
pub struct DuplicateSymbol {
    pub name: String,
    pub existing_span: compiscript_common::Span,
}

/// `(continue_label, break_label)` for the innermost active loop. `switch`
/// pushes a break-only frame (§4.2): `continue_label` is `None` there, so a
/// `continue` inside a bare `switch` still fails to resolve even though
/// `break` succeeds.
#[derive(Clone, Debug)]
pub struct LoopContext {
    pub continue_label: Option<String>,
    pub break_label: String,
}

pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<ScopeData>,
    current: ScopeId,
    loop_stack: Vec<LoopContext>,
    return_stack: Vec<Type>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let global = ScopeData::new(ScopeKind::Global, None);
        Self { symbols: Vec::new(), scopes: vec![global], current: ScopeId(0), loop_stack: Vec::new(), return_stack: Vec::new() }
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn scope_kind(&self, id: ScopeId) -> ScopeKind {
        self.scopes[id.0 as usize].kind
    }

    pub fn push(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData::new(kind, Some(self.current)));
        self.current = id;
        id
    }

    /// Pops back to the parent of the current scope. The popped scope's
    /// data remains in the arena (owned by the table for the rest of the
    /// compile), it is simply no longer the lookup/declare target.
    pub fn pop(&mut self) {
        if let Some(parent) = self.scopes[self.current.0 as usize].parent {
            self.current = parent;
        }
    }

    pub fn declare(&mut self, symbol: Symbol) -> Result<SymbolId, DuplicateSymbol> {
        let name = symbol.name().to_string();
        let scope = &self.scopes[self.current.0 as usize];
        if let Some(&existing_id) = scope.names.get(&name) {
            let existing_span = self.symbols[existing_id.0 as usize].span();
            return Err(DuplicateSymbol { name, existing_span });
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        self.scopes[self.current.0 as usize].names.insert(name, id);
        Ok(id)
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.lookup_from(self.current, name)
    }

    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let scope_data = &self.scopes[id.0 as usize];
            if let Some(&sym) = scope_data.names.get(name) {
                return Some(sym);
            }
            cursor = scope_data.parent;
        }
        None
    }

    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        self.scopes[self.current.0 as usize].names.get(name).copied()
    }

    /// Nearest enclosing `Function` scope's symbol id, found by walking the
    /// `own_methods`/global-function entry that declared it. Since scopes
    /// don't back-reference their owning symbol directly, callers track the
    /// current function's symbol id alongside the scope push via
    /// `push_function_context`/`pop_function_context` (the return stack).
    pub fn current_return_type(&self) -> Option<&Type> {
        self.return_stack.last()
    }

    pub fn push_function_context(&mut self, expected_return: Type) {
        self.return_stack.push(expected_return);
    }

    pub fn pop_function_context(&mut self) {
        self.return_stack.pop();
    }

    pub fn in_function(&self) -> bool {
        !self.return_stack.is_empty()
    }

    /// Nearest enclosing `Class` scope by walking the scope parent chain.
    pub fn current_class_scope(&self) -> Option<ScopeId> {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            if self.scopes[id.0 as usize].kind == ScopeKind::Class {
                return Some(id);
            }
            cursor = self.scopes[id.0 as usize].parent;
        }
        None
    }

    pub fn push_loop(&mut self, continue_label: Option<String>, break_label: String) {
        self.loop_stack.push(LoopContext { continue_label, break_label });
    }

    pub fn pop_loop(&mut self) {
        self.loop_stack.pop();
    }

    pub fn innermost_loop(&self) -> Option<&LoopContext> {
        self.loop_stack.last()
    }

    /// Nearest frame (walking outward) that has a `continue_label`, i.e.
    /// skips `switch`'s break-only frame. Used by `continue` resolution.
    pub fn innermost_continuable_loop(&self) -> Option<&LoopContext> {
        self.loop_stack.iter().rev().find(|ctx| ctx.continue_label.is_some())
    }

    // ---- class registry ----

    pub fn declare_class(&mut self, scope: ScopeId, class: ClassSymbol) -> Result<SymbolId, DuplicateSymbol> {
        let saved = self.current;
        self.current = scope;
        let result = self.declare(Symbol::Class(class));
        self.current = saved;
        result
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassSymbol> {
        self.lookup_from(self.global_scope(), name).and_then(|id| match self.symbol(id) {
            Symbol::Class(c) => Some(c),
            _ => None,
        })
    }

    pub fn class_exists(&self, name: &str) -> bool {
        self.find_class(name).is_some()
    }

    /// The flattened field layout for a class: its own fields plus all
    /// inherited fields not shadowed by a closer declaration, in
    /// declaration order with the class's own fields last so overriding
    /// reads naturally as "closest wins" during iteration.
    pub fn resolved_fields(&self, class_name: &str) -> IndexMap<String, Type> {
        let mut chain = Vec::new();
        let mut current = Some(class_name.to_string());
        let mut guard = 0usize;
        while let Some(name) = current {
            let Some(class) = self.find_class(&name) else { break };
            chain.push(class);
            current = class.parent.clone();
            guard += 1;
            if guard > 1024 {
                break;
            }
        }
        let mut fields = IndexMap::new();
        for class in chain.into_iter().rev() {
            for (name, ty) in &class.own_fields {
                fields.insert(name.clone(), ty.clone());
            }
        }
        fields
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassHierarchy for SymbolTable {
    fn parent_of(&self, class_name: &str) -> Option<String> {
        self.find_class(class_name).and_then(|c| c.parent.clone())
    }

    fn member_type(&self, class_name: &str, member: &str) -> Option<Type> {
        let class = self.find_class(class_name)?;
        if let Some(ty) = class.own_fields.get(member) {
            return Some(ty.clone());
        }
        class.own_methods.get(member).map(|sig| Type::Function(sig.clone()))
    }
}
