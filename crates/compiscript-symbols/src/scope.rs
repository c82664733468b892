//! Lexical scopes (§3.3). Scopes form a tree via parent pointers; the
//! `SymbolTable` keeps every scope alive for the duration of a compile
//! (owned by the checker) so the TAC generator can still walk a function's
//! scope after the checker has moved past it.

use crate::symbol::SymbolId;
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Class,
    Block,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Clone, Debug)]
pub struct ScopeData {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub names: FxHashMap<String, SymbolId>,
}

impl ScopeData {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self { kind, parent, names: FxHashMap::default() }
    }
}
