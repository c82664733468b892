//! Symbol variants (§3.2). Each carries the source position of its
//! declaration so diagnostics can point back at it (e.g. a `DuplicateSymbol`
//! names the earlier declaration's span).

use compiscript_common::Span;
use compiscript_types::{FunctionSig, Type};
use indexmap::IndexMap;

/// A stable identifier for a symbol, valid for the lifetime of the
/// `SymbolTable` that produced it. The TAC generator holds these (or the
/// names they resolve to) rather than borrowing the table's scopes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Clone, Debug)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: Type,
    pub is_const: bool,
    pub initialized: bool,
    pub span: Span,
    /// `Some(N)` when this binding's declared value is known at check time
    /// to be an `N`-element array (i.e. initialized directly from an array
    /// literal) — the only case `foreach` can lower without a runtime
    /// array-length primitive (§3.4 has none). `None` for every other
    /// variable, including array-typed parameters and fields.
    pub known_array_len: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct ParameterSymbol {
    pub name: String,
    pub ty: Type,
    pub slot_index: usize,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FunctionSymbol {
    pub name: String,
    pub params: Vec<ParameterSymbol>,
    pub return_type: Type,
    /// Set when this function is a method; the name of the enclosing class.
    pub enclosing_class: Option<String>,
    pub span: Span,
}

impl FunctionSymbol {
    pub fn signature(&self) -> FunctionSig {
        FunctionSig::new(self.params.iter().map(|p| p.ty.clone()).collect(), self.return_type.clone())
    }
}

#[derive(Clone, Debug)]
pub struct ClassSymbol {
    pub name: String,
    pub parent: Option<String>,
    pub own_fields: IndexMap<String, Type>,
    pub own_methods: IndexMap<String, FunctionSig>,
    pub span: Span,
}

impl ClassSymbol {
    pub fn has_own_constructor(&self) -> bool {
        self.own_methods.contains_key("constructor")
    }
}

#[derive(Clone, Debug)]
pub struct BuiltinSymbol {
    pub name: String,
    pub signature: FunctionSig,
}

#[derive(Clone, Debug)]
pub enum Symbol {
    Variable(VariableSymbol),
    Parameter(ParameterSymbol),
    Function(FunctionSymbol),
    Class(ClassSymbol),
    Builtin(BuiltinSymbol),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable(s) => &s.name,
            Symbol::Parameter(s) => &s.name,
            Symbol::Function(s) => &s.name,
            Symbol::Class(s) => &s.name,
            Symbol::Builtin(s) => &s.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Symbol::Variable(s) => s.span,
            Symbol::Parameter(s) => s.span,
            Symbol::Function(s) => s.span,
            Symbol::Class(s) => s.span,
            Symbol::Builtin(_) => Span::dummy(),
        }
    }

    /// The type this symbol denotes when referenced as an expression
    /// (a variable's value type, a function's callable signature, ...).
    pub fn value_type(&self) -> Type {
        match self {
            Symbol::Variable(s) => s.ty.clone(),
            Symbol::Parameter(s) => s.ty.clone(),
            Symbol::Function(s) => Type::Function(s.signature()),
            Symbol::Class(s) => Type::Function(FunctionSig::new(Vec::new(), Type::class(s.name.clone()))),
            Symbol::Builtin(s) => Type::Function(s.signature.clone()),
        }
    }
}
