//! The Compiscript type algebra: primitives, arrays, nominal classes, and
//! first-class function signatures, plus the compatibility predicates the
//! checker uses to type expressions.
//!
//! Classes are represented nominally by name only (`Type::Class`); the
//! field/method layout of a class lives in the symbol table, not in the
//! type itself — embedding a class's full member map inside `Type` would
//! make a self-referential class (a field typed as its own class) an
//! infinitely sized type. Anything here that needs a class's members takes
//! a `&dyn ClassHierarchy` so this crate stays decoupled from the symbol
//! table crate that implements it.

pub mod promotion;

use std::fmt;

/// The full type universe. `Class` and `Function` are the only variants
/// whose equality is not purely structural-by-tag.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Null,
    Void,
    Array(Box<Type>),
    /// Nominal: identified by the class's declared name alone.
    Class(String),
    Function(FunctionSig),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FunctionSig {
    pub params: Vec<Type>,
    pub return_type: Box<Type>,
}

impl FunctionSig {
    pub fn new(params: Vec<Type>, return_type: Type) -> Self {
        Self { params, return_type: Box::new(return_type) }
    }
}

impl Type {
    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn class(name: impl Into<String>) -> Type {
        Type::Class(name.into())
    }

    pub fn function(params: Vec<Type>, return_type: Type) -> Type {
        Type::Function(FunctionSig::new(params, return_type))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Array(_) | Type::Class(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_comparable_ordered(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::String)
    }

    pub fn as_class_name(&self) -> Option<&str> {
        match self {
            Type::Class(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "integer"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "boolean"),
            Type::String => write!(f, "string"),
            Type::Null => write!(f, "null"),
            Type::Void => write!(f, "void"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Function(sig) => {
                write!(f, "(")?;
                for (i, p) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") => {}", sig.return_type)
            }
        }
    }
}

/// Queries the checker's symbol table needs to resolve nominal class
/// relationships without this crate depending on the symbol table crate.
pub trait ClassHierarchy {
    /// The immediate parent class name, if any.
    fn parent_of(&self, class_name: &str) -> Option<String>;

    /// The type of a named member (field or method, flattened across the
    /// parent chain; the first match nearest `class_name` wins), if any.
    fn member_type(&self, class_name: &str, member: &str) -> Option<Type>;
}

/// `A` transitively extends `B` (or `A == B`).
pub fn is_subclass(hierarchy: &dyn ClassHierarchy, a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let mut current = a.to_string();
    let mut guard = 0usize;
    while let Some(parent) = hierarchy.parent_of(&current) {
        if parent == b {
            return true;
        }
        current = parent;
        guard += 1;
        if guard > 1024 {
            // Parent chains are checker-validated to be acyclic; this bound
            // only guards against a checker bug, never legitimate input.
            return false;
        }
    }
    false
}

/// `assignable(from, to)`: (i) identical, (ii) `Int -> Float`, (iii) `Null`
/// into any reference type, (iv) nominal subclass -> superclass.
pub fn assignable(hierarchy: &dyn ClassHierarchy, from: &Type, to: &Type) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (Type::Int, Type::Float) => true,
        (Type::Null, other) => other.is_reference(),
        (Type::Class(a), Type::Class(b)) => is_subclass(hierarchy, a, b),
        (Type::Array(a), Type::Array(b)) => a == b,
        _ => false,
    }
}

/// Walks the parent chain for `class_name` looking for `member`.
pub fn member_lookup(hierarchy: &dyn ClassHierarchy, class_name: &str, member: &str) -> Option<Type> {
    if let Some(t) = hierarchy.member_type(class_name, member) {
        return Some(t);
    }
    let mut current = class_name.to_string();
    let mut guard = 0usize;
    while let Some(parent) = hierarchy.parent_of(&current) {
        if let Some(t) = hierarchy.member_type(&parent, member) {
            return Some(t);
        }
        current = parent;
        guard += 1;
        if guard > 1024 {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeHierarchy {
        parents: HashMap<String, String>,
        members: HashMap<(String, String), Type>,
    }

    impl ClassHierarchy for FakeHierarchy {
        fn parent_of(&self, class_name: &str) -> Option<String> {
            self.parents.get(class_name).cloned()
        }

        fn member_type(&self, class_name: &str, member: &str) -> Option<Type> {
            self.members.get(&(class_name.to_string(), member.to_string())).cloned()
        }
    }

    fn animal_dog_hierarchy() -> FakeHierarchy {
        let mut parents = HashMap::new();
        parents.insert("Dog".to_string(), "Animal".to_string());
        let mut members = HashMap::new();
        members.insert(("Animal".to_string(), "name".to_string()), Type::String);
        FakeHierarchy { parents, members }
    }

    #[test]
    fn subclass_transitive() {
        let h = animal_dog_hierarchy();
        assert!(is_subclass(&h, "Dog", "Animal"));
        assert!(is_subclass(&h, "Dog", "Dog"));
        assert!(!is_subclass(&h, "Animal", "Dog"));
    }

    #[test]
    fn assignable_null_to_reference() {
        let h = animal_dog_hierarchy();
        assert!(assignable(&h, &Type::Null, &Type::class("Dog")));
        assert!(assignable(&h, &Type::Null, &Type::array(Type::Int)));
        assert!(!assignable(&h, &Type::Null, &Type::Int));
    }

    #[test]
    fn assignable_int_to_float_only_one_way() {
        let h = animal_dog_hierarchy();
        assert!(assignable(&h, &Type::Int, &Type::Float));
        assert!(!assignable(&h, &Type::Float, &Type::Int));
    }

    #[test]
    fn member_lookup_inherits_from_parent() {
        let h = animal_dog_hierarchy();
        assert_eq!(member_lookup(&h, "Dog", "name"), Some(Type::String));
        assert_eq!(member_lookup(&h, "Dog", "bark"), None);
    }
}
