//! Resolves a parsed `TypeAnnotation` to the `Type` it denotes.

use crate::Checker;
use compiscript_common::DiagnosticCode;
use compiscript_parser::TypeAnnotation;
use compiscript_types::Type;

impl Checker {
    /// Unknown type names (including forward references to classes that
    /// turn out never to be declared) report `UnknownSymbol` and resolve
    /// to `Void` so the caller can keep checking without cascading.
    pub(crate) fn resolve_type(&mut self, annotation: &TypeAnnotation) -> Type {
        match annotation {
            TypeAnnotation::Named(name, span) => match name.as_str() {
                "integer" => Type::Int,
                "float" => Type::Float,
                "boolean" => Type::Bool,
                "string" => Type::String,
                "void" => Type::Void,
                other => {
                    if self.table.class_exists(other) {
                        Type::class(other)
                    } else {
                        self.diags.error(DiagnosticCode::UnknownSymbol, format!("unknown type '{other}'"), *span);
                        Type::Void
                    }
                }
            },
            TypeAnnotation::Array(elem, _) => Type::array(self.resolve_type(elem)),
        }
    }
}
