//! Generator-internal failure modes. These should never surface for a
//! program that already passed `compiscript_checker::check` with no
//! errors — they exist to fail loudly rather than panic if that
//! precondition is ever violated (§4.5 "the generator assumes a
//! diagnostics-free tree").

use compiscript_common::Span;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TacError {
    #[error("{span:?}: reference to undeclared symbol '{name}'")]
    UndeclaredSymbol { name: String, span: Span },

    #[error("{span:?}: 'this' used outside of a method body")]
    ThisOutsideMethod { span: Span },

    #[error("{span:?}: method '{method}' has no defining class in the hierarchy for '{class}'")]
    UnresolvedMethod { class: String, method: String, span: Span },

    #[error("{span:?}: array length of '{name}' could not be determined for 'foreach' lowering")]
    UnknownArrayLength { name: String, span: Span },
}
