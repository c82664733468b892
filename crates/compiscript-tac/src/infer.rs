//! A diagnostics-free re-derivation of an expression's static type, used
//! only where a lowering rule actually needs one: qualifying a method call
//! to its defining class, rendering an array literal's element type, and
//! joining ternary/array-literal branches. Mirrors
//! `compiscript_checker`'s expression typing (its `expr.rs`) minus the
//! diagnostics — by generation time the tree has already passed `check()`
//! clean, so every lookup here is assumed to succeed.

use compiscript_parser::{BinaryOp, Expr, Literal, UnaryOp};
use compiscript_symbols::{Symbol, SymbolTable};
use compiscript_types::{self as types, promotion, Type};

pub(crate) fn infer_type(table: &SymbolTable, class_stack: &[String], expr: &Expr) -> Type {
    match expr {
        Expr::Literal(lit, _) => literal_type(lit),
        Expr::Identifier(name, _) => table.lookup(name).map(|id| table.symbol(id).value_type()).unwrap_or(Type::Void),
        Expr::Unary(op, operand, _) => match op {
            UnaryOp::Not => Type::Bool,
            UnaryOp::Neg => infer_type(table, class_stack, operand),
        },
        Expr::Binary(op, lhs, rhs, _) => infer_binary(table, class_stack, *op, lhs, rhs),
        Expr::Call(callee, _, _) => infer_call_return(table, class_stack, callee),
        Expr::Member(obj, field, _) => {
            let obj_ty = infer_type(table, class_stack, obj);
            match obj_ty.as_class_name() {
                Some(class_name) => types::member_lookup(table, class_name, field).unwrap_or(Type::Void),
                None => Type::Void,
            }
        }
        Expr::Index(arr, _, _) => match infer_type(table, class_stack, arr) {
            Type::Array(elem) => *elem,
            _ => Type::Void,
        },
        Expr::This(_) => class_stack.last().map(|c| Type::class(c.clone())).unwrap_or(Type::Void),
        Expr::New(class_name, _, _) => Type::class(class_name.clone()),
        Expr::ArrayLit(elems, _) => {
            let mut iter = elems.iter().map(|e| infer_type(table, class_stack, e));
            let Some(first) = iter.next() else { return Type::array(Type::Void) };
            let joined = iter.fold(first, |acc, t| promotion::join(&acc, &t).unwrap_or(acc));
            Type::array(joined)
        }
        Expr::Assign(lhs, _, _) => infer_type(table, class_stack, lhs),
        Expr::Ternary(_, then_e, else_e, _) => {
            let then_ty = infer_type(table, class_stack, then_e);
            let else_ty = infer_type(table, class_stack, else_e);
            promotion::join(&then_ty, &else_ty).unwrap_or(then_ty)
        }
    }
}

fn infer_binary(table: &SymbolTable, class_stack: &[String], op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Type {
    use BinaryOp::*;
    match op {
        Lt | LtEq | Gt | GtEq | EqEq | BangEq | AndAnd | OrOr => Type::Bool,
        Add | Sub | Mul | Div | Mod => {
            let lt = infer_type(table, class_stack, lhs);
            let rt = infer_type(table, class_stack, rhs);
            promotion::promote_binary(&lt, &rt, op == Add).map(|(_, result)| result).unwrap_or(lt)
        }
    }
}

fn infer_call_return(table: &SymbolTable, class_stack: &[String], callee: &Expr) -> Type {
    match callee {
        Expr::Identifier(name, _) => match table.lookup(name).map(|id| table.symbol(id).clone()) {
            Some(Symbol::Function(f)) => f.return_type,
            Some(Symbol::Builtin(b)) => *b.signature.return_type,
            _ => Type::Void,
        },
        Expr::Member(obj, field, _) => {
            let obj_ty = infer_type(table, class_stack, obj);
            match obj_ty.as_class_name() {
                Some(class_name) => match types::member_lookup(table, class_name, field) {
                    Some(Type::Function(sig)) => *sig.return_type,
                    _ => Type::Void,
                },
                None => Type::Void,
            }
        }
        _ => Type::Void,
    }
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::Int,
        Literal::Float(_) => Type::Float,
        Literal::Str(_) => Type::String,
        Literal::Bool(_) => Type::Bool,
        Literal::Null => Type::Null,
    }
}
