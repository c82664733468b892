//! Expression typing (§4.1). Every rule type-checks its operands first
//! (even when the operator itself turns out to be misapplied) so later
//! expressions in the same statement still get checked — the checker never
//! stops at the first error.

use crate::Checker;
use compiscript_common::{DiagnosticCode, Span};
use compiscript_parser::{BinaryOp, Expr, Literal, UnaryOp};
use compiscript_symbols::Symbol;
use compiscript_types::{self as types, promotion, Type};

impl Checker {
    pub(crate) fn check_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Literal(lit, _) => check_literal(lit),
            Expr::Identifier(name, span) => self.check_identifier(name, *span),
            Expr::Unary(op, operand, span) => self.check_unary(*op, operand, *span),
            Expr::Binary(op, lhs, rhs, span) => self.check_binary(*op, lhs, rhs, *span),
            Expr::Call(callee, args, span) => self.check_call(callee, args, *span),
            Expr::Member(obj, field, span) => self.check_member(obj, field, *span),
            Expr::Index(arr, idx, span) => self.check_index(arr, idx, *span),
            Expr::This(span) => self.check_this(*span),
            Expr::New(class_name, args, span) => self.check_new(class_name, args, *span),
            Expr::ArrayLit(elems, span) => self.check_array_lit(elems, *span),
            Expr::Assign(lhs, rhs, span) => self.check_assign(lhs, rhs, *span),
            Expr::Ternary(cond, then_e, else_e, span) => self.check_ternary(cond, then_e, else_e, *span),
        }
    }

    fn check_identifier(&mut self, name: &str, span: Span) -> Type {
        match self.table.lookup(name) {
            Some(id) => self.table.symbol(id).value_type(),
            None => {
                self.diags.error(DiagnosticCode::UnknownSymbol, format!("unknown identifier '{name}'"), span);
                Type::Void
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Type {
        let ty = self.check_expr(operand);
        match op {
            UnaryOp::Neg if ty.is_numeric() => ty,
            UnaryOp::Neg => {
                self.diags.error(DiagnosticCode::NotNumeric, format!("unary '-' requires a numeric operand, found {ty}"), span);
                Type::Void
            }
            UnaryOp::Not if ty == Type::Bool => Type::Bool,
            UnaryOp::Not => {
                self.diags.error(DiagnosticCode::NotBoolean, format!("unary '!' requires a boolean operand, found {ty}"), span);
                Type::Bool
            }
        }
    }

    fn check_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: Span) -> Type {
        let lt = self.check_expr(lhs);
        let rt = self.check_expr(rhs);
        use BinaryOp::*;
        match op {
            Add | Sub | Mul | Div | Mod => match promotion::promote_binary(&lt, &rt, op == Add) {
                Ok((_, result)) => result,
                Err(_) => {
                    self.diags.error(DiagnosticCode::NotNumeric, format!("operator requires numeric operands, found {lt} and {rt}"), span);
                    Type::Void
                }
            },
            Lt | LtEq | Gt | GtEq => match promotion::unify_relational(&lt, &rt) {
                Ok(t) => t,
                Err(_) => {
                    self.diags.error(DiagnosticCode::NotComparable, format!("operands are not comparable ({lt} vs {rt})"), span);
                    Type::Bool
                }
            },
            EqEq | BangEq => match promotion::unify_equality(&lt, &rt) {
                Ok(t) => t,
                Err(_) => {
                    self.diags.error(DiagnosticCode::TypeMismatch, format!("cannot compare {lt} with {rt}"), span);
                    Type::Bool
                }
            },
            AndAnd | OrOr => {
                if lt != Type::Bool {
                    self.diags.error(DiagnosticCode::NotBoolean, format!("left operand of a logical operator must be boolean, found {lt}"), span);
                }
                if rt != Type::Bool {
                    self.diags.error(DiagnosticCode::NotBoolean, format!("right operand of a logical operator must be boolean, found {rt}"), span);
                }
                Type::Bool
            }
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Type {
        let sig = match callee {
            Expr::Identifier(name, id_span) => match self.table.lookup(name) {
                Some(id) => match self.table.symbol(id).value_type() {
                    Type::Function(sig) => Some(sig),
                    other => {
                        self.diags.error(DiagnosticCode::TypeMismatch, format!("'{name}' has type {other} and is not callable"), *id_span);
                        None
                    }
                },
                None => {
                    self.diags.error(DiagnosticCode::UnknownSymbol, format!("unknown identifier '{name}'"), *id_span);
                    None
                }
            },
            Expr::Member(obj, field, member_span) => {
                let obj_ty = self.check_expr(obj);
                match &obj_ty {
                    Type::Class(class_name) => match types::member_lookup(&self.table, class_name, field) {
                        Some(Type::Function(sig)) => Some(sig),
                        Some(other) => {
                            self.diags.error(DiagnosticCode::TypeMismatch, format!("'{field}' has type {other} and is not callable"), *member_span);
                            None
                        }
                        None => {
                            self.diags.error(DiagnosticCode::UnknownMember, format!("unknown member '{field}' on class '{class_name}'"), *member_span);
                            None
                        }
                    },
                    other => {
                        self.diags.error(DiagnosticCode::TypeMismatch, format!("cannot call a method on non-class type {other}"), *member_span);
                        None
                    }
                }
            }
            other => {
                let ty = self.check_expr(other);
                self.diags.error(DiagnosticCode::TypeMismatch, format!("value of type {ty} is not callable"), other.span());
                None
            }
        };

        let arg_types: Vec<Type> = args.iter().map(|a| self.check_expr(a)).collect();

        let Some(sig) = sig else { return Type::Void };

        if sig.params.len() != arg_types.len() {
            self.diags.error(
                DiagnosticCode::ArityMismatch,
                format!("expected {} argument(s), found {}", sig.params.len(), arg_types.len()),
                span,
            );
            return *sig.return_type;
        }
        for (i, (param_ty, arg_ty)) in sig.params.iter().zip(arg_types.iter()).enumerate() {
            if !types::assignable(&self.table, arg_ty, param_ty) {
                self.diags.error(
                    DiagnosticCode::TypeMismatch,
                    format!("argument {} expected {param_ty}, found {arg_ty}", i + 1),
                    span,
                );
            }
        }
        *sig.return_type
    }

    fn check_member(&mut self, obj: &Expr, field: &str, span: Span) -> Type {
        let obj_ty = self.check_expr(obj);
        match &obj_ty {
            Type::Class(class_name) => match types::member_lookup(&self.table, class_name, field) {
                Some(ty) => ty,
                None => {
                    self.diags.error(DiagnosticCode::UnknownMember, format!("unknown member '{field}' on class '{class_name}'"), span);
                    Type::Void
                }
            },
            other => {
                self.diags.error(DiagnosticCode::TypeMismatch, format!("cannot access member '{field}' on non-class type {other}"), span);
                Type::Void
            }
        }
    }

    fn check_index(&mut self, arr: &Expr, idx: &Expr, span: Span) -> Type {
        let arr_ty = self.check_expr(arr);
        let idx_ty = self.check_expr(idx);
        if idx_ty != Type::Int {
            self.diags.error(DiagnosticCode::TypeMismatch, format!("array index must be an integer, found {idx_ty}"), span);
        }
        match arr_ty {
            Type::Array(elem) => *elem,
            other => {
                self.diags.error(DiagnosticCode::TypeMismatch, format!("cannot index non-array type {other}"), span);
                Type::Void
            }
        }
    }

    fn check_this(&mut self, span: Span) -> Type {
        match self.class_stack.last() {
            Some(class_name) => Type::class(class_name.clone()),
            None => {
                self.diags.error(DiagnosticCode::UnknownSymbol, "'this' is only valid inside a method", span);
                Type::Void
            }
        }
    }

    fn check_new(&mut self, class_name: &str, args: &[Expr], span: Span) -> Type {
        if !self.table.class_exists(class_name) {
            self.diags.error(DiagnosticCode::UnknownSymbol, format!("unknown class '{class_name}'"), span);
            for a in args {
                self.check_expr(a);
            }
            return Type::Void;
        }
        let ctor = types::member_lookup(&self.table, class_name, "constructor");
        let arg_types: Vec<Type> = args.iter().map(|a| self.check_expr(a)).collect();
        match ctor {
            Some(Type::Function(sig)) => {
                if sig.params.len() != arg_types.len() {
                    self.diags.error(
                        DiagnosticCode::BadConstructor,
                        format!("constructor for '{class_name}' expects {} argument(s), found {}", sig.params.len(), arg_types.len()),
                        span,
                    );
                } else {
                    for (i, (p, a)) in sig.params.iter().zip(arg_types.iter()).enumerate() {
                        if !types::assignable(&self.table, a, p) {
                            self.diags.error(
                                DiagnosticCode::BadConstructor,
                                format!("constructor argument {} expected {p}, found {a}", i + 1),
                                span,
                            );
                        }
                    }
                }
            }
            _ => {
                if !arg_types.is_empty() {
                    self.diags.error(
                        DiagnosticCode::BadConstructor,
                        format!("class '{class_name}' has no declared constructor but {} argument(s) were given", arg_types.len()),
                        span,
                    );
                }
            }
        }
        Type::class(class_name)
    }

    fn check_array_lit(&mut self, elems: &[Expr], span: Span) -> Type {
        if elems.is_empty() {
            self.diags.error(DiagnosticCode::TypeMismatch, "cannot infer the element type of an empty array literal", span);
            return Type::array(Type::Void);
        }
        let mut elem_type = self.check_expr(&elems[0]);
        for e in &elems[1..] {
            let t = self.check_expr(e);
            match promotion::join(&elem_type, &t) {
                Some(joined) => elem_type = joined,
                None => {
                    self.diags.error(
                        DiagnosticCode::TypeMismatch,
                        format!("array elements must share a common type, found {elem_type} and {t}"),
                        span,
                    );
                }
            }
        }
        Type::array(elem_type)
    }

    fn check_assign(&mut self, lhs: &Expr, rhs: &Expr, span: Span) -> Type {
        let rhs_ty = self.check_expr(rhs);
        let lhs_ty = match lhs {
            Expr::Identifier(name, id_span) => match self.table.lookup(name) {
                Some(id) => match self.table.symbol(id) {
                    Symbol::Variable(v) => {
                        if v.is_const {
                            self.diags.error(DiagnosticCode::AssignToConst, format!("cannot assign to const '{name}'"), span);
                        }
                        v.ty.clone()
                    }
                    Symbol::Parameter(p) => p.ty.clone(),
                    _ => {
                        self.diags.error(DiagnosticCode::InvalidLValue, format!("'{name}' is not an assignable location"), *id_span);
                        Type::Void
                    }
                },
                None => {
                    self.diags.error(DiagnosticCode::UnknownSymbol, format!("unknown identifier '{name}'"), *id_span);
                    Type::Void
                }
            },
            Expr::Member(obj, field, member_span) => self.check_member(obj, field, *member_span),
            Expr::Index(arr, idx, idx_span) => self.check_index(arr, idx, *idx_span),
            other => {
                self.diags.error(
                    DiagnosticCode::InvalidLValue,
                    "the left-hand side of an assignment must be a variable, field, or array element",
                    other.span(),
                );
                self.check_expr(other);
                Type::Void
            }
        };
        if lhs_ty != Type::Void && !types::assignable(&self.table, &rhs_ty, &lhs_ty) {
            self.diags.error(DiagnosticCode::TypeMismatch, format!("cannot assign {rhs_ty} to {lhs_ty}"), span);
        }
        lhs_ty
    }

    fn check_ternary(&mut self, cond: &Expr, then_e: &Expr, else_e: &Expr, span: Span) -> Type {
        let cond_ty = self.check_expr(cond);
        if cond_ty != Type::Bool {
            self.diags.error(DiagnosticCode::NotBoolean, format!("ternary condition must be boolean, found {cond_ty}"), span);
        }
        let then_ty = self.check_expr(then_e);
        let else_ty = self.check_expr(else_e);
        match promotion::join(&then_ty, &else_ty) {
            Some(joined) => joined,
            None => {
                self.diags.error(
                    DiagnosticCode::TypeMismatch,
                    format!("ternary branches have incompatible types ({then_ty} vs {else_ty})"),
                    span,
                );
                then_ty
            }
        }
    }
}

fn check_literal(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::Int,
        Literal::Float(_) => Type::Float,
        Literal::Str(_) => Type::String,
        Literal::Bool(_) => Type::Bool,
        Literal::Null => Type::Null,
    }
}
