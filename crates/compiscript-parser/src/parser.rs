//! Recursive-descent parser with precedence climbing for expressions
//! (§4.7). A parse error pushes a `SyntaxError` diagnostic and
//! synchronizes to the next statement boundary instead of aborting,
//! mirroring the checker's own "never throws, always collects" style.

use crate::ast::*;
use compiscript_common::{DiagnosticBag, DiagnosticCode, Span};
use compiscript_scanner::{Scanner, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: DiagnosticBag,
}

/// Parses a full Compiscript source file into a `Program` plus any
/// diagnostics collected while scanning and parsing.
pub fn parse(source: &str) -> (Program, DiagnosticBag) {
    let (tokens, scan_diagnostics) = Scanner::new(source).scan();
    let mut parser = Parser { tokens, pos: 0, diagnostics: scan_diagnostics };
    let program = parser.parse_program();
    (program, parser.diagnostics)
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check_advance(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Token {
        if self.at(kind) {
            self.advance()
        } else {
            let tok = self.peek().clone();
            self.diagnostics.error(
                DiagnosticCode::SyntaxError,
                format!("expected {what}, found '{}'", tok.text),
                tok.span,
            );
            tok
        }
    }

    /// Skip tokens until the next statement boundary so a single syntax
    /// error does not abort the rest of the parse.
    fn synchronize(&mut self) {
        while !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if matches!(
                self.peek_kind(),
                TokenKind::RBrace
                    | TokenKind::Let
                    | TokenKind::Const
                    | TokenKind::Function
                    | TokenKind::Class
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::For
                    | TokenKind::Return
            ) {
                return;
            }
            self.advance();
        }
    }

    fn parse_program(&mut self) -> Program {
        let mut items = Vec::new();
        while !self.at(TokenKind::Eof) {
            items.push(self.parse_stmt());
        }
        Program { items }
    }

    fn parse_type(&mut self) -> TypeAnnotation {
        let tok = self.advance();
        let name = match tok.kind {
            TokenKind::Integer => "integer".to_string(),
            TokenKind::Float => "float".to_string(),
            TokenKind::Boolean => "boolean".to_string(),
            TokenKind::StringType => "string".to_string(),
            TokenKind::Void => "void".to_string(),
            TokenKind::Identifier => tok.text.clone(),
            _ => {
                self.diagnostics.error(
                    DiagnosticCode::SyntaxError,
                    format!("expected a type, found '{}'", tok.text),
                    tok.span,
                );
                tok.text.clone()
            }
        };
        let mut ty = TypeAnnotation::Named(name, tok.span);
        while self.at(TokenKind::LBracket) {
            let lb = self.advance();
            let rb = self.expect(TokenKind::RBracket, "]");
            let span = lb.span.merge(rb.span);
            ty = TypeAnnotation::Array(Box::new(ty), span);
        }
        ty
    }

    fn parse_stmt(&mut self) -> Stmt {
        match self.peek_kind() {
            TokenKind::Let => Stmt::VarDecl(self.parse_var_decl(false)),
            TokenKind::Const => Stmt::VarDecl(self.parse_var_decl(true)).into_const(),
            TokenKind::Function => Stmt::FuncDecl(self.parse_func_decl()),
            TokenKind::Class => Stmt::ClassDecl(self.parse_class_decl()),
            TokenKind::LBrace => Stmt::Block(self.parse_block()),
            TokenKind::If => Stmt::If(self.parse_if()),
            TokenKind::While => Stmt::While(self.parse_while()),
            TokenKind::Do => Stmt::DoWhile(self.parse_do_while()),
            TokenKind::For => Stmt::For(self.parse_for()),
            TokenKind::Foreach => Stmt::Foreach(self.parse_foreach()),
            TokenKind::Switch => Stmt::Switch(self.parse_switch()),
            TokenKind::Break => {
                let span = self.advance().span;
                self.expect(TokenKind::Semicolon, ";");
                Stmt::Break(span)
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                self.expect(TokenKind::Semicolon, ";");
                Stmt::Continue(span)
            }
            TokenKind::Return => Stmt::Return(self.parse_return()),
            TokenKind::Print => Stmt::Print(self.parse_print()),
            _ => Stmt::ExprStmt(self.parse_expr_stmt()),
        }
    }

    fn parse_var_decl(&mut self, is_const: bool) -> VarDeclStmt {
        let start = self.advance().span; // `let` or `const`
        let name_tok = self.expect(TokenKind::Identifier, "an identifier");
        let declared_type = if self.check_advance(TokenKind::Colon) { Some(self.parse_type()) } else { None };
        let init = if self.check_advance(TokenKind::Eq) { Some(self.parse_expr()) } else { None };
        if is_const && init.is_none() {
            self.diagnostics.error(
                DiagnosticCode::SyntaxError,
                "const declarations require an initializer",
                name_tok.span,
            );
        }
        let end = self.expect(TokenKind::Semicolon, ";").span;
        VarDeclStmt { name: name_tok.text, declared_type, init, span: start.merge(end) }
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let name_tok = self.expect(TokenKind::Identifier, "a parameter name");
                self.expect(TokenKind::Colon, ":");
                let param_type = self.parse_type();
                let span = name_tok.span.merge(param_type.span());
                params.push(Param { name: name_tok.text, param_type, span });
                if !self.check_advance(TokenKind::Comma) {
                    break;
                }
            }
        }
        params
    }

    fn parse_func_decl(&mut self) -> FuncDeclStmt {
        let start = self.advance().span; // `function`
        let name_tok = self.expect(TokenKind::Identifier, "a function name");
        self.expect(TokenKind::LParen, "(");
        let params = self.parse_params();
        self.expect(TokenKind::RParen, ")");
        let return_type = if self.check_advance(TokenKind::Colon) { Some(self.parse_type()) } else { None };
        let body = self.parse_block();
        let span = start.merge(body.span);
        FuncDeclStmt { name: name_tok.text, params, return_type, body, span }
    }

    fn parse_class_decl(&mut self) -> ClassDeclStmt {
        let start = self.advance().span; // `class`
        let name_tok = self.expect(TokenKind::Identifier, "a class name");
        let parent = if self.check_advance(TokenKind::Extends) {
            Some(self.expect(TokenKind::Identifier, "a parent class name").text)
        } else {
            None
        };
        self.expect(TokenKind::LBrace, "{");
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.peek_kind() {
                TokenKind::Let => {
                    let field_start = self.advance().span;
                    let field_name = self.expect(TokenKind::Identifier, "a field name");
                    self.expect(TokenKind::Colon, ":");
                    let field_type = self.parse_type();
                    let end = self.expect(TokenKind::Semicolon, ";").span;
                    members.push(ClassMember::Field(FieldDecl {
                        name: field_name.text,
                        field_type,
                        span: field_start.merge(end),
                    }));
                }
                TokenKind::Function => {
                    members.push(ClassMember::Method(MethodDecl { func: self.parse_func_decl() }));
                }
                _ => {
                    let tok = self.peek().clone();
                    self.diagnostics.error(
                        DiagnosticCode::SyntaxError,
                        format!("expected a field or method declaration, found '{}'", tok.text),
                        tok.span,
                    );
                    self.synchronize();
                }
            }
        }
        let end = self.expect(TokenKind::RBrace, "}").span;
        ClassDeclStmt { name: name_tok.text, parent, members, span: start.merge(end) }
    }

    fn parse_block(&mut self) -> Block {
        let start = self.expect(TokenKind::LBrace, "{").span;
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            stmts.push(self.parse_stmt());
        }
        let end = self.expect(TokenKind::RBrace, "}").span;
        Block { stmts, span: start.merge(end) }
    }

    fn parse_if(&mut self) -> IfStmt {
        let start = self.advance().span; // `if`
        self.expect(TokenKind::LParen, "(");
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen, ")");
        let then_branch = Box::new(self.parse_stmt());
        let else_branch = if self.check_advance(TokenKind::Else) { Some(Box::new(self.parse_stmt())) } else { None };
        let end = else_branch.as_ref().map_or(then_branch.span(), |s| s.span());
        IfStmt { cond, then_branch, else_branch, span: start.merge(end) }
    }

    fn parse_while(&mut self) -> WhileStmt {
        let start = self.advance().span; // `while`
        self.expect(TokenKind::LParen, "(");
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen, ")");
        let body = Box::new(self.parse_stmt());
        let span = start.merge(body.span());
        WhileStmt { cond, body, span }
    }

    fn parse_do_while(&mut self) -> DoWhileStmt {
        let start = self.advance().span; // `do`
        let body = Box::new(self.parse_stmt());
        self.expect(TokenKind::While, "while");
        self.expect(TokenKind::LParen, "(");
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen, ")");
        let end = self.expect(TokenKind::Semicolon, ";").span;
        DoWhileStmt { body, cond, span: start.merge(end) }
    }

    fn parse_for(&mut self) -> ForStmt {
        let start = self.advance().span; // `for`
        self.expect(TokenKind::LParen, "(");
        let init = match self.peek_kind() {
            TokenKind::Semicolon => ForInit::None,
            TokenKind::Let => ForInit::VarDecl(self.parse_var_decl(false)),
            _ => ForInit::Expr(self.parse_expr()),
        };
        if !matches!(init, ForInit::VarDecl(_)) {
            self.expect(TokenKind::Semicolon, ";");
        }
        let cond = if self.at(TokenKind::Semicolon) { None } else { Some(self.parse_expr()) };
        self.expect(TokenKind::Semicolon, ";");
        let step = if self.at(TokenKind::RParen) { None } else { Some(self.parse_expr()) };
        self.expect(TokenKind::RParen, ")");
        let body = Box::new(self.parse_stmt());
        let span = start.merge(body.span());
        ForStmt { init, cond, step, body, span }
    }

    fn parse_foreach(&mut self) -> ForeachStmt {
        let start = self.advance().span; // `foreach`
        self.expect(TokenKind::LParen, "(");
        let binding = self.expect(TokenKind::Identifier, "a binding name").text;
        self.expect(TokenKind::In, "in");
        let iterable = self.parse_expr();
        self.expect(TokenKind::RParen, ")");
        let body = Box::new(self.parse_stmt());
        let span = start.merge(body.span());
        ForeachStmt { binding, iterable, body, span }
    }

    fn parse_switch(&mut self) -> SwitchStmt {
        let start = self.advance().span; // `switch`
        self.expect(TokenKind::LParen, "(");
        let discriminant = self.parse_expr();
        self.expect(TokenKind::RParen, ")");
        self.expect(TokenKind::LBrace, "{");
        let mut cases = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let case_start = self.peek().span;
            let value = if self.check_advance(TokenKind::Case) {
                let v = self.parse_expr();
                Some(v)
            } else {
                self.expect(TokenKind::Default, "'case' or 'default'");
                None
            };
            self.expect(TokenKind::Colon, ":");
            let mut body = Vec::new();
            while !matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof)
            {
                body.push(self.parse_stmt());
            }
            let case_end = body.last().map_or(case_start, |s| s.span());
            cases.push(CaseArm { value, body, span: case_start.merge(case_end) });
        }
        let end = self.expect(TokenKind::RBrace, "}").span;
        SwitchStmt { discriminant, cases, span: start.merge(end) }
    }

    fn parse_return(&mut self) -> ReturnStmt {
        let start = self.advance().span; // `return`
        let value = if self.at(TokenKind::Semicolon) { None } else { Some(self.parse_expr()) };
        let end = self.expect(TokenKind::Semicolon, ";").span;
        ReturnStmt { value, span: start.merge(end) }
    }

    fn parse_print(&mut self) -> PrintStmt {
        let start = self.advance().span; // `print`
        self.expect(TokenKind::LParen, "(");
        let expr = self.parse_expr();
        self.expect(TokenKind::RParen, ")");
        let end = self.expect(TokenKind::Semicolon, ";").span;
        PrintStmt { expr, span: start.merge(end) }
    }

    fn parse_expr_stmt(&mut self) -> ExprStmt {
        let expr = self.parse_expr();
        let end = self.expect(TokenKind::Semicolon, ";").span;
        let span = expr.span().merge(end);
        ExprStmt { expr, span }
    }

    // ---- expressions, lowest to highest precedence ----

    fn parse_expr(&mut self) -> Expr {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expr {
        let lhs = self.parse_ternary();
        if self.at(TokenKind::Eq) {
            self.advance();
            let rhs = self.parse_assignment();
            let span = lhs.span().merge(rhs.span());
            return Expr::Assign(Box::new(lhs), Box::new(rhs), span);
        }
        lhs
    }

    fn parse_ternary(&mut self) -> Expr {
        let cond = self.parse_or();
        if self.check_advance(TokenKind::Question) {
            let then_expr = self.parse_expr();
            self.expect(TokenKind::Colon, ":");
            let else_expr = self.parse_ternary();
            let span = cond.span().merge(else_expr.span());
            return Expr::Ternary(Box::new(cond), Box::new(then_expr), Box::new(else_expr), span);
        }
        cond
    }

    fn parse_or(&mut self) -> Expr {
        let mut lhs = self.parse_and();
        while self.check_advance(TokenKind::PipePipe) {
            let rhs = self.parse_and();
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryOp::OrOr, Box::new(lhs), Box::new(rhs), span);
        }
        lhs
    }

    fn parse_and(&mut self) -> Expr {
        let mut lhs = self.parse_equality();
        while self.check_advance(TokenKind::AmpAmp) {
            let rhs = self.parse_equality();
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryOp::AndAnd, Box::new(lhs), Box::new(rhs), span);
        }
        lhs
    }

    fn parse_equality(&mut self) -> Expr {
        let mut lhs = self.parse_relational();
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::EqEq,
                TokenKind::BangEq => BinaryOp::BangEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational();
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), span);
        }
        lhs
    }

    fn parse_relational(&mut self) -> Expr {
        let mut lhs = self.parse_additive();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive();
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), span);
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative();
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), span);
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary();
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), span);
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.parse_unary();
            let span = start.merge(operand.span());
            return Expr::Unary(op, Box::new(operand), span);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect(TokenKind::Identifier, "a member name");
                    let span = expr.span().merge(field.span);
                    expr = Expr::Member(Box::new(expr), field.text, span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr();
                    let end = self.expect(TokenKind::RBracket, "]").span;
                    let span = expr.span().merge(end);
                    expr = Expr::Index(Box::new(expr), Box::new(index), span);
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_args();
                    let end = self.expect(TokenKind::RParen, ")").span;
                    let span = expr.span().merge(end);
                    expr = Expr::Call(Box::new(expr), args, span);
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr());
                if !self.check_advance(TokenKind::Comma) {
                    break;
                }
            }
        }
        args
    }

    fn parse_primary(&mut self) -> Expr {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value: i64 = tok.text.parse().unwrap_or(0);
                Expr::Literal(Literal::Int(value), tok.span)
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let value: f64 = tok.text.parse().unwrap_or(0.0);
                Expr::Literal(Literal::Float(value), tok.span)
            }
            TokenKind::StringLiteral => {
                self.advance();
                Expr::Literal(Literal::Str(tok.text), tok.span)
            }
            TokenKind::True => {
                self.advance();
                Expr::Literal(Literal::Bool(true), tok.span)
            }
            TokenKind::False => {
                self.advance();
                Expr::Literal(Literal::Bool(false), tok.span)
            }
            TokenKind::Null => {
                self.advance();
                Expr::Literal(Literal::Null, tok.span)
            }
            TokenKind::This => {
                self.advance();
                Expr::This(tok.span)
            }
            TokenKind::Identifier => {
                self.advance();
                Expr::Identifier(tok.text, tok.span)
            }
            TokenKind::New => {
                self.advance();
                let name = self.expect(TokenKind::Identifier, "a class name").text;
                self.expect(TokenKind::LParen, "(");
                let args = self.parse_args();
                let end = self.expect(TokenKind::RParen, ")").span;
                Expr::New(name, args, tok.span.merge(end))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(TokenKind::RParen, ")");
                inner
            }
            TokenKind::LBracket => {
                self.advance();
                let elems = self.parse_args();
                let end = self.expect(TokenKind::RBracket, "]").span;
                Expr::ArrayLit(elems, tok.span.merge(end))
            }
            _ => {
                self.diagnostics.error(
                    DiagnosticCode::SyntaxError,
                    format!("expected an expression, found '{}'", tok.text),
                    tok.span,
                );
                self.advance();
                Expr::Literal(Literal::Null, tok.span)
            }
        }
    }
}

trait IntoConst {
    fn into_const(self) -> Stmt;
}

impl IntoConst for Stmt {
    fn into_const(self) -> Stmt {
        match self {
            Stmt::VarDecl(v) => Stmt::ConstDecl(v),
            other => other,
        }
    }
}
