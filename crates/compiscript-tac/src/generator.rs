//! AST-to-TAC lowering (§4.4). Walks the same tree the checker walked,
//! after checking has already passed with zero errors — every lookup this
//! module performs is assumed to resolve.

use crate::error::TacError;
use crate::infer::infer_type;
use crate::ir::{BinOp, Instruction, Literal, Operand, TacFunction, TacProgram, UnOp};
use crate::symtab;
use compiscript_common::Span;
use compiscript_parser::{
    BinaryOp, Block, ClassDeclStmt, CaseArm, DoWhileStmt, Expr, ForInit, ForStmt, ForeachStmt, FuncDeclStmt, IfStmt, MethodDecl, Program,
    ReturnStmt, Stmt, SwitchStmt, UnaryOp, VarDeclStmt, WhileStmt,
};
use compiscript_symbols::{ParameterSymbol, ScopeKind, Symbol, SymbolTable, VariableSymbol};
use compiscript_types::Type;
use rustc_hash::{FxHashMap, FxHashSet};

/// Per-function lowering state: the instructions emitted so far and the
/// counters/maps that only make sense within one function's body.
/// Temporaries and labels are never reused across scopes, but nothing
/// requires them to be unique *across* functions either (§4.4 "Operand
/// provisioning"), so each function starts back at `t0`/`L0`.
struct FunctionLowering {
    instructions: Vec<Instruction>,
    temp_counter: u32,
    label_counter: u32,
    locals: FxHashSet<String>,
    /// `(continue_label, break_label)` per active loop; `switch` pushes a
    /// break-only frame (`None` continue label), mirroring the checker's
    /// loop stack (§4.2).
    loop_stack: Vec<(Option<String>, String)>,
    /// Known array lengths by variable name, populated when a variable is
    /// initialized directly from an array literal (§4.4 "Array literal").
    arr_len: FxHashMap<String, usize>,
}

impl FunctionLowering {
    fn new() -> Self {
        Self {
            instructions: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
            locals: FxHashSet::default(),
            loop_stack: Vec::new(),
            arr_len: FxHashMap::default(),
        }
    }

    fn new_temp(&mut self) -> Operand {
        let id = self.temp_counter;
        self.temp_counter += 1;
        Operand::Temp(id)
    }

    fn new_label(&mut self) -> String {
        let id = self.label_counter;
        self.label_counter += 1;
        format!("L{id}")
    }

    fn emit(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }

    fn bind_local(&mut self, name: &str) {
        self.locals.insert(name.to_string());
    }

    /// Skips the bridging `goto` when the preceding instruction already
    /// terminates the block (a `return` or an unconditional jump) — used so
    /// an `if`/`switch` arm that always returns doesn't leave a dead `goto`
    /// sitting right after a `ret`, which would violate "no unreachable
    /// block begins with a non-label instruction" (§8).
    fn goto_unless_terminal(&mut self, label: String) {
        if !self.instructions.last().is_some_and(Instruction::is_terminal) {
            self.emit(Instruction::Goto { label });
        }
    }
}

pub struct Generator {
    table: SymbolTable,
    class_stack: Vec<String>,
    extra_functions: Vec<TacFunction>,
}

/// Lowers a checked program to TAC (§4.4). The caller is responsible for
/// having run `compiscript_checker::check` first and confirming
/// `!diagnostics.has_errors()` (§4.5) — this function does not re-validate.
pub fn generate(program: &Program) -> Result<TacProgram, TacError> {
    let mut table = SymbolTable::new();
    symtab::declare_scope_signatures(&mut table, &program.items);
    let mut gen = Generator { table, class_stack: Vec::new(), extra_functions: Vec::new() };

    let mut functions = Vec::new();
    for item in &program.items {
        match item {
            Stmt::FuncDecl(f) => functions.push(gen.lower_function(f, None)?),
            Stmt::ClassDecl(c) => {
                for member in &c.members {
                    if let compiscript_parser::ClassMember::Method(m) = member {
                        functions.push(gen.lower_method(c, m)?);
                    }
                }
            }
            _ => {}
        }
    }

    let top_level: Vec<&Stmt> = program.items.iter().filter(|s| !matches!(s, Stmt::FuncDecl(_) | Stmt::ClassDecl(_))).collect();
    if !top_level.is_empty() {
        functions.push(gen.lower_main(&top_level)?);
    }

    functions.extend(gen.extra_functions.drain(..));
    tracing::debug!(functions = functions.len(), "generated TAC");
    Ok(TacProgram { functions })
}

impl Generator {
    fn infer_type(&self, expr: &Expr) -> Type {
        infer_type(&self.table, &self.class_stack, expr)
    }

    fn lookup_function_return_type(&self, name: &str) -> Type {
        match self.table.lookup(name).map(|id| self.table.symbol(id)) {
            Some(Symbol::Function(f)) => f.return_type.clone(),
            Some(Symbol::Builtin(b)) => (*b.signature.return_type).clone(),
            _ => Type::Void,
        }
    }

    fn emit_call(&self, fl: &mut FunctionLowering, fname: String, nargs: usize, return_type: &Type) -> Operand {
        if matches!(return_type, Type::Void) {
            fl.emit(Instruction::Call { fname, nargs, dst: None });
            Operand::Literal(Literal::Void)
        } else {
            let dst = fl.new_temp();
            fl.emit(Instruction::Call { fname, nargs, dst: Some(dst.clone()) });
            dst
        }
    }

    fn lower_function(&mut self, decl: &FuncDeclStmt, enclosing_class: Option<&str>) -> Result<TacFunction, TacError> {
        let return_type = decl.return_type.as_ref().map(symtab::resolve_type).unwrap_or(Type::Void);
        self.table.push(ScopeKind::Function);
        for (slot_index, p) in decl.params.iter().enumerate() {
            let ty = symtab::resolve_type(&p.param_type);
            let _ = self.table.declare(Symbol::Parameter(ParameterSymbol { name: p.name.clone(), ty, slot_index, span: p.span }));
        }

        let mut fl = FunctionLowering::new();
        if enclosing_class.is_some() {
            fl.bind_local("this");
        }
        for p in &decl.params {
            fl.bind_local(&p.name);
        }
        self.lower_stmt_list(&mut fl, &decl.body.stmts)?;
        if !fl.instructions.last().is_some_and(Instruction::is_terminal) {
            fl.emit(Instruction::Ret { operand: None });
        }
        self.table.pop();

        let name = match enclosing_class {
            Some(class) => format!("{class}.{}", decl.name),
            None => decl.name.clone(),
        };
        let mut params = Vec::new();
        if enclosing_class.is_some() {
            params.push("this".to_string());
        }
        params.extend(decl.params.iter().map(|p| p.name.clone()));

        Ok(TacFunction { name, params, return_type: return_type.to_string(), locals: fl.locals.len(), instructions: fl.instructions })
    }

    fn lower_method(&mut self, class: &ClassDeclStmt, method: &MethodDecl) -> Result<TacFunction, TacError> {
        self.class_stack.push(class.name.clone());
        let result = self.lower_function(&method.func, Some(&class.name));
        self.class_stack.pop();
        result
    }

    fn lower_main(&mut self, stmts: &[&Stmt]) -> Result<TacFunction, TacError> {
        let mut fl = FunctionLowering::new();
        for stmt in stmts {
            self.lower_stmt(&mut fl, stmt)?;
        }
        if !fl.instructions.last().is_some_and(Instruction::is_terminal) {
            fl.emit(Instruction::Ret { operand: None });
        }
        Ok(TacFunction {
            name: "main".to_string(),
            params: Vec::new(),
            return_type: Type::Void.to_string(),
            locals: fl.locals.len(),
            instructions: fl.instructions,
        })
    }

    fn lower_stmt_list(&mut self, fl: &mut FunctionLowering, stmts: &[Stmt]) -> Result<(), TacError> {
        symtab::declare_scope_signatures(&mut self.table, stmts);
        for stmt in stmts {
            self.lower_stmt(fl, stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, fl: &mut FunctionLowering, stmt: &Stmt) -> Result<(), TacError> {
        match stmt {
            Stmt::VarDecl(v) | Stmt::ConstDecl(v) => self.lower_var_decl(fl, v),
            Stmt::FuncDecl(f) => {
                let tf = self.lower_function(f, None)?;
                self.extra_functions.push(tf);
                Ok(())
            }
            Stmt::ClassDecl(c) => {
                for member in &c.members {
                    if let compiscript_parser::ClassMember::Method(m) = member {
                        let tf = self.lower_method(c, m)?;
                        self.extra_functions.push(tf);
                    }
                }
                Ok(())
            }
            Stmt::Block(b) => self.lower_block(fl, b),
            Stmt::If(i) => self.lower_if(fl, i),
            Stmt::While(w) => self.lower_while(fl, w),
            Stmt::DoWhile(d) => self.lower_do_while(fl, d),
            Stmt::For(f) => self.lower_for(fl, f),
            Stmt::Foreach(f) => self.lower_foreach(fl, f),
            Stmt::Switch(s) => self.lower_switch(fl, s),
            Stmt::Break(span) => {
                let (_, break_label) =
                    fl.loop_stack.last().cloned().ok_or_else(|| TacError::UndeclaredSymbol { name: "<break>".to_string(), span: *span })?;
                fl.emit(Instruction::Goto { label: break_label });
                Ok(())
            }
            Stmt::Continue(span) => {
                let label = fl
                    .loop_stack
                    .iter()
                    .rev()
                    .find_map(|(c, _)| c.clone())
                    .ok_or_else(|| TacError::UndeclaredSymbol { name: "<continue>".to_string(), span: *span })?;
                fl.emit(Instruction::Goto { label });
                Ok(())
            }
            Stmt::Return(r) => self.lower_return(fl, r),
            Stmt::ExprStmt(e) => {
                self.lower_expr(fl, &e.expr)?;
                Ok(())
            }
            Stmt::Print(p) => {
                let operand = self.lower_expr(fl, &p.expr)?;
                fl.emit(Instruction::Print { operand });
                Ok(())
            }
        }
    }

    fn lower_var_decl(&mut self, fl: &mut FunctionLowering, decl: &VarDeclStmt) -> Result<(), TacError> {
        let ty = match &decl.declared_type {
            Some(t) => symtab::resolve_type(t),
            None => decl.init.as_ref().map(|e| self.infer_type(e)).unwrap_or(Type::Void),
        };
        let value = match &decl.init {
            Some(e) => Some(self.lower_expr(fl, e)?),
            None => None,
        };
        let _ = self.table.declare(Symbol::Variable(VariableSymbol {
            name: decl.name.clone(),
            ty,
            is_const: false,
            initialized: decl.init.is_some(),
            span: decl.span,
            known_array_len: None,
        }));
        fl.bind_local(&decl.name);
        if let Some(value) = value {
            fl.emit(Instruction::Move { src: value, dst: Operand::local(decl.name.clone()) });
        }
        if let Some(Expr::ArrayLit(elems, _)) = &decl.init {
            fl.arr_len.insert(decl.name.clone(), elems.len());
        }
        Ok(())
    }

    fn lower_block(&mut self, fl: &mut FunctionLowering, block: &Block) -> Result<(), TacError> {
        self.table.push(ScopeKind::Block);
        let result = self.lower_stmt_list(fl, &block.stmts);
        self.table.pop();
        result
    }

    fn lower_if(&mut self, fl: &mut FunctionLowering, stmt: &IfStmt) -> Result<(), TacError> {
        let cond = self.lower_expr(fl, &stmt.cond)?;
        match &stmt.else_branch {
            None => {
                let l_end = fl.new_label();
                fl.emit(Instruction::IfFalse { cond, label: l_end.clone() });
                self.lower_stmt(fl, &stmt.then_branch)?;
                fl.emit(Instruction::Label { name: l_end });
            }
            Some(else_branch) => {
                let l_else = fl.new_label();
                let l_end = fl.new_label();
                fl.emit(Instruction::IfFalse { cond, label: l_else.clone() });
                self.lower_stmt(fl, &stmt.then_branch)?;
                fl.goto_unless_terminal(l_end.clone());
                fl.emit(Instruction::Label { name: l_else });
                self.lower_stmt(fl, else_branch)?;
                fl.emit(Instruction::Label { name: l_end });
            }
        }
        Ok(())
    }

    fn lower_while(&mut self, fl: &mut FunctionLowering, stmt: &WhileStmt) -> Result<(), TacError> {
        let l_test = fl.new_label();
        let l_end = fl.new_label();
        fl.emit(Instruction::Label { name: l_test.clone() });
        let cond = self.lower_expr(fl, &stmt.cond)?;
        fl.emit(Instruction::IfFalse { cond, label: l_end.clone() });
        fl.loop_stack.push((Some(l_test.clone()), l_end.clone()));
        self.lower_stmt(fl, &stmt.body)?;
        fl.loop_stack.pop();
        fl.emit(Instruction::Goto { label: l_test });
        fl.emit(Instruction::Label { name: l_end });
        Ok(())
    }

    /// `continue` inside a `do-while` must re-test the condition rather than
    /// restart the body unconditionally, so the continue target is a label
    /// placed right before the condition, distinct from the body's top.
    fn lower_do_while(&mut self, fl: &mut FunctionLowering, stmt: &DoWhileStmt) -> Result<(), TacError> {
        let l_top = fl.new_label();
        let l_cond = fl.new_label();
        let l_end = fl.new_label();
        fl.emit(Instruction::Label { name: l_top.clone() });
        fl.loop_stack.push((Some(l_cond.clone()), l_end.clone()));
        self.lower_stmt(fl, &stmt.body)?;
        fl.loop_stack.pop();
        fl.emit(Instruction::Label { name: l_cond });
        let cond = self.lower_expr(fl, &stmt.cond)?;
        fl.emit(Instruction::IfGoto { cond, label: l_top });
        fl.emit(Instruction::Label { name: l_end });
        Ok(())
    }

    fn lower_for(&mut self, fl: &mut FunctionLowering, stmt: &ForStmt) -> Result<(), TacError> {
        self.table.push(ScopeKind::Block);
        match &stmt.init {
            ForInit::VarDecl(v) => self.lower_var_decl(fl, v)?,
            ForInit::Expr(e) => {
                self.lower_expr(fl, e)?;
            }
            ForInit::None => {}
        }
        let l_top = fl.new_label();
        let l_cont = fl.new_label();
        let l_end = fl.new_label();
        fl.emit(Instruction::Label { name: l_top.clone() });
        if let Some(cond) = &stmt.cond {
            let c = self.lower_expr(fl, cond)?;
            fl.emit(Instruction::IfFalse { cond: c, label: l_end.clone() });
        }
        fl.loop_stack.push((Some(l_cont.clone()), l_end.clone()));
        self.lower_stmt(fl, &stmt.body)?;
        fl.loop_stack.pop();
        fl.emit(Instruction::Label { name: l_cont });
        if let Some(step) = &stmt.step {
            self.lower_expr(fl, step)?;
        }
        fl.emit(Instruction::Goto { label: l_top });
        fl.emit(Instruction::Label { name: l_end });
        self.table.pop();
        Ok(())
    }

    /// Desugars to an integer-indexed `for` over the array's length, tracked
    /// in `arr_len` from the initializer that produced it (§4.4).
    fn lower_foreach(&mut self, fl: &mut FunctionLowering, stmt: &ForeachStmt) -> Result<(), TacError> {
        let elem_ty = match self.infer_type(&stmt.iterable) {
            Type::Array(elem) => *elem,
            other => other,
        };
        let arr_op = self.lower_expr(fl, &stmt.iterable)?;
        let len = match &stmt.iterable {
            Expr::Identifier(name, _) => {
                *fl.arr_len.get(name).ok_or_else(|| TacError::UnknownArrayLength { name: name.clone(), span: stmt.span })?
            }
            _ => return Err(TacError::UnknownArrayLength { name: "<expression>".to_string(), span: stmt.span }),
        };

        self.table.push(ScopeKind::Block);
        let idx_name = format!("__idx_{}", stmt.binding);
        let _ = self.table.declare(Symbol::Variable(VariableSymbol {
            name: idx_name.clone(),
            ty: Type::Int,
            is_const: false,
            initialized: true,
            span: stmt.span,
            known_array_len: None,
        }));
        fl.bind_local(&idx_name);
        fl.emit(Instruction::Move { src: Operand::int(0), dst: Operand::local(idx_name.clone()) });

        let l_top = fl.new_label();
        let l_cont = fl.new_label();
        let l_end = fl.new_label();
        fl.emit(Instruction::Label { name: l_top.clone() });
        let cmp = fl.new_temp();
        fl.emit(Instruction::Binary { op: BinOp::Lt, a: Operand::local(idx_name.clone()), b: Operand::int(len as i64), dst: cmp.clone() });
        fl.emit(Instruction::IfFalse { cond: cmp, label: l_end.clone() });

        let _ = self.table.declare(Symbol::Variable(VariableSymbol {
            name: stmt.binding.clone(),
            ty: elem_ty,
            is_const: false,
            initialized: true,
            span: stmt.span,
            known_array_len: None,
        }));
        fl.bind_local(&stmt.binding);
        let elem = fl.new_temp();
        fl.emit(Instruction::ALoad { arr: arr_op, idx: Operand::local(idx_name.clone()), dst: elem.clone() });
        fl.emit(Instruction::Move { src: elem, dst: Operand::local(stmt.binding.clone()) });

        fl.loop_stack.push((Some(l_cont.clone()), l_end.clone()));
        self.lower_stmt(fl, &stmt.body)?;
        fl.loop_stack.pop();

        fl.emit(Instruction::Label { name: l_cont });
        let next = fl.new_temp();
        fl.emit(Instruction::Binary { op: BinOp::Add, a: Operand::local(idx_name.clone()), b: Operand::int(1), dst: next.clone() });
        fl.emit(Instruction::Move { src: next, dst: Operand::local(idx_name) });
        fl.emit(Instruction::Goto { label: l_top });
        fl.emit(Instruction::Label { name: l_end });
        self.table.pop();
        Ok(())
    }

    /// Evaluates the discriminant once, branches to each matching case with
    /// `ifGoto`, falls through to `default` (or past the switch, if none),
    /// then lays out the case bodies; fall-through between bodies is
    /// forbidden by the checker, so each ends in `break`/`return` already —
    /// `goto_unless_terminal` only guards the rare body the checker missed.
    fn lower_switch(&mut self, fl: &mut FunctionLowering, stmt: &SwitchStmt) -> Result<(), TacError> {
        let disc = self.lower_expr(fl, &stmt.discriminant)?;
        let l_end = fl.new_label();
        let mut case_labels = Vec::with_capacity(stmt.cases.len());
        let mut default_label = None;
        for case in &stmt.cases {
            let label = fl.new_label();
            if case.value.is_none() {
                default_label = Some(label.clone());
            }
            case_labels.push(label);
        }
        for (case, label) in stmt.cases.iter().zip(&case_labels) {
            if let Some(value) = &case.value {
                let case_val = self.lower_expr(fl, value)?;
                let cmp = fl.new_temp();
                fl.emit(Instruction::Binary { op: BinOp::Eq, a: disc.clone(), b: case_val, dst: cmp.clone() });
                fl.emit(Instruction::IfGoto { cond: cmp, label: label.clone() });
            }
        }
        fl.emit(Instruction::Goto { label: default_label.unwrap_or_else(|| l_end.clone()) });

        fl.loop_stack.push((None, l_end.clone()));
        for (case, label) in stmt.cases.iter().zip(&case_labels) {
            fl.emit(Instruction::Label { name: label.clone() });
            self.lower_case_body(fl, case)?;
            fl.goto_unless_terminal(l_end.clone());
        }
        fl.loop_stack.pop();
        fl.emit(Instruction::Label { name: l_end });
        Ok(())
    }

    fn lower_case_body(&mut self, fl: &mut FunctionLowering, case: &CaseArm) -> Result<(), TacError> {
        self.table.push(ScopeKind::Block);
        let result = self.lower_stmt_list(fl, &case.body);
        self.table.pop();
        result
    }

    fn lower_return(&mut self, fl: &mut FunctionLowering, stmt: &ReturnStmt) -> Result<(), TacError> {
        match &stmt.value {
            Some(e) => {
                let v = self.lower_expr(fl, e)?;
                fl.emit(Instruction::Ret { operand: Some(v) });
            }
            None => fl.emit(Instruction::Ret { operand: None }),
        }
        Ok(())
    }

    fn lower_expr(&mut self, fl: &mut FunctionLowering, expr: &Expr) -> Result<Operand, TacError> {
        match expr {
            Expr::Literal(lit, _) => Ok(Operand::Literal(lower_literal(lit))),
            Expr::Identifier(name, _) => Ok(Operand::local(name.clone())),
            Expr::Unary(op, operand, _) => self.lower_unary(fl, *op, operand),
            Expr::Binary(op, lhs, rhs, span) => self.lower_binary(fl, *op, lhs, rhs, *span),
            Expr::Call(callee, args, span) => self.lower_call(fl, callee, args, *span),
            Expr::Member(obj, field, span) => self.lower_member(fl, obj, field, *span),
            Expr::Index(arr, idx, _) => {
                let arr_op = self.lower_expr(fl, arr)?;
                let idx_op = self.lower_expr(fl, idx)?;
                let dst = fl.new_temp();
                fl.emit(Instruction::ALoad { arr: arr_op, idx: idx_op, dst: dst.clone() });
                Ok(dst)
            }
            Expr::This(span) => {
                if self.class_stack.is_empty() {
                    return Err(TacError::ThisOutsideMethod { span: *span });
                }
                Ok(Operand::local("this"))
            }
            Expr::New(class_name, args, span) => self.lower_new(fl, class_name, args, *span),
            Expr::ArrayLit(elems, span) => self.lower_array_lit(fl, elems, *span),
            Expr::Assign(lhs, rhs, span) => self.lower_assign(fl, lhs, rhs, *span),
            Expr::Ternary(cond, then_e, else_e, _) => self.lower_ternary(fl, cond, then_e, else_e),
        }
    }

    fn lower_unary(&mut self, fl: &mut FunctionLowering, op: UnaryOp, operand: &Expr) -> Result<Operand, TacError> {
        let a = self.lower_expr(fl, operand)?;
        let dst = fl.new_temp();
        let ir_op = match op {
            UnaryOp::Neg => UnOp::Neg,
            UnaryOp::Not => UnOp::Not,
        };
        fl.emit(Instruction::Unary { op: ir_op, a, dst: dst.clone() });
        Ok(dst)
    }

    fn lower_binary(&mut self, fl: &mut FunctionLowering, op: BinaryOp, lhs: &Expr, rhs: &Expr, _span: Span) -> Result<Operand, TacError> {
        match op {
            BinaryOp::AndAnd => self.lower_and(fl, lhs, rhs),
            BinaryOp::OrOr => self.lower_or(fl, lhs, rhs),
            _ => {
                let a = self.lower_expr(fl, lhs)?;
                let b = self.lower_expr(fl, rhs)?;
                let dst = fl.new_temp();
                fl.emit(Instruction::Binary { op: map_binop(op), a, b, dst: dst.clone() });
                Ok(dst)
            }
        }
    }

    /// `E1 && E2` (§4.4 Short-circuit): `E2` is only ever evaluated once,
    /// and only on the path where `E1` is true.
    fn lower_and(&mut self, fl: &mut FunctionLowering, lhs: &Expr, rhs: &Expr) -> Result<Operand, TacError> {
        let a = self.lower_expr(fl, lhs)?;
        let l_false = fl.new_label();
        let l_end = fl.new_label();
        let result = fl.new_temp();
        fl.emit(Instruction::IfFalse { cond: a, label: l_false.clone() });
        let b = self.lower_expr(fl, rhs)?;
        fl.emit(Instruction::Move { src: b, dst: result.clone() });
        fl.emit(Instruction::Goto { label: l_end.clone() });
        fl.emit(Instruction::Label { name: l_false });
        fl.emit(Instruction::Move { src: Operand::boolean(false), dst: result.clone() });
        fl.emit(Instruction::Label { name: l_end });
        Ok(result)
    }

    /// Symmetric with `lower_and`, using `ifGoto` in place of `ifFalse`.
    fn lower_or(&mut self, fl: &mut FunctionLowering, lhs: &Expr, rhs: &Expr) -> Result<Operand, TacError> {
        let a = self.lower_expr(fl, lhs)?;
        let l_true = fl.new_label();
        let l_end = fl.new_label();
        let result = fl.new_temp();
        fl.emit(Instruction::IfGoto { cond: a, label: l_true.clone() });
        let b = self.lower_expr(fl, rhs)?;
        fl.emit(Instruction::Move { src: b, dst: result.clone() });
        fl.emit(Instruction::Goto { label: l_end.clone() });
        fl.emit(Instruction::Label { name: l_true });
        fl.emit(Instruction::Move { src: Operand::boolean(true), dst: result.clone() });
        fl.emit(Instruction::Label { name: l_end });
        Ok(result)
    }

    fn lower_call(&mut self, fl: &mut FunctionLowering, callee: &Expr, args: &[Expr], span: Span) -> Result<Operand, TacError> {
        match callee {
            Expr::Identifier(name, _) => {
                let mut nargs = 0usize;
                for a in args {
                    let v = self.lower_expr(fl, a)?;
                    fl.emit(Instruction::Param { operand: v });
                    nargs += 1;
                }
                let return_type = self.lookup_function_return_type(name);
                Ok(self.emit_call(fl, name.clone(), nargs, &return_type))
            }
            Expr::Member(obj, field, _) => {
                let obj_ty = self.infer_type(obj);
                let class_name = obj_ty
                    .as_class_name()
                    .map(str::to_string)
                    .ok_or_else(|| TacError::UnresolvedMethod { class: obj_ty.to_string(), method: field.clone(), span })?;
                let defining = symtab::defining_class(&self.table, &class_name, field)
                    .ok_or_else(|| TacError::UnresolvedMethod { class: class_name.clone(), method: field.clone(), span })?;
                let return_type = self
                    .table
                    .find_class(&defining)
                    .and_then(|c| c.own_methods.get(field))
                    .map(|sig| (*sig.return_type).clone())
                    .unwrap_or(Type::Void);

                let receiver = self.lower_expr(fl, obj)?;
                fl.emit(Instruction::Param { operand: receiver });
                let mut nargs = 1usize;
                for a in args {
                    let v = self.lower_expr(fl, a)?;
                    fl.emit(Instruction::Param { operand: v });
                    nargs += 1;
                }
                Ok(self.emit_call(fl, format!("{defining}.{field}"), nargs, &return_type))
            }
            other => {
                let _ = self.lower_expr(fl, other)?;
                Err(TacError::UnresolvedMethod { class: "<expr>".to_string(), method: "<call>".to_string(), span })
            }
        }
    }

    fn lower_member(&mut self, fl: &mut FunctionLowering, obj: &Expr, field: &str, _span: Span) -> Result<Operand, TacError> {
        let obj_op = self.lower_expr(fl, obj)?;
        let dst = fl.new_temp();
        fl.emit(Instruction::GetF { obj: obj_op, field: field.to_string(), dst: dst.clone() });
        Ok(dst)
    }

    fn lower_new(&mut self, fl: &mut FunctionLowering, class_name: &str, args: &[Expr], _span: Span) -> Result<Operand, TacError> {
        let dst = fl.new_temp();
        fl.emit(Instruction::New { classname: class_name.to_string(), dst: dst.clone() });
        fl.emit(Instruction::Param { operand: dst.clone() });
        let mut nargs = 1usize;
        for a in args {
            let v = self.lower_expr(fl, a)?;
            fl.emit(Instruction::Param { operand: v });
            nargs += 1;
        }
        let ctor_owner = symtab::defining_class(&self.table, class_name, "constructor").unwrap_or_else(|| class_name.to_string());
        fl.emit(Instruction::Call { fname: format!("{ctor_owner}.constructor"), nargs, dst: None });
        Ok(dst)
    }

    fn lower_array_lit(&mut self, fl: &mut FunctionLowering, elems: &[Expr], _span: Span) -> Result<Operand, TacError> {
        let elem_ty = if elems.is_empty() { Type::Void } else { self.infer_type(&elems[0]) };
        let dst = fl.new_temp();
        fl.emit(Instruction::NewArr { elem_type: elem_ty.to_string(), size: Operand::int(elems.len() as i64), dst: dst.clone() });
        for (i, e) in elems.iter().enumerate() {
            let v = self.lower_expr(fl, e)?;
            fl.emit(Instruction::AStore { arr: dst.clone(), idx: Operand::int(i as i64), val: v });
        }
        Ok(dst)
    }

    /// Evaluates the lvalue's address components before the assigned value
    /// (§4.4 "index left-to-right before value for stores").
    fn lower_assign(&mut self, fl: &mut FunctionLowering, lhs: &Expr, rhs: &Expr, _span: Span) -> Result<Operand, TacError> {
        match lhs {
            Expr::Identifier(name, _) => {
                let value = self.lower_expr(fl, rhs)?;
                fl.emit(Instruction::Move { src: value, dst: Operand::local(name.clone()) });
                Ok(Operand::local(name.clone()))
            }
            Expr::Member(obj, field, _) => {
                let obj_op = self.lower_expr(fl, obj)?;
                let value = self.lower_expr(fl, rhs)?;
                fl.emit(Instruction::SetF { obj: obj_op, field: field.clone(), val: value.clone() });
                Ok(value)
            }
            Expr::Index(arr, idx, _) => {
                let arr_op = self.lower_expr(fl, arr)?;
                let idx_op = self.lower_expr(fl, idx)?;
                let value = self.lower_expr(fl, rhs)?;
                fl.emit(Instruction::AStore { arr: arr_op, idx: idx_op, val: value.clone() });
                Ok(value)
            }
            _ => unreachable!("checked: assignment lvalues are identifiers, fields, or array elements"),
        }
    }

    fn lower_ternary(&mut self, fl: &mut FunctionLowering, cond: &Expr, then_e: &Expr, else_e: &Expr) -> Result<Operand, TacError> {
        let c = self.lower_expr(fl, cond)?;
        let l_else = fl.new_label();
        let l_end = fl.new_label();
        let result = fl.new_temp();
        fl.emit(Instruction::IfFalse { cond: c, label: l_else.clone() });
        let then_v = self.lower_expr(fl, then_e)?;
        fl.emit(Instruction::Move { src: then_v, dst: result.clone() });
        fl.emit(Instruction::Goto { label: l_end.clone() });
        fl.emit(Instruction::Label { name: l_else });
        let else_v = self.lower_expr(fl, else_e)?;
        fl.emit(Instruction::Move { src: else_v, dst: result.clone() });
        fl.emit(Instruction::Label { name: l_end });
        Ok(result)
    }
}

fn lower_literal(lit: &compiscript_parser::Literal) -> Literal {
    use compiscript_parser::Literal as AstLit;
    match lit {
        AstLit::Int(n) => Literal::Int(*n),
        AstLit::Float(n) => Literal::Float(*n),
        AstLit::Str(s) => Literal::Str(s.clone()),
        AstLit::Bool(b) => Literal::Bool(*b),
        AstLit::Null => Literal::Null,
    }
}

fn map_binop(op: BinaryOp) -> BinOp {
    match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::Div,
        BinaryOp::Mod => BinOp::Mod,
        BinaryOp::Lt => BinOp::Lt,
        BinaryOp::LtEq => BinOp::LtEq,
        BinaryOp::Gt => BinOp::Gt,
        BinaryOp::GtEq => BinOp::GtEq,
        BinaryOp::EqEq => BinOp::Eq,
        BinaryOp::BangEq => BinOp::Neq,
        BinaryOp::AndAnd | BinaryOp::OrOr => unreachable!("short-circuit operators are lowered via lower_and/lower_or"),
    }
}
