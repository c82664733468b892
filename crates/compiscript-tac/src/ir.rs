//! The TAC instruction set and its textual form (§3.4, §6 "TAC textual
//! format"). Operand encoding uses a single-character prefix discriminator
//! so the text is unambiguous to re-parse: `tN` temporaries, `%name` locals
//! and parameters, `@NAME` globals (reserved; unused today — see
//! `Operand::Global`'s doc comment), `#lit` literals.

use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    /// The result of a `Void`-typed expression — only ever produced for a
    /// `ret` in a function whose callers never read the value.
    Void,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "#{n}"),
            Literal::Float(n) => write!(f, "#{n}"),
            Literal::Str(s) => write!(f, "#\"{}\"", escape_string(s)),
            Literal::Bool(b) => write!(f, "#{b}"),
            Literal::Null => write!(f, "#null"),
            Literal::Void => write!(f, "#void"),
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

/// An operand as it appears in instruction text (§3.4).
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Temp(u32),
    /// A local variable or parameter, named `%name`. The source repository
    /// this design follows does not distinguish `let` from `const` at the
    /// operand level (open question #1 in SPEC_FULL.md / DESIGN.md).
    Local(String),
    /// Reserved for a module-level global/constant-folding target; nothing
    /// in this language produces one today (no modules, §1 Non-goals), so
    /// this variant is never constructed by the generator.
    Global(String),
    Literal(Literal),
}

impl Operand {
    pub fn local(name: impl Into<String>) -> Self {
        Operand::Local(name.into())
    }

    pub fn int(n: i64) -> Self {
        Operand::Literal(Literal::Int(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Operand::Literal(Literal::Str(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Operand::Literal(Literal::Bool(b))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp(n) => write!(f, "t{n}"),
            Operand::Local(name) => write!(f, "%{name}"),
            Operand::Global(name) => write!(f, "@{name}"),
            Operand::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

/// Binary operators that survive to the IR. `&&`/`||` never appear here —
/// they're lowered to explicit branches (§4.4 "Short-circuit").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    Neq,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Neg => f.write_str("neg"),
            UnOp::Not => f.write_str("not"),
        }
    }
}

/// One TAC instruction (§3.4). Textual forms match the spec's table
/// exactly; `Instruction::fmt` is the sole place that renders them.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Binary { op: BinOp, a: Operand, b: Operand, dst: Operand },
    Unary { op: UnOp, a: Operand, dst: Operand },
    Move { src: Operand, dst: Operand },
    Label { name: String },
    Goto { label: String },
    IfGoto { cond: Operand, label: String },
    IfFalse { cond: Operand, label: String },
    Param { operand: Operand },
    Call { fname: String, nargs: usize, dst: Option<Operand> },
    Ret { operand: Option<Operand> },
    New { classname: String, dst: Operand },
    GetF { obj: Operand, field: String, dst: Operand },
    SetF { obj: Operand, field: String, val: Operand },
    NewArr { elem_type: String, size: Operand, dst: Operand },
    ALoad { arr: Operand, idx: Operand, dst: Operand },
    AStore { arr: Operand, idx: Operand, val: Operand },
    Print { operand: Operand },
}

impl Instruction {
    /// A terminal instruction never falls through to the next one (§3.4);
    /// the generator uses this to suppress a redundant trailing `goto`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Instruction::Goto { .. } | Instruction::Ret { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary { op, a, b, dst } => write!(f, "{dst} = {a} {op} {b}"),
            Instruction::Unary { op, a, dst } => write!(f, "{dst} = {op} {a}"),
            Instruction::Move { src, dst } => write!(f, "move {src}, {dst}"),
            Instruction::Label { name } => write!(f, "label {name}:"),
            Instruction::Goto { label } => write!(f, "goto {label}"),
            Instruction::IfGoto { cond, label } => write!(f, "if {cond} goto {label}"),
            Instruction::IfFalse { cond, label } => write!(f, "ifFalse {cond} goto {label}"),
            Instruction::Param { operand } => write!(f, "param {operand}"),
            Instruction::Call { fname, nargs, dst: Some(dst) } => write!(f, "call {fname}, {nargs} -> {dst}"),
            Instruction::Call { fname, nargs, dst: None } => write!(f, "call {fname}, {nargs}"),
            Instruction::Ret { operand: Some(operand) } => write!(f, "ret {operand}"),
            Instruction::Ret { operand: None } => write!(f, "ret"),
            Instruction::New { classname, dst } => write!(f, "{dst} = new {classname}"),
            Instruction::GetF { obj, field, dst } => write!(f, "{dst} = getf {obj}, \"{field}\""),
            Instruction::SetF { obj, field, val } => write!(f, "setf {obj}, \"{field}\", {val}"),
            Instruction::NewArr { elem_type, size, dst } => write!(f, "{dst} = newarr {elem_type}, {size}"),
            Instruction::ALoad { arr, idx, dst } => write!(f, "{dst} = aload {arr}, {idx}"),
            Instruction::AStore { arr, idx, val } => write!(f, "astore {arr}, {idx}, {val}"),
            Instruction::Print { operand } => write!(f, "print {operand}"),
        }
    }
}

/// A single function's lowered body (§3.4). `locals` is the count of
/// distinct `%name` bindings (parameters plus declared variables) the
/// function uses — a stack-frame sizing hint for a downstream backend.
#[derive(Clone, Debug)]
pub struct TacFunction {
    pub name: String,
    pub params: Vec<String>,
    pub return_type: String,
    pub locals: usize,
    pub instructions: Vec<Instruction>,
}

impl TacFunction {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(".func {}({}) : {}\n", self.name, self.params.join(", "), self.return_type));
        out.push_str(&format!("  .locals {}\n", self.locals));
        for instr in &self.instructions {
            out.push_str(&format!("  {instr}\n"));
        }
        out.push_str(".endfunc\n");
        out
    }
}

/// An ordered list of functions — the whole program's lowered form (§3.4).
#[derive(Clone, Debug, Default)]
pub struct TacProgram {
    pub functions: Vec<TacFunction>,
}

impl TacProgram {
    pub fn to_text(&self) -> String {
        self.functions.iter().map(TacFunction::to_text).collect::<Vec<_>>().join("\n")
    }
}
