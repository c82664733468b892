//! Lowers a checked Compiscript parse tree to Three-Address Code: the IR
//! model (`ir`), the AST-to-TAC generator (`generator`), and a peephole
//! optimizer (`peephole`) that cleans up the generator's literal output.

mod error;
mod generator;
mod infer;
mod ir;
mod peephole;
mod symtab;

pub use error::TacError;
pub use ir::{BinOp, Instruction, Literal, Operand, TacFunction, TacProgram, UnOp};

use compiscript_parser::Program;

/// Lowers `program` to TAC and runs the peephole optimizer over the result.
/// Callers must have already run `compiscript_checker::check` and confirmed
/// it reported no errors — this function assumes every name resolves.
pub fn generate(program: &Program) -> Result<TacProgram, TacError> {
    let mut tac = generator::generate(program)?;
    peephole::optimize(&mut tac);
    Ok(tac)
}
