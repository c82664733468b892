//! Local, single-pass-per-rule clean-up over a lowered function's
//! instruction stream (§4.6). Every rule here is idempotent on its own, and
//! running the full set to a fixpoint (`optimize`) never re-introduces a
//! pattern a previous rule removed, so one fixpoint loop is enough.

use crate::ir::{Instruction, TacFunction, TacProgram};
use rustc_hash::FxHashSet;

/// Runs the peephole passes over every function until none of them change
/// anything.
pub fn optimize(program: &mut TacProgram) {
    for function in &mut program.functions {
        optimize_function(function);
    }
}

fn optimize_function(function: &mut TacFunction) {
    loop {
        let before = function.instructions.len();
        elide_goto_to_next_label(&mut function.instructions);
        fuse_iffalse_goto_label(&mut function.instructions);
        let changed_shape = function.instructions.len() != before;
        let changed_moves = eliminate_dead_moves(&mut function.instructions);
        if !changed_shape && !changed_moves {
            break;
        }
    }
}

/// Rule 1: a `goto L` immediately followed by `label L:` is a no-op — the
/// fall-through already lands there.
fn elide_goto_to_next_label(instructions: &mut Vec<Instruction>) {
    let mut i = 0;
    while i + 1 < instructions.len() {
        let drop = matches!(
            (&instructions[i], &instructions[i + 1]),
            (Instruction::Goto { label }, Instruction::Label { name }) if label == name
        );
        if drop {
            instructions.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Rule 2: `ifFalse c goto A` / `goto B` / `label A:` collapses to
/// `if c goto B` / `label A:` when `A` falls straight through to nothing
/// else in between — the branch-around-a-jump pattern an `if`/`else`
/// lowering with an always-taken else produces.
fn fuse_iffalse_goto_label(instructions: &mut Vec<Instruction>) {
    let mut i = 0;
    while i + 2 < instructions.len() {
        let fused = match (&instructions[i], &instructions[i + 1], &instructions[i + 2]) {
            (Instruction::IfFalse { cond, label: a }, Instruction::Goto { label: b }, Instruction::Label { name }) if a == name => {
                Some(Instruction::IfGoto { cond: cond.clone(), label: b.clone() })
            }
            _ => None,
        };
        if let Some(fused) = fused {
            instructions[i] = fused;
            instructions.remove(i + 1);
        } else {
            i += 1;
        }
    }
}

/// Rule 3 (optional): drops a `move src, tN` whose destination temporary is
/// never read afterward — dead from the point it's written to the end of
/// the function. Conservative: only ever removes a `move` into a `Temp`,
/// never into a `%local` (a local might be observed by later debugging
/// tooling or simply isn't proven dead by this single-function pass).
fn eliminate_dead_moves(instructions: &mut Vec<Instruction>) -> bool {
    let mut live_after: FxHashSet<u32> = FxHashSet::default();
    for instr in instructions.iter().rev() {
        collect_temps_read(instr, &mut live_after);
    }
    let mut to_drop = vec![false; instructions.len()];
    let mut live: FxHashSet<u32> = live_after.clone();
    for idx in (0..instructions.len()).rev() {
        if let Instruction::Move { dst: crate::ir::Operand::Temp(n), .. } = &instructions[idx] {
            if !live.contains(n) {
                to_drop[idx] = true;
            }
        }
        collect_temps_read(&instructions[idx], &mut live);
    }
    if !to_drop.iter().any(|d| *d) {
        return false;
    }
    let mut kept = Vec::with_capacity(instructions.len());
    for (idx, instr) in instructions.drain(..).enumerate() {
        if !to_drop[idx] {
            kept.push(instr);
        }
    }
    *instructions = kept;
    true
}

fn collect_temps_read(instr: &Instruction, out: &mut FxHashSet<u32>) {
    use crate::ir::Operand;
    let mut note = |op: &Operand| {
        if let Operand::Temp(n) = op {
            out.insert(*n);
        }
    };
    match instr {
        Instruction::Binary { a, b, .. } => {
            note(a);
            note(b);
        }
        Instruction::Unary { a, .. } => note(a),
        Instruction::Move { src, .. } => note(src),
        Instruction::IfGoto { cond, .. } | Instruction::IfFalse { cond, .. } => note(cond),
        Instruction::Param { operand } => note(operand),
        Instruction::Ret { operand: Some(operand) } => note(operand),
        Instruction::GetF { obj, .. } => note(obj),
        Instruction::SetF { obj, val, .. } => {
            note(obj);
            note(val);
        }
        Instruction::NewArr { size, .. } => note(size),
        Instruction::ALoad { arr, idx, .. } => {
            note(arr);
            note(idx);
        }
        Instruction::AStore { arr, idx, val } => {
            note(arr);
            note(idx);
            note(val);
        }
        Instruction::Print { operand } => note(operand),
        Instruction::Label { .. } | Instruction::Goto { .. } | Instruction::Ret { operand: None } | Instruction::Call { .. } | Instruction::New { .. } => {}
    }
}
