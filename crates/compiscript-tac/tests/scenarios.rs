//! End-to-end lowering scenarios (§8): each compiles a snippet through the
//! full `parse -> check -> generate` pipeline and asserts on the shape of
//! the emitted TAC text. Exact temp/label numbers aren't pinned down (the
//! spec's scenarios are given "modulo temp/label numbering") but the
//! relative structure — which instructions appear, in what order, how many
//! times — is.

fn compile(src: &str) -> compiscript_tac::TacProgram {
    let (program, parse_diags) = compiscript_parser::parse(src);
    assert!(parse_diags.is_empty(), "unexpected parse diagnostics: {parse_diags:?}");
    let (_table, check_diags) = compiscript_checker::check(&program);
    assert!(check_diags.is_empty(), "unexpected check diagnostics: {:?}", check_diags.into_vec());
    compiscript_tac::generate(&program).expect("generation of a checked program must not fail")
}

fn main_fn_text(program: &compiscript_tac::TacProgram) -> String {
    program.functions.iter().find(|f| f.name == "main").expect("a main function").to_text()
}

/// Scenario S1 — simple print: a straight-line `let`/`let`/`if` body.
#[test]
fn s1_simple_print() {
    let program = compile("let x: integer = 10; let y: integer = x + 5; if (y > 12) { print(y); }");
    let text = main_fn_text(&program);

    assert!(text.contains("move #10, %x"), "{text}");
    assert!(text.contains("= %x + #5"), "{text}");
    assert!(text.contains("%y"), "{text}");
    assert!(text.contains("= %y > #12"), "{text}");
    assert!(text.contains("ifFalse"), "{text}");
    assert!(text.contains("print %y"), "{text}");

    // `if` without `else` guards the `print` with exactly one `ifFalse` and
    // one label — no stray `goto`.
    assert_eq!(text.matches("ifFalse").count(), 1);
    assert_eq!(text.matches("label ").count(), 1);
    assert_eq!(text.matches("goto ").count(), 0);
}

/// Scenario S2 — recursive factorial: the `if (n <= 1) return 1;` guard
/// must precede the recursive call, and the call site passes exactly one
/// argument.
#[test]
fn s2_recursive_factorial() {
    let program = compile(
        "function factorial(n: integer): integer { \
           if (n <= 1) return 1; \
           return n * factorial(n - 1); \
         }",
    );
    let f = program.functions.iter().find(|f| f.name == "factorial").expect("a factorial function");
    let text = f.to_text();

    assert!(text.contains("= %n <= #1"), "{text}");
    assert!(text.contains("ret #1"), "{text}");
    assert!(text.contains("= %n - #1"), "{text}");
    assert!(text.contains("call factorial, 1 ->"), "{text}");
    assert!(text.contains("%n *"), "{text}");

    let guard_idx = text.find("<= #1").unwrap();
    let call_idx = text.find("call factorial").unwrap();
    assert!(guard_idx < call_idx, "guard must be emitted before the recursive call:\n{text}");

    // Exactly one `ret` carries a value from the base case and one from the
    // recursive case; no implicit trailing `ret` should be synthesized
    // since every path already returns.
    assert_eq!(text.matches("ret ").count(), 2);
}

/// Scenario S3 — short-circuit `&&`: `b > 0` must be lowered inside the
/// branch guarded by `a > 0` being true, never unconditionally.
#[test]
fn s3_short_circuit_and() {
    let program = compile("let a: integer = 1; let b: integer = 1; if (a > 0 && b > 0) { print(1); } else { print(0); }");
    let text = main_fn_text(&program);

    // `b > 0` appears exactly once in the text (the generator never
    // duplicates its evaluation across branches).
    assert_eq!(text.matches("> #0").count(), 2, "one comparison for a>0, one for b>0:\n{text}");

    let a_cmp = text.find("%a > #0").expect("a > 0 comparison");
    let false_branch_label = text.find("ifFalse").expect("a short-circuit guard");
    let b_cmp = text.find("%b > #0").expect("b > 0 comparison");
    assert!(a_cmp < false_branch_label && false_branch_label < b_cmp, "{text}");

    assert!(text.contains("print #1"), "{text}");
    assert!(text.contains("print #0"), "{text}");
}

/// Scenario S3 (complement) — on the path where `a > 0` is false, `b > 0`
/// is still emitted as code (lowering is static), but is unreachable; what
/// matters operationally is that the `ifFalse` on `a`'s comparison skips
/// straight past it. We assert the skip target is not the `b` comparison
/// itself, i.e. short-circuiting actually branches around it.
#[test]
fn s3_short_circuit_and_skips_b_on_false_path() {
    let program = compile("let a: integer = 1; let b: integer = 1; if (a > 0 && b > 0) { print(1); }");
    let text = main_fn_text(&program);
    let first_iffalse = text.lines().find(|l| l.contains("ifFalse")).expect("a guard on a>0");
    let target_label = first_iffalse.rsplit(' ').next().unwrap().trim_end_matches(':');
    // the label the false-path jumps to must appear, and the `b > 0`
    // comparison must be lowered strictly before that label's definition.
    let label_def_idx = text.find(&format!("label {target_label}:")).expect("label defined");
    let b_cmp_idx = text.find("%b > #0").expect("b > 0 comparison");
    assert!(b_cmp_idx < label_def_idx, "{text}");
}

/// Scenario S4 — method call on an object: constructor call first, then a
/// receiver-qualified instance method call.
#[test]
fn s4_method_call_on_object() {
    let program = compile(
        "class Counter { \
           let v: integer; \
           function constructor(s: integer){ this.v=s; } \
           function inc(): integer { this.v = this.v + 1; return this.v; } \
         } \
         let c: Counter = new Counter(5); \
         print(c.inc());",
    );

    let ctor = program.functions.iter().find(|f| f.name == "Counter.constructor").expect("a constructor function");
    assert!(ctor.to_text().contains("setf %this, \"v\", %s"), "{}", ctor.to_text());

    let inc = program.functions.iter().find(|f| f.name == "Counter.inc").expect("an inc function");
    let inc_text = inc.to_text();
    assert!(inc_text.contains("getf %this, \"v\""), "{inc_text}");
    assert!(inc_text.contains("setf %this, \"v\","), "{inc_text}");
    assert!(inc_text.contains("ret"), "{inc_text}");

    let main_text = main_fn_text(&program);
    assert!(main_text.contains("= new Counter"), "{main_text}");
    assert!(main_text.contains("call Counter.constructor, 2"), "{main_text}");
    assert!(main_text.contains("call Counter.inc, 1 ->"), "{main_text}");
    assert!(main_text.contains("print "), "{main_text}");

    let new_idx = main_text.find("= new Counter").unwrap();
    let ctor_call_idx = main_text.find("call Counter.constructor").unwrap();
    let inc_call_idx = main_text.find("call Counter.inc").unwrap();
    assert!(new_idx < ctor_call_idx && ctor_call_idx < inc_call_idx, "{main_text}");
}

/// Scenario S5 — `foreach` over a literal array: constant-length array
/// construction followed by an index-based loop with `aload`.
#[test]
fn s5_foreach_over_literal_array() {
    let program = compile("let a: integer[] = [1,2,3]; foreach (x in a) { print(x); }");
    let text = main_fn_text(&program);

    assert!(text.contains("= newarr integer, #3"), "{text}");
    assert_eq!(text.matches("astore ").count(), 3, "three elements stored into the array literal:\n{text}");
    assert!(text.contains("aload %a,"), "{text}");
    assert!(text.contains("print "), "{text}");

    // the loop compares the index against the literal length 3, not a
    // runtime-computed one.
    assert!(text.contains("< #3"), "{text}");
}

/// Scenario S6 equivalent at the TAC layer: generation is never attempted
/// by a well-behaved caller once checking reports errors — covered at the
/// checker layer in `compiscript_checker::tests::scenario_s6_reports_exactly_three_errors`.
/// This test instead confirms determinism (§8 "Determinism"): identical
/// input trees produce byte-identical TAC text, including stable
/// temp/label numbering.
#[test]
fn generation_is_deterministic() {
    let src = "let x: integer = 1; if (x > 0) { print(x); } else { print(0); }";
    let first = compile(src).to_text();
    let second = compile(src).to_text();
    assert_eq!(first, second);
}

/// No-ghost-temps (§8): every `tN` read in an instruction was assigned by
/// an earlier instruction in the same function.
#[test]
fn no_ghost_temps() {
    let program = compile(
        "function factorial(n: integer): integer { \
           if (n <= 1) return 1; \
           return n * factorial(n - 1); \
         }",
    );
    for f in &program.functions {
        let mut defined = std::collections::HashSet::new();
        for instr in &f.instructions {
            for read in temps_read(instr) {
                assert!(defined.contains(&read), "temp t{read} read before assignment in {}", f.name);
            }
            if let Some(written) = temp_written(instr) {
                defined.insert(written);
            }
        }
    }
}

fn temps_read(instr: &compiscript_tac::Instruction) -> Vec<u32> {
    use compiscript_tac::{Instruction, Operand};
    let mut out = Vec::new();
    let mut note = |op: &Operand| {
        if let Operand::Temp(n) = op {
            out.push(*n);
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
        _ => {}
    }
    out
}

fn temp_written(instr: &compiscript_tac::Instruction) -> Option<u32> {
    use compiscript_tac::{Instruction, Operand};
    let dst = match instr {
        Instruction::Binary { dst, .. }
        | Instruction::Unary { dst, .. }
        | Instruction::Move { dst, .. }
        | Instruction::New { dst, .. }
        | Instruction::GetF { dst, .. }
        | Instruction::NewArr { dst, .. }
        | Instruction::ALoad { dst, .. } => dst,
        Instruction::Call { dst: Some(dst), .. } => dst,
        _ => return None,
    };
    match dst {
        Operand::Temp(n) => Some(*n),
        _ => None,
    }
}
