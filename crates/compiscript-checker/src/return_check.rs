//! Structural return-path analysis (§4.3 Return-path analysis, Dead-code
//! warnings). Both predicates work purely over the parse tree's shape; they
//! never consult types, since "does this path return" and "is this
//! statement reachable" don't depend on what a `return` actually returns.

use compiscript_parser::Stmt;

/// True iff `stmts`, read as a sequence, guarantees a value-producing
/// `return` on every path out. A sequence must-returns as soon as any one of
/// its statements does — everything after that statement is unreachable
/// (and separately flagged as dead code), but doesn't change the verdict.
pub(crate) fn must_return(stmts: &[Stmt]) -> bool {
    stmts.iter().any(stmt_must_return)
}

fn stmt_must_return(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(r) => r.value.is_some(),
        Stmt::Block(b) => must_return(&b.stmts),
        Stmt::If(i) => match &i.else_branch {
            Some(else_branch) => stmt_must_return(&i.then_branch) && stmt_must_return(else_branch),
            None => false,
        },
        Stmt::Switch(s) => {
            let has_default = s.cases.iter().any(|c| c.value.is_none());
            has_default && s.cases.iter().all(|c| must_return(&c.body))
        }
        // A loop's body may never execute, so a loop never guarantees a
        // return regardless of what its body contains.
        Stmt::While(_) | Stmt::DoWhile(_) | Stmt::For(_) | Stmt::Foreach(_) => false,
        _ => false,
    }
}

/// True iff control can never fall through past `stmt` to the next
/// statement in its list: `return`, `break`, `continue`, or a compound
/// statement every one of whose branches itself terminates. Broader than
/// [`must_return`] — `break`/`continue` end the current block without
/// producing a function return — and used purely to drive dead-code
/// warnings on whatever textually follows.
pub(crate) fn is_block_terminator(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) | Stmt::Break(_) | Stmt::Continue(_) => true,
        Stmt::Block(b) => block_terminates(&b.stmts),
        Stmt::If(i) => match &i.else_branch {
            Some(else_branch) => is_block_terminator(&i.then_branch) && is_block_terminator(else_branch),
            None => false,
        },
        Stmt::Switch(s) => {
            let has_default = s.cases.iter().any(|c| c.value.is_none());
            has_default && s.cases.iter().all(|c| block_terminates(&c.body))
        }
        _ => false,
    }
}

fn block_terminates(stmts: &[Stmt]) -> bool {
    stmts.iter().any(is_block_terminator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compiscript_parser::parse;

    fn body_of(src: &str) -> Vec<Stmt> {
        let (program, diags) = parse(src);
        assert!(diags.is_empty(), "{diags:?}");
        program.items
    }

    #[test]
    fn if_without_else_never_must_returns() {
        let stmts = body_of("if (true) { return 1; }");
        assert!(!must_return(&stmts));
    }

    #[test]
    fn if_else_both_returning_must_returns() {
        let stmts = body_of("if (true) { return 1; } else { return 2; }");
        assert!(must_return(&stmts));
    }

    #[test]
    fn switch_needs_default_and_every_arm_returning() {
        let with_default = body_of("switch (1) { case 1: return 1; default: return 2; }");
        assert!(must_return(&with_default));
        let without_default = body_of("switch (1) { case 1: return 1; }");
        assert!(!must_return(&without_default));
    }

    #[test]
    fn loop_body_never_must_returns() {
        let stmts = body_of("while (true) { return 1; }");
        assert!(!must_return(&stmts));
    }

    #[test]
    fn break_terminates_block_but_not_must_return() {
        let stmts = body_of("break;");
        assert!(is_block_terminator(&stmts[0]));
        assert!(!must_return(&stmts));
    }
}
