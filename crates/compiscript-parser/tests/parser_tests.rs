use compiscript_parser::{parse, ClassMember, Stmt};

#[test]
fn parses_var_decl_with_binary_expr_and_if() {
    let src = "let x: integer = 10; let y: integer = x + 5; if (y > 12) { print(y); }";
    let (program, diagnostics) = parse(src);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    assert_eq!(program.items.len(), 3);
    assert!(matches!(program.items[0], Stmt::VarDecl(_)));
    assert!(matches!(program.items[2], Stmt::If(_)));
}

#[test]
fn parses_recursive_function() {
    let src = "function factorial(n: integer): integer { if (n <= 1) return 1; return n * factorial(n - 1); }";
    let (program, diagnostics) = parse(src);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let Stmt::FuncDecl(f) = &program.items[0] else { panic!("expected a function declaration") };
    assert_eq!(f.name, "factorial");
    assert_eq!(f.params.len(), 1);
    assert_eq!(f.body.stmts.len(), 2);
}

#[test]
fn parses_class_with_constructor_and_method() {
    let src = "class Counter { let v: integer; function constructor(s: integer){ this.v=s; } \
               function inc(): integer { this.v = this.v + 1; return this.v; } }";
    let (program, diagnostics) = parse(src);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let Stmt::ClassDecl(c) = &program.items[0] else { panic!("expected a class declaration") };
    assert_eq!(c.name, "Counter");
    assert_eq!(c.members.len(), 3);
    assert!(matches!(c.members[0], ClassMember::Field(_)));
    assert!(matches!(c.members[1], ClassMember::Method(_)));
}

#[test]
fn syntax_error_recovers_and_keeps_parsing() {
    let src = "let x: integer = ; let y: integer = 3;";
    let (program, diagnostics) = parse(src);
    assert!(!diagnostics.is_empty());
    assert_eq!(program.items.len(), 2);
}
