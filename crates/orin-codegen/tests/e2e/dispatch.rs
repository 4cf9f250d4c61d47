//! Command-line dispatcher end-to-end

use crate::harness::{program, routine, run_main};
use orin_ast::{BinaryOp, Expr, ExprKind, Print, Return, Stmt, Type};

fn add_print_routine() -> orin_ast::Decl {
    routine(
        "add",
        vec![("a", Type::integer()), ("b", Type::integer())],
        Type::void(),
        vec![Stmt::Print(Print {
            args: vec![Expr::binary(
                BinaryOp::Add,
                Expr::var("a", Type::integer()),
                Expr::var("b", Type::integer()),
                Type::integer(),
            )],
            line: None,
        })],
    )
}

#[test]
fn test_dispatcher_routes_by_routine_name() {
    let prog = program(vec![
        add_print_routine(),
        routine(
            "answer",
            vec![],
            Type::void(),
            vec![Stmt::Print(Print {
                args: vec![Expr::int(42)],
                line: None,
            })],
        ),
    ]);

    let run = run_main(&prog, &["add", "2", "3"]);
    assert_eq!(run.output, "5\n");
    assert!(run.calls.contains(&"add".to_string()));
    assert!(!run.calls.contains(&"answer".to_string()));

    let run = run_main(&prog, &["answer"]);
    assert_eq!(run.output, "42\n");
}

#[test]
fn test_unmatched_name_falls_through() {
    let prog = program(vec![add_print_routine()]);
    let run = run_main(&prog, &["nope"]);
    assert_eq!(run.output, "");
    assert!(run.calls.is_empty());
}

#[test]
fn test_real_arguments_parse_by_family() {
    let prog = program(vec![routine(
        "scale",
        vec![("x", Type::real())],
        Type::real(),
        vec![Stmt::Return(Return {
            value: Some(Expr::binary(
                BinaryOp::Mul,
                Expr::var("x", Type::real()),
                Expr::real(2.0),
                Type::real(),
            )),
            line: None,
        })],
    )]);
    // The result is discarded by the dispatcher; reaching the return is the
    // point, and the call must appear in the log.
    let run = run_main(&prog, &["scale", "1.5"]);
    assert_eq!(run.calls, vec!["scale".to_string()]);
    assert_eq!(run.result, None);
}

#[test]
fn test_boolean_arguments_use_the_integer_family() {
    let prog = program(vec![routine(
        "gate",
        vec![("flag", Type::boolean())],
        Type::void(),
        vec![Stmt::Print(Print {
            args: vec![Expr {
                kind: ExprKind::Var("flag".to_string()),
                ty: Type::boolean(),
            }],
            line: None,
        })],
    )]);
    let run = run_main(&prog, &["gate", "1"]);
    assert_eq!(run.output, "1\n");
}
