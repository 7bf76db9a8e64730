use minic_compiler::compile_to_ir;
use minic_compiler::ir::{BinaryOp, Function, Instr, IrType, ValueDef, ValueId};

// ── Constant folding ─────────────────────────────────────────────────────

#[test]
fn negated_literal_folds_to_constant() {
    let module = compile_to_ir("int main() { return -5; }").unwrap();
    let main = module.entry().unwrap();

    assert!(
        !main.instrs().iter().any(|i| matches!(i, Instr::Binary { .. })),
        "negating a literal must emit no instructions"
    );
    assert_eq!(main.value(return_move_src(main)), &ValueDef::Const(-5));
}

#[test]
fn negated_hex_and_octal_literals_fold() {
    for (literal, expected) in [("-0x10", -16), ("-010", -8), ("-0", 0), ("-2147483648", i32::MIN)] {
        let source = format!("int main() {{ return {}; }}", literal);
        let module = compile_to_ir(&source).unwrap();
        let main = module.entry().unwrap();

        assert!(
            !main.instrs().iter().any(|i| matches!(i, Instr::Binary { .. })),
            "literal {} should fold without instructions",
            literal
        );
        assert_eq!(
            main.value(return_move_src(main)),
            &ValueDef::Const(expected),
            "literal {}",
            literal
        );
    }
}

// ── Comparison materialization ───────────────────────────────────────────

#[test]
fn comparison_result_is_bool_landed_by_a_move() {
    let module = compile_to_ir("int main() { int x; x = 1 < 2; return x; }").unwrap();
    let main = module.entry().unwrap();
    let instrs = main.instrs();

    let pos = instrs
        .iter()
        .position(|i| matches!(i, Instr::Binary { op: BinaryOp::Lt, .. }))
        .expect("comparison instruction");
    let cmp_dst = match &instrs[pos] {
        Instr::Binary { dst, .. } => *dst,
        _ => unreachable!(),
    };
    assert_eq!(main.value_type(cmp_dst), IrType::Bool);

    match &instrs[pos + 1] {
        Instr::Move { dst, src } => {
            assert_eq!(*src, cmp_dst, "the move must land the comparison result");
            assert_eq!(main.value_type(*dst), IrType::Bool);
        }
        other => panic!("expected a move right after the comparison, got {:?}", other),
    }
}

// ── Function shape ───────────────────────────────────────────────────────

#[test]
fn if_else_returns_share_one_exit() {
    let module =
        compile_to_ir("int f(int a) { if (a > 0) return a; else return 0 - a; }").unwrap();
    let f = module.function_by_name("f").unwrap();
    let instrs = f.instrs();
    let exit = f.exit_label();
    let ret = f.return_slot().expect("non-void function has a return slot");

    let entries = instrs.iter().filter(|i| matches!(i, Instr::Entry)).count();
    assert_eq!(entries, 1);

    let exits: Vec<_> = instrs.iter().filter(|i| matches!(i, Instr::Exit(_))).collect();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0], &Instr::Exit(Some(ret)));

    let param_binds = instrs
        .iter()
        .filter(|i| {
            matches!(i, Instr::Move { src, .. }
                if matches!(f.value(*src), ValueDef::Param { .. }))
        })
        .count();
    assert_eq!(param_binds, 1, "one parameter, one bind move");

    let branches = instrs.iter().filter(|i| matches!(i, Instr::CondGoto { .. })).count();
    assert_eq!(branches, 1);

    let cmp = instrs
        .iter()
        .find_map(|i| match i {
            Instr::Binary { op: BinaryOp::Gt, dst, .. } => Some(*dst),
            _ => None,
        })
        .expect("comparison");
    assert_eq!(f.value_type(cmp), IrType::Bool);

    // both returns move into the shared slot and jump to the shared exit
    let mut pairs = 0;
    for w in instrs.windows(2) {
        if let [Instr::Move { dst, .. }, Instr::Goto(target)] = w {
            if *dst == ret && *target == exit {
                pairs += 1;
            }
        }
    }
    assert_eq!(pairs, 2);
}

#[test]
fn void_function_exit_carries_no_value() {
    let module = compile_to_ir("void nop() { }").unwrap();
    let nop = module.function_by_name("nop").unwrap();
    assert_eq!(nop.return_slot(), None);
    assert!(nop.instrs().iter().any(|i| matches!(i, Instr::Exit(None))));
}

// ── Calls ────────────────────────────────────────────────────────────────

#[test]
fn call_arguments_follow_source_order() {
    let source = r#"
        int g() { return 1; }
        int h() { return 2; }
        int f(int a, int b) { return a - b; }
        int main() { return f(g(), h()); }
    "#;
    let module = compile_to_ir(source).unwrap();
    let main = module.entry().unwrap();

    let calls: Vec<(&str, ValueId, &[ValueId])> = main
        .instrs()
        .iter()
        .filter_map(|i| match i {
            Instr::Call { dst, callee, args } => {
                Some((module.proto(*callee).name.as_str(), *dst, args.as_slice()))
            }
            _ => None,
        })
        .collect();

    let names: Vec<&str> = calls.iter().map(|(n, _, _)| *n).collect();
    assert_eq!(names, ["g", "h", "f"], "argument calls precede the outer call, left to right");

    let (_, g_dst, _) = calls[0];
    let (_, h_dst, _) = calls[1];
    let (_, _, f_args) = calls[2];
    assert_eq!(f_args.to_vec(), vec![g_dst, h_dst]);
}

#[test]
fn call_sites_are_tracked_on_the_caller() {
    let source = r#"
        int f(int a, int b, int c) { return a + b + c; }
        int main() { return f(1, 2, 3); }
    "#;
    let module = compile_to_ir(source).unwrap();

    let main = module.entry().unwrap();
    assert!(main.makes_calls());
    assert_eq!(main.max_call_args(), 3);

    let f = module.function_by_name("f").unwrap();
    assert!(!f.makes_calls());
    assert_eq!(f.max_call_args(), 0);
}

#[test]
fn forward_and_mutual_references_resolve() {
    let source = r#"
        int is_even(int n) { if (n == 0) return 1; return is_odd(n - 1); }
        int is_odd(int n) { if (n == 0) return 0; return is_even(n - 1); }
    "#;
    assert!(compile_to_ir(source).is_ok());
}

// ── Short-circuit structure ──────────────────────────────────────────────

#[test]
fn right_operand_of_and_is_branched_around() {
    let source = r#"
        int side() { return 1; }
        int main() { int x; x = 0 && side(); return x; }
    "#;
    let module = compile_to_ir(source).unwrap();
    let main = module.entry().unwrap();
    let instrs = main.instrs();

    let branch = instrs
        .iter()
        .position(|i| matches!(i, Instr::CondGoto { .. }))
        .expect("short-circuit branch");
    let call = instrs
        .iter()
        .position(|i| matches!(i, Instr::Call { .. }))
        .expect("right-operand call");
    assert!(
        branch < call,
        "the call belongs to the guarded right-operand region"
    );
}

// ── Module surface ───────────────────────────────────────────────────────

#[test]
fn entry_function_is_main() {
    let module = compile_to_ir("int main() { return 0; }").unwrap();
    assert_eq!(module.entry().unwrap().name(), "main");
}

#[test]
fn module_without_main_has_no_entry() {
    let module = compile_to_ir("int f() { return 0; }").unwrap();
    assert!(module.entry().is_none());
}

#[test]
fn module_renders_to_text() {
    let module = compile_to_ir("int main() { return 1 + 2; }").unwrap();
    let text = module.to_text();
    assert!(text.contains("fn @main"));
    assert!(text.contains("entry"));
    assert!(text.contains("add"));
    assert!(text.contains("exit"));
}

// ── Helper ───────────────────────────────────────────────────────────────

fn return_move_src(f: &Function) -> ValueId {
    let ret = f.return_slot().expect("function returns a value");
    f.instrs()
        .iter()
        .find_map(|i| match i {
            Instr::Move { dst, src } if *dst == ret => Some(*src),
            _ => None,
        })
        .expect("return value move")
}
