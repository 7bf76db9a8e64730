use minic_compiler::ast::{AstKind, AstNode, Program, TypeSpec};
use minic_compiler::ir::ir_generator;
use minic_compiler::{compile_to_ir, CompileError, SemanticErrorKind};

// ── Semantic error detection ─────────────────────────────────────────────
// Each test verifies that an invalid program produces the correct error kind.

#[test]
fn undefined_variable() {
    let source = "int main() { return y; }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::UndefinedVariable);
}

#[test]
fn assignment_to_undeclared_variable() {
    let source = "int main() { x = 1; return 0; }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::UndefinedVariable);
}

#[test]
fn undefined_function() {
    let source = "int main() { return foo(); }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::UndefinedFunction);
}

#[test]
fn variable_redefinition_in_same_scope() {
    let source = "int main() { int x; int x; return 0; }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::VariableRedefinition);
}

#[test]
fn parameter_shares_the_body_scope() {
    // the body's top-level block does not open a fresh frame, so a local
    // cannot reuse a parameter name there
    let source = "int f(int a) { int a; return a; }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::VariableRedefinition);
}

#[test]
fn shadowing_in_nested_block_is_allowed() {
    let source = r#"
        int main() {
            int x;
            x = 1;
            { int x; x = 2; }
            return x;
        }
    "#;
    assert!(compile_to_ir(source).is_ok());
}

#[test]
fn variable_does_not_escape_its_block() {
    let source = r#"
        int main() {
            { int y; y = 1; }
            y = 2;
            return 0;
        }
    "#;
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::UndefinedVariable);
}

#[test]
fn function_redefinition() {
    let source = r#"
        int f() { return 1; }
        int f() { return 2; }
    "#;
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::FunctionRedefinition);
}

#[test]
fn parameter_redefinition() {
    let source = "int f(int a, int a) { return a; }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::ParameterRedefinition);
}

#[test]
fn too_many_arguments() {
    let source = r#"
        int add(int a, int b) { return a + b; }
        int main() { return add(1, 2, 3); }
    "#;
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::ArgumentCountMismatch);
}

#[test]
fn too_few_arguments() {
    let source = r#"
        int add(int a, int b) { return a + b; }
        int main() { return add(1); }
    "#;
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::ArgumentCountMismatch);
}

#[test]
fn break_outside_loop() {
    let source = "int main() { break; return 0; }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::BreakOutsideLoop);
}

#[test]
fn continue_outside_loop() {
    let source = "int main() { continue; return 0; }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::ContinueOutsideLoop);
}

#[test]
fn break_after_loop_is_still_outside() {
    let source = r#"
        int main() {
            while (0) { }
            break;
            return 0;
        }
    "#;
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::BreakOutsideLoop);
}

#[test]
fn invalid_octal_literal() {
    let source = "int main() { return 09; }";
    assert_semantic_error(compile_to_ir(source), SemanticErrorKind::InvalidLiteral);
}

// ── Structural misuse on raw syntax trees ────────────────────────────────
// The lowering entry accepts any tree, not just parser output.

#[test]
fn nested_function_definitions_are_rejected() {
    let inner = func_def("g", AstNode::leaf(AstKind::Block));
    let outer = func_def("f", AstNode::new(AstKind::Block, vec![inner]));
    let program = Program { items: vec![outer] };

    assert_semantic_error(ir_generator::lower(&program), SemanticErrorKind::NestedFunction);
}

#[test]
fn missing_parameter_name_is_rejected() {
    let bad_param = AstNode::leaf(AstKind::Param { ty: TypeSpec::Int });
    let def = AstNode::new(
        AstKind::FuncDef { ret_ty: TypeSpec::Int },
        vec![
            ident("f"),
            AstNode::new(AstKind::ParamList, vec![bad_param]),
            AstNode::leaf(AstKind::Block),
        ],
    );
    let program = Program { items: vec![def] };

    assert_semantic_error(ir_generator::lower(&program), SemanticErrorKind::MalformedNode);
}

#[test]
fn unsupported_top_level_node_is_ignored() {
    // unhandled tags are logged and skipped, not errors
    let program = Program {
        items: vec![AstNode::leaf(AstKind::ParamList)],
    };
    let module = ir_generator::lower(&program).unwrap();
    assert_eq!(module.functions().count(), 0);
}

// ── Error location accuracy ──────────────────────────────────────────────

#[test]
fn semantic_error_reports_line() {
    let source = "int main() {\n    int x;\n    x = missing;\n    return x;\n}\n";
    match compile_to_ir(source) {
        Err(CompileError::Semantic { kind, line, .. }) => {
            assert_eq!(kind, SemanticErrorKind::UndefinedVariable);
            assert_eq!(line, 3, "error should point at the use site");
        }
        other => panic!("expected a semantic error, got {:?}", other),
    }
}

#[test]
fn parse_error_reports_line_and_column() {
    let source = "int main() {\n    return 1 + ;\n}\n";
    match compile_to_ir(source) {
        Err(CompileError::Parse { line, col, .. }) => {
            assert_eq!(line, 2);
            assert!(col > 1);
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn lexical_error_reports_position() {
    let source = "int main() { return @1; }";
    match compile_to_ir(source) {
        Err(CompileError::Lexical(e)) => {
            assert_eq!(e.line, 1);
            assert_eq!(e.unexpected_char, '@');
        }
        other => panic!("expected a lexical error, got {:?}", other),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn ident(name: &str) -> AstNode {
    AstNode::leaf(AstKind::Ident {
        name: name.to_string(),
        line: 1,
    })
}

fn func_def(name: &str, body: AstNode) -> AstNode {
    AstNode::new(
        AstKind::FuncDef { ret_ty: TypeSpec::Int },
        vec![ident(name), AstNode::leaf(AstKind::ParamList), body],
    )
}

fn assert_semantic_error(
    result: Result<minic_compiler::ir::Module, CompileError>,
    expected: SemanticErrorKind,
) {
    match result {
        Ok(_) => panic!("Expected {:?} error, but compilation succeeded", expected),
        Err(CompileError::Semantic { kind, .. }) => {
            assert_eq!(kind, expected);
        }
        Err(other) => panic!("Expected {:?} semantic error, got: {:?}", expected, other),
    }
}
