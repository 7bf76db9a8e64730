use super::context::{
    binary_children, ident_parts, malformed, ternary_children, FuncGen, Gen, LoopLabels,
};
use crate::ast::{AstKind, AstNode, Program, TypeSpec};
use crate::ir::module::{Param, Prototype};
use crate::ir::{Instr, IrType};
use crate::{CompileError, SemanticErrorKind};

impl Gen {
    pub fn lower_program(&mut self, program: &Program) -> Result<(), CompileError> {
        // First pass: register every function prototype so forward and
        // mutually recursive calls resolve during body lowering.
        for item in &program.items {
            if let AstKind::FuncDef { ret_ty } = &item.kind {
                let proto = prototype_from_def(item, *ret_ty)?;
                let (name, line) = (proto.name.clone(), proto.line);
                if self.module.declare(proto).is_none() {
                    return Err(CompileError::semantic(
                        SemanticErrorKind::FunctionRedefinition,
                        line,
                        format!("function '{}' already defined", name),
                    ));
                }
            }
        }

        // Second pass: lower all top-level items in source order.
        for item in &program.items {
            self.lower_top(item)?;
        }
        Ok(())
    }

    fn lower_top(&mut self, node: &AstNode) -> Result<(), CompileError> {
        match &node.kind {
            AstKind::FuncDef { .. } => self.lower_function(node),
            other => {
                log::warn!("no lowering handler for top-level {:?}; ignoring", other);
                Ok(())
            }
        }
    }

    fn lower_function(&mut self, node: &AstNode) -> Result<(), CompileError> {
        let (name_node, _, body) = ternary_children(node)?;
        let (name, line) = ident_parts(name_node)?;

        let id = match self.module.lookup(name) {
            Some(id) => id,
            None => {
                return Err(CompileError::semantic(
                    SemanticErrorKind::UndefinedFunction,
                    line,
                    format!("function '{}' has no registered prototype", name),
                ))
            }
        };

        let mut fg = FuncGen::new(&self.module, id);
        fg.lower_body(body)?;
        let func = fg.finish();
        self.module.define(id, func);
        Ok(())
    }
}

impl FuncGen<'_> {
    /// Lower a function body: Entry, parameter binds, the body statements,
    /// then the shared exit label and Exit. The body block shares the
    /// function's top scope frame, so parameters and body-level locals
    /// resolve together.
    pub(crate) fn lower_body(&mut self, body: &AstNode) -> Result<(), CompileError> {
        if !matches!(body.kind, AstKind::Block) {
            return Err(malformed(body));
        }

        self.emit(Instr::Entry);
        self.bind_params()?;

        for stmt in &body.children {
            self.lower_stmt(stmt)?;
        }

        let exit = self.func.exit_label();
        self.emit(Instr::Label(exit));
        self.emit(Instr::Exit(self.func.return_slot()));
        Ok(())
    }

    /// Parameters are pass-by-value: each one is copied into a named local
    /// so mutation inside the body never aliases the caller.
    fn bind_params(&mut self) -> Result<(), CompileError> {
        for i in 0..self.func.params().len() {
            let (pname, pty) = {
                let p = &self.func.params()[i];
                (p.name.clone(), p.ty)
            };
            let local = self.func.new_local(Some(pname.clone()), pty);
            if self.scopes.declare(&pname, local).is_err() {
                return Err(CompileError::semantic(
                    SemanticErrorKind::ParameterRedefinition,
                    self.def_line,
                    format!("parameter '{}' defined multiple times", pname),
                ));
            }
            let src = self.func.param_value(i);
            self.emit(Instr::Move { dst: local, src });
        }
        Ok(())
    }

    pub(crate) fn lower_stmt(&mut self, node: &AstNode) -> Result<(), CompileError> {
        match &node.kind {
            AstKind::Block => self.lower_block(node),
            AstKind::DeclStmt => {
                for decl in &node.children {
                    self.lower_var_decl(decl)?;
                }
                Ok(())
            }
            AstKind::VarDecl { .. } => self.lower_var_decl(node),
            AstKind::Assign => self.lower_assign(node),
            AstKind::If => self.lower_if(node),
            AstKind::IfElse => self.lower_if_else(node),
            AstKind::While => self.lower_while(node),
            AstKind::Break { line } => self.lower_break(*line),
            AstKind::Continue { line } => self.lower_continue(*line),
            AstKind::Return => self.lower_return(node),
            AstKind::FuncDef { .. } => {
                let line = node
                    .children
                    .first()
                    .and_then(|n| ident_parts(n).ok())
                    .map(|(_, line)| line)
                    .unwrap_or(0);
                Err(CompileError::semantic(
                    SemanticErrorKind::NestedFunction,
                    line,
                    "function definitions cannot nest",
                ))
            }
            k if k.is_expr() => {
                // expression statement: evaluate for effects, discard value
                self.lower_expr(node)?;
                Ok(())
            }
            other => {
                log::warn!("no lowering handler for {:?} in statement position; ignoring", other);
                Ok(())
            }
        }
    }

    fn lower_block(&mut self, node: &AstNode) -> Result<(), CompileError> {
        self.scopes.enter_scope();
        let result = node.children.iter().try_for_each(|s| self.lower_stmt(s));
        self.scopes.leave_scope();
        result
    }

    fn lower_var_decl(&mut self, node: &AstNode) -> Result<(), CompileError> {
        let ty = match &node.kind {
            AstKind::VarDecl { ty: TypeSpec::Int } => IrType::Int32,
            AstKind::VarDecl { ty: TypeSpec::Void } => {
                return Err(CompileError::semantic(
                    SemanticErrorKind::MalformedNode,
                    0,
                    "cannot declare a variable of type void",
                ))
            }
            _ => return Err(malformed(node)),
        };

        let name_node = match node.children.first() {
            Some(n) => n,
            None => return Err(malformed(node)),
        };
        let (name, line) = ident_parts(name_node)?;

        let value = self.func.new_local(Some(name.to_string()), ty);
        if self.scopes.declare(name, value).is_err() {
            return Err(CompileError::semantic(
                SemanticErrorKind::VariableRedefinition,
                line,
                format!("variable '{}' already declared in this scope", name),
            ));
        }
        Ok(())
    }

    /// Right-hand side first, then lvalue resolution, then the move; the
    /// RHS instructions precede the move by convention, fixing evaluation
    /// order.
    fn lower_assign(&mut self, node: &AstNode) -> Result<(), CompileError> {
        let (lhs, rhs) = binary_children(node)?;
        let src = self.lower_expr(rhs)?;

        let (name, line) = ident_parts(lhs)?;
        let dst = self.scopes.resolve(name).ok_or_else(|| {
            CompileError::semantic(
                SemanticErrorKind::UndefinedVariable,
                line,
                format!("variable '{}' is not declared", name),
            )
        })?;

        self.emit(Instr::Move { dst, src });
        Ok(())
    }

    fn lower_if(&mut self, node: &AstNode) -> Result<(), CompileError> {
        let (cond, then_stmt) = binary_children(node)?;
        let then_label = self.new_label();
        let end_label = self.new_label();

        let c = self.lower_expr(cond)?;
        let b = self.to_bool(c);
        self.emit(Instr::CondGoto {
            cond: b,
            on_true: then_label,
            on_false: end_label,
        });

        self.emit(Instr::Label(then_label));
        self.lower_stmt(then_stmt)?;

        self.emit(Instr::Label(end_label));
        Ok(())
    }

    fn lower_if_else(&mut self, node: &AstNode) -> Result<(), CompileError> {
        let (cond, then_stmt, else_stmt) = ternary_children(node)?;
        let then_label = self.new_label();
        let else_label = self.new_label();
        let end_label = self.new_label();

        let c = self.lower_expr(cond)?;
        let b = self.to_bool(c);
        self.emit(Instr::CondGoto {
            cond: b,
            on_true: then_label,
            on_false: else_label,
        });

        self.emit(Instr::Label(then_label));
        self.lower_stmt(then_stmt)?;
        self.emit(Instr::Goto(end_label));

        self.emit(Instr::Label(else_label));
        self.lower_stmt(else_stmt)?;

        self.emit(Instr::Label(end_label));
        Ok(())
    }

    /// The condition is re-evaluated at the condition label every
    /// iteration; `continue` re-enters there and `break` jumps past the
    /// end label.
    fn lower_while(&mut self, node: &AstNode) -> Result<(), CompileError> {
        let (cond, body) = binary_children(node)?;
        let cond_label = self.new_label();
        let body_label = self.new_label();
        let end_label = self.new_label();

        self.emit(Instr::Label(cond_label));
        let c = self.lower_expr(cond)?;
        let b = self.to_bool(c);
        self.emit(Instr::CondGoto {
            cond: b,
            on_true: body_label,
            on_false: end_label,
        });

        self.emit(Instr::Label(body_label));
        self.loops.push(LoopLabels {
            break_to: end_label,
            continue_to: cond_label,
        });
        let body_result = self.lower_stmt(body);
        self.loops.pop();
        body_result?;

        self.emit(Instr::Goto(cond_label));
        self.emit(Instr::Label(end_label));
        Ok(())
    }

    fn lower_break(&mut self, line: usize) -> Result<(), CompileError> {
        let target = match self.loops.last() {
            Some(labels) => labels.break_to,
            None => {
                return Err(CompileError::semantic(
                    SemanticErrorKind::BreakOutsideLoop,
                    line,
                    "break statement outside of any loop",
                ))
            }
        };
        self.emit(Instr::Goto(target));
        Ok(())
    }

    fn lower_continue(&mut self, line: usize) -> Result<(), CompileError> {
        let target = match self.loops.last() {
            Some(labels) => labels.continue_to,
            None => {
                return Err(CompileError::semantic(
                    SemanticErrorKind::ContinueOutsideLoop,
                    line,
                    "continue statement outside of any loop",
                ))
            }
        };
        self.emit(Instr::Goto(target));
        Ok(())
    }

    /// Every return moves into the function's return slot (skipped for
    /// void) and jumps to the single exit label; there is no structural
    /// early exit.
    fn lower_return(&mut self, node: &AstNode) -> Result<(), CompileError> {
        if let Some(expr) = node.children.first() {
            let v = self.lower_expr(expr)?;
            if let Some(slot) = self.func.return_slot() {
                self.emit(Instr::Move { dst: slot, src: v });
            }
        }
        let exit = self.func.exit_label();
        self.emit(Instr::Goto(exit));
        Ok(())
    }
}

/// Extract a function's prototype from its definition node. Missing or
/// malformed parameter information is a hard error.
fn prototype_from_def(node: &AstNode, ret_ty: TypeSpec) -> Result<Prototype, CompileError> {
    let (name_node, params_node, _body) = ternary_children(node)?;
    let (name, line) = ident_parts(name_node)?;

    if !matches!(params_node.kind, AstKind::ParamList) {
        return Err(malformed(node));
    }

    let mut params = Vec::with_capacity(params_node.children.len());
    for p in &params_node.children {
        let ty = match &p.kind {
            AstKind::Param { ty: TypeSpec::Int } => IrType::Int32,
            _ => return Err(malformed(p)),
        };
        let name_node = match p.children.first() {
            Some(n) => n,
            None => return Err(malformed(p)),
        };
        let (pname, _) = ident_parts(name_node)?;
        params.push(Param {
            name: pname.to_string(),
            ty,
        });
    }

    let return_ty = match ret_ty {
        TypeSpec::Int => IrType::Int32,
        TypeSpec::Void => IrType::Void,
    };

    Ok(Prototype {
        name: name.to_string(),
        return_ty,
        params,
        line,
    })
}
