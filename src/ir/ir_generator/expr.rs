use super::context::{binary_children, ident_parts, malformed, only_child, FuncGen};
use crate::ast::{AstKind, AstNode};
use crate::ir::{BinaryOp, Instr, IrType, ValueId};
use crate::{CompileError, SemanticErrorKind};

impl FuncGen<'_> {
    /// Lower an expression node; the returned value is the node's result
    /// operand, produced after every instruction the node emitted.
    pub(crate) fn lower_expr(&mut self, node: &AstNode) -> Result<ValueId, CompileError> {
        match &node.kind {
            AstKind::IntLiteral { text, line } => {
                let n = self.parse_literal(text, *line)?;
                Ok(self.func.new_const(n as i32))
            }

            AstKind::Ident { name, line } => self.scopes.resolve(name).ok_or_else(|| {
                CompileError::semantic(
                    SemanticErrorKind::UndefinedVariable,
                    *line,
                    format!("variable '{}' is not declared", name),
                )
            }),

            AstKind::Add => self.lower_arith(node, BinaryOp::Add),
            AstKind::Sub => self.lower_arith(node, BinaryOp::Sub),
            AstKind::Mul => self.lower_arith(node, BinaryOp::Mul),
            AstKind::Div => self.lower_arith(node, BinaryOp::Div),
            AstKind::Mod => self.lower_arith(node, BinaryOp::Mod),

            AstKind::Lt => self.lower_comparison(node, BinaryOp::Lt),
            AstKind::Gt => self.lower_comparison(node, BinaryOp::Gt),
            AstKind::Le => self.lower_comparison(node, BinaryOp::Le),
            AstKind::Ge => self.lower_comparison(node, BinaryOp::Ge),
            AstKind::Eq => self.lower_comparison(node, BinaryOp::Eq),
            AstKind::Ne => self.lower_comparison(node, BinaryOp::Ne),

            AstKind::LogicAnd => self.lower_logic_and(node),
            AstKind::LogicOr => self.lower_logic_or(node),
            AstKind::LogicNot => self.lower_logic_not(node),
            AstKind::Neg => self.lower_neg(node),

            AstKind::FuncCall => self.lower_call(node),

            _ => Err(malformed(node)),
        }
    }

    /// Left child, right child, then one arithmetic instruction. The fixed
    /// left-to-right order matters once operands contain calls.
    fn lower_arith(&mut self, node: &AstNode, op: BinaryOp) -> Result<ValueId, CompileError> {
        let (l, r) = binary_children(node)?;
        let lhs = self.lower_expr(l)?;
        let rhs = self.lower_expr(r)?;
        let dst = self.func.new_result(op.result_type());
        self.emit(Instr::Binary { op, dst, lhs, rhs });
        Ok(dst)
    }

    /// Comparisons yield Bool and are always landed in a fresh temporary by
    /// a move directly after the compare.
    fn lower_comparison(&mut self, node: &AstNode, op: BinaryOp) -> Result<ValueId, CompileError> {
        let (l, r) = binary_children(node)?;
        let lhs = self.lower_expr(l)?;
        let rhs = self.lower_expr(r)?;
        let cmp = self.func.new_result(op.result_type());
        self.emit(Instr::Binary { op, dst: cmp, lhs, rhs });
        let tmp = self.new_temp(IrType::Bool);
        self.emit(Instr::Move { dst: tmp, src: cmp });
        Ok(tmp)
    }

    /// `a && b` with short-circuit: `b` only runs when `a` is true, so its
    /// side effects are skipped otherwise. The result temp receives `b`'s
    /// raw value on the right path and constant 0 on the short path.
    fn lower_logic_and(&mut self, node: &AstNode) -> Result<ValueId, CompileError> {
        let (l, r) = binary_children(node)?;
        let rhs_label = self.new_label();
        let short_label = self.new_label();
        let end_label = self.new_label();
        let result = self.new_temp(IrType::Int32);

        let lv = self.lower_expr(l)?;
        let lb = self.to_bool(lv);
        self.emit(Instr::CondGoto {
            cond: lb,
            on_true: rhs_label,
            on_false: short_label,
        });

        self.emit(Instr::Label(rhs_label));
        let rv = self.lower_expr(r)?;
        self.emit(Instr::Move { dst: result, src: rv });
        self.emit(Instr::Goto(end_label));

        self.emit(Instr::Label(short_label));
        let zero = self.func.new_const(0);
        self.emit(Instr::Move { dst: result, src: zero });

        self.emit(Instr::Label(end_label));
        Ok(result)
    }

    /// `a || b`, mirror of `&&`: the short path moves constant 1.
    fn lower_logic_or(&mut self, node: &AstNode) -> Result<ValueId, CompileError> {
        let (l, r) = binary_children(node)?;
        let rhs_label = self.new_label();
        let short_label = self.new_label();
        let end_label = self.new_label();
        let result = self.new_temp(IrType::Int32);

        let lv = self.lower_expr(l)?;
        let lb = self.to_bool(lv);
        self.emit(Instr::CondGoto {
            cond: lb,
            on_true: short_label,
            on_false: rhs_label,
        });

        self.emit(Instr::Label(rhs_label));
        let rv = self.lower_expr(r)?;
        self.emit(Instr::Move { dst: result, src: rv });
        self.emit(Instr::Goto(end_label));

        self.emit(Instr::Label(short_label));
        let one = self.func.new_const(1);
        self.emit(Instr::Move { dst: result, src: one });

        self.emit(Instr::Label(end_label));
        Ok(result)
    }

    /// `!x` is an equal-to-zero comparison.
    fn lower_logic_not(&mut self, node: &AstNode) -> Result<ValueId, CompileError> {
        let operand = only_child(node)?;
        let v = self.lower_expr(operand)?;
        let zero = self.func.new_const(0);
        let cmp = self.func.new_result(IrType::Bool);
        self.emit(Instr::Binary {
            op: BinaryOp::Eq,
            dst: cmp,
            lhs: v,
            rhs: zero,
        });
        let tmp = self.new_temp(IrType::Bool);
        self.emit(Instr::Move { dst: tmp, src: cmp });
        Ok(tmp)
    }

    /// Unary minus folds literals in place; anything else subtracts from
    /// zero.
    fn lower_neg(&mut self, node: &AstNode) -> Result<ValueId, CompileError> {
        let operand = only_child(node)?;
        if let AstKind::IntLiteral { text, line } = &operand.kind {
            let n = self.parse_literal(text, *line)?;
            return Ok(self.func.new_const((n as i32).wrapping_neg()));
        }

        let v = self.lower_expr(operand)?;
        let zero = self.func.new_const(0);
        let dst = self.func.new_result(IrType::Int32);
        self.emit(Instr::Binary {
            op: BinaryOp::Sub,
            dst,
            lhs: zero,
            rhs: v,
        });
        Ok(dst)
    }

    fn lower_call(&mut self, node: &AstNode) -> Result<ValueId, CompileError> {
        let (name_node, args) = match node.children.split_first() {
            Some(split) => split,
            None => return Err(malformed(node)),
        };
        let (name, line) = ident_parts(name_node)?;

        let module = self.module;
        let callee = module.lookup(name).ok_or_else(|| {
            CompileError::semantic(
                SemanticErrorKind::UndefinedFunction,
                line,
                format!("function '{}' is not defined", name),
            )
        })?;

        self.func.note_call(args.len());

        // arguments evaluate left to right
        let mut arg_values = Vec::with_capacity(args.len());
        for a in args {
            arg_values.push(self.lower_expr(a)?);
        }

        let proto = module.proto(callee);
        let expected = proto.params.len();
        if arg_values.len() != expected {
            return Err(CompileError::semantic(
                SemanticErrorKind::ArgumentCountMismatch,
                line,
                format!(
                    "function '{}' expects {} argument{}, got {}",
                    name,
                    expected,
                    if expected == 1 { "" } else { "s" },
                    arg_values.len()
                ),
            ));
        }

        let dst = self.func.new_result(proto.return_ty);
        self.emit(Instr::Call {
            dst,
            callee,
            args: arg_values,
        });
        Ok(dst)
    }

    /// Normalize an operand to Bool. Bool values pass through; anything else
    /// is compared not-equal-zero and the comparison result is landed in a
    /// fresh Bool temp, all emitted inline.
    pub(crate) fn to_bool(&mut self, v: ValueId) -> ValueId {
        if self.func.value_type(v) == IrType::Bool {
            return v;
        }
        let zero = self.func.new_const(0);
        let cmp = self.func.new_result(IrType::Bool);
        self.emit(Instr::Binary {
            op: BinaryOp::Ne,
            dst: cmp,
            lhs: v,
            rhs: zero,
        });
        let tmp = self.new_temp(IrType::Bool);
        self.emit(Instr::Move { dst: tmp, src: cmp });
        tmp
    }

    fn parse_literal(&self, text: &str, line: usize) -> Result<u32, CompileError> {
        parse_int_literal(text).ok_or_else(|| {
            CompileError::semantic(
                SemanticErrorKind::InvalidLiteral,
                line,
                format!("invalid integer literal '{}'", text),
            )
        })
    }
}

/// Integer literals reach lowering as raw token text. Decimal, `0`-prefixed
/// octal, and `0x`-prefixed hexadecimal forms are parsed as 32-bit unsigned.
pub fn parse_int_literal(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u32::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse::<u32>().ok()
    }
}
