use crate::ast::{AstKind, AstNode};
use crate::ir::module::{Function, Module};
use crate::ir::symbol_table::ScopeStack;
use crate::ir::{FuncId, Instr, IrType, LabelId, ValueId};
use crate::{CompileError, SemanticErrorKind};

/// Break/continue targets of one enclosing loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopLabels {
    pub break_to: LabelId,
    pub continue_to: LabelId,
}

/// Orchestrates lowering of a whole compilation unit.
pub struct Gen {
    pub(crate) module: Module,
}

impl Gen {
    pub fn new() -> Self {
        Self {
            module: Module::new(),
        }
    }

    pub fn finish(self) -> Module {
        self.module
    }
}

impl Default for Gen {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-function lowering state, threaded explicitly through the recursive
/// descent: the stream under construction, the scope stack, and the active
/// loop targets. Dropped state never leaks into the finished `Function`.
pub struct FuncGen<'m> {
    pub(crate) module: &'m Module,
    pub(crate) func: Function,
    pub(crate) scopes: ScopeStack,
    pub(crate) loops: Vec<LoopLabels>,
    /// Source line of the definition, for parameter diagnostics.
    pub(crate) def_line: usize,
}

impl<'m> FuncGen<'m> {
    pub(crate) fn new(module: &'m Module, id: FuncId) -> Self {
        let proto = module.proto(id);
        let func = Function::new(proto);
        let def_line = proto.line;
        Self {
            module,
            func,
            scopes: ScopeStack::new(),
            loops: Vec::new(),
            def_line,
        }
    }

    pub(crate) fn finish(self) -> Function {
        self.func
    }

    pub(crate) fn emit(&mut self, i: Instr) {
        self.func.push(i);
    }

    pub(crate) fn new_temp(&mut self, ty: IrType) -> ValueId {
        self.func.new_local(None, ty)
    }

    pub(crate) fn new_label(&mut self) -> LabelId {
        self.func.new_label()
    }
}

// ── Node-shape helpers ───────────────────────────────────────────────────

pub(super) fn binary_children(node: &AstNode) -> Result<(&AstNode, &AstNode), CompileError> {
    match node.children.as_slice() {
        [l, r] => Ok((l, r)),
        _ => Err(malformed(node)),
    }
}

pub(super) fn ternary_children(
    node: &AstNode,
) -> Result<(&AstNode, &AstNode, &AstNode), CompileError> {
    match node.children.as_slice() {
        [a, b, c] => Ok((a, b, c)),
        _ => Err(malformed(node)),
    }
}

pub(super) fn only_child(node: &AstNode) -> Result<&AstNode, CompileError> {
    match node.children.as_slice() {
        [c] => Ok(c),
        _ => Err(malformed(node)),
    }
}

pub(super) fn ident_parts(node: &AstNode) -> Result<(&str, usize), CompileError> {
    match &node.kind {
        AstKind::Ident { name, line } => Ok((name, *line)),
        _ => Err(malformed(node)),
    }
}

pub(super) fn malformed(node: &AstNode) -> CompileError {
    CompileError::semantic(
        SemanticErrorKind::MalformedNode,
        0,
        format!("malformed syntax node: {:?}", node.kind),
    )
}
