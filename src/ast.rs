//! The syntax tree consumed by the IR generator.
//!
//! Nodes are uniform: a kind tag plus an ordered child list. Leaf payloads
//! carry what the source provides (literal text, identifier names, declared
//! types, line numbers); everything structural is expressed through the
//! children. The tree is read-only input to lowering.

/// A type as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpec {
    Int,
    Void,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    /// Integer literal, kept as raw token text (decimal, `0` octal, or
    /// `0x` hex). Decoding happens during lowering.
    IntLiteral { text: String, line: usize },
    Ident { name: String, line: usize },

    // binary operators; children are [left, right]
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    LogicAnd,
    LogicOr,

    // unary operators; one child
    LogicNot,
    Neg,

    /// children: [lvalue ident, value expression]
    Assign,
    /// children: [] or [value expression]
    Return,
    Block,
    /// children: one `VarDecl` per declared name
    DeclStmt,
    /// children: [ident]
    VarDecl { ty: TypeSpec },
    /// children: [condition, then-statement]
    If,
    /// children: [condition, then-statement, else-statement]
    IfElse,
    /// children: [condition, body-statement]
    While,
    Break { line: usize },
    Continue { line: usize },

    /// children: [name ident, param-list, body block]
    FuncDef { ret_ty: TypeSpec },
    /// children: [name ident, argument expressions...]
    FuncCall,
    ParamList,
    /// children: [ident]
    Param { ty: TypeSpec },
}

impl AstKind {
    /// True for kinds that produce a value when lowered.
    pub fn is_expr(&self) -> bool {
        matches!(
            self,
            AstKind::IntLiteral { .. }
                | AstKind::Ident { .. }
                | AstKind::Add
                | AstKind::Sub
                | AstKind::Mul
                | AstKind::Div
                | AstKind::Mod
                | AstKind::Lt
                | AstKind::Gt
                | AstKind::Le
                | AstKind::Ge
                | AstKind::Eq
                | AstKind::Ne
                | AstKind::LogicAnd
                | AstKind::LogicOr
                | AstKind::LogicNot
                | AstKind::Neg
                | AstKind::FuncCall
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: AstKind,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn new(kind: AstKind, children: Vec<AstNode>) -> Self {
        Self { kind, children }
    }

    pub fn leaf(kind: AstKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }
}

/// An ordered list of top-level items (function definitions).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub items: Vec<AstNode>,
}
