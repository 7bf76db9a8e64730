pub mod ast;
pub mod frontend;
pub mod interp;
pub mod ir;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexical error: {0}")]
    Lexical(#[from] frontend::lexer::LexicalError),

    #[error("Parse error at {line}:{col}: {message}")]
    Parse {
        line: usize,
        col: usize,
        context: String,
        message: String,
    },

    #[error("SemanticError:{kind} (line {line}) - {message}")]
    Semantic {
        kind: SemanticErrorKind,
        line: usize,
        message: String,
    },
}

impl CompileError {
    pub(crate) fn semantic(kind: SemanticErrorKind, line: usize, message: impl Into<String>) -> Self {
        CompileError::Semantic {
            kind,
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    UndefinedVariable,
    UndefinedFunction,
    VariableRedefinition,
    FunctionRedefinition,
    ParameterRedefinition,
    ArgumentCountMismatch,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    NestedFunction,
    InvalidLiteral,
    MalformedNode,
}

impl std::fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticErrorKind::UndefinedVariable => write!(f, "UndefinedVariable"),
            SemanticErrorKind::UndefinedFunction => write!(f, "UndefinedFunction"),
            SemanticErrorKind::VariableRedefinition => write!(f, "VariableRedefinition"),
            SemanticErrorKind::FunctionRedefinition => write!(f, "FunctionRedefinition"),
            SemanticErrorKind::ParameterRedefinition => write!(f, "ParameterRedefinition"),
            SemanticErrorKind::ArgumentCountMismatch => write!(f, "ArgumentCountMismatch"),
            SemanticErrorKind::BreakOutsideLoop => write!(f, "BreakOutsideLoop"),
            SemanticErrorKind::ContinueOutsideLoop => write!(f, "ContinueOutsideLoop"),
            SemanticErrorKind::NestedFunction => write!(f, "NestedFunction"),
            SemanticErrorKind::InvalidLiteral => write!(f, "InvalidLiteral"),
            SemanticErrorKind::MalformedNode => write!(f, "MalformedNode"),
        }
    }
}

/// Parse source text and lower it to an IR module.
pub fn compile_to_ir(source: &str) -> Result<ir::Module, CompileError> {
    let program = frontend::parse(source)?;
    ir::ir_generator::lower(&program)
}
