//! AST to IR lowering module.
//!
//! This module handles the translation of the syntax tree into a linear
//! intermediate representation. The top level is lowered in two passes:
//! every function prototype is registered before any body is lowered, so
//! forward and mutually recursive calls resolve; bodies then follow in
//! source order.

pub mod context;
pub mod expr;
pub mod stmt;

/// The main Gen struct that orchestrates the lowering process.
pub use context::Gen;

use crate::ast::Program;
use crate::ir::module::Module;
use crate::CompileError;

/// Entry point for lowering a syntax tree to an IR `Module`.
pub fn lower(program: &Program) -> Result<Module, CompileError> {
    let mut g = Gen::new();
    g.lower_program(program)?;
    Ok(g.finish())
}
