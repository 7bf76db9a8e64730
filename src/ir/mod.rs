//! Intermediate Representation (IR) module.
//!
//! This module contains the IR definitions (typed operands and the linear
//! instruction stream), the function/module registry, the scope table, and
//! the AST-to-IR generator.

pub mod ir;
pub use ir::*;
pub mod module;
pub use module::{Function, Module, Param, Prototype};
pub mod ir_generator;
pub mod symbol_table;
