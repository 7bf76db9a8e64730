//! Function and module registry.
//!
//! Prototypes are registered signatures-first so bodies lowered later can
//! call forward and mutually recursive functions. Once defined, functions
//! are immutable to callers outside this crate: the lowering engine mutates
//! through the `pub(crate)` methods only.

use std::collections::HashMap;
use std::fmt;

use super::ir::{FuncId, Instr, IrType, LabelId, ValueDef, ValueId};

/// A named, typed formal parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: IrType,
}

/// A function's externally visible signature, registered independently of
/// its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prototype {
    pub name: String,
    pub return_ty: IrType,
    pub params: Vec<Param>,
    /// Source line of the definition, for diagnostics.
    pub line: usize,
}

/// A lowered function: its value arena and linear instruction stream.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    return_ty: IrType,
    params: Vec<Param>,
    values: Vec<ValueDef>,
    instrs: Vec<Instr>,
    labels: u32,
    exit_label: LabelId,
    ret_slot: Option<ValueId>,
    makes_calls: bool,
    max_call_args: usize,
}

impl Function {
    pub(crate) fn new(proto: &Prototype) -> Self {
        let mut values: Vec<ValueDef> = proto
            .params
            .iter()
            .enumerate()
            .map(|(index, p)| ValueDef::Param {
                name: p.name.clone(),
                index,
                ty: p.ty,
            })
            .collect();

        // Dedicated return-value local; every `return` moves into it before
        // jumping to the shared exit label.
        let ret_slot = if proto.return_ty.is_void() {
            None
        } else {
            values.push(ValueDef::Local {
                name: None,
                ty: proto.return_ty,
            });
            Some(ValueId(values.len() as u32 - 1))
        };

        Self {
            name: proto.name.clone(),
            return_ty: proto.return_ty,
            params: proto.params.clone(),
            values,
            instrs: Vec::new(),
            labels: 1,
            exit_label: LabelId(0),
            ret_slot,
            makes_calls: false,
            max_call_args: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_ty(&self) -> IrType {
        self.return_ty
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    pub fn value(&self, id: ValueId) -> &ValueDef {
        &self.values[id.index()]
    }

    pub fn value_type(&self, id: ValueId) -> IrType {
        self.values[id.index()].ty()
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[ValueDef] {
        &self.values
    }

    /// The caller-visible value of the i-th formal parameter.
    pub fn param_value(&self, index: usize) -> ValueId {
        ValueId(index as u32)
    }

    pub fn exit_label(&self) -> LabelId {
        self.exit_label
    }

    pub fn return_slot(&self) -> Option<ValueId> {
        self.ret_slot
    }

    /// Whether this function contains any `Call` instruction.
    pub fn makes_calls(&self) -> bool {
        self.makes_calls
    }

    /// Largest argument count among this function's call sites.
    pub fn max_call_args(&self) -> usize {
        self.max_call_args
    }

    pub(crate) fn new_const(&mut self, value: i32) -> ValueId {
        self.push_value(ValueDef::Const(value))
    }

    pub(crate) fn new_local(&mut self, name: Option<String>, ty: IrType) -> ValueId {
        self.push_value(ValueDef::Local { name, ty })
    }

    pub(crate) fn new_result(&mut self, ty: IrType) -> ValueId {
        self.push_value(ValueDef::InstrResult { ty })
    }

    pub(crate) fn new_label(&mut self) -> LabelId {
        let l = LabelId(self.labels);
        self.labels += 1;
        l
    }

    pub(crate) fn push(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    pub(crate) fn note_call(&mut self, arg_count: usize) {
        self.makes_calls = true;
        if arg_count > self.max_call_args {
            self.max_call_args = arg_count;
        }
    }

    fn push_value(&mut self, def: ValueDef) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(def);
        id
    }

    fn fmt_value(&self, id: ValueId) -> String {
        match &self.values[id.index()] {
            ValueDef::Const(c) => c.to_string(),
            ValueDef::Param { index, .. } => format!("%a{}", index),
            ValueDef::Local { name: Some(n), .. } => format!("%{}.{}", n, id.0),
            ValueDef::Local { name: None, .. } => format!("%t{}", id.0),
            ValueDef::InstrResult { .. } => format!("%t{}", id.0),
        }
    }
}

/// The finished compilation unit: prototypes plus their lowered bodies.
#[derive(Debug, Clone, Default)]
pub struct Module {
    protos: Vec<Prototype>,
    index: HashMap<String, FuncId>,
    funcs: Vec<Option<Function>>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prototype. Returns `None` if the name is already taken.
    pub(crate) fn declare(&mut self, proto: Prototype) -> Option<FuncId> {
        if self.index.contains_key(&proto.name) {
            return None;
        }
        let id = FuncId(self.protos.len() as u32);
        self.index.insert(proto.name.clone(), id);
        self.protos.push(proto);
        self.funcs.push(None);
        Some(id)
    }

    pub(crate) fn define(&mut self, id: FuncId, func: Function) {
        self.funcs[id.0 as usize] = Some(func);
    }

    pub fn lookup(&self, name: &str) -> Option<FuncId> {
        self.index.get(name).copied()
    }

    pub fn proto(&self, id: FuncId) -> &Prototype {
        &self.protos[id.0 as usize]
    }

    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.funcs.get(id.0 as usize)?.as_ref()
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.function(self.lookup(name)?)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.funcs.iter().filter_map(|f| f.as_ref())
    }

    /// The designated program entry function.
    pub fn entry(&self) -> Option<&Function> {
        self.function_by_name("main")
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }

    fn fmt_function(&self, f: &Function, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = f
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} %a{}", p.ty, i))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "fn @{}({}) -> {} {{", f.name, params, f.return_ty)?;

        for ins in &f.instrs {
            match ins {
                Instr::Entry => writeln!(out, "  entry")?,
                Instr::Exit(Some(v)) => writeln!(out, "  exit {}", f.fmt_value(*v))?,
                Instr::Exit(None) => writeln!(out, "  exit")?,
                Instr::Label(l) => writeln!(out, ".L{}:", l.0)?,
                Instr::Binary { op, dst, lhs, rhs } => writeln!(
                    out,
                    "  {} = {} {}, {}",
                    f.fmt_value(*dst),
                    op,
                    f.fmt_value(*lhs),
                    f.fmt_value(*rhs)
                )?,
                Instr::Move { dst, src } => {
                    writeln!(out, "  {} = {}", f.fmt_value(*dst), f.fmt_value(*src))?
                }
                Instr::Goto(l) => writeln!(out, "  goto .L{}", l.0)?,
                Instr::CondGoto {
                    cond,
                    on_true,
                    on_false,
                } => writeln!(
                    out,
                    "  br {}, .L{}, .L{}",
                    f.fmt_value(*cond),
                    on_true.0,
                    on_false.0
                )?,
                Instr::Call { dst, callee, args } => {
                    let rendered = args
                        .iter()
                        .map(|a| f.fmt_value(*a))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let name = &self.protos[callee.0 as usize].name;
                    if f.value_type(*dst).is_void() {
                        writeln!(out, "  call @{}({})", name, rendered)?
                    } else {
                        writeln!(out, "  {} = call @{}({})", f.fmt_value(*dst), name, rendered)?
                    }
                }
            }
        }
        writeln!(out, "}}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, func) in self.functions().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            self.fmt_function(func, f)?;
        }
        Ok(())
    }
}
