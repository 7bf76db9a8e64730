//! Reference interpreter for the linear IR.
//!
//! Executes a lowered `Module` directly: one frame of value slots per
//! activation, a program counter over the instruction stream, recursion on
//! `Call`. A step limit turns non-terminating programs into errors, and
//! label visit counts are recorded so tests can observe control flow (for
//! example, how many times a loop body was entered).

use std::collections::HashMap;

use thiserror::Error;

use crate::ir::module::{Function, Module};
use crate::ir::{BinaryOp, FuncId, Instr, LabelId, ValueDef};

pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} arguments, got {got}")]
    ArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("function '{0}' has no body")]
    UndefinedBody(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("step limit exceeded; the program may not terminate")]
    StepLimit,

    #[error("malformed instruction stream: {0}")]
    BadStream(String),
}

pub struct Machine<'m> {
    module: &'m Module,
    steps_left: u64,
    visits: HashMap<(FuncId, LabelId), u64>,
}

impl<'m> Machine<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self::with_step_limit(module, DEFAULT_STEP_LIMIT)
    }

    pub fn with_step_limit(module: &'m Module, limit: u64) -> Self {
        Self {
            module,
            steps_left: limit,
            visits: HashMap::new(),
        }
    }

    /// Run the module's entry function with no arguments.
    pub fn run(&mut self) -> Result<Option<i32>, ExecError> {
        self.call("main", &[])
    }

    pub fn call(&mut self, name: &str, args: &[i32]) -> Result<Option<i32>, ExecError> {
        let id = self
            .module
            .lookup(name)
            .ok_or_else(|| ExecError::UnknownFunction(name.to_string()))?;
        self.call_id(id, args)
    }

    /// Number of times execution reached the labeled point in `func`.
    pub fn label_visits(&self, func: &str, label: LabelId) -> u64 {
        match self.module.lookup(func) {
            Some(id) => self.visits.get(&(id, label)).copied().unwrap_or(0),
            None => 0,
        }
    }

    fn call_id(&mut self, id: FuncId, args: &[i32]) -> Result<Option<i32>, ExecError> {
        let module = self.module;
        let func = module
            .function(id)
            .ok_or_else(|| ExecError::UndefinedBody(module.proto(id).name.clone()))?;

        if args.len() != func.params().len() {
            return Err(ExecError::ArgumentCount {
                name: func.name().to_string(),
                expected: func.params().len(),
                got: args.len(),
            });
        }

        let label_at = label_positions(func);
        let mut slots = init_slots(func, args);

        let mut pc = 0usize;
        loop {
            if self.steps_left == 0 {
                return Err(ExecError::StepLimit);
            }
            self.steps_left -= 1;

            let instr = func.instrs().get(pc).ok_or_else(|| {
                ExecError::BadStream(format!(
                    "fell off the end of '{}' without an exit",
                    func.name()
                ))
            })?;

            match instr {
                Instr::Entry => pc += 1,
                Instr::Label(l) => {
                    *self.visits.entry((id, *l)).or_insert(0) += 1;
                    pc += 1;
                }
                Instr::Binary { op, dst, lhs, rhs } => {
                    let v = eval_binary(*op, slots[lhs.index()], slots[rhs.index()])?;
                    slots[dst.index()] = v;
                    pc += 1;
                }
                Instr::Move { dst, src } => {
                    slots[dst.index()] = slots[src.index()];
                    pc += 1;
                }
                Instr::Goto(l) => pc = jump(&label_at, *l)?,
                Instr::CondGoto {
                    cond,
                    on_true,
                    on_false,
                } => {
                    let target = if slots[cond.index()] != 0 {
                        *on_true
                    } else {
                        *on_false
                    };
                    pc = jump(&label_at, target)?;
                }
                Instr::Call {
                    dst,
                    callee,
                    args: call_args,
                } => {
                    let values: Vec<i32> =
                        call_args.iter().map(|a| slots[a.index()]).collect();
                    let result = self.call_id(*callee, &values)?;
                    slots[dst.index()] = result.unwrap_or(0);
                    pc += 1;
                }
                Instr::Exit(value) => return Ok(value.map(|v| slots[v.index()])),
            }
        }
    }
}

fn label_positions(func: &Function) -> HashMap<LabelId, usize> {
    let mut map = HashMap::new();
    for (i, instr) in func.instrs().iter().enumerate() {
        if let Instr::Label(l) = instr {
            map.insert(*l, i);
        }
    }
    map
}

fn init_slots(func: &Function, args: &[i32]) -> Vec<i32> {
    let mut slots = vec![0i32; func.value_count()];
    for (i, def) in func.values().iter().enumerate() {
        match def {
            ValueDef::Const(c) => slots[i] = *c,
            ValueDef::Param { index, .. } => slots[i] = args[*index],
            _ => {}
        }
    }
    slots
}

fn eval_binary(op: BinaryOp, lhs: i32, rhs: i32) -> Result<i32, ExecError> {
    Ok(match op {
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Sub => lhs.wrapping_sub(rhs),
        BinaryOp::Mul => lhs.wrapping_mul(rhs),
        BinaryOp::Div => {
            if rhs == 0 {
                return Err(ExecError::DivisionByZero);
            }
            lhs.wrapping_div(rhs)
        }
        BinaryOp::Mod => {
            if rhs == 0 {
                return Err(ExecError::DivisionByZero);
            }
            lhs.wrapping_rem(rhs)
        }
        BinaryOp::Lt => (lhs < rhs) as i32,
        BinaryOp::Gt => (lhs > rhs) as i32,
        BinaryOp::Le => (lhs <= rhs) as i32,
        BinaryOp::Ge => (lhs >= rhs) as i32,
        BinaryOp::Eq => (lhs == rhs) as i32,
        BinaryOp::Ne => (lhs != rhs) as i32,
    })
}

fn jump(label_at: &HashMap<LabelId, usize>, label: LabelId) -> Result<usize, ExecError> {
    label_at
        .get(&label)
        .copied()
        .ok_or_else(|| ExecError::BadStream(format!("jump to unknown label .L{}", label.0)))
}
