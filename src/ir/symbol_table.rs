use crate::ir::ValueId;
use std::collections::HashMap;

/// A stack of lexical name->value frames.
///
/// Lookup is innermost-first, so an inner frame may shadow an outer binding;
/// redeclaring a name within one frame is rejected. A fresh stack starts
/// with a single frame: the function's top-level scope, which parameters
/// and body-level locals share.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, ValueId>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Enter a nested lexical block.
    pub fn enter_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Leave the innermost block, discarding its bindings. The function's
    /// top frame is never popped.
    pub fn leave_scope(&mut self) {
        debug_assert!(self.frames.len() > 1, "leave_scope without matching enter_scope");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind a name in the innermost frame. Fails only on redeclaration
    /// within that same frame; shadowing an outer frame is allowed.
    pub fn declare(&mut self, name: &str, value: ValueId) -> Result<(), ValueId> {
        let idx = self.frames.len() - 1;
        let frame = &mut self.frames[idx];
        if let Some(existing) = frame.get(name) {
            return Err(*existing);
        }
        frame.insert(name.to_string(), value);
        Ok(())
    }

    /// Resolve a name, innermost frame first.
    pub fn resolve(&self, name: &str) -> Option<ValueId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
