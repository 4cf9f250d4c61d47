//! Per-routine compilation context
//!
//! Owns the three mutable resources a routine compilation threads through
//! its tree walk: the scope stack mapping names to local slots, the label
//! counter, and the slot counter with its routine-wide running maximum.
//! Leaving a block restores the slot counter to its entry value so sibling
//! blocks reuse slots, but never the maximum (which becomes `.limit locals`)
//! and never the label counter (labels are unique for the whole routine).

use crate::error::{CodegenError, CodegenResult};
use orin_jasm::Label;
use rustc_hash::FxHashMap;

/// Jump targets of one enclosing loop, innermost last
#[derive(Debug, Clone, Copy)]
pub struct LoopLabels {
    /// Top of the loop
    pub start: Label,
    /// Target of `continue`: where the condition is re-evaluated
    pub cond: Label,
    /// Target of `break`
    pub end: Label,
}

/// One block scope: its name bindings and the slot counter at entry
#[derive(Debug, Default)]
struct Scope {
    names: FxHashMap<String, u16>,
    entry_slot: u16,
}

/// Compilation context for a single routine body
#[derive(Debug)]
pub struct RoutineCtx {
    scopes: Vec<Scope>,
    next_slot: u16,
    max_slots: u16,
    next_label: u32,
    loops: Vec<LoopLabels>,
}

impl RoutineCtx {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            next_slot: 0,
            max_slots: 0,
            next_label: 0,
            loops: Vec::new(),
        }
    }

    /// A fresh label; monotonic, never reused within the routine
    pub fn fresh_label(&mut self) -> CodegenResult<Label> {
        let label = Label(self.next_label);
        self.next_label = self
            .next_label
            .checked_add(1)
            .ok_or(CodegenError::TooManyLabels)?;
        Ok(label)
    }

    /// Bind `name` to a fresh slot in the innermost scope
    pub fn declare(&mut self, name: &str) -> CodegenResult<u16> {
        if self.next_slot == u16::MAX {
            return Err(CodegenError::TooManyLocals);
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.max_slots = self.max_slots.max(self.next_slot);
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .names
            .insert(name.to_string(), slot);
        Ok(slot)
    }

    /// Resolve a name against the scope chain, innermost first
    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.names.get(name).copied())
    }

    /// Fork a child scope and snapshot the slot counter
    pub fn enter_block(&mut self) {
        self.scopes.push(Scope {
            names: FxHashMap::default(),
            entry_slot: self.next_slot,
        });
    }

    /// Drop the innermost scope; slots return to the entry value, the
    /// routine-wide maximum stays
    pub fn exit_block(&mut self) {
        let scope = self.scopes.pop().expect("unbalanced block exit");
        self.next_slot = scope.entry_slot;
    }

    /// The slot limit this routine must declare
    pub fn max_locals(&self) -> u16 {
        self.max_slots
    }

    pub fn push_loop(&mut self, labels: LoopLabels) {
        self.loops.push(labels);
    }

    pub fn pop_loop(&mut self) {
        self.loops.pop();
    }

    /// The innermost enclosing loop, if any
    pub fn current_loop(&self) -> Option<&LoopLabels> {
        self.loops.last()
    }
}

impl Default for RoutineCtx {
    fn default() -> Self {
        Self::new()
    }
}
