// Copyright (c) 2024-2026 The ssir developers

//! Data flow graph and def-use index.
//!
//! The `DataFlowGraph` owns the instructions and values of a function and
//! maintains the def-use index incrementally: adding an instruction registers
//! its operand uses, killing one unregisters them and detaches its result
//! from the def index. Values embedded in the operand lists of other
//! instructions after their definition was killed are dangling; `get_def`
//! returns `None` for them.

use crate::{
    impl_table_indexing,
    ir::{Block, Inst, InstData, Value, ValueData},
    table::{PrimaryTable, SecondaryTable},
    ty::Type,
};
use std::collections::BTreeSet;

/// A data flow graph.
#[derive(Default)]
pub struct DataFlowGraph {
    /// The instructions in the graph.
    pub(crate) insts: PrimaryTable<Inst, InstData>,
    /// The result values produced by instructions.
    pub(crate) results: SecondaryTable<Inst, Value>,
    /// The values in the graph.
    pub(crate) values: PrimaryTable<Value, ValueData>,
    /// The users of each value, ordered by instruction id.
    uses: SecondaryTable<Value, BTreeSet<Inst>>,
}

impl_table_indexing!(DataFlowGraph, insts, Inst, InstData);
impl_table_indexing!(DataFlowGraph, values, Value, ValueData);

impl DataFlowGraph {
    /// Create a new data flow graph.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a function parameter value.
    pub fn add_param(&mut self, ty: Type, index: usize) -> Value {
        self.values.add(ValueData::Param { ty, index })
    }

    /// Add an instruction.
    ///
    /// Registers the uses of every value operand and, for result-producing
    /// opcodes, creates the result value.
    pub fn add_inst(&mut self, data: InstData) -> Inst {
        let has_result = data.opcode().has_result();
        let ty = data.ty();
        let inst = self.insts.add(data);
        if has_result {
            let result = self.values.add(ValueData::Inst { ty, inst });
            self.results.add(inst, result);
        }
        let args: Vec<_> = self[inst].args().to_vec();
        for arg in args {
            self.uses.get_or_default(arg).insert(inst);
        }
        inst
    }

    /// Check whether an instruction is still in the graph.
    pub fn contains_inst(&self, inst: Inst) -> bool {
        self.insts.contains(inst)
    }

    /// Returns whether an instruction produces a result.
    pub fn has_result(&self, inst: Inst) -> bool {
        self.results.contains(inst)
    }

    /// Returns the result of an instruction, if it produces one.
    pub fn inst_result(&self, inst: Inst) -> Option<Value> {
        self.results.get(inst).cloned()
    }

    /// Returns the type of a value.
    pub fn value_type(&self, value: Value) -> Type {
        match self[value] {
            ValueData::Inst { ty, .. } => ty,
            ValueData::Param { ty, .. } => ty,
        }
    }

    /// Return the instruction that defines `value`.
    ///
    /// `None` for parameters and for values whose definition was killed.
    pub fn get_def(&self, value: Value) -> Option<Inst> {
        match self.values.get(value) {
            Some(&ValueData::Inst { inst, .. }) => Some(inst),
            _ => None,
        }
    }

    /// Iterate over the users of a value, in instruction-id order.
    pub fn uses<'a>(&'a self, value: Value) -> impl Iterator<Item = Inst> + 'a {
        self.uses.get(value).into_iter().flatten().cloned()
    }

    /// Check if a value is used.
    pub fn has_uses(&self, value: Value) -> bool {
        self.uses.get(value).map(|s| !s.is_empty()).unwrap_or(false)
    }

    /// The number of instructions using a value.
    pub fn num_uses(&self, value: Value) -> usize {
        self.uses.get(value).map(|s| s.len()).unwrap_or(0)
    }

    /// Kill an instruction.
    ///
    /// Unregisters its operand uses and detaches its result from the def
    /// index. Tolerates operands whose own definitions are already gone, so
    /// a set of mutually-referencing instructions can be killed in any order.
    pub fn kill(&mut self, inst: Inst) {
        let args: Vec<_> = self[inst].args().to_vec();
        for arg in args {
            if let Some(users) = self.uses.get_mut(arg) {
                users.remove(&inst);
            }
        }
        if let Some(result) = self.results.remove(inst) {
            self.values.remove(result);
            self.uses.remove(result);
        }
        self.insts.remove(inst);
    }

    /// Replace all uses of a value with another.
    ///
    /// Returns the number of rewritten user instructions.
    pub fn replace_all_uses(&mut self, from: Value, to: Value) -> usize {
        let users = match self.uses.remove(from) {
            Some(users) => users,
            None => return 0,
        };
        let count = users.len();
        for &user in &users {
            self[user].replace_value(from, to);
        }
        self.uses.get_or_default(to).extend(users);
        count
    }

    /// Drop the incoming pairs of a phi whose predecessor fails the
    /// predicate, keeping value and block operands aligned and unregistering
    /// the uses of dropped values. Returns whether anything was dropped.
    pub fn prune_phi_incoming(&mut self, phi: Inst, keep: impl Fn(Block) -> bool) -> bool {
        debug_assert!(self[phi].opcode().is_phi());
        let dropped = self[phi].retain_incoming(keep);
        for value in &dropped {
            // The same value may still arrive over a surviving edge.
            if !self[phi].args().contains(value) {
                if let Some(users) = self.uses.get_mut(*value) {
                    users.remove(&phi);
                }
            }
        }
        !dropped.is_empty()
    }
}
