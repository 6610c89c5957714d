// Copyright (c) 2024-2026 The ssir developers

//! Memory promotion infrastructure.
//!
//! The shared machinery that concrete mem2reg-style passes are built from:
//! classification of promotable variables, syntactic pointer resolution,
//! cascading dead code elimination, CFG cleanup, and undef materialization.

use crate::{ir::prelude::*, table::TableKey};
use hibitset::BitSet;
use itertools::Itertools;
use log::{debug, trace};
use std::collections::{HashMap, HashSet, VecDeque};

/// Shared state and utilities for memory-promotion passes.
///
/// One instance serves the analysis of one function at a time: the caches are
/// memoization tables keyed by ids of that function and must be reset with
/// [`clear`](MemPass::clear) before the next function. Classification caches
/// also go stale when uses of a variable are added or removed; the owning
/// pass decides when that matters.
#[derive(Default)]
pub struct MemPass {
    /// Variables verified to be promotable.
    seen_target_vars: HashSet<Value>,
    /// Variables verified not to be promotable.
    seen_non_target_vars: HashSet<Value>,
    /// The materialized undef value for each type.
    type2undefs: HashMap<Type, Value>,
}

impl MemPass {
    /// Create a new, empty pass state.
    pub fn new() -> Self {
        Default::default()
    }

    /// Reset all per-function caches.
    pub fn clear(&mut self) {
        self.seen_target_vars.clear();
        self.seen_non_target_vars.clear();
        self.type2undefs.clear();
    }

    /// Check if a type is a scalar, vector, or matrix.
    fn is_base_target_type(func: &Function, ty: Type) -> bool {
        match *func.types.data(ty) {
            TypeData::Bool
            | TypeData::Int(_)
            | TypeData::Float(_)
            | TypeData::Vector { .. }
            | TypeData::Matrix { .. } => true,
            _ => false,
        }
    }

    /// Check if a type is a base target type or an aggregate composed solely
    /// of target types.
    fn is_target_type(func: &Function, ty: Type) -> bool {
        if Self::is_base_target_type(func, ty) {
            return true;
        }
        match *func.types.data(ty) {
            TypeData::Array { elem, .. } => Self::is_target_type(func, elem),
            TypeData::Struct(ref members) => {
                members.iter().all(|&m| Self::is_target_type(func, m))
            }
            _ => false,
        }
    }

    /// Check if a value is a function-scope storage declaration.
    fn is_function_variable(func: &Function, var: Value) -> bool {
        match func.dfg.get_def(var) {
            Some(def) if func.dfg[def].opcode() == Opcode::Variable => {
                func.types.storage_class(func.dfg[def].ty()) == Some(StorageClass::Function)
            }
            _ => false,
        }
    }

    /// Check if all indices of an access chain are constants.
    fn has_const_indices(func: &Function, chain: Inst) -> bool {
        func.dfg[chain].args()[1..].iter().all(|&idx| {
            func.dfg
                .get_def(idx)
                .map(|def| func.dfg[def].opcode() == Opcode::Constant)
                .unwrap_or(false)
        })
    }

    /// Check if every use of a variable is a load, a store, a constant-index
    /// access chain based on it, or metadata.
    fn has_only_supported_refs(func: &Function, var: Value) -> bool {
        func.dfg.uses(var).all(|user| {
            let data = &func.dfg[user];
            match data.opcode() {
                Opcode::Load | Opcode::Store => true,
                Opcode::AccessChain => {
                    data.args()[0] == var && Self::has_const_indices(func, user)
                }
                op => op.is_metadata(),
            }
        })
    }

    /// Check if all remaining uses of a value are metadata. True for values
    /// with no uses at all.
    fn has_only_metadata_uses(func: &Function, value: Value) -> bool {
        func.dfg
            .uses(value)
            .all(|user| func.dfg[user].opcode().is_metadata())
    }

    /// Check if `var` is a promotable variable: a function-scope declaration
    /// of target type whose every use is a load, a store, a constant-index
    /// access chain, or metadata.
    ///
    /// The verdict is memoized per variable; repeated calls do not re-scan
    /// the function.
    pub fn is_target_var(&mut self, func: &Function, var: Value) -> bool {
        if self.seen_target_vars.contains(&var) {
            return true;
        }
        if self.seen_non_target_vars.contains(&var) {
            return false;
        }
        let target = Self::classify(func, var);
        if target {
            trace!("{} is a target variable", var);
            self.seen_target_vars.insert(var);
        } else {
            self.seen_non_target_vars.insert(var);
        }
        target
    }

    fn classify(func: &Function, var: Value) -> bool {
        if !Self::is_function_variable(func, var) {
            return false;
        }
        let def = match func.dfg.get_def(var) {
            Some(def) => def,
            None => return false,
        };
        let pointee = match func.types.pointee(func.dfg[def].ty()) {
            Some(ty) => ty,
            None => return false,
        };
        Self::is_target_type(func, pointee) && Self::has_only_supported_refs(func, var)
    }

    /// Classify every variable referenced by a load or store in the function,
    /// populating the target/non-target caches. Each base variable is
    /// classified exactly once.
    pub fn collect_target_vars(&mut self, func: &Function) {
        for bb in func.layout.blocks() {
            for &inst in func.layout.insts(bb) {
                match func.dfg[inst].opcode() {
                    Opcode::Load | Opcode::Store => {
                        if let (_, Some(var)) = self.get_ptr(func, inst) {
                            self.is_target_var(func, var);
                        }
                    }
                    _ => (),
                }
            }
        }
        debug!(
            "collected {} target variables in @{}",
            self.seen_target_vars.len(),
            func.name()
        );
    }

    /// Given a load or store, resolve its pointer operand. For any other
    /// result-producing instruction, resolve its result.
    ///
    /// See [`get_ptr_id`](MemPass::get_ptr_id) for the returned pair.
    pub fn get_ptr(&self, func: &Function, inst: Inst) -> (Value, Option<Value>) {
        let data = &func.dfg[inst];
        let ptr_id = match data.opcode() {
            Opcode::Load | Opcode::Store => data.args()[0],
            _ => func
                .dfg
                .inst_result(inst)
                .expect("get_ptr on an instruction without a pointer"),
        };
        self.get_ptr_id(func, ptr_id)
    }

    /// Resolve a pointer-valued id through copies and access chains.
    ///
    /// Returns the top-most non-copy pointer value, together with the base
    /// variable the chain bottoms out at, or `None` if it does not end in a
    /// storage declaration (e.g. the pointer is a function parameter). The
    /// resolution is purely syntactic: no aliasing across distinct bases.
    pub fn get_ptr_id(&self, func: &Function, ptr_id: Value) -> (Value, Option<Value>) {
        let mut base = ptr_id;
        loop {
            let def = match func.dfg.get_def(base) {
                Some(def) => def,
                None => break,
            };
            match func.dfg[def].opcode() {
                Opcode::Copy | Opcode::AccessChain => base = func.dfg[def].args()[0],
                _ => break,
            }
        }
        let var_id = match func.dfg.get_def(base) {
            Some(def) if func.dfg[def].opcode() == Opcode::Variable => Some(base),
            _ => None,
        };

        let mut ptr = ptr_id;
        while let Some(def) = func.dfg.get_def(ptr) {
            if func.dfg[def].opcode() == Opcode::Copy {
                ptr = func.dfg[def].args()[0];
            } else {
                break;
            }
        }
        (ptr, var_id)
    }

    /// Check if any instruction loads from the variable, looking through
    /// access chains and copies. Uses other than stores, metadata, chains,
    /// and copies are conservatively treated as loads.
    pub fn has_loads(&self, func: &Function, var: Value) -> bool {
        let mut worklist = vec![var];
        while let Some(v) = worklist.pop() {
            for user in func.dfg.uses(v) {
                match func.dfg[user].opcode() {
                    Opcode::AccessChain | Opcode::Copy => {
                        if let Some(result) = func.dfg.inst_result(user) {
                            worklist.push(result);
                        }
                    }
                    Opcode::Store | Opcode::Name | Opcode::Decorate => (),
                    _ => return true,
                }
            }
        }
        false
    }

    /// Check if a variable is live: declared outside function scope, or
    /// still loaded from.
    pub fn is_live_var(&self, func: &Function, var: Value) -> bool {
        if !Self::is_function_variable(func, var) {
            return true;
        }
        self.has_loads(func, var)
    }

    /// Enqueue all stores reachable from `ptr` through chains and copies.
    fn add_stores(&self, func: &Function, ptr: Value, dead: &mut VecDeque<Inst>) {
        let mut worklist = vec![ptr];
        while let Some(v) = worklist.pop() {
            for user in func.dfg.uses(v) {
                match func.dfg[user].opcode() {
                    Opcode::AccessChain | Opcode::Copy => {
                        if let Some(result) = func.dfg.inst_result(user) {
                            worklist.push(result);
                        }
                    }
                    Opcode::Store => dead.push_back(user),
                    _ => (),
                }
            }
        }
    }

    /// Delete `inst` and cascade: operands whose remaining uses are only
    /// metadata are deleted too, and a deleted load whose variable has no
    /// remaining loads takes all of the variable's stores with it.
    ///
    /// `on_delete` is invoked once per deleted instruction, in deletion
    /// order, before the instruction is detached; it has no effect on the
    /// cascade itself. The cascade runs on an explicit worklist.
    pub fn dce_inst(&self, func: &mut Function, inst: Inst, mut on_delete: impl FnMut(Inst)) {
        let mut dead = VecDeque::new();
        dead.push_back(inst);
        while let Some(di) = dead.pop_front() {
            // A store can be enqueued both as a dead operand cascade and by
            // add_stores; skip anything already gone.
            if !func.dfg.contains_inst(di) {
                continue;
            }
            let mut var_id = None;
            if func.dfg[di].opcode() == Opcode::Load {
                var_id = self.get_ptr(func, di).1;
            }
            let ids = func.dfg[di].args().to_vec();
            trace!("DCE {}", func.dfg[di]);
            on_delete(di);
            func.kill_inst(di);
            for id in ids {
                if let Some(def) = func.dfg.get_def(id) {
                    // Declarations and constants are not part of the cascade;
                    // whether to drop an unused variable is the concrete
                    // pass's decision.
                    match func.dfg[def].opcode() {
                        Opcode::Variable | Opcode::Constant => (),
                        _ if Self::has_only_metadata_uses(func, id) => dead.push_back(def),
                        _ => (),
                    }
                }
            }
            if let Some(var) = var_id {
                if !self.is_live_var(func, var) {
                    self.add_stores(func, var, &mut dead);
                }
            }
        }
    }

    /// Remove the blocks not reachable from the entry and repair the phis of
    /// the surviving blocks. Returns whether anything changed, so callers can
    /// drive a fixed-point loop; a second run on a clean function reports no
    /// change.
    pub fn cfg_cleanup(&mut self, func: &mut Function) -> bool {
        let mut reachable = BitSet::with_capacity(func.block_id_bound() as u32);
        let mut stack = Vec::new();
        if let Some(entry) = func.entry() {
            reachable.add(entry.index() as u32);
            stack.push(entry);
        }
        while let Some(bb) = stack.pop() {
            for succ in func.succs(bb) {
                if !reachable.add(succ.index() as u32) {
                    stack.push(succ);
                }
            }
        }

        let all_blocks = func.layout.blocks().collect_vec();
        let surviving: HashSet<Block> = all_blocks
            .iter()
            .cloned()
            .filter(|bb| reachable.contains(bb.index() as u32))
            .collect();

        let mut modified = false;

        // Repair phis before erasing anything, so every surviving phi is
        // checked against the final predecessor population.
        for &bb in &all_blocks {
            if !surviving.contains(&bb) {
                continue;
            }
            let phis = func
                .layout
                .insts(bb)
                .iter()
                .cloned()
                .filter(|&inst| func.dfg[inst].opcode().is_phi())
                .collect_vec();
            for phi in phis {
                if func
                    .dfg
                    .prune_phi_incoming(phi, |pred| surviving.contains(&pred))
                {
                    trace!("dropped phi operands of removed predecessors in {}", bb);
                    modified = true;
                }
            }
        }

        for &bb in &all_blocks {
            if surviving.contains(&bb) {
                continue;
            }
            debug!("prune unreachable block {}", bb);
            // Detach the block's instructions from the def-use index. Uses of
            // them from other unreachable blocks dangle until those blocks
            // are erased in turn.
            for inst in func.layout.insts(bb).to_vec() {
                func.layout.remove_inst(inst);
                func.dfg.kill(inst);
            }
            func.layout.remove_block(bb);
            func.blocks.remove(bb);
            modified = true;
        }

        modified
    }

    /// Return the undef value of the given type, materializing it on first
    /// request.
    ///
    /// The undef instruction is inserted right after the entry block's
    /// variable declarations, which must stay contiguous at function start.
    /// Idempotent per type: repeated calls return the same id.
    pub fn type2undef(&mut self, func: &mut Function, ty: Type) -> Value {
        if let Some(&undef) = self.type2undefs.get(&ty) {
            return undef;
        }
        let entry = func.entry().expect("function has no entry block");
        let inst = func.dfg.add_inst(InstData::new(Opcode::Undef, ty));
        let first_non_var = func
            .layout
            .insts(entry)
            .iter()
            .cloned()
            .find(|&i| func.dfg[i].opcode() != Opcode::Variable);
        match first_non_var {
            Some(before) => func.layout.insert_inst_before(inst, before),
            None => func.layout.append_inst(inst, entry),
        }
        let undef = func
            .dfg
            .inst_result(inst)
            .expect("undef produces a result");
        debug!("materialized {} as undef for {}", undef, ty);
        self.type2undefs.insert(ty, undef);
        undef
    }
}
