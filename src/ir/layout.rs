// Copyright (c) 2024-2026 The ssir developers

//! Instruction and basic block ordering.

use crate::{
    ir::{Block, Inst},
    table::SecondaryTable,
};
use std::collections::HashMap;

/// Determines the order of instructions and basic blocks in a `Function`.
///
/// The first block in the layout is the function's entry block. Instructions
/// attached to metadata rather than control flow do not appear here.
#[derive(Default)]
pub struct FunctionLayout {
    /// The blocks in layout order.
    bbs: Vec<Block>,
    /// The instructions of each block, in execution order.
    insts: SecondaryTable<Block, Vec<Inst>>,
    /// Lookup table to find the block that contains an instruction.
    inst_map: HashMap<Inst, Block>,
}

impl FunctionLayout {
    /// Create a new function layout.
    pub fn new() -> Self {
        Default::default()
    }

    /// Append a block to the end of the layout.
    pub fn append_block(&mut self, bb: Block) {
        self.insts.add(bb, Vec::new());
        self.bbs.push(bb);
    }

    /// Remove a block and all its instructions from the layout.
    pub fn remove_block(&mut self, bb: Block) {
        let insts = self.insts.remove(bb).expect("block not in layout");
        for inst in insts {
            self.inst_map.remove(&inst);
        }
        let pos = self
            .bbs
            .iter()
            .position(|&b| b == bb)
            .expect("block not in layout");
        self.bbs.remove(pos);
    }

    /// Check whether a block is in the layout.
    pub fn contains_block(&self, bb: Block) -> bool {
        self.insts.contains(bb)
    }

    /// Get the first block in the layout, which is the entry block.
    pub fn first_block(&self) -> Option<Block> {
        self.bbs.first().cloned()
    }

    /// Iterate over the blocks in layout order.
    pub fn blocks<'a>(&'a self) -> impl Iterator<Item = Block> + 'a {
        self.bbs.iter().cloned()
    }

    /// Get the instructions of a block in execution order.
    pub fn insts(&self, bb: Block) -> &[Inst] {
        &self.insts[bb]
    }

    /// Get the last instruction of a block.
    pub fn last_inst(&self, bb: Block) -> Option<Inst> {
        self.insts[bb].last().cloned()
    }

    /// Append an instruction to the end of a block.
    pub fn append_inst(&mut self, inst: Inst, bb: Block) {
        self.map_inst(inst, bb);
        self.insts[bb].push(inst);
    }

    /// Insert an instruction before another instruction.
    pub fn insert_inst_before(&mut self, inst: Inst, before: Inst) {
        let bb = *self.inst_map.get(&before).expect("inst not in layout");
        self.map_inst(inst, bb);
        let pos = self.insts[bb]
            .iter()
            .position(|&i| i == before)
            .expect("inst not in layout");
        self.insts[bb].insert(pos, inst);
    }

    /// Remove an instruction from the layout.
    pub fn remove_inst(&mut self, inst: Inst) {
        let bb = match self.inst_map.remove(&inst) {
            Some(bb) => bb,
            None => panic!("inst {} not in layout", inst),
        };
        let pos = self.insts[bb]
            .iter()
            .position(|&i| i == inst)
            .expect("inst not in layout");
        self.insts[bb].remove(pos);
    }

    /// Get the block that contains an instruction.
    ///
    /// `None` for metadata and otherwise detached instructions.
    pub fn inst_block(&self, inst: Inst) -> Option<Block> {
        self.inst_map.get(&inst).cloned()
    }

    fn map_inst(&mut self, inst: Inst, bb: Block) {
        match self.inst_map.insert(inst, bb) {
            Some(old_bb) => panic!(
                "inst {} already inserted in {}, now being inserted into {}",
                inst, old_bb, bb
            ),
            None => (),
        }
    }
}
