// Copyright (c) 2024-2026 The ssir developers

//! Functions: the unit of analysis and transformation.

use crate::{
    ir::{Block, DataFlowGraph, FunctionLayout, Inst, Value},
    table::PrimaryTable,
    ty::TypeTable,
};

/// Internal table storage for basic blocks.
#[derive(Default)]
pub struct BlockData {
    /// An optional name, for dumps.
    pub name: Option<String>,
}

/// A function.
///
/// Owns the types, values, instructions, and blocks it contains, as well as
/// the def-use index over them. The entry block is the first block in layout
/// order. Predecessor and successor lists are derived from terminators and
/// never stored.
pub struct Function {
    name: String,
    /// The basic blocks in the function.
    pub(crate) blocks: PrimaryTable<Block, BlockData>,
    /// The data flow graph and def-use index.
    pub dfg: DataFlowGraph,
    /// The block and instruction order.
    pub layout: FunctionLayout,
    /// The types used in the function.
    pub types: TypeTable,
}

impl Function {
    /// Create a new, empty function.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: PrimaryTable::new(),
            dfg: DataFlowGraph::new(),
            layout: FunctionLayout::new(),
            types: TypeTable::new(),
        }
    }

    /// Get the name of the function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a new block and append it to the layout.
    pub fn create_block(&mut self) -> Block {
        let bb = self.blocks.add(BlockData::default());
        self.layout.append_block(bb);
        bb
    }

    /// Create a new named block and append it to the layout.
    pub fn create_named_block(&mut self, name: impl Into<String>) -> Block {
        let bb = self.create_block();
        self.blocks[bb].name = Some(name.into());
        bb
    }

    /// Get the entry block of the function.
    pub fn entry(&self) -> Option<Block> {
        self.layout.first_block()
    }

    /// Check whether a block still exists.
    pub fn contains_block(&self, bb: Block) -> bool {
        self.blocks.contains(bb)
    }

    /// An exclusive upper bound on block indices, for index-keyed scratch
    /// arrays and bit sets.
    pub fn block_id_bound(&self) -> usize {
        self.blocks.id_bound()
    }

    /// Get the terminator instruction of a block, if it has one.
    pub fn terminator(&self, bb: Block) -> Option<Inst> {
        self.layout
            .last_inst(bb)
            .filter(|&inst| self.dfg[inst].opcode().is_terminator())
    }

    /// Get the successor blocks of a block, derived from its terminator.
    pub fn succs(&self, bb: Block) -> Vec<Block> {
        match self.terminator(bb) {
            Some(term) => self.dfg[term].blocks().to_vec(),
            None => Vec::new(),
        }
    }

    /// Kill an instruction: detach it from the layout, unregister it from the
    /// def-use index, and kill any metadata instructions attached to its
    /// result.
    pub fn kill_inst(&mut self, inst: Inst) {
        if let Some(result) = self.dfg.inst_result(inst) {
            let metadata: Vec<_> = self
                .dfg
                .uses(result)
                .filter(|&user| self.dfg[user].opcode().is_metadata())
                .collect();
            for user in metadata {
                self.dfg.kill(user);
            }
        }
        if self.layout.inst_block(inst).is_some() {
            self.layout.remove_inst(inst);
        }
        self.dfg.kill(inst);
    }

    /// Replace all uses of a value with another. Returns the number of
    /// rewritten user instructions.
    pub fn replace_all_uses(&mut self, from: Value, to: Value) -> usize {
        self.dfg.replace_all_uses(from, to)
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "func @{} {{", self.name)?;
        for bb in self.layout.blocks() {
            match self.blocks[bb].name {
                Some(ref name) => writeln!(f, "{} ({}):", bb, name)?,
                None => writeln!(f, "{}:", bb)?,
            }
            for &inst in self.layout.insts(bb) {
                match self.dfg.inst_result(inst) {
                    Some(v) => writeln!(f, "    {} = {}", v, self.dfg[inst])?,
                    None => writeln!(f, "    {}", self.dfg[inst])?,
                }
            }
        }
        write!(f, "}}")
    }
}
