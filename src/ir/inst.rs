// Copyright (c) 2024-2026 The ssir developers

//! Instructions and opcodes.

use crate::{
    ir::{Block, Value},
    ty::Type,
};
use itertools::Itertools;

/// An instruction opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Declare a storage location. The type is a pointer whose storage class
    /// is the declaration scope.
    Variable,
    /// Materialize a constant with an immediate payload.
    Constant,
    /// Materialize an undefined value.
    Undef,
    /// Load through a pointer.
    Load,
    /// Store through a pointer; `args[0]` is the pointer, `args[1]` the value.
    Store,
    /// Copy a value unchanged.
    Copy,
    /// Compute a sub-element pointer from a base pointer and a list of
    /// indices; `args[0]` is the base, the rest are indices.
    AccessChain,
    /// Select a value based on the predecessor control arrived from. Value
    /// operand `i` is the value incoming from block operand `i`.
    Phi,
    /// Unconditional branch.
    Br,
    /// Conditional branch; `args[0]` is the condition, `blocks[0]` the target
    /// taken when it is true, `blocks[1]` otherwise.
    BrCond,
    /// Return from the function.
    Ret,
    /// Return a value from the function.
    RetValue,
    /// Metadata: attach a debug name to a value. Lives outside the block
    /// layout.
    Name,
    /// Metadata: attach a decoration to a value. Lives outside the block
    /// layout.
    Decorate,
}

impl Opcode {
    /// Check if this opcode terminates a block.
    pub fn is_terminator(self) -> bool {
        match self {
            Opcode::Br | Opcode::BrCond | Opcode::Ret | Opcode::RetValue => true,
            _ => false,
        }
    }

    /// Check if this is the phi opcode.
    pub fn is_phi(self) -> bool {
        self == Opcode::Phi
    }

    /// Check if this opcode is pure metadata attached to a value.
    pub fn is_metadata(self) -> bool {
        match self {
            Opcode::Name | Opcode::Decorate => true,
            _ => false,
        }
    }

    /// Check if instructions with this opcode define a result value.
    pub fn has_result(self) -> bool {
        match self {
            Opcode::Store
            | Opcode::Br
            | Opcode::BrCond
            | Opcode::Ret
            | Opcode::RetValue
            | Opcode::Name
            | Opcode::Decorate => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match *self {
            Opcode::Variable => "var",
            Opcode::Constant => "const",
            Opcode::Undef => "undef",
            Opcode::Load => "ld",
            Opcode::Store => "st",
            Opcode::Copy => "cp",
            Opcode::AccessChain => "gep",
            Opcode::Phi => "phi",
            Opcode::Br => "br",
            Opcode::BrCond => "brc",
            Opcode::Ret => "ret",
            Opcode::RetValue => "retv",
            Opcode::Name => "name",
            Opcode::Decorate => "deco",
        };
        write!(f, "{}", name)
    }
}

/// An instruction: an opcode, a type, ordered value operands, ordered block
/// operands, and an optional immediate payload.
#[derive(Debug)]
pub struct InstData {
    opcode: Opcode,
    ty: Type,
    args: Vec<Value>,
    blocks: Vec<Block>,
    imm: Option<u64>,
}

impl InstData {
    /// Create a new instruction.
    pub fn new(opcode: Opcode, ty: Type) -> Self {
        Self {
            opcode,
            ty,
            args: Vec::new(),
            blocks: Vec::new(),
            imm: None,
        }
    }

    /// Attach value operands.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Attach block operands.
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Attach an immediate payload.
    pub fn with_imm(mut self, imm: u64) -> Self {
        self.imm = Some(imm);
        self
    }

    /// Get the opcode of the instruction.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Get the type of the instruction.
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// Get the value operands of the instruction.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Get the block operands of the instruction.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Get the immediate payload of the instruction.
    pub fn get_imm(&self) -> Option<u64> {
        self.imm
    }

    /// Iterate over the incoming edges of a phi as `(predecessor, value)`
    /// pairs. Empty for non-phi instructions.
    pub fn incoming<'a>(&'a self) -> impl Iterator<Item = (Block, Value)> + 'a {
        self.blocks.iter().cloned().zip(self.args.iter().cloned())
    }

    /// Replace all operand occurrences of a value with another.
    ///
    /// Returns how many operands were replaced.
    pub fn replace_value(&mut self, from: Value, to: Value) -> usize {
        let mut count = 0;
        for arg in &mut self.args {
            if *arg == from {
                *arg = to;
                count += 1;
            }
        }
        count
    }

    /// Drop phi incoming pairs that fail the predicate, preserving the
    /// alignment of value and block operands. Returns the dropped values.
    pub(super) fn retain_incoming(&mut self, keep: impl Fn(Block) -> bool) -> Vec<Value> {
        debug_assert_eq!(self.args.len(), self.blocks.len());
        let mut dropped = Vec::new();
        let mut i = 0;
        while i < self.blocks.len() {
            if keep(self.blocks[i]) {
                i += 1;
            } else {
                self.blocks.remove(i);
                dropped.push(self.args.remove(i));
            }
        }
        dropped
    }
}

impl std::fmt::Display for InstData {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.opcode)?;
        if let Some(imm) = self.imm {
            write!(f, " #{}", imm)?;
        }
        if !self.args.is_empty() {
            write!(f, " {}", self.args.iter().format(", "))?;
        }
        if !self.blocks.is_empty() {
            write!(f, " [{}]", self.blocks.iter().format(", "))?;
        }
        Ok(())
    }
}
