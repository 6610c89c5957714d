// Copyright (c) 2024-2026 The ssir developers

//! Convenient construction of functions.

use crate::{
    ir::{Block, Function, Inst, InstData, Opcode, Value},
    ty::{StorageClass, Type},
};

/// A temporary object used to populate a `Function`.
pub struct FunctionBuilder<'a> {
    /// The function currently being built.
    pub func: &'a mut Function,
    /// The block into which new instructions are inserted.
    pos: Option<Block>,
}

impl<'a> FunctionBuilder<'a> {
    /// Create a new builder for a function.
    pub fn new(func: &'a mut Function) -> Self {
        Self { func, pos: None }
    }

    /// Create a new block.
    pub fn block(&mut self) -> Block {
        self.func.create_block()
    }

    /// Create a new named block.
    pub fn named_block(&mut self, name: impl Into<String>) -> Block {
        self.func.create_named_block(name)
    }

    /// Append all following instructions to the end of the given block.
    pub fn append_to(&mut self, bb: Block) {
        self.pos = Some(bb);
    }

    /// Add a function parameter.
    pub fn param(&mut self, ty: Type) -> Value {
        let index = self.func.dfg.values.len();
        self.func.dfg.add_param(ty, index)
    }

    fn build(&mut self, data: InstData) -> Inst {
        let inst = self.func.dfg.add_inst(data);
        let bb = self.pos.expect("no block to insert into");
        self.func.layout.append_inst(inst, bb);
        inst
    }

    fn build_result(&mut self, data: InstData) -> Value {
        let inst = self.build(data);
        self.func.dfg.inst_result(inst).unwrap()
    }

    /// Declare a storage location of the given pointee type.
    pub fn variable(&mut self, pointee: Type, class: StorageClass) -> Value {
        let ty = self.func.types.pointer(pointee, class);
        self.build_result(InstData::new(Opcode::Variable, ty))
    }

    /// Materialize an integer constant.
    pub fn const_int(&mut self, ty: Type, imm: u64) -> Value {
        self.build_result(InstData::new(Opcode::Constant, ty).with_imm(imm))
    }

    /// Materialize an undefined value.
    pub fn undef(&mut self, ty: Type) -> Value {
        self.build_result(InstData::new(Opcode::Undef, ty))
    }

    /// Load through a pointer.
    pub fn load(&mut self, ptr: Value) -> Value {
        let ptr_ty = self.func.dfg.value_type(ptr);
        let ty = self
            .func
            .types
            .pointee(ptr_ty)
            .expect("load through a non-pointer");
        self.build_result(InstData::new(Opcode::Load, ty).with_args(vec![ptr]))
    }

    /// Store a value through a pointer.
    pub fn store(&mut self, ptr: Value, value: Value) -> Inst {
        let void = self.func.types.void();
        self.build(InstData::new(Opcode::Store, void).with_args(vec![ptr, value]))
    }

    /// Copy a value unchanged.
    pub fn copy(&mut self, value: Value) -> Value {
        let ty = self.func.dfg.value_type(value);
        self.build_result(InstData::new(Opcode::Copy, ty).with_args(vec![value]))
    }

    /// Compute a sub-element pointer from a base pointer and indices.
    pub fn access_chain(&mut self, ty: Type, base: Value, indices: Vec<Value>) -> Value {
        let mut args = vec![base];
        args.extend(indices);
        self.build_result(InstData::new(Opcode::AccessChain, ty).with_args(args))
    }

    /// Create a phi selecting among the given `(value, predecessor)` pairs.
    pub fn phi(&mut self, ty: Type, incoming: Vec<(Value, Block)>) -> Value {
        let (args, blocks): (Vec<_>, Vec<_>) = incoming.into_iter().unzip();
        self.build_result(
            InstData::new(Opcode::Phi, ty)
                .with_args(args)
                .with_blocks(blocks),
        )
    }

    /// Branch unconditionally.
    pub fn br(&mut self, target: Block) -> Inst {
        let void = self.func.types.void();
        self.build(InstData::new(Opcode::Br, void).with_blocks(vec![target]))
    }

    /// Branch conditionally.
    pub fn br_cond(&mut self, cond: Value, if_true: Block, if_false: Block) -> Inst {
        let void = self.func.types.void();
        self.build(
            InstData::new(Opcode::BrCond, void)
                .with_args(vec![cond])
                .with_blocks(vec![if_true, if_false]),
        )
    }

    /// Return from the function.
    pub fn ret(&mut self) -> Inst {
        let void = self.func.types.void();
        self.build(InstData::new(Opcode::Ret, void))
    }

    /// Return a value from the function.
    pub fn ret_value(&mut self, value: Value) -> Inst {
        let void = self.func.types.void();
        self.build(InstData::new(Opcode::RetValue, void).with_args(vec![value]))
    }

    /// Attach a debug name to a value. The instruction lives outside the
    /// block layout.
    pub fn name(&mut self, value: Value) -> Inst {
        let void = self.func.types.void();
        self.func
            .dfg
            .add_inst(InstData::new(Opcode::Name, void).with_args(vec![value]))
    }

    /// Attach a decoration to a value. The instruction lives outside the
    /// block layout.
    pub fn decorate(&mut self, value: Value, kind: u64) -> Inst {
        let void = self.func.types.void();
        self.func.dfg.add_inst(
            InstData::new(Opcode::Decorate, void)
                .with_args(vec![value])
                .with_imm(kind),
        )
    }
}
