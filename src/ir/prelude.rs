// Copyright (c) 2024-2026 The ssir developers

//! Re-exports of commonly used IR items.

pub use crate::{
    ir::{
        Block, DataFlowGraph, Function, FunctionBuilder, FunctionLayout, Inst, InstData, Opcode,
        Value, ValueData,
    },
    ty::{StorageClass, Type, TypeData, TypeTable},
};
