// Copyright (c) 2024-2026 The ssir developers

//! Representation of SSA functions.
//!
//! This module implements the intermediate representation around which the
//! rest of the crate is built: functions made of basic blocks, instructions
//! identified by stable keys, and a maintained def-use index.

use crate::{impl_table_key, ty::Type};

mod builder;
mod dfg;
mod function;
mod inst;
mod layout;
pub mod prelude;

pub use self::builder::*;
pub use self::dfg::*;
pub use self::function::*;
pub use self::inst::*;
pub use self::layout::*;

impl_table_key! {
    /// An instruction.
    struct Inst(u32) as "i";

    /// A value.
    struct Value(u32) as "v";

    /// A basic block.
    struct Block(u32) as "bb";
}

/// Internal table storage for values.
#[derive(Debug)]
pub enum ValueData {
    /// The value is the result of an instruction.
    Inst {
        /// The type of the value.
        ty: Type,
        /// The instruction defining the value.
        inst: Inst,
    },
    /// The value is a parameter of the function. Parameters have no defining
    /// instruction; pointer resolution treats them as unresolved.
    Param {
        /// The type of the value.
        ty: Type,
        /// The position of the parameter.
        index: usize,
    },
}
