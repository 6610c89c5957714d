// Copyright (c) 2024-2026 The ssir developers

//! An SSA intermediate representation together with the analyses and shared
//! pass infrastructure needed to promote memory into registers: dominator
//! tree construction and queries, promotable-variable classification, pointer
//! resolution, cascading dead code elimination, and CFG cleanup.

pub mod analysis;
pub mod ir;
pub mod pass;
pub mod table;
mod ty;

pub use crate::ty::*;
