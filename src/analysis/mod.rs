// Copyright (c) 2024-2026 The ssir developers

//! Analyses over the IR.
//!
//! Analysis results are snapshots: they are built on demand, owned by the
//! pass that requested them, and become invalid whenever the CFG is
//! structurally mutated. There is no automatic invalidation tracking.

mod domtree;
mod preds;

pub use self::domtree::*;
pub use self::preds::*;
