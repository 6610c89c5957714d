// Copyright (c) 2024-2026 The ssir developers

//! Shared pass infrastructure.
//!
//! Passes here are plain structs holding their per-function memoization
//! state; they take the function and the analyses they need as explicit
//! arguments rather than inheriting them from a pass base class. The caller
//! owns the analyses and is responsible for rebuilding them after structural
//! CFG mutation.

mod mem;

pub use self::mem::*;
