// Copyright (c) 2024-2026 The ssir developers

use crate::{analysis::PredecessorTable, ir::prelude::*, table::TableKey};
use hibitset::BitSet;
use log::trace;
use std::collections::{HashMap, HashSet};

/// A block dominator tree.
///
/// Records for every block reachable from the entry which block is its
/// immediate dominator. Unreachable blocks have no entry in the tree; every
/// query about them answers "no dominance relation".
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// Map from a reachable block to its immediate dominator. The entry block
    /// maps to itself.
    idoms: HashMap<Block, Block>,
    /// Reachable blocks in post-order.
    post_order: Vec<Block>,
}

impl DominatorTree {
    /// Compute the dominator tree of a function.
    ///
    /// This implementation is based on [1]: immediate dominators are found by
    /// an iterative dataflow fixed point over the blocks in reverse
    /// post-order, intersecting the dominator chains of all already-processed
    /// predecessors.
    ///
    /// [1]: https://www.cs.rice.edu/~keith/Embed/dom.pdf "Cooper, Keith D., Timothy J. Harvey, and Ken Kennedy. 'A simple, fast dominance algorithm.' Software Practice & Experience 4.1-10 (2001): 1-8."
    pub fn new(func: &Function, pred: &PredecessorTable) -> Self {
        let post_order = Self::compute_blocks_post_order(func);
        let length = post_order.len();
        trace!("[DomTree] post-order {:?}", post_order);

        let undef = std::u32::MAX;
        let mut inv_post_order = vec![undef; func.block_id_bound()];
        for (i, &bb) in post_order.iter().enumerate() {
            inv_post_order[bb.index()] = i as u32;
        }

        // The entry block is the last block in post-order and the sole root.
        let mut doms = vec![undef; length];
        if length > 0 {
            doms[length - 1] = (length - 1) as u32;
        }

        let mut changed = true;
        while changed {
            changed = false;

            for idx in (0..length).rev() {
                if doms[idx] == idx as u32 {
                    continue; // skip the root
                }
                let bb = post_order[idx];

                let mut new_idom = undef;
                for p in pred.pred(bb) {
                    let pidx = inv_post_order[p.index()];
                    // Skip unreachable and not-yet-visited predecessors.
                    if pidx == undef || doms[pidx as usize] == undef {
                        continue;
                    }
                    new_idom = if new_idom == undef {
                        pidx
                    } else {
                        Self::intersect(&doms, pidx, new_idom)
                    };
                }
                debug_assert!(new_idom != undef, "reachable block without processed pred");
                if doms[idx] != new_idom {
                    doms[idx] = new_idom;
                    changed = true;
                }
            }
        }
        trace!("[DomTree] converged {:?}", doms);

        let mut idoms = HashMap::with_capacity(length);
        for (i, &bb) in post_order.iter().enumerate() {
            idoms.insert(bb, post_order[doms[i] as usize]);
        }

        Self { idoms, post_order }
    }

    /// The two-finger intersection of [1]: walk both dominator chains up
    /// (towards higher post-order indices) until they meet.
    fn intersect(doms: &[u32], mut a: u32, mut b: u32) -> u32 {
        while a != b {
            while a < b {
                a = doms[a as usize];
            }
            while b < a {
                b = doms[b as usize];
            }
        }
        a
    }

    fn compute_blocks_post_order(func: &Function) -> Vec<Block> {
        let bound = func.block_id_bound() as u32;
        let mut order = Vec::with_capacity(bound as usize);

        let mut stack = Vec::with_capacity(8);
        let mut discovered = BitSet::with_capacity(bound);
        let mut finished = BitSet::with_capacity(bound);

        // Traversal starts at the entry only, so blocks unreachable from it
        // never make it into the order.
        stack.extend(func.entry());

        while let Some(&next) = stack.last() {
            if !discovered.add(next.index() as u32) {
                for succ in func.succs(next) {
                    if !discovered.contains(succ.index() as u32) {
                        stack.push(succ);
                    }
                }
            } else {
                stack.pop();
                if !finished.add(next.index() as u32) {
                    order.push(next);
                }
            }
        }

        order
    }

    /// Get the reachable blocks in post-order.
    pub fn blocks_post_order(&self) -> &[Block] {
        &self.post_order
    }

    /// Check if a block is reachable from the entry.
    pub fn is_reachable(&self, bb: Block) -> bool {
        self.idoms.contains_key(&bb)
    }

    /// Get the immediate dominator of a block.
    ///
    /// `None` for the entry block, which has no strict dominator, and for
    /// unreachable blocks, which are not in the tree.
    pub fn immediate_dominator(&self, bb: Block) -> Option<Block> {
        match self.idoms.get(&bb) {
            Some(&idom) if idom != bb => Some(idom),
            _ => None,
        }
    }

    /// Check if a block dominates another block.
    ///
    /// A block dominates itself. Either block being unreachable means no
    /// dominance relation.
    pub fn dominates(&self, parent: Block, mut child: Block) -> bool {
        if !self.is_reachable(parent) || !self.is_reachable(child) {
            return false;
        }
        while parent != child {
            match self.immediate_dominator(child) {
                Some(next) => child = next,
                // Arrived at the entry without encountering the suspected
                // parent, so no domination.
                None => return false,
            }
        }
        true
    }
}

/// Dominance queries at block and instruction granularity.
///
/// A thin facade over a `DominatorTree` snapshot. Like the tree itself it is
/// owned by one pass instance and must be rebuilt after any structural CFG
/// mutation.
pub struct DominatorAnalysis {
    tree: DominatorTree,
}

impl DominatorAnalysis {
    /// Compute the dominator analysis for a function.
    pub fn new(func: &Function) -> Self {
        let pred = PredecessorTable::new(func);
        Self::with_predtbl(func, &pred)
    }

    /// Compute the dominator analysis, reusing an existing predecessor table.
    pub fn with_predtbl(func: &Function, pred: &PredecessorTable) -> Self {
        Self {
            tree: DominatorTree::new(func, pred),
        }
    }

    /// Get the underlying dominator tree.
    pub fn tree(&self) -> &DominatorTree {
        &self.tree
    }

    /// Get the immediate dominator of a block, or `None` for the entry block
    /// and for unreachable blocks.
    pub fn immediate_dominator(&self, bb: Block) -> Option<Block> {
        self.tree.immediate_dominator(bb)
    }

    /// Check if one block dominates another.
    pub fn dominates(&self, a: Block, b: Block) -> bool {
        self.tree.dominates(a, b)
    }

    /// Check if one instruction dominates another.
    ///
    /// An instruction dominates itself. Detached instructions, which have no
    /// owning block, dominate nothing and are dominated by nothing. Within a
    /// single block dominance is positional: `a` dominates `b` iff `b` occurs
    /// after `a` in the block.
    pub fn inst_dominates(&self, func: &Function, a: Inst, b: Inst) -> bool {
        if a == b {
            return true;
        }
        let bb_a = match func.layout.inst_block(a) {
            Some(bb) => bb,
            None => return false,
        };
        let bb_b = match func.layout.inst_block(b) {
            Some(bb) => bb,
            None => return false,
        };
        if bb_a != bb_b {
            return self.dominates(bb_a, bb_b);
        }
        let mut behind_a = false;
        for &inst in func.layout.insts(bb_a) {
            if behind_a && inst == b {
                return true;
            }
            if inst == a {
                behind_a = true;
            }
        }
        false
    }

    /// Find the closest common dominator of two blocks.
    ///
    /// `None` if either input is `None` or if the two chains never meet. The
    /// walk of `a`'s chain guards against revisiting a block within this
    /// walk; `b`'s walk relies on the tree being acyclic, which the builder
    /// guarantees.
    pub fn common_dominator(&self, a: Option<Block>, b: Option<Block>) -> Option<Block> {
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => return None,
        };

        let mut seen = HashSet::new();
        let mut block = Some(a);
        while let Some(bb) = block {
            if !seen.insert(bb) {
                break;
            }
            block = self.immediate_dominator(bb);
        }

        let mut block = Some(b);
        while let Some(bb) = block {
            if seen.contains(&bb) {
                return Some(bb);
            }
            block = self.immediate_dominator(bb);
        }

        None
    }
}
