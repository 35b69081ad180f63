//! Minimum-cost matching tables.
//!
//! The matcher records two structures while walking the trees: a
//! [`DistTable`] with the edit distance of every candidate pair, and a
//! [`MinCostMatch`] with the pairs committed to the final correspondence.

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use crate::tree::{NodeId, Tree};

/// An ordered pair of a left-tree node and a right-tree node.
pub type NodePair = (NodeId, NodeId);

/// Table of matched node pairs.
///
/// Membership means the left node corresponds to the right node. Adding a
/// pair also records every ancestor pair up to the roots, so a parent match
/// is implied by any matched descendant.
#[derive(Debug, Default)]
pub struct MinCostMatch {
    pairs: FxHashSet<NodePair>,
    left: FxHashSet<NodeId>,
    right: FxHashSet<NodeId>,
}

impl MinCostMatch {
    /// Idempotently adds a match.
    ///
    /// The pair is skipped when either side already participates in a match;
    /// ancestor pairs are recorded unconditionally.
    pub fn add(&mut self, left: &Tree, right: &Tree, pair: NodePair) {
        if self.pairs.contains(&pair)
            || self.left.contains(&pair.0)
            || self.right.contains(&pair.1)
        {
            return;
        }
        self.insert(pair);
        let mut left_parent = left.node(pair.0).parent();
        let mut right_parent = right.node(pair.1).parent();
        while let (Some(l), Some(r)) = (left_parent, right_parent) {
            self.insert((l, r));
            left_parent = left.node(l).parent();
            right_parent = right.node(r).parent();
        }
    }

    fn insert(&mut self, pair: NodePair) {
        self.pairs.insert(pair);
        self.left.insert(pair.0);
        self.right.insert(pair.1);
    }

    /// Returns true if the pair is matched.
    pub fn has_pair(&self, pair: NodePair) -> bool {
        self.pairs.contains(&pair)
    }

    /// Returns true if the node is matched in the left position.
    pub fn has_left(&self, n: NodeId) -> bool {
        self.left.contains(&n)
    }

    /// Returns true if the node is matched in the right position.
    pub fn has_right(&self, n: NodeId) -> bool {
        self.right.contains(&n)
    }

    /// Counts the matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no pairs are matched.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Edit distances for every pair the matcher considered.
///
/// Iteration follows insertion order, which keeps the greedy assignment
/// reproducible when several pairs share a cost.
#[derive(Debug, Default)]
pub struct DistTable {
    costs: IndexMap<NodePair, usize, FxBuildHasher>,
}

impl DistTable {
    /// Updates the pair distance.
    pub fn set(&mut self, pair: NodePair, cost: usize) {
        self.costs.insert(pair, cost);
    }

    /// Returns the recorded distance for the pair.
    pub fn get(&self, pair: NodePair) -> Option<usize> {
        self.costs.get(&pair).copied()
    }

    /// Iterates over all recorded pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodePair, usize)> + '_ {
        self.costs.iter().map(|(&pair, &cost)| (pair, cost))
    }

    /// Counts the recorded pairs.
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    /// Returns true if no distances were recorded.
    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

/// A candidate pair together with its edit distance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CostPair {
    pub pair: NodePair,
    pub cost: usize,
}

/// Scores a single candidate pair, recording its distance and, for
/// hash-equal subtrees, committing the match immediately.
///
/// Relies on the nested post-order driver in [`compare`](super::compare):
/// distances of all child pairs are already present when a parent pair is
/// scored.
pub(crate) fn match_pair(
    left: &Tree,
    right: &Tree,
    l: NodeId,
    r: NodeId,
    dist: &mut DistTable,
    matching: &mut MinCostMatch,
) {
    if left.node(l).signature() != right.node(r).signature() {
        return;
    }
    let pair = (l, r);
    if left.node(l).hash() == right.node(r).hash() {
        // Subtrees are identical, no cost.
        dist.set(pair, 0);
        matching.add(left, right, pair);
        return;
    }
    let left_leaf = left.node(l).is_leaf();
    let right_leaf = right.node(r).is_leaf();
    if left_leaf && right_leaf {
        // One Update.
        dist.set(pair, 1);
        return;
    } else if left_leaf {
        // Insert all of the right node's children.
        dist.set(pair, right.child_count(r));
        return;
    } else if right_leaf {
        // Delete all of the left node's children.
        dist.set(pair, left.child_count(l));
        return;
    }

    // Group children of both nodes by signature.
    let mut left_groups: FxHashMap<&[u8], Vec<NodeId>> = FxHashMap::default();
    let mut right_groups: FxHashMap<&[u8], Vec<NodeId>> = FxHashMap::default();
    let mut left_count = 0usize;
    let mut right_count = 0usize;
    for ch in left.children(l) {
        left_count += 1;
        left_groups
            .entry(left.node(ch).signature())
            .or_default()
            .push(ch);
    }
    for ch in right.children(r) {
        right_count += 1;
        right_groups
            .entry(right.node(ch).signature())
            .or_default()
            .push(ch);
    }

    let mut costs: Vec<CostPair> = Vec::new();
    for (sig, left_children) in &left_groups {
        if let Some(right_children) = right_groups.get(sig) {
            for &lc in left_children {
                for &rc in right_children {
                    let cost = dist.get((lc, rc)).unwrap_or(0);
                    costs.push(CostPair {
                        pair: (lc, rc),
                        cost,
                    });
                }
            }
        }
    }
    costs.sort_by_key(|cp| cp.cost);

    // Greedy assignment over the sorted costs: a pair is accepted iff neither
    // side is already used. Each unmatched child on either side contributes
    // one delete or one insert.
    let mut used_left: FxHashSet<NodeId> = FxHashSet::default();
    let mut used_right: FxHashSet<NodeId> = FxHashSet::default();
    let mut mapped = 0usize;
    let mut total = 0usize;
    for cp in &costs {
        if used_left.contains(&cp.pair.0) || used_right.contains(&cp.pair.1) {
            continue;
        }
        total += cp.cost;
        mapped += 1;
        used_left.insert(cp.pair.0);
        used_right.insert(cp.pair.1);
    }
    total += left_count + right_count - 2 * mapped;

    dist.set(pair, total);
}
