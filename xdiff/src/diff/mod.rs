//! Minimum-cost edit scripts between two prepared trees.
//!
//! The documents are treated as unordered trees: sibling order carries no
//! semantic weight. Candidate pairs are restricted to nodes with byte-equal
//! signatures, which reduces the matching problem to small bipartite
//! assignments solved greedily per signature group.

mod encoder;
mod matching;
mod reduce;
mod script;

pub use encoder::{Encoder, PlainTextEncoder};
pub use matching::{DistTable, MinCostMatch, NodePair};

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::error::Result;
use crate::tree::{post_order, prepare, NodeId, Tree};
use matching::{match_pair, CostPair};
use reduce::reduce_matching_space;
use script::edit_script;

/// Possible modifying operations of the edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Insert a leaf node.
    Insert,
    /// Update a leaf node value.
    Update,
    /// Delete a leaf node.
    Delete,
    /// Insert a whole subtree.
    InsertSubtree,
    /// Delete a whole subtree.
    DeleteSubtree,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Insert => "Insert",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
            Operation::InsertSubtree => "InsertSubtree",
            Operation::DeleteSubtree => "DeleteSubtree",
        })
    }
}

/// A unit of change that transforms the original document towards the edited
/// one.
///
/// `subject` is the node acted upon and `object` the parent in which the
/// action occurs, or the right-side counterpart for [`Operation::Update`].
/// Insert-side subjects and objects index into the right tree, delete-side
/// ones into the left tree; an update's subject is the left leaf and its
/// object the right leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    /// What to do.
    pub operation: Operation,
    /// The node acted upon.
    pub subject: NodeId,
    /// Parent of the action, or the new value for updates. `None` only for
    /// root-level subtree replacement.
    pub object: Option<NodeId>,
}

/// Generates the minimum-cost edit script transforming the left tree into
/// the right tree.
///
/// Unprepared inputs are prepared first. Both trees may be reduced in the
/// process: identical subtrees are detached before matching and stay
/// allocated but unreachable from their roots.
pub fn compare(left: &mut Tree, right: &mut Tree) -> Result<Vec<Delta>> {
    if left.node(left.root()).hash().is_empty() {
        prepare(left)?;
    }
    if right.node(right.root()).hash().is_empty() {
        prepare(right)?;
    }

    let root_pair = (left.root(), right.root());
    if left.node(root_pair.0).signature() != right.node(root_pair.1).signature() {
        // Roots with different structural roles are unmatchable.
        return Ok(vec![
            Delta {
                operation: Operation::DeleteSubtree,
                subject: root_pair.0,
                object: None,
            },
            Delta {
                operation: Operation::InsertSubtree,
                subject: root_pair.1,
                object: None,
            },
        ]);
    }
    if left.node(root_pair.0).hash() == right.node(root_pair.1).hash() {
        return Ok(Vec::new());
    }

    reduce_matching_space(left, right);

    let mut dist = DistTable::default();
    let mut min_cost = MinCostMatch::default();
    min_cost.add(left, right, root_pair);

    // Nested post-order drive: children's distances are always recorded
    // before any pair containing their parents is scored.
    let left_order = post_order(left)?;
    let right_order = post_order(right)?;
    for &l in &left_order {
        for &r in &right_order {
            match_pair(left, right, l, r, &mut dist, &mut min_cost);
        }
    }

    // Global assignment: group every recorded pair by left signature and
    // commit the cheapest pairs first.
    let mut by_signature: IndexMap<Vec<u8>, Vec<CostPair>, FxBuildHasher> = IndexMap::default();
    for (pair, cost) in dist.iter() {
        by_signature
            .entry(left.node(pair.0).signature().to_vec())
            .or_default()
            .push(CostPair { pair, cost });
    }
    for costs in by_signature.values_mut() {
        // Stable sort; on equal cost prefer pairs whose parents already
        // correspond, so children stay anchored to matched subtrees.
        costs.sort_by_key(|cp| {
            let parents_matched = match (
                left.node(cp.pair.0).parent(),
                right.node(cp.pair.1).parent(),
            ) {
                (Some(lp), Some(rp)) => min_cost.has_pair((lp, rp)),
                _ => true,
            };
            (cp.cost, !parents_matched)
        });
        for cp in costs.iter() {
            min_cost.add(left, right, cp.pair);
        }
    }

    Ok(edit_script(left, right, &min_cost))
}
