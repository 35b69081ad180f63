//! Bottom-up preparation of trees for matching.
//!
//! [`prepare`] walks the tree in iterative post-order and assigns every node
//! its signature and subtree hash. Children are hashed in stored order; the
//! unordered view of the documents is recovered later by signature grouping
//! in the matcher, not by commutative hashing.

use sha1::{Digest, Sha1};

use super::{NodeId, Stack, Tree, MAX_DEPTH};
use crate::error::{Error, Result};

/// Assigns signatures and hashes to every node of the tree.
///
/// Idempotent; preparing a tree twice yields identical signatures and hashes.
/// Fails with [`Error::DepthExceeded`] when nesting exceeds [`MAX_DEPTH`].
pub fn prepare(tree: &mut Tree) -> Result<()> {
    let mut hasher = Sha1::new();
    let mut stack = Stack::new();
    let mut last_visited: Option<NodeId> = None;
    let mut n = Some(tree.root());
    while !stack.is_empty() || n.is_some() {
        if let Some(id) = n {
            if !stack.push(id) {
                return Err(Error::DepthExceeded(MAX_DEPTH));
            }
            n = tree.node(id).first_child();
        } else {
            let peek = stack.peek().expect("stack holds a node while descending");
            let next = tree.node(peek).next_sibling();
            if next.is_some() && last_visited != next {
                n = next;
            } else {
                tree.calculate_signature(peek);
                tree.calculate_hash(peek, &mut hasher);
                last_visited = stack.pop();
            }
        }
    }
    Ok(())
}

/// Collects every node reachable from the root in post-order.
///
/// The matcher relies on this ordering: a node's children are listed before
/// the node itself, so child distances exist by the time a parent pair is
/// scored.
pub fn post_order(tree: &Tree) -> Result<Vec<NodeId>> {
    let mut order = Vec::new();
    let mut stack = Stack::new();
    let mut last_visited: Option<NodeId> = None;
    let mut n = Some(tree.root());
    while !stack.is_empty() || n.is_some() {
        if let Some(id) = n {
            if !stack.push(id) {
                return Err(Error::DepthExceeded(MAX_DEPTH));
            }
            n = tree.node(id).first_child();
        } else {
            let peek = stack.peek().expect("stack holds a node while descending");
            let next = tree.node(peek).next_sibling();
            if next.is_some() && last_visited != next {
                n = next;
            } else {
                order.push(peek);
                last_visited = stack.pop();
            }
        }
    }
    Ok(order)
}
