//! Edit script derivation.
//!
//! Walks matched pairs from the roots down and emits deltas: updates for
//! matched leaves whose values differ, deletes for left children without a
//! counterpart, inserts for right children without one. Delete-side deltas
//! precede insert-side deltas at every level, so the sequence is a valid
//! forward script when applied left to right.

use super::matching::MinCostMatch;
use super::{Delta, Operation};
use crate::tree::{NodeId, Tree};

enum Work {
    Visit(NodeId, NodeId),
    Emit(Delta),
}

/// Generates the delta sequence for two reduced trees under the matching.
pub(crate) fn edit_script(left: &Tree, right: &Tree, matching: &MinCostMatch) -> Vec<Delta> {
    let root_pair = (left.root(), right.root());
    if !matching.has_pair(root_pair) {
        return vec![
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
        ];
    }

    let mut script = Vec::new();
    let mut work = vec![Work::Visit(root_pair.0, root_pair.1)];
    while let Some(item) = work.pop() {
        let (l, r) = match item {
            Work::Emit(delta) => {
                script.push(delta);
                continue;
            }
            Work::Visit(l, r) => (l, r),
        };

        let mut level: Vec<Work> = Vec::new();
        for lc in left.children(l) {
            for rc in right.children(r) {
                if !matching.has_pair((lc, rc)) {
                    continue;
                }
                if left.node(lc).is_leaf() && right.node(rc).is_leaf() {
                    if left.node(lc).hash() != right.node(rc).hash() {
                        level.push(Work::Emit(Delta {
                            operation: Operation::Update,
                            subject: lc,
                            object: Some(rc),
                        }));
                    }
                    continue;
                }
                level.push(Work::Visit(lc, rc));
            }
            if !matching.has_left(lc) {
                let operation = if left.node(lc).is_leaf() {
                    Operation::Delete
                } else {
                    Operation::DeleteSubtree
                };
                level.push(Work::Emit(Delta {
                    operation,
                    subject: lc,
                    object: left.node(lc).parent(),
                }));
            }
        }
        for rc in right.children(r) {
            if !matching.has_right(rc) {
                let operation = if right.node(rc).is_leaf() {
                    Operation::Insert
                } else {
                    Operation::InsertSubtree
                };
                level.push(Work::Emit(Delta {
                    operation,
                    subject: rc,
                    object: right.node(rc).parent(),
                }));
            }
        }
        // Reversed push keeps the pop order identical to the recursive
        // formulation: nested pairs expand in place before later siblings.
        for item in level.into_iter().rev() {
            work.push(item);
        }
    }
    script
}
