//! Matching-space reduction.

use crate::tree::{NodeId, NodeType, Tree};

/// Detaches identical element subtrees from both trees before matching.
///
/// Children at matching sibling positions that share a signature either
/// become removal candidates (equal hashes) or are descended into (unequal
/// hashes). All candidates but one are detached on both sides; the retained
/// pair anchors the parent-to-parent match that fully removed subtrees could
/// no longer witness. Only element children are pruned.
pub(crate) fn reduce_matching_space(left: &mut Tree, right: &mut Tree) {
    let mut stack: Vec<(NodeId, NodeId)> = vec![(left.root(), right.root())];
    while let Some((l, r)) = stack.pop() {
        let mut candidates: Vec<(NodeId, NodeId)> = Vec::new();
        let mut lc = left.node(l).first_child();
        let mut rc = right.node(r).first_child();
        while let (Some(lid), Some(rid)) = (lc, rc) {
            let left_next = left.node(lid).next_sibling();
            let right_next = right.node(rid).next_sibling();
            if left.node(lid).node_type() == NodeType::Element
                && right.node(rid).node_type() == NodeType::Element
                && left.node(lid).signature() == right.node(rid).signature()
            {
                if left.node(lid).hash() == right.node(rid).hash() {
                    candidates.push((lid, rid));
                } else {
                    stack.push((lid, rid));
                }
            }
            lc = left_next;
            rc = right_next;
        }
        if candidates.len() > 1 {
            for &(lid, rid) in &candidates[..candidates.len() - 1] {
                left.remove(lid);
                right.remove(rid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::prepare;

    fn build_side(edited: bool) -> Tree {
        let mut tree = Tree::document("");
        let root = tree.root();
        let r = tree.new_element("r");
        tree.append_child(root, r);
        for name in ["keep", "keep"] {
            let el = tree.new_element(name);
            let data = tree.new_data("same");
            tree.append_child(r, el);
            tree.append_child(el, data);
        }
        let diff = tree.new_element("diff");
        let data = tree.new_data(if edited { "new" } else { "old" });
        tree.append_child(r, diff);
        tree.append_child(diff, data);
        prepare(&mut tree).unwrap();
        tree
    }

    #[test]
    fn identical_pairs_pruned_except_last() {
        let mut left = build_side(false);
        let mut right = build_side(true);
        reduce_matching_space(&mut left, &mut right);

        let r = left.node(left.root()).first_child().unwrap();
        let names: Vec<Vec<u8>> = left
            .children(r)
            .map(|c| left.node(c).name().to_vec())
            .collect();
        // One of the two identical "keep" subtrees survives on each side.
        assert_eq!(names, vec![b"keep".to_vec(), b"diff".to_vec()]);

        let r = right.node(right.root()).first_child().unwrap();
        assert_eq!(right.child_count(r), 2);
    }

    #[test]
    fn value_nodes_are_never_pruned() {
        let mut left = Tree::document("");
        let root = left.root();
        let r = left.new_element("r");
        let a = left.new_data("same");
        let b = left.new_element("x");
        let bv = left.new_data("old");
        left.append_child(root, r);
        left.append_child(r, a);
        left.append_child(r, b);
        left.append_child(b, bv);

        let mut right = Tree::document("");
        let root = right.root();
        let r2 = right.new_element("r");
        let a2 = right.new_data("same");
        let b2 = right.new_element("x");
        let bv2 = right.new_data("new");
        right.append_child(root, r2);
        right.append_child(r2, a2);
        right.append_child(r2, b2);
        right.append_child(b2, bv2);

        prepare(&mut left).unwrap();
        prepare(&mut right).unwrap();
        reduce_matching_space(&mut left, &mut right);

        // The identical data leaves inside <r> are not candidates even
        // though their signatures and hashes agree.
        assert_eq!(left.child_count(r), 2);
        assert_eq!(right.child_count(r2), 2);
    }
}
