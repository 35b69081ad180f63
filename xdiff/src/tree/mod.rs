//! Tree representation of XML documents and directory structures.
//!
//! Nodes live in a flat arena owned by [`Tree`] and refer to each other with
//! copyable [`NodeId`] indices, which keeps parent back-references and the
//! cyclic previous-sibling link free of shared-ownership cycles. The cyclic
//! link makes last-child lookup and mid-list removal O(1) without a separate
//! last pointer.

mod encoding;
mod prepare;

pub use encoding::{text_string, xml_string, TextEncoder, XmlEncoder};
pub use prepare::{post_order, prepare};

use std::fmt;

/// Maximum depth of nested nodes any traversal will follow.
pub const MAX_DEPTH: usize = 10_000;

/// Kinds of nodes a tree can contain.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A file that is not an XML document. Name is the file name, value the
    /// file contents.
    NotXml = 0,
    /// A directory node. Name is the directory name. Value is empty.
    Directory,
    /// A document node. Name is the file name when parsed from a directory,
    /// otherwise empty. Value is empty.
    Document,
    /// An element node. Name is the element name.
    Element,
    /// An attribute node. Name and value hold the attribute name and value.
    Attribute,
    /// A character data node. Name is empty, value holds the text.
    Data,
    /// A CDATA section. Name is empty, value holds the text.
    CData,
    /// A comment node. Name is empty, value holds the comment text.
    Comment,
    /// The XML declaration. Version, encoding and standalone parameters are
    /// attribute children.
    Declaration,
    /// A DOCTYPE node. Value holds the doctype text.
    Doctype,
    /// A processing instruction. Name is the target, value the instructions.
    ProcInstr,
}

impl NodeType {
    /// Canonical textual tag used as the trailing signature segment.
    pub fn tag(self) -> &'static [u8] {
        match self {
            NodeType::NotXml => b"NotXML",
            NodeType::Directory => b"Directory",
            NodeType::Document => b"Document",
            NodeType::Element => b"Element",
            NodeType::Attribute => b"Attribute",
            NodeType::Data => b"Data",
            NodeType::CData => b"CData",
            NodeType::Comment => b"Comment",
            NodeType::Declaration => b"Declaration",
            NodeType::Doctype => b"Doctype",
            NodeType::ProcInstr => b"ProcInstr",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(std::str::from_utf8(self.tag()).expect("type tags are ASCII"))
    }
}

/// Index of a node inside its owning [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single node of the tree.
///
/// `signature` and `hash` are empty until [`prepare`] has run on the tree.
#[derive(Debug)]
pub struct Node {
    node_type: NodeType,
    name: Vec<u8>,
    value: Vec<u8>,
    signature: Vec<u8>,
    hash: Vec<u8>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    prev_sibling_cyclic: Option<NodeId>,
}

impl Node {
    fn new(node_type: NodeType, name: Vec<u8>, value: Vec<u8>) -> Self {
        Node {
            node_type,
            name,
            value,
            signature: Vec::new(),
            hash: Vec::new(),
            parent: None,
            first_child: None,
            next_sibling: None,
            prev_sibling_cyclic: None,
        }
    }

    /// Returns the node type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the node name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Returns the node value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns the structural signature, empty before preparation.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Returns the subtree content hash, empty before preparation.
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Returns the parent, `None` for the root and detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the first child.
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    /// Returns the next sibling.
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Returns true if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.first_child.is_none()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} n:{} v:{} s:{} h:",
            self.node_type,
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.value).replace('\n', "\\n"),
            String::from_utf8_lossy(&self.signature),
        )?;
        for b in self.hash.iter().take(3) {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

/// An arena of nodes forming a single tree.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Creates a tree whose root is a node of the given type with an empty
    /// name and value.
    pub fn new(root_type: NodeType) -> Self {
        Tree {
            nodes: vec![Node::new(root_type, Vec::new(), Vec::new())],
            root: NodeId(0),
        }
    }

    /// Creates a tree rooted at a document node.
    pub fn document(name: impl Into<Vec<u8>>) -> Self {
        Tree {
            nodes: vec![Node::new(NodeType::Document, name.into(), Vec::new())],
            root: NodeId(0),
        }
    }

    /// Creates a tree rooted at a directory node.
    pub fn directory(name: impl Into<Vec<u8>>) -> Self {
        Tree {
            nodes: vec![Node::new(NodeType::Directory, name.into(), Vec::new())],
            root: NodeId(0),
        }
    }

    /// Returns the root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a reference to the node with the given id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Creates a detached node of the given type with empty name and value.
    pub fn new_node(&mut self, node_type: NodeType) -> NodeId {
        self.push(Node::new(node_type, Vec::new(), Vec::new()))
    }

    /// Creates a detached directory node.
    pub fn new_directory(&mut self, name: impl Into<Vec<u8>>) -> NodeId {
        self.push(Node::new(NodeType::Directory, name.into(), Vec::new()))
    }

    /// Creates a detached document node.
    pub fn new_document(&mut self, name: impl Into<Vec<u8>>) -> NodeId {
        self.push(Node::new(NodeType::Document, name.into(), Vec::new()))
    }

    /// Creates a detached element node.
    pub fn new_element(&mut self, name: impl Into<Vec<u8>>) -> NodeId {
        self.push(Node::new(NodeType::Element, name.into(), Vec::new()))
    }

    /// Creates a detached attribute node.
    pub fn new_attribute(
        &mut self,
        name: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> NodeId {
        self.push(Node::new(NodeType::Attribute, name.into(), value.into()))
    }

    /// Creates a detached character data node.
    pub fn new_data(&mut self, value: impl Into<Vec<u8>>) -> NodeId {
        self.push(Node::new(NodeType::Data, Vec::new(), value.into()))
    }

    /// Creates a detached CDATA node.
    pub fn new_cdata(&mut self, value: impl Into<Vec<u8>>) -> NodeId {
        self.push(Node::new(NodeType::CData, Vec::new(), value.into()))
    }

    /// Creates a detached comment node.
    pub fn new_comment(&mut self, value: impl Into<Vec<u8>>) -> NodeId {
        self.push(Node::new(NodeType::Comment, Vec::new(), value.into()))
    }

    /// Creates a detached XML declaration node.
    pub fn new_declaration(&mut self) -> NodeId {
        self.push(Node::new(NodeType::Declaration, b"xml".to_vec(), Vec::new()))
    }

    /// Creates a detached doctype node.
    pub fn new_doctype(&mut self, value: impl Into<Vec<u8>>) -> NodeId {
        self.push(Node::new(NodeType::Doctype, Vec::new(), value.into()))
    }

    /// Creates a detached processing instruction node.
    pub fn new_proc_instr(
        &mut self,
        name: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> NodeId {
        self.push(Node::new(NodeType::ProcInstr, name.into(), value.into()))
    }

    /// Creates a detached node for a file that is not an XML document.
    pub fn new_not_xml(
        &mut self,
        name: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> NodeId {
        self.push(Node::new(NodeType::NotXml, name.into(), value.into()))
    }

    /// Appends `child` as the last child of `parent` in O(1).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        match self.nodes[parent.index()].first_child {
            None => {
                self.nodes[parent.index()].first_child = Some(child);
                self.nodes[child.index()].prev_sibling_cyclic = Some(child);
            }
            Some(first) => {
                let last = self.nodes[first.index()]
                    .prev_sibling_cyclic
                    .expect("first child always links back to the last child");
                self.nodes[child.index()].prev_sibling_cyclic = Some(last);
                self.nodes[last.index()].next_sibling = Some(child);
                self.nodes[first.index()].prev_sibling_cyclic = Some(child);
            }
        }
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Detaches the node from its parent, relinking the remaining siblings.
    ///
    /// The node keeps its children; the detached subtree simply becomes
    /// unreachable from the root. Detaching the root is a no-op.
    pub fn remove(&mut self, n: NodeId) {
        let (parent, next, prev_c) = {
            let node = &self.nodes[n.index()];
            (node.parent, node.next_sibling, node.prev_sibling_cyclic)
        };
        let Some(parent) = parent else {
            return;
        };
        if self.nodes[parent.index()].first_child == Some(n) {
            self.nodes[parent.index()].first_child = next;
        }
        if let Some(next) = next {
            self.nodes[next.index()].prev_sibling_cyclic = prev_c;
        }
        if let Some(prev_c) = prev_c {
            if self.nodes[prev_c.index()].next_sibling == Some(n) {
                self.nodes[prev_c.index()].next_sibling = next;
            }
            if next.is_none() {
                // Removed the last child: the first child's cyclic link must
                // point at the new last sibling.
                if let Some(first) = self.nodes[parent.index()].first_child {
                    self.nodes[first.index()].prev_sibling_cyclic = Some(prev_c);
                }
            }
        }
        let node = &mut self.nodes[n.index()];
        node.parent = None;
        node.next_sibling = None;
        node.prev_sibling_cyclic = None;
    }

    /// Returns the last child of the node in O(1).
    pub fn last_child(&self, n: NodeId) -> Option<NodeId> {
        let first = self.nodes[n.index()].first_child?;
        self.nodes[first.index()].prev_sibling_cyclic
    }

    /// Returns the previous sibling of the node in O(1).
    pub fn prev_sibling(&self, n: NodeId) -> Option<NodeId> {
        let prev_c = self.nodes[n.index()].prev_sibling_cyclic?;
        if self.nodes[prev_c.index()].next_sibling.is_none() {
            // The cyclic link of a first child points at the last child.
            None
        } else {
            Some(prev_c)
        }
    }

    /// Iterates over the children of the node in forward sibling order.
    pub fn children(&self, n: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.nodes[n.index()].first_child,
        }
    }

    /// Counts the children of the node.
    pub fn child_count(&self, n: NodeId) -> usize {
        self.children(n).count()
    }

    /// Sets the signature of the node from its ancestor chain, own name and
    /// type tag.
    ///
    /// The root signature is the single byte `/`. For any other node the
    /// signature is the names of its named ancestors, its own name when
    /// non-empty, and the type tag, joined by `/`.
    pub fn calculate_signature(&mut self, n: NodeId) {
        let signature = {
            let node = &self.nodes[n.index()];
            if node.parent.is_none() {
                vec![b'/']
            } else {
                let mut segments: Vec<&[u8]> = Vec::new();
                let mut parent = node.parent;
                while let Some(p) = parent {
                    let ancestor = &self.nodes[p.index()];
                    if !ancestor.name.is_empty() {
                        segments.push(&ancestor.name);
                    }
                    parent = ancestor.parent;
                }
                segments.reverse();
                if !node.name.is_empty() {
                    segments.push(&node.name);
                }
                segments.push(node.node_type.tag());
                segments.join(&b'/')
            }
        };
        self.nodes[n.index()].signature = signature;
    }

    /// Sets the hash of the node from its type, name, value and the hashes of
    /// its children in stored order. Children must already carry hashes.
    pub fn calculate_hash(&mut self, n: NodeId, hasher: &mut sha1::Sha1) {
        use sha1::Digest;

        let node = &self.nodes[n.index()];
        hasher.update([node.node_type as u8]);
        hasher.update(&node.name);
        hasher.update(&node.value);
        let mut child = node.first_child;
        while let Some(c) = child {
            let child_node = &self.nodes[c.index()];
            hasher.update(&child_node.hash);
            child = child_node.next_sibling;
        }
        self.nodes[n.index()].hash = hasher.finalize_reset().to_vec();
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.node(current).next_sibling;
        Some(current)
    }
}

/// Bounded stack for iterative tree traversal.
///
/// `push` refuses to grow beyond [`MAX_DEPTH`] so pathologically deep
/// documents fail cleanly instead of exhausting memory or the call stack.
pub struct Stack {
    data: Vec<NodeId>,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Stack { data: Vec::new() }
    }

    /// Pushes a node, returning false when the depth limit is hit.
    #[must_use]
    pub fn push(&mut self, n: NodeId) -> bool {
        if self.data.len() == MAX_DEPTH {
            return false;
        }
        self.data.push(n);
        true
    }

    /// Pops the node at the top of the stack.
    pub fn pop(&mut self) -> Option<NodeId> {
        self.data.pop()
    }

    /// Returns the node at the top of the stack without removing it.
    pub fn peek(&self) -> Option<NodeId> {
        self.data.last().copied()
    }

    /// Returns true if the stack holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Counts the nodes on the stack.
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_names(tree: &Tree, parent: NodeId) -> Vec<Vec<u8>> {
        tree.children(parent)
            .map(|c| tree.node(c).name().to_vec())
            .collect()
    }

    #[test]
    fn append_child_links_siblings() {
        let mut tree = Tree::document("");
        let root = tree.root();
        let a = tree.new_element("a");
        let b = tree.new_element("b");
        let c = tree.new_element("c");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, c);

        assert_eq!(collect_names(&tree, root), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(tree.last_child(root), Some(c));
        assert_eq!(tree.prev_sibling(a), None);
        assert_eq!(tree.prev_sibling(b), Some(a));
        assert_eq!(tree.prev_sibling(c), Some(b));
        assert_eq!(tree.node(a).parent(), Some(root));
    }

    #[test]
    fn cyclic_link_points_at_last_child() {
        let mut tree = Tree::document("");
        let root = tree.root();
        let a = tree.new_element("a");
        tree.append_child(root, a);
        assert_eq!(tree.last_child(root), Some(a));

        let b = tree.new_element("b");
        tree.append_child(root, b);
        assert_eq!(tree.last_child(root), Some(b));
        assert_eq!(tree.node(b).next_sibling(), None);
    }

    #[test]
    fn remove_first_child() {
        let mut tree = Tree::document("");
        let root = tree.root();
        let a = tree.new_element("a");
        let b = tree.new_element("b");
        let c = tree.new_element("c");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, c);

        tree.remove(a);
        assert_eq!(collect_names(&tree, root), vec![b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(tree.last_child(root), Some(c));
        assert_eq!(tree.prev_sibling(b), None);
        assert_eq!(tree.node(a).parent(), None);
        assert_eq!(tree.node(a).next_sibling(), None);
    }

    #[test]
    fn remove_middle_child() {
        let mut tree = Tree::document("");
        let root = tree.root();
        let a = tree.new_element("a");
        let b = tree.new_element("b");
        let c = tree.new_element("c");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, c);

        tree.remove(b);
        assert_eq!(collect_names(&tree, root), vec![b"a".to_vec(), b"c".to_vec()]);
        assert_eq!(tree.prev_sibling(c), Some(a));
        assert_eq!(tree.last_child(root), Some(c));
    }

    #[test]
    fn remove_last_child_relinks_cycle() {
        let mut tree = Tree::document("");
        let root = tree.root();
        let a = tree.new_element("a");
        let b = tree.new_element("b");
        let c = tree.new_element("c");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, c);

        tree.remove(c);
        assert_eq!(tree.last_child(root), Some(b));
        assert_eq!(tree.node(b).next_sibling(), None);
        assert_eq!(tree.prev_sibling(b), Some(a));
    }

    #[test]
    fn remove_only_child() {
        let mut tree = Tree::document("");
        let root = tree.root();
        let a = tree.new_element("a");
        tree.append_child(root, a);

        tree.remove(a);
        assert_eq!(tree.node(root).first_child(), None);
        assert_eq!(tree.last_child(root), None);
    }

    #[test]
    fn removed_subtree_keeps_children() {
        let mut tree = Tree::document("");
        let root = tree.root();
        let a = tree.new_element("a");
        let inner = tree.new_data("text");
        tree.append_child(root, a);
        tree.append_child(a, inner);

        tree.remove(a);
        assert_eq!(tree.node(a).first_child(), Some(inner));
        assert_eq!(tree.node(inner).parent(), Some(a));
    }

    #[test]
    fn signature_of_root_is_slash() {
        let mut tree = Tree::document("");
        let root = tree.root();
        tree.calculate_signature(root);
        assert_eq!(tree.node(root).signature(), b"/");
    }

    #[test]
    fn signature_skips_nameless_ancestors() {
        let mut tree = Tree::document("");
        let root = tree.root();
        let el = tree.new_element("item");
        let attr = tree.new_attribute("id", "1");
        let data = tree.new_data("text");
        tree.append_child(root, el);
        tree.append_child(el, attr);
        tree.append_child(el, data);

        tree.calculate_signature(el);
        tree.calculate_signature(attr);
        tree.calculate_signature(data);
        assert_eq!(tree.node(el).signature(), b"item/Element");
        assert_eq!(tree.node(attr).signature(), b"item/id/Attribute");
        assert_eq!(tree.node(data).signature(), b"item/Data");
    }

    #[test]
    fn stack_rejects_overflow() {
        let mut tree = Tree::document("");
        let id = tree.root();
        let mut stack = Stack::new();
        for _ in 0..MAX_DEPTH {
            assert!(stack.push(id));
        }
        assert!(!stack.push(id));
        assert_eq!(stack.len(), MAX_DEPTH);
        assert_eq!(stack.peek(), Some(id));
    }
}
