//! Tree serialisers.
//!
//! [`TextEncoder`] renders a tree as an indented outline for command line
//! inspection, one node per line. [`XmlEncoder`] writes the tree back out as
//! an XML document. Both walk iteratively with the bounded [`Stack`].

use std::io::{BufWriter, Write};

use super::{NodeId, NodeType, Stack, Tree, MAX_DEPTH};
use crate::error::{Error, Result};

/// Renders a node tree as indented text suitable for command line output.
pub struct TextEncoder<W: Write> {
    w: BufWriter<W>,
}

impl<W: Write> TextEncoder<W> {
    /// Creates a text encoder writing into `w`.
    pub fn new(w: W) -> Self {
        TextEncoder { w: BufWriter::new(w) }
    }

    /// Writes the tree to the stream.
    pub fn encode(&mut self, tree: &Tree) -> Result<()> {
        let mut stack = Stack::new();
        if !stack.push(tree.root()) {
            return Err(Error::DepthExceeded(MAX_DEPTH));
        }
        while let Some(current) = stack.pop() {
            self.write_line(tree, current)?;
            if let Some(next) = tree.node(current).next_sibling() {
                if !stack.push(next) {
                    return Err(Error::DepthExceeded(MAX_DEPTH));
                }
            }
            if let Some(first) = tree.node(current).first_child() {
                if !stack.push(first) {
                    return Err(Error::DepthExceeded(MAX_DEPTH));
                }
            }
        }
        self.w.flush().map_err(Error::Encode)
    }

    fn write_line(&mut self, tree: &Tree, current: NodeId) -> Result<()> {
        let mut indent: Vec<&str> = Vec::new();
        let mut parent = tree.node(current).parent();
        while let Some(p) = parent {
            if tree.node(p).next_sibling().is_some() {
                indent.push("│  ");
            } else {
                indent.push("   ");
            }
            parent = tree.node(p).parent();
        }
        indent.reverse();

        let node = tree.node(current);
        let branch = if node.parent().is_none() {
            "───"
        } else if node.next_sibling().is_none() {
            "└──"
        } else {
            "├──"
        };
        let fork = if node.first_child().is_some() { "┐" } else { "─" };
        writeln!(self.w, "{}{}{}{}", indent.concat(), branch, fork, node)
            .map_err(Error::Encode)
    }
}

/// Renders a node tree as an XML document.
pub struct XmlEncoder<W: Write> {
    w: BufWriter<W>,
    indent: String,
}

impl<W: Write> XmlEncoder<W> {
    /// Creates an XML encoder writing into `w`.
    pub fn new(w: W) -> Self {
        XmlEncoder {
            w: BufWriter::new(w),
            indent: String::new(),
        }
    }

    /// Sets the indent written per nesting level. Empty disables the
    /// line-oriented layout entirely.
    pub fn indent(&mut self, indent: &str) {
        self.indent = indent.to_string();
    }

    /// Writes the tree to the stream.
    pub fn encode(&mut self, tree: &Tree) -> Result<()> {
        let mut stack = Stack::new();
        if !stack.push(tree.root()) {
            return Err(Error::DepthExceeded(MAX_DEPTH));
        }
        while let Some(current) = stack.pop() {
            self.write_node(tree, current)?;
            let next = tree.node(current).next_sibling();
            let first = tree.node(current).first_child();
            if let Some(next) = next {
                if !stack.push(next) {
                    return Err(Error::DepthExceeded(MAX_DEPTH));
                }
            }
            if let Some(first) = first {
                if !stack.push(first) {
                    return Err(Error::DepthExceeded(MAX_DEPTH));
                }
            }
            if next.is_none() && first.is_none() {
                self.write_closing(tree, current)?;
                let mut closing = tree.node(current).parent();
                while let Some(c) = closing {
                    if let Some(peek) = stack.peek() {
                        if tree.node(peek).parent() == Some(c) {
                            break;
                        }
                    }
                    self.write_closing(tree, c)?;
                    closing = tree.node(c).parent();
                }
            }
        }
        self.w.flush().map_err(Error::Encode)
    }

    fn out(&mut self, bytes: &[u8]) -> Result<()> {
        self.w.write_all(bytes).map_err(Error::Encode)
    }

    fn write_indent(&mut self, tree: &Tree, n: NodeId) -> Result<()> {
        if self.indent.is_empty() {
            return Ok(());
        }
        let mut parent = tree.node(n).parent();
        while let Some(p) = parent {
            if tree.node(p).node_type() == NodeType::Document {
                break;
            }
            self.w.write_all(self.indent.as_bytes()).map_err(Error::Encode)?;
            parent = tree.node(p).parent();
        }
        Ok(())
    }

    fn write_le(&mut self) -> Result<()> {
        if self.indent.is_empty() {
            return Ok(());
        }
        self.out(b"\n")
    }

    fn write_node(&mut self, tree: &Tree, n: NodeId) -> Result<()> {
        let node = tree.node(n);
        match node.node_type() {
            NodeType::Document => {}
            NodeType::Element => {
                self.write_indent(tree, n)?;
                self.out(b"<")?;
                self.out(tree.node(n).name())?;
                let first = tree.node(n).first_child();
                let first_is_attr = first
                    .is_some_and(|f| tree.node(f).node_type() == NodeType::Attribute);
                if !first_is_attr {
                    self.out(b">")?;
                    if let Some(f) = first {
                        if tree.node(f).node_type() != NodeType::Data {
                            self.write_le()?;
                        }
                    }
                }
            }
            NodeType::Attribute => {
                self.out(b" ")?;
                self.out(tree.node(n).name())?;
                self.out(b"=\"")?;
                self.out(tree.node(n).value())?;
                self.out(b"\"")?;
                let next = tree.node(n).next_sibling();
                let next_is_attr = next
                    .is_some_and(|s| tree.node(s).node_type() == NodeType::Attribute);
                if !next_is_attr {
                    let parent_type = tree
                        .node(n)
                        .parent()
                        .map(|p| tree.node(p).node_type());
                    if parent_type != Some(NodeType::Declaration) {
                        self.out(b">")?;
                        if let Some(s) = next {
                            if tree.node(s).node_type() != NodeType::Data {
                                self.write_le()?;
                            }
                        }
                    }
                }
            }
            NodeType::Data => {
                self.out(tree.node(n).value())?;
            }
            NodeType::CData => {
                self.out(b"<![CDATA[")?;
                self.out(tree.node(n).value())?;
                self.out(b"]]>")?;
            }
            NodeType::Comment => {
                self.write_indent(tree, n)?;
                self.out(b"<!--")?;
                self.out(tree.node(n).value())?;
                self.out(b"-->")?;
                self.write_le()?;
            }
            NodeType::Declaration => {
                self.out(b"<?xml")?;
            }
            NodeType::Doctype => {
                self.out(b"<!DOCTYPE ")?;
                self.out(tree.node(n).value())?;
                self.out(b">")?;
                self.write_le()?;
            }
            NodeType::ProcInstr => {
                self.out(b"<?")?;
                self.out(tree.node(n).name())?;
                if !tree.node(n).value().is_empty() {
                    self.out(b" ")?;
                    self.out(tree.node(n).value())?;
                }
                self.out(b"?>")?;
                self.write_le()?;
            }
            NodeType::Directory | NodeType::NotXml => {
                return Err(Error::Encode(std::io::Error::other(format!(
                    "invalid xml node type {}",
                    node.node_type()
                ))));
            }
        }
        Ok(())
    }

    fn write_closing(&mut self, tree: &Tree, n: NodeId) -> Result<()> {
        match tree.node(n).node_type() {
            NodeType::Element => {
                if let Some(last) = tree.last_child(n) {
                    if tree.node(last).node_type() != NodeType::Data {
                        self.write_indent(tree, n)?;
                    }
                }
                // Elements that held only attributes were closed inline by the
                // attribute writer, but still need the closing tag.
                self.out(b"</")?;
                self.out(tree.node(n).name())?;
                self.out(b">")?;
                self.write_le()?;
            }
            NodeType::Declaration => {
                self.out(b"?>")?;
                self.write_le()?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Returns the text rendering of the tree as a string.
pub fn text_string(tree: &Tree) -> Result<String> {
    let mut buf = Vec::new();
    TextEncoder::new(&mut buf).encode(tree)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Returns the indented XML rendering of the tree as a string.
pub fn xml_string(tree: &Tree) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut enc = XmlEncoder::new(&mut buf);
        enc.indent("  ");
        enc.encode(tree)?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
