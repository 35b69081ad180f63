//! Parsers that build node trees from XML sources.
//!
//! The parser uses quick-xml's streaming API. Besides single documents it
//! can walk a directory, producing a tree in which directories and files are
//! nodes: XML files become document subtrees, everything else becomes a
//! [`NodeType::NotXml`](crate::tree::NodeType) leaf carrying the file bytes.
//! This makes XML data spread over many files comparable in one pass.
//!
//! Attributes are stored as child nodes in document order, character data
//! becomes data nodes with whitespace-only runs dropped, and the XML
//! declaration turns into a declaration node whose parameters are attribute
//! children. Every returned tree is already prepared.

use std::borrow::Cow;
use std::fs;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::tree::{prepare, NodeId, Tree};

/// XML parser that builds prepared node trees.
#[derive(Debug, Default, Clone)]
pub struct Parser;

impl Parser {
    /// Instantiates a new parser.
    pub fn new() -> Self {
        Parser
    }

    /// Parses a document from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Tree> {
        self.parse_bytes(xml.as_bytes())
    }

    /// Parses a document from raw bytes. UTF-8 and UTF-16 byte order marks
    /// are honoured.
    ///
    /// The document node is left unnamed; names would flow into every
    /// descendant signature and stop same-shaped documents from matching.
    /// Only directory parsing names documents, where both sides carry file
    /// names.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Tree> {
        let content = ensure_utf8(bytes)?;
        let mut tree = Tree::document("");
        let root = tree.root();
        let mut reader = Reader::from_reader(content.as_ref());
        self.build_document(&mut tree, root, &mut reader)?;
        prepare(&mut tree)?;
        Ok(tree)
    }

    /// Parses a document by reading the provided reader to its end.
    pub fn parse_reader<R: Read>(&self, mut r: R) -> Result<Tree> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        self.parse_bytes(&bytes)
    }

    /// Parses a document from a file path.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Tree> {
        let bytes = fs::read(path.as_ref())?;
        self.parse_bytes(&bytes)
    }

    /// Parses a directory into a tree of directory, document and non-XML
    /// nodes. Entries are visited in name order so runs over the same data
    /// always build the same tree.
    pub fn parse_dir<P: AsRef<Path>>(&self, path: P) -> Result<Tree> {
        let path = path.as_ref();
        let mut tree = Tree::directory(base_name(path));
        let mut pending: Vec<(NodeId, PathBuf)> = vec![(tree.root(), path.to_path_buf())];
        while let Some((dir_node, dir_path)) = pending.pop() {
            let mut entries: Vec<_> =
                fs::read_dir(&dir_path)?.collect::<std::io::Result<_>>()?;
            entries.sort_by_key(|e| e.file_name());
            for entry in entries {
                let entry_path = entry.path();
                if entry.file_type()?.is_dir() {
                    let child = tree.new_directory(base_name(&entry_path));
                    tree.append_child(dir_node, child);
                    pending.push((child, entry_path));
                } else if let Some(child) = self.file_node(&mut tree, &entry_path)? {
                    tree.append_child(dir_node, child);
                }
            }
        }
        prepare(&mut tree)?;
        Ok(tree)
    }

    /// Builds a node for a regular file: XML content becomes a document
    /// subtree, anything else a NotXML leaf. Empty files are skipped.
    fn file_node(&self, tree: &mut Tree, path: &Path) -> Result<Option<NodeId>> {
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let content = ensure_utf8(&bytes)?;
        if content.first() == Some(&b'<') {
            let doc = tree.new_document(base_name(path));
            let mut reader = Reader::from_reader(content.as_ref());
            self.build_document(tree, doc, &mut reader)?;
            Ok(Some(doc))
        } else {
            Ok(Some(tree.new_not_xml(base_name(path), bytes)))
        }
    }

    /// Feeds parser events into the tree below the given document node.
    fn build_document<R: BufRead>(
        &self,
        tree: &mut Tree,
        doc: NodeId,
        reader: &mut Reader<R>,
    ) -> Result<()> {
        // Whitespace handling is ours: whitespace-only runs are dropped,
        // everything else is stored untouched.
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        let mut node_stack: Vec<NodeId> = vec![doc];
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let element = self.element_node(tree, e, reader)?;
                    let parent = *node_stack.last().expect("document node stays on the stack");
                    tree.append_child(parent, element);
                    node_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    node_stack.pop();
                }
                Ok(Event::Empty(ref e)) => {
                    let element = self.element_node(tree, e, reader)?;
                    let parent = *node_stack.last().expect("document node stays on the stack");
                    tree.append_child(parent, element);
                }
                Ok(Event::Text(e)) => {
                    let raw =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    if !text.trim().is_empty() {
                        let data = tree.new_data(text.as_bytes());
                        let parent = *node_stack.last().expect("document node stays on the stack");
                        tree.append_child(parent, data);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    let cdata = tree.new_cdata(e.as_ref());
                    let parent = *node_stack.last().expect("document node stays on the stack");
                    tree.append_child(parent, cdata);
                }
                Ok(Event::Comment(ref e)) => {
                    let comment = tree.new_comment(e.as_ref());
                    let parent = *node_stack.last().expect("document node stays on the stack");
                    tree.append_child(parent, comment);
                }
                Ok(Event::PI(ref e)) => {
                    // <?target content?>
                    let pi_data = String::from_utf8_lossy(e.as_ref()).to_string();
                    let (target, content) = match pi_data
                        .char_indices()
                        .find(|(_, c)| c.is_whitespace())
                        .map(|(i, _)| i)
                    {
                        Some(pos) => (
                            pi_data[..pos].to_string(),
                            pi_data[pos..].trim().to_string(),
                        ),
                        None => (pi_data, String::new()),
                    };
                    let pi = tree.new_proc_instr(target, content);
                    let parent = *node_stack.last().expect("document node stays on the stack");
                    tree.append_child(parent, pi);
                }
                Ok(Event::Decl(ref e)) => {
                    let decl = tree.new_declaration();
                    let parent = *node_stack.last().expect("document node stays on the stack");
                    tree.append_child(parent, decl);
                    let version = e.version().map_err(|e| Error::Parse(e.to_string()))?;
                    let attr = tree.new_attribute("version", version.as_ref());
                    tree.append_child(decl, attr);
                    if let Some(encoding) = e.encoding() {
                        let encoding = encoding.map_err(|e| Error::Parse(e.to_string()))?;
                        let attr = tree.new_attribute("encoding", encoding.as_ref());
                        tree.append_child(decl, attr);
                    }
                    if let Some(standalone) = e.standalone() {
                        let standalone = standalone.map_err(|e| Error::Parse(e.to_string()))?;
                        let attr = tree.new_attribute("standalone", standalone.as_ref());
                        tree.append_child(decl, attr);
                    }
                }
                Ok(Event::DocType(ref e)) => {
                    let doctype = tree.new_doctype(e.as_ref());
                    let parent = *node_stack.last().expect("document node stays on the stack");
                    tree.append_child(parent, doctype);
                }
                Ok(Event::GeneralRef(_)) => {
                    // General entity references are not expanded.
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Parse(format!("XML parse error: {}", e))),
            }
            buf.clear();
        }
        Ok(())
    }

    /// Creates an element node with its attributes appended as child nodes
    /// in document order.
    fn element_node<R: BufRead>(
        &self,
        tree: &mut Tree,
        e: &BytesStart,
        reader: &Reader<R>,
    ) -> Result<NodeId> {
        let name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        let element = tree.new_element(name);
        for attr_result in e.attributes() {
            let attr =
                attr_result.map_err(|e| Error::Parse(format!("attribute error: {}", e)))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let attr_node = tree.new_attribute(key, value);
            tree.append_child(element, attr_node);
        }
        Ok(element)
    }
}

/// Returns the last path component as bytes.
fn base_name(path: &Path) -> Vec<u8> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned().into_bytes())
        .unwrap_or_default()
}

/// Checks the input for byte order marks and returns UTF-8 encoded content.
fn ensure_utf8(b: &[u8]) -> Result<Cow<'_, [u8]>> {
    if let Some(rest) = b.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        Ok(Cow::Borrowed(rest))
    } else if let Some(rest) = b.strip_prefix(&[0xFF, 0xFE]) {
        Ok(Cow::Owned(decode_utf16(rest, |c| {
            u16::from_le_bytes([c[0], c[1]])
        })?))
    } else if let Some(rest) = b.strip_prefix(&[0xFE, 0xFF]) {
        Ok(Cow::Owned(decode_utf16(rest, |c| {
            u16::from_be_bytes([c[0], c[1]])
        })?))
    } else {
        Ok(Cow::Borrowed(b))
    }
}

/// Transcodes UTF-16 content to UTF-8.
fn decode_utf16(b: &[u8], read_unit: impl Fn(&[u8]) -> u16) -> Result<Vec<u8>> {
    if b.len() % 2 != 0 {
        return Err(Error::Parse(
            "UTF-16 content must have an even byte length".to_string(),
        ));
    }
    let units: Vec<u16> = b.chunks_exact(2).map(read_unit).collect();
    let decoded = String::from_utf16(&units).map_err(|e| Error::Parse(e.to_string()))?;
    Ok(decoded.into_bytes())
}
