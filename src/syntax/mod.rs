//! Owned concrete syntax trees.
//!
//! The extraction engine never talks to a grammar binary directly. Every
//! parser boundary (s-expression fixtures, JSON dumps from an external
//! driver, or an in-process tree-sitter tree) is converted into a
//! [`SyntaxTree`]: an arena of nodes that borrow their text from one source
//! buffer. [`Node`] is a cheap `Copy` handle into that arena with an API
//! shaped after tree-sitter's.

mod kind;

pub mod json;
pub mod sexp;

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

pub use kind::NodeKind;

use thiserror::Error;

/// Errors raised while building a syntax tree.
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("s-expression error at byte {offset}: {message}")]
    Sexp { offset: usize, message: String },

    #[error("invalid JSON syntax tree: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node {index} spans {start}..{end}, outside a source of {len} bytes")]
    Span {
        index: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("syntax tree has no root node")]
    Empty,
}

/// One node as stored in the arena.
#[derive(Debug, Clone)]
pub struct RawNode {
    pub kind: NodeKind,
    /// Grammar type tag, or the token text for anonymous nodes.
    pub tag: String,
    pub named: bool,
    /// Field name under which the parent holds this node.
    pub field: Option<String>,
    pub start_byte: usize,
    pub end_byte: usize,
    /// 0-indexed row of the first byte.
    pub start_row: usize,
    pub children: Vec<usize>,
}

impl RawNode {
    /// Create a node. Anonymous nodes always get [`NodeKind::Other`] so that
    /// keyword tokens never masquerade as named constructs.
    pub fn new(tag: &str, named: bool, field: Option<String>) -> Self {
        let kind = if named {
            NodeKind::from_tag(tag)
        } else {
            NodeKind::Other
        };
        Self {
            kind,
            tag: tag.to_string(),
            named,
            field,
            start_byte: 0,
            end_byte: 0,
            start_row: 0,
            children: Vec::new(),
        }
    }
}

/// A concrete syntax tree for one source file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<RawNode>,
}

impl SyntaxTree {
    /// Assemble a tree from its source and arena. Node 0 is the root.
    pub fn from_parts(source: String, nodes: Vec<RawNode>) -> Result<Self, SyntaxError> {
        if nodes.is_empty() {
            return Err(SyntaxError::Empty);
        }
        for (index, node) in nodes.iter().enumerate() {
            let bad = node.start_byte > node.end_byte
                || node.end_byte > source.len()
                || !source.is_char_boundary(node.start_byte)
                || !source.is_char_boundary(node.end_byte);
            if bad {
                return Err(SyntaxError::Span {
                    index,
                    start: node.start_byte,
                    end: node.end_byte,
                    len: source.len(),
                });
            }
        }
        Ok(Self { source, nodes })
    }

    /// The root node.
    pub fn root(&self) -> Node<'_> {
        Node { tree: self, id: 0 }
    }

    /// The full source buffer.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true for a built tree).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn raw(&self, id: usize) -> &RawNode {
        &self.nodes[id]
    }
}

/// A handle to one node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: usize,
}

impl<'t> Node<'t> {
    fn raw(&self) -> &'t RawNode {
        self.tree.raw(self.id)
    }

    fn at(&self, id: usize) -> Node<'t> {
        Node {
            tree: self.tree,
            id,
        }
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.raw().kind
    }

    /// Raw grammar tag (token text for anonymous nodes).
    pub fn tag(&self) -> &'t str {
        &self.raw().tag
    }

    /// Named nodes are grammar rules; anonymous nodes are keyword and
    /// punctuation tokens.
    pub fn is_named(&self) -> bool {
        self.raw().named
    }

    /// Field name this node is stored under in its parent.
    pub fn field_name(&self) -> Option<&'t str> {
        self.raw().field.as_deref()
    }

    /// Source text covered by this node.
    pub fn text(&self) -> &'t str {
        let raw = self.raw();
        &self.tree.source[raw.start_byte..raw.end_byte]
    }

    /// Source text from the start of this node to the end of `last`.
    pub fn text_through(&self, last: Node<'t>) -> &'t str {
        let start = self.raw().start_byte;
        let end = last.raw().end_byte.max(start);
        &self.tree.source[start..end]
    }

    /// Whether this node is the anonymous token `token` (case-insensitive).
    pub fn is_token(&self, token: &str) -> bool {
        !self.is_named() && self.text().eq_ignore_ascii_case(token)
    }

    /// 0-indexed start row.
    pub fn start_row(&self) -> usize {
        self.raw().start_row
    }

    /// 1-indexed start line.
    pub fn line(&self) -> usize {
        self.raw().start_row + 1
    }

    /// Start byte offset.
    pub fn start_byte(&self) -> usize {
        self.raw().start_byte
    }

    /// Number of children, named and anonymous.
    pub fn child_count(&self) -> usize {
        self.raw().children.len()
    }

    /// Child at `index`.
    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        self.raw().children.get(index).map(|&id| self.at(id))
    }

    /// All children in order.
    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        self.raw()
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    /// Named children in order.
    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(|c| c.is_named())
    }

    /// First child stored under `field`.
    pub fn child_by_field_name(&self, field: &str) -> Option<Node<'t>> {
        self.children().find(|c| c.field_name() == Some(field))
    }

    /// Every child stored under `field`.
    pub fn children_by_field_name(&self, field: &str) -> Vec<Node<'t>> {
        self.children()
            .filter(|c| c.field_name() == Some(field))
            .collect()
    }

    /// First named child of `kind`.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<Node<'t>> {
        self.named_children().find(|c| c.kind() == kind)
    }

    /// This node and every node below it, in pre-order.
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// First descendant (excluding self) of `kind`, in pre-order.
    pub fn find_descendant(&self, kind: NodeKind) -> Option<Node<'t>> {
        self.descendants().skip(1).find(|n| n.kind() == kind)
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{:?}", self.tag(), self.line(), self.text())
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

/// Pre-order iterator over a subtree.
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<usize>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let raw = self.tree.raw(id);
        self.stack.extend(raw.children.iter().rev());
        Some(Node {
            tree: self.tree,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tag: &str, named: bool, start: usize, end: usize, row: usize) -> RawNode {
        let mut node = RawNode::new(tag, named, None);
        node.start_byte = start;
        node.end_byte = end;
        node.start_row = row;
        node
    }

    #[test]
    fn test_handles_expose_text_and_fields() {
        let source = "y <= a;".to_string();
        let mut root = leaf("concurrent_signal_assignment", true, 0, 7, 0);
        root.children = vec![1, 2, 3, 4];
        let mut target = leaf("identifier", true, 0, 1, 0);
        target.field = Some("target".to_string());
        let nodes = vec![
            root,
            target,
            leaf("<=", false, 2, 4, 0),
            leaf("identifier", true, 5, 6, 0),
            leaf(";", false, 6, 7, 0),
        ];
        let tree = SyntaxTree::from_parts(source, nodes).unwrap();
        let root = tree.root();

        assert_eq!(root.kind(), NodeKind::ConcurrentSignalAssignment);
        assert_eq!(root.line(), 1);
        assert_eq!(root.child_count(), 4);
        assert_eq!(root.named_children().count(), 2);
        assert_eq!(root.child_by_field_name("target").unwrap().text(), "y");
        assert!(root.child(1).unwrap().is_token("<="));
        assert_eq!(root.child(1).unwrap().kind(), NodeKind::Other);
        assert_eq!(root.descendants().count(), 5);
    }

    #[test]
    fn test_rejects_out_of_range_spans() {
        let nodes = vec![leaf("design_file", true, 0, 10, 0)];
        let err = SyntaxTree::from_parts("short".to_string(), nodes).unwrap_err();
        assert!(matches!(err, SyntaxError::Span { index: 0, .. }));
    }

    #[test]
    fn test_rejects_empty_arena() {
        let err = SyntaxTree::from_parts(String::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, SyntaxError::Empty));
    }
}
