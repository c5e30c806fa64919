//! Conversion from tree-sitter trees.

use tree_sitter::{Tree, TreeCursor};

use super::{RawNode, SyntaxError, SyntaxTree};

/// Copy a tree-sitter tree into an owned [`SyntaxTree`].
///
/// `source` must be the buffer the tree was parsed from. Extra nodes
/// (comments) are kept; the extractors skip them.
pub fn from_tree(tree: &Tree, source: &str) -> Result<SyntaxTree, SyntaxError> {
    let mut nodes = Vec::new();
    let mut cursor = tree.walk();
    convert(&mut cursor, &mut nodes);
    SyntaxTree::from_parts(source.to_string(), nodes)
}

fn convert(cursor: &mut TreeCursor<'_>, nodes: &mut Vec<RawNode>) -> usize {
    let node = cursor.node();
    let id = nodes.len();
    let mut raw = RawNode::new(
        node.kind(),
        node.is_named(),
        cursor.field_name().map(str::to_string),
    );
    raw.start_byte = node.start_byte();
    raw.end_byte = node.end_byte();
    raw.start_row = node.start_position().row;
    nodes.push(raw);

    let mut children = Vec::new();
    if cursor.goto_first_child() {
        loop {
            children.push(convert(cursor, nodes));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
    nodes[id].children = children;
    id
}
