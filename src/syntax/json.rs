//! JSON syntax tree dumps.
//!
//! External parser drivers hand trees over as JSON:
//!
//! ```json
//! {
//!   "source": "y <= a;",
//!   "root": {
//!     "type": "design_file", "start_byte": 0, "end_byte": 7,
//!     "children": [ { "type": "concurrent_signal_assignment", ... } ]
//!   }
//! }
//! ```
//!
//! `named` defaults to true, `field` to none, and `start_row` is derived
//! from the source when absent.

use serde::{Deserialize, Serialize};

use super::{RawNode, SyntaxError, SyntaxTree};

/// Serialized form of a whole tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTree {
    pub source: String,
    pub root: JsonNode,
}

/// Serialized form of one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonNode {
    #[serde(rename = "type", alias = "kind")]
    pub tag: String,
    #[serde(default = "default_true")]
    pub named: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub start_byte: usize,
    pub end_byte: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JsonNode>,
}

fn default_true() -> bool {
    true
}

/// Parse a JSON dump into a syntax tree.
pub fn parse(text: &str) -> Result<SyntaxTree, SyntaxError> {
    let dump: JsonTree = serde_json::from_str(text)?;
    from_dump(dump)
}

/// Convert an already deserialized dump.
pub fn from_dump(dump: JsonTree) -> Result<SyntaxTree, SyntaxError> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(dump.source.match_indices('\n').map(|(i, _)| i + 1))
        .collect();

    let mut nodes = Vec::new();
    flatten(&dump.root, &line_starts, &mut nodes);
    SyntaxTree::from_parts(dump.source, nodes)
}

fn flatten(node: &JsonNode, line_starts: &[usize], nodes: &mut Vec<RawNode>) -> usize {
    let id = nodes.len();
    let mut raw = RawNode::new(&node.tag, node.named, node.field.clone());
    raw.start_byte = node.start_byte;
    raw.end_byte = node.end_byte;
    raw.start_row = node.start_row.unwrap_or_else(|| {
        line_starts
            .partition_point(|&start| start <= node.start_byte)
            .saturating_sub(1)
    });
    nodes.push(raw);

    let children: Vec<usize> = node
        .children
        .iter()
        .map(|child| flatten(child, line_starts, nodes))
        .collect();
    nodes[id].children = children;
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::NodeKind;

    #[test]
    fn test_parse_dump_derives_rows() {
        let json = r#"{
            "source": "library ieee;\nsignal s : bit;",
            "root": {
                "type": "design_file", "start_byte": 0, "end_byte": 29,
                "children": [
                    {"type": "library_clause", "start_byte": 0, "end_byte": 13,
                     "children": [{"type": "identifier", "start_byte": 8, "end_byte": 12}]},
                    {"type": "signal_declaration", "start_byte": 14, "end_byte": 29,
                     "children": [
                        {"type": "signal", "named": false, "start_byte": 14, "end_byte": 20},
                        {"type": "identifier", "start_byte": 21, "end_byte": 22},
                        {"type": "subtype_indication", "field": "type", "start_byte": 25, "end_byte": 28}
                     ]}
                ]
            }
        }"#;
        let tree = parse(json).unwrap();
        let root = tree.root();
        let decl = root.child(1).unwrap();
        assert_eq!(decl.kind(), NodeKind::SignalDeclaration);
        assert_eq!(decl.line(), 2);
        assert_eq!(decl.child_by_field_name("type").unwrap().text(), "bit");
        assert!(decl.child(0).unwrap().is_token("signal"));
        assert_eq!(root.child(0).unwrap().child(0).unwrap().text(), "ieee");
    }

    #[test]
    fn test_bad_span_is_rejected() {
        let json = r#"{"source": "abc", "root": {"type": "design_file", "start_byte": 0, "end_byte": 9}}"#;
        assert!(matches!(parse(json), Err(SyntaxError::Span { .. })));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(parse("{"), Err(SyntaxError::Json(_))));
    }
}
