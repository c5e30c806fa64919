//! Generate statement headers.
//!
//! Grammars either wrap the scheme in a `for_generate` / `if_generate` /
//! `case_generate` child of `generate_statement`, or put everything flat
//! in one node. Both shapes are reduced to a label, a scheme and the list
//! of body nodes the walker recurses into.

use crate::facts::GenerateScheme;
use crate::syntax::{Node, NodeKind};

use super::declarations::{label_of, parse_range, squash};

/// The parts of a generate statement the walker needs.
#[derive(Debug)]
pub(crate) struct GenerateHeader<'t> {
    pub label: String,
    pub scheme: GenerateScheme,
    pub body: Vec<Node<'t>>,
}

impl GenerateHeader<'_> {
    /// Loop parameter of a `for` generate.
    pub fn loop_var(&self) -> Option<&str> {
        match &self.scheme {
            GenerateScheme::For { loop_var, .. } if !loop_var.is_empty() => Some(loop_var),
            _ => None,
        }
    }
}

fn is_scheme_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::ForGenerate | NodeKind::IfGenerate | NodeKind::CaseGenerate
    )
}

pub(crate) fn header(node: Node<'_>) -> GenerateHeader<'_> {
    let scheme_node = if is_scheme_kind(node.kind()) {
        node
    } else {
        node.named_children()
            .find(|c| is_scheme_kind(c.kind()))
            .unwrap_or(node)
    };

    let label = label_of(node)
        .or_else(|| label_of(scheme_node))
        .or_else(|| label_before_colon(node))
        .unwrap_or_else(|| format!("generate_{}", node.line()));

    let kind = match scheme_node.kind() {
        NodeKind::ForGenerate => NodeKind::ForGenerate,
        NodeKind::IfGenerate => NodeKind::IfGenerate,
        NodeKind::CaseGenerate => NodeKind::CaseGenerate,
        _ => keyword_kind(scheme_node),
    };

    let (scheme, body) = match kind {
        NodeKind::ForGenerate => (for_scheme(scheme_node), body_nodes(scheme_node)),
        NodeKind::CaseGenerate => case_scheme(scheme_node),
        _ => (
            GenerateScheme::If {
                condition: field_or_between(scheme_node, "condition", "if"),
            },
            body_nodes(scheme_node),
        ),
    };

    GenerateHeader {
        label,
        scheme,
        body,
    }
}

fn label_before_colon(node: Node<'_>) -> Option<String> {
    let children: Vec<_> = node.children().collect();
    let colon = children.iter().position(|c| c.is_token(":"))?;
    children[..colon]
        .iter()
        .find(|c| c.kind() == NodeKind::Identifier)
        .map(|c| c.text().trim().to_string())
}

/// Scheme from the first of the `for` / `if` / `case` tokens.
fn keyword_kind(node: Node<'_>) -> NodeKind {
    for child in node.children() {
        if child.is_token("for") {
            return NodeKind::ForGenerate;
        }
        if child.is_token("case") {
            return NodeKind::CaseGenerate;
        }
        if child.is_token("if") {
            return NodeKind::IfGenerate;
        }
    }
    NodeKind::IfGenerate
}

/// Named children between the `generate` token and `end`.
fn body_nodes(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut in_body = false;
    for child in node.children() {
        if !in_body {
            in_body = child.is_token("generate");
            continue;
        }
        if child.is_token("end") {
            break;
        }
        if child.is_named() && child.field_name() != Some("label") {
            out.push(child);
        }
    }
    out
}

/// Field text, else the text of the named children between `keyword` and
/// the `generate` token.
fn field_or_between(node: Node<'_>, field: &str, keyword: &str) -> String {
    if let Some(f) = node.child_by_field_name(field) {
        return squash(f.text());
    }
    let mut parts = Vec::new();
    let mut seen = false;
    for child in node.children() {
        if child.is_token("generate") {
            break;
        }
        if child.is_token(keyword) {
            seen = true;
        } else if seen && child.is_named() {
            parts.push(child);
        }
    }
    match (parts.first(), parts.last()) {
        (Some(first), Some(last)) => squash(first.text_through(*last)),
        _ => String::new(),
    }
}

fn for_scheme(node: Node<'_>) -> GenerateScheme {
    let loop_var = node
        .child_by_field_name("loop_var")
        .map(|n| n.text().trim().to_string())
        .or_else(|| super::process::loop_parameter(node))
        .unwrap_or_default();

    let range_text = node
        .child_by_field_name("range")
        .or_else(|| {
            node.children()
                .take_while(|c| !c.is_token("generate"))
                .find(|c| c.kind() == NodeKind::Range)
        })
        .map(|r| squash(r.text()))
        .or_else(|| range_from_text(node.text()));

    let (range_low, range_high, range_dir) = match range_text {
        Some(text) => parse_range(&text).unwrap_or((text, String::new(), String::new())),
        None => Default::default(),
    };
    GenerateScheme::For {
        loop_var,
        range_low,
        range_high,
        range_dir,
    }
}

/// Text between ` in ` and ` generate`.
fn range_from_text(text: &str) -> Option<String> {
    let text = squash(text);
    let lower = text.to_ascii_lowercase();
    let start = lower.find(" in ")? + 4;
    let end = start + lower[start..].find(" generate")?;
    Some(text[start..end].trim().to_string())
}

fn case_scheme(node: Node<'_>) -> (GenerateScheme, Vec<Node<'_>>) {
    let expression = field_or_between(node, "expression", "case");
    let mut alternatives = Vec::new();
    let mut body = Vec::new();
    for alt in node.named_children() {
        let children: Vec<_> = alt.children().collect();
        let Some(arrow) = children.iter().position(|c| c.is_token("=>")) else {
            continue;
        };
        let choices: Vec<_> = children[..arrow]
            .iter()
            .filter(|c| !c.is_token("when") && c.field_name() != Some("label"))
            .collect();
        if let (Some(first), Some(last)) = (choices.first(), choices.last()) {
            alternatives.push(squash(first.text_through(**last)));
        }
        body.extend(children[arrow + 1..].iter().filter(|c| c.is_named()).copied());
    }
    (
        GenerateScheme::Case {
            expression,
            alternatives,
        },
        body,
    )
}
