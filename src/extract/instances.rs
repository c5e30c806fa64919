//! Component declarations and instantiations.

use std::collections::BTreeMap;

use crate::facts::{ActualKind, Association, AssociationKind, Component, Instance};
use crate::syntax::{Node, NodeKind};

use super::declarations::{collect_shallow, compact, interface_list, label_of, name_of, squash};
use super::names::{resolve, NameLookup};
use super::scope::Scope;

pub(crate) fn component(node: Node<'_>) -> Component {
    let name = name_of(node).unwrap_or_default();
    let (generics, ports) = interface_list(&name, node);
    Component {
        name,
        generics,
        ports,
        line: node.line(),
    }
}

/// Strip a trailing `(architecture)` from an entity reference.
fn strip_architecture(text: &str) -> String {
    let compact = compact(text);
    match compact.find('(') {
        Some(i) => compact[..i].to_string(),
        None => compact,
    }
}

pub(crate) fn instance(node: Node<'_>, scope: &Scope, names: &dyn NameLookup) -> Instance {
    let children: Vec<_> = node.children().collect();
    let colon = children.iter().position(|c| c.is_token(":"));

    let name = label_of(node)
        .or_else(|| {
            children[..colon.unwrap_or(0)]
                .iter()
                .find(|c| c.kind() == NodeKind::Identifier)
                .map(|c| c.text().trim().to_string())
        })
        .unwrap_or_default();

    let entity_token = children.iter().any(|c| c.is_token("entity"));
    let (target, is_entity) = if let Some(c) = node.child_by_field_name("component") {
        (strip_architecture(c.text()), false)
    } else if let Some(e) = node.child_by_field_name("entity") {
        let entity = strip_architecture(e.text());
        let target = match node.child_by_field_name("library") {
            Some(lib) if !entity.contains('.') => format!("{}.{}", compact(lib.text()), entity),
            _ => entity,
        };
        (target, true)
    } else {
        let start = colon.map_or(0, |c| c + 1);
        let target = children[start..]
            .iter()
            .find(|c| {
                c.is_named()
                    && c.field_name() != Some("label")
                    && !matches!(
                        c.kind(),
                        NodeKind::GenericMapAspect | NodeKind::PortMapAspect | NodeKind::Comment
                    )
            })
            .map(|c| strip_architecture(c.text()))
            .unwrap_or_default();
        (target, entity_token)
    };

    let mut inst = Instance {
        name,
        target,
        is_entity,
        in_arch: scope.path().to_string(),
        line: node.line(),
        ..Instance::default()
    };

    for child in node.named_children() {
        let kind = match child.kind() {
            NodeKind::GenericMapAspect => AssociationKind::Generic,
            NodeKind::PortMapAspect => AssociationKind::Port,
            _ => continue,
        };
        let elements = collect_shallow(child, NodeKind::AssociationElement);
        let mut position = 0;
        for element in elements {
            let assoc = association(element, kind, position, names);
            if assoc.is_positional {
                position += 1;
            } else {
                let map = match kind {
                    AssociationKind::Generic => &mut inst.generic_map,
                    AssociationKind::Port => &mut inst.port_map,
                };
                insert_map(map, &assoc);
            }
            inst.associations.push(assoc);
        }
    }
    inst
}

fn insert_map(map: &mut BTreeMap<String, String>, assoc: &Association) {
    map.insert(assoc.formal.clone(), assoc.actual.clone());
}

/// Text of the non-punctuation tokens in `nodes`, if any.
fn token_text(nodes: &[Node<'_>]) -> Option<String> {
    let parts: Vec<&str> = nodes
        .iter()
        .filter(|c| c.kind() != NodeKind::Comment && !matches!(c.text(), "," | "(" | ")"))
        .map(|c| c.text())
        .collect();
    let text = squash(&parts.join(" "));
    (!text.is_empty()).then_some(text)
}

fn association(
    node: Node<'_>,
    kind: AssociationKind,
    position: usize,
    names: &dyn NameLookup,
) -> Association {
    let children: Vec<_> = node.children().collect();
    let arrow = children.iter().position(|c| c.is_token("=>"));
    // An element made only of tokens is a leaf whose text holds the arrow.
    let leaf_split = if children.is_empty() {
        node.text()
            .split_once("=>")
            .map(|(f, a)| (squash(f), squash(a)))
            .filter(|(f, _)| !f.is_empty())
    } else {
        None
    };

    let formal = node.child_by_field_name("formal").map(|f| squash(f.text())).or_else(|| {
        if let Some((f, _)) = &leaf_split {
            return Some(f.clone());
        }
        let a = arrow?;
        let named: Vec<_> = children[..a].iter().filter(|c| c.is_named()).collect();
        match (named.first(), named.last()) {
            (Some(first), Some(last)) => Some(squash(first.text_through(**last))),
            // Formal written as bare tokens.
            _ => token_text(&children[..a]),
        }
    });

    let actual_nodes: Vec<Node<'_>> = match node.child_by_field_name("actual") {
        Some(a) => vec![a],
        None => {
            let start = arrow.map_or(0, |a| a + 1);
            children[start..]
                .iter()
                .filter(|c| c.is_named() && c.kind() != NodeKind::Comment)
                .copied()
                .collect()
        }
    };
    let actual = match (actual_nodes.first(), actual_nodes.last()) {
        (Some(first), Some(last)) => squash(first.text_through(*last)),
        _ if leaf_split.is_some() => leaf_split.map(|(_, a)| a).unwrap_or_default(),
        // A leaf element carries its whole text.
        _ if formal.is_none() => squash(node.text()),
        _ => arrow
            .and_then(|a| token_text(&children[a + 1..]))
            .unwrap_or_default(),
    };

    let mut assoc = Association {
        kind,
        is_positional: formal.is_none(),
        position_index: if formal.is_none() { position } else { 0 },
        formal: formal.unwrap_or_default(),
        line: node.line(),
        ..Association::default()
    };

    let single = match actual_nodes.as_slice() {
        [only] => Some(*only),
        _ => None,
    };
    assoc.actual_kind = match single {
        _ if actual.eq_ignore_ascii_case("open") => ActualKind::Open,
        Some(n) if n.kind() == NodeKind::Open => ActualKind::Open,
        Some(n) if n.kind().is_literal() => ActualKind::Literal,
        Some(n) if n.kind().is_name() => match resolve(n, names) {
            Some(r) if !r.is_call => {
                assoc.actual_base = r.base;
                assoc.actual_full = r.full_path;
                ActualKind::Name
            }
            _ => ActualKind::Expression,
        },
        Some(_) => ActualKind::Expression,
        None if super::expressions::is_literal_text(&actual) => ActualKind::Literal,
        None if is_plain_name(&actual) => {
            assoc.actual_full = actual
                .split('(')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            assoc.actual_base = assoc
                .actual_full
                .split('.')
                .next()
                .unwrap_or_default()
                .to_string();
            ActualKind::Name
        }
        None => ActualKind::Expression,
    };
    assoc.actual = actual;
    assoc
}

/// `a`, `a.b`, or `a(3 downto 0)` written as a leaf.
fn is_plain_name(text: &str) -> bool {
    let head = text.split('(').next().unwrap_or_default().trim();
    !head.is_empty()
        && head
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        && head
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
