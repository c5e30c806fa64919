//! Declaration extractors.
//!
//! Each function turns one declaration node into facts. Missing fields
//! yield empty values; nothing here fails.

use crate::facts::{
    Architecture, Configuration, Constant, ContextClause, Direction, Entity, FunctionDeclaration,
    LibraryClause, Package, Parameter, Port, ProcedureDeclaration, RecordField, SharedVariable,
    Signal, SubtypeDeclaration, TypeDeclaration, TypeKind, UseClause,
};
use crate::semantic::width::estimate_width;
use crate::syntax::{Node, NodeKind};

use super::names::split_top_level;
use super::scope::Scope;

const MODES: [&str; 5] = ["in", "out", "inout", "buffer", "linkage"];
const CLASSES: [&str; 4] = ["signal", "constant", "variable", "file"];

/// Compact whitespace to single spaces.
pub(crate) fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove all whitespace (for dotted names).
pub(crate) fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Label of a statement (`label` field, trailing colon stripped).
pub(crate) fn label_of(node: Node<'_>) -> Option<String> {
    node.child_by_field_name("label")
        .map(|l| l.text().trim().trim_end_matches(':').trim().to_string())
        .filter(|l| !l.is_empty())
}

/// Declared name (`name` field, else the first identifier child).
pub(crate) fn name_of(node: Node<'_>) -> Option<String> {
    node.child_by_field_name("name")
        .or_else(|| node.child_of_kind(NodeKind::Identifier))
        .map(|n| n.text().trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Named children stored under no field or under `field`, collected
/// without descending into matches.
pub(crate) fn collect_shallow<'t>(node: Node<'t>, kind: NodeKind) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    for child in node.named_children() {
        if child.kind() == kind {
            out.push(child);
        } else {
            out.extend(collect_shallow(child, kind));
        }
    }
    out
}

/// The parts of `names : [mode] type [:= default]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ObjectDecl {
    pub names: Vec<(String, usize)>,
    pub type_text: String,
    pub default: Option<String>,
    pub mode: Option<String>,
    pub class: Option<String>,
    pub shared: bool,
}

/// Split an object or interface declaration into its parts.
pub(crate) fn object_decl(node: Node<'_>) -> ObjectDecl {
    let children: Vec<Node<'_>> = node.children().collect();
    let Some(colon) = children.iter().position(|c| c.is_token(":")) else {
        return object_decl_from_text(node.text(), node.line());
    };

    let mut decl = ObjectDecl::default();
    for child in &children[..colon] {
        match child.kind() {
            NodeKind::Identifier => decl
                .names
                .push((child.text().trim().to_string(), child.line())),
            NodeKind::InterfaceClass => decl.class = Some(child.text().trim().to_ascii_lowercase()),
            _ if child.is_token("shared") => decl.shared = true,
            _ if !child.is_named() => {
                let word = child.text().to_ascii_lowercase();
                if CLASSES.contains(&word.as_str()) {
                    decl.class = Some(word);
                }
            }
            _ => {}
        }
    }

    let assign = children[colon..]
        .iter()
        .position(|c| c.is_token(":="))
        .map(|p| p + colon);
    let end = assign.unwrap_or(children.len());

    let mut type_nodes = Vec::new();
    for child in &children[colon + 1..end] {
        match child.kind() {
            NodeKind::Mode => decl.mode = Some(child.text().trim().to_ascii_lowercase()),
            NodeKind::Comment => {}
            _ if !child.is_named() => {
                let word = child.text().to_ascii_lowercase();
                if type_nodes.is_empty() && decl.mode.is_none() && MODES.contains(&word.as_str())
                {
                    decl.mode = Some(word);
                } else if word != ";" && word != "bus" && word != "register" {
                    type_nodes.push(*child);
                }
            }
            _ => type_nodes.push(*child),
        }
    }
    if let Some(mode) = node.child_by_field_name("direction") {
        decl.mode = Some(mode.text().trim().to_ascii_lowercase());
    }
    if let Some(class) = node.child_by_field_name("class") {
        decl.class = Some(class.text().trim().to_ascii_lowercase());
    }

    decl.type_text = match node.child_by_field_name("type") {
        Some(t) => squash(t.text()),
        None => match (type_nodes.first(), type_nodes.last()) {
            (Some(first), Some(last)) => squash(first.text_through(*last)),
            _ => String::new(),
        },
    };

    decl.default = match node.child_by_field_name("default") {
        Some(d) => Some(squash(d.text())),
        None => assign.and_then(|a| {
            let value: Vec<_> = children[a + 1..]
                .iter()
                .filter(|c| !c.is_token(";"))
                .copied()
                .collect();
            match (value.first(), value.last()) {
                (Some(first), Some(last)) => Some(squash(first.text_through(*last))),
                _ => None,
            }
        }),
    };
    decl
}

/// Text fallback for declarations whose tokens were not split by the grammar.
pub(crate) fn object_decl_from_text(text: &str, line: usize) -> ObjectDecl {
    let mut decl = ObjectDecl::default();
    let mut rest = text.trim().trim_end_matches(';').trim();

    loop {
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let word = rest[..word_end].to_ascii_lowercase();
        if word == "shared" {
            decl.shared = true;
        } else if CLASSES.contains(&word.as_str()) {
            decl.class = Some(word);
        } else {
            break;
        }
        rest = rest[word_end..].trim_start();
    }

    let colon = rest
        .char_indices()
        .find(|&(i, c)| c == ':' && !rest[i + 1..].starts_with('='))
        .map(|(i, _)| i);
    let Some(colon) = colon else {
        return decl;
    };

    decl.names = rest[..colon]
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| (n.to_string(), line))
        .collect();

    let after = rest[colon + 1..].trim();
    let (type_part, default) = match after.find(":=") {
        Some(i) => (after[..i].trim(), Some(squash(&after[i + 2..]))),
        None => (after, None),
    };
    decl.default = default.filter(|d| !d.is_empty());

    let first_word_end = type_part.find(char::is_whitespace).unwrap_or(type_part.len());
    let first = type_part[..first_word_end].to_ascii_lowercase();
    if MODES.contains(&first.as_str()) {
        decl.mode = Some(first);
        decl.type_text = squash(&type_part[first_word_end..]);
    } else {
        decl.type_text = squash(type_part);
    }
    decl
}

/// Ports and generics of an entity or component.
pub(crate) fn interface_list(owner: &str, node: Node<'_>) -> (Vec<Port>, Vec<Port>) {
    let mut generics = Vec::new();
    let mut ports = Vec::new();

    for clause in node.named_children() {
        let is_generic = match clause.kind() {
            NodeKind::GenericClause => true,
            NodeKind::PortClause => false,
            _ => continue,
        };
        for param in collect_shallow(clause, NodeKind::Parameter) {
            let decl = object_decl(param);
            for (name, line) in &decl.names {
                let direction = if is_generic {
                    Direction::None
                } else {
                    decl.mode
                        .as_deref()
                        .map(Direction::parse)
                        .filter(|d| *d != Direction::None)
                        .unwrap_or(Direction::In)
                };
                let port = Port {
                    name: name.clone(),
                    direction,
                    port_type: decl.type_text.clone(),
                    default: decl.default.clone(),
                    class: decl.class.clone(),
                    width: estimate_width(&decl.type_text),
                    entity: owner.to_string(),
                    line: *line,
                };
                if is_generic {
                    generics.push(port);
                } else {
                    ports.push(port);
                }
            }
        }
    }
    (generics, ports)
}

pub(crate) fn entity(node: Node<'_>) -> Entity {
    let name = name_of(node).unwrap_or_default();
    let (generics, ports) = interface_list(&name, node);
    Entity {
        name,
        line: node.line(),
        generics,
        ports,
    }
}

pub(crate) fn architecture(node: Node<'_>) -> Architecture {
    let named: Vec<_> = node
        .named_children()
        .filter(|c| c.kind() == NodeKind::Identifier)
        .collect();
    let name = node
        .child_by_field_name("name")
        .or_else(|| named.first().copied())
        .map(|n| n.text().trim().to_string())
        .unwrap_or_default();
    let entity_name = node
        .child_by_field_name("entity")
        .or_else(|| named.get(1).copied())
        .map(|n| compact(n.text()))
        .unwrap_or_default();
    Architecture {
        name,
        entity_name,
        line: node.line(),
    }
}

pub(crate) fn package(node: Node<'_>) -> Package {
    Package {
        name: name_of(node).unwrap_or_default(),
        line: node.line(),
    }
}

pub(crate) fn configuration(node: Node<'_>) -> Configuration {
    let named: Vec<_> = node
        .named_children()
        .filter(|c| c.kind().is_name())
        .collect();
    Configuration {
        name: name_of(node).unwrap_or_default(),
        entity_name: node
            .child_by_field_name("entity")
            .or_else(|| named.get(1).copied())
            .map(|n| compact(n.text()))
            .unwrap_or_default(),
        line: node.line(),
    }
}

/// Library names of a library clause.
pub(crate) fn library_clause(node: Node<'_>) -> Vec<LibraryClause> {
    clause_names(node, "library")
        .into_iter()
        .map(|name| LibraryClause {
            name,
            line: node.line(),
        })
        .collect()
}

/// Selected names of a use clause.
pub(crate) fn use_clause(node: Node<'_>) -> Vec<UseClause> {
    clause_names(node, "use")
        .into_iter()
        .map(|path| {
            let parts: Vec<&str> = path.split('.').collect();
            UseClause {
                library: parts.first().map(|s| s.to_string()).unwrap_or_default(),
                package: parts.get(1).map(|s| s.to_string()).unwrap_or_default(),
                item: parts.get(2..).map(|s| s.join(".")).unwrap_or_default(),
                path,
                line: node.line(),
            }
        })
        .collect()
}

pub(crate) fn context_clause(node: Node<'_>) -> Vec<ContextClause> {
    clause_names(node, "context")
        .into_iter()
        .map(|name| ContextClause {
            name,
            line: node.line(),
        })
        .collect()
}

fn clause_names(node: Node<'_>, keyword: &str) -> Vec<String> {
    let names: Vec<String> = node
        .named_children()
        .filter(|c| c.kind().is_name())
        .map(|c| compact(c.text()))
        .collect();
    if !names.is_empty() {
        return names;
    }
    let text = node.text().trim().trim_end_matches(';');
    let body = match text.get(..keyword.len()) {
        Some(head) if head.eq_ignore_ascii_case(keyword) => &text[keyword.len()..],
        _ => text,
    };
    body.split(',')
        .map(compact)
        .filter(|n| !n.is_empty())
        .collect()
}

pub(crate) fn signals(node: Node<'_>, scope: &Scope) -> Vec<Signal> {
    let decl = object_decl(node);
    decl.names
        .iter()
        .map(|(name, line)| Signal {
            name: name.clone(),
            signal_type: decl.type_text.clone(),
            default: decl.default.clone(),
            width: estimate_width(&decl.type_text),
            scope: scope.owner().to_string(),
            line: *line,
        })
        .collect()
}

pub(crate) fn constants(node: Node<'_>, scope: &Scope) -> Vec<Constant> {
    let decl = object_decl(node);
    decl.names
        .iter()
        .map(|(name, line)| Constant {
            name: name.clone(),
            constant_type: decl.type_text.clone(),
            value: decl.default.clone(),
            in_package: scope.package().map(str::to_string),
            in_arch: scope.arch().map(str::to_string),
            line: *line,
        })
        .collect()
}

pub(crate) fn shared_variables(node: Node<'_>, scope: &Scope) -> Vec<SharedVariable> {
    let decl = object_decl(node);
    decl.names
        .iter()
        .map(|(name, line)| SharedVariable {
            name: name.clone(),
            variable_type: decl.type_text.clone(),
            scope: scope.owner().to_string(),
            line: *line,
        })
        .collect()
}

/// A type declaration, dispatched on its definition node.
pub(crate) fn type_declaration(node: Node<'_>, scope: &Scope) -> TypeDeclaration {
    let name = name_of(node).unwrap_or_default();
    let definition = node
        .child_by_field_name("definition")
        .or_else(|| node.named_children().find(|c| c.kind().is_type_definition()));

    let kind = match definition {
        Some(def) => type_kind(def),
        None => {
            let text = node.text();
            match find_word(text, "is") {
                Some(pos) => type_kind_from_text(&text[pos + 2..]),
                None => TypeKind::Incomplete,
            }
        }
    };

    TypeDeclaration {
        name,
        kind,
        in_package: scope.package().map(str::to_string),
        in_arch: scope.arch().map(str::to_string),
        line: node.line(),
    }
}

fn type_kind(def: Node<'_>) -> TypeKind {
    match def.kind() {
        NodeKind::EnumerationTypeDefinition => {
            let literals: Vec<String> = def
                .named_children()
                .filter(|c| {
                    matches!(c.kind(), NodeKind::Identifier | NodeKind::CharacterLiteral)
                })
                .map(|c| c.text().trim().to_string())
                .collect();
            if literals.is_empty() {
                type_kind_from_text(def.text())
            } else {
                TypeKind::Enum { literals }
            }
        }
        NodeKind::RecordTypeDefinition => {
            let fields = collect_shallow(def, NodeKind::ElementDeclaration)
                .into_iter()
                .flat_map(|element| {
                    let ObjectDecl {
                        names, type_text, ..
                    } = object_decl(element);
                    names.into_iter().map(move |(name, line)| RecordField {
                        name,
                        field_type: type_text.clone(),
                        line,
                    })
                })
                .collect();
            TypeKind::Record { fields }
        }
        NodeKind::ProtectedTypeDeclaration => TypeKind::Protected {
            is_body: def.tag().ends_with("body") || find_word(def.text(), "body").is_some(),
        },
        _ => type_kind_from_text(def.text()),
    }
}

/// Classify a type definition from its text (everything after `is`).
pub(crate) fn type_kind_from_text(text: &str) -> TypeKind {
    let def = text.trim().trim_end_matches(';').trim();
    let lower = def.to_ascii_lowercase();

    if def.starts_with('(') {
        let inner = def.trim_start_matches('(').trim_end_matches(')');
        return TypeKind::Enum {
            literals: inner
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        };
    }
    if lower.starts_with("record") {
        return TypeKind::Record { fields: Vec::new() };
    }
    if lower.starts_with("array") {
        let unconstrained = def.contains("<>");
        let element_type = find_word(def, "of")
            .map(|i| squash(&def[i + 2..]))
            .unwrap_or_default();
        let index_types = match (def.find('('), find_word(def, "of")) {
            (Some(open), Some(of)) if open < of => {
                let inner = def[open + 1..of].trim().trim_end_matches(')');
                split_top_level(inner, ',')
                    .into_iter()
                    .map(|s| {
                        let s = squash(s);
                        match find_word(&s, "range") {
                            Some(i) if s[i..].contains("<>") => s[..i].trim().to_string(),
                            _ => s,
                        }
                    })
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            _ => Vec::new(),
        };
        return TypeKind::Array {
            element_type,
            index_types,
            unconstrained,
        };
    }
    if lower.starts_with("access") {
        return TypeKind::Access {
            designated_type: squash(&def["access".len()..]),
        };
    }
    if lower.starts_with("file") {
        let designated = find_word(def, "of")
            .map(|i| squash(&def[i + 2..]))
            .unwrap_or_default();
        return TypeKind::File {
            designated_type: designated,
        };
    }
    if lower.starts_with("protected") {
        return TypeKind::Protected {
            is_body: find_word(def, "body").is_some(),
        };
    }
    if lower.starts_with("range") {
        if let Some(units) = find_word(def, "units") {
            let range = squash(&def["range".len()..units]);
            let body = &def[units + "units".len()..];
            let body = match find_word(body, "end") {
                Some(end) => &body[..end],
                None => body,
            };
            let units: Vec<String> = body
                .split(';')
                .filter_map(|decl| {
                    decl.split(|c: char| c.is_whitespace() || c == '=')
                        .find(|w| !w.is_empty())
                        .map(str::to_string)
                })
                .collect();
            return TypeKind::Physical {
                range: Some(range).filter(|r| !r.is_empty()),
                base_unit: units.first().cloned().unwrap_or_default(),
                units,
            };
        }
        let (low, high, direction) = parse_range(&def["range".len()..]).unwrap_or_default();
        return TypeKind::Range {
            low,
            high,
            direction,
        };
    }
    TypeKind::Incomplete
}

/// Split `low to high` / `high downto low` into (left, right, direction).
/// `downto` is checked before `to`.
pub(crate) fn parse_range(text: &str) -> Option<(String, String, String)> {
    let text = text.trim();
    for dir in ["downto", "to"] {
        if let Some(pos) = find_word(text, dir) {
            let left = squash(&text[..pos]);
            let right = squash(&text[pos + dir.len()..]);
            if left.is_empty() || right.is_empty() {
                continue;
            }
            return Some((left, right, dir.to_string()));
        }
    }
    None
}

/// Byte offset of `word` as a whole word (ASCII case-insensitive).
pub(crate) fn find_word(text: &str, word: &str) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    let word = word.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&word) {
        let start = from + rel;
        let end = start + word.len();
        let before_ok = start == 0 || !is_ident(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_ident(bytes[end]);
        if before_ok && after_ok {
            return Some(start);
        }
        from = start + 1;
    }
    None
}

pub(crate) fn alias_declaration(node: Node<'_>, scope: &Scope) -> TypeDeclaration {
    let name = name_of(node).unwrap_or_default();
    let target = node
        .child_by_field_name("target")
        .map(|t| squash(t.text()))
        .or_else(|| {
            let text = node.text().trim().trim_end_matches(';');
            find_word(text, "is").map(|i| squash(&text[i + 2..]))
        })
        .unwrap_or_default();
    let alias_type = node
        .child_by_field_name("type")
        .map(|t| squash(t.text()))
        .filter(|t| !t.is_empty());

    TypeDeclaration {
        name,
        kind: TypeKind::Alias { target, alias_type },
        in_package: scope.package().map(str::to_string),
        in_arch: scope.arch().map(str::to_string),
        line: node.line(),
    }
}

pub(crate) fn subtype_declaration(node: Node<'_>, scope: &Scope) -> SubtypeDeclaration {
    let name = name_of(node).unwrap_or_default();
    let indication = node
        .child_by_field_name("indication")
        .or_else(|| node.child_of_kind(NodeKind::SubtypeIndication));

    let mut decl = SubtypeDeclaration {
        name,
        in_package: scope.package().map(str::to_string),
        in_arch: scope.arch().map(str::to_string),
        line: node.line(),
        ..SubtypeDeclaration::default()
    };

    let Some(ind) = indication else {
        return decl;
    };
    let text = squash(ind.text());

    let (mark, constraint) = if let Some(c) = ind.child_by_field_name("constraint") {
        let mark = ind
            .child_by_field_name("type_mark")
            .map(|m| squash(m.text()))
            .unwrap_or_else(|| squash(&text[..text.find(c.text()).unwrap_or(text.len())]));
        (mark, Some(squash(c.text())))
    } else if let Some(pos) = find_word(&text, "range") {
        (text[..pos].trim().to_string(), Some(text[pos..].trim().to_string()))
    } else if let Some(pos) = text.find('(') {
        (text[..pos].trim().to_string(), Some(text[pos..].trim().to_string()))
    } else {
        (text.clone(), None)
    };

    let explicit_resolution = ind
        .child_by_field_name("resolution")
        .map(|r| squash(r.text()));
    let words: Vec<&str> = mark.split_whitespace().collect();
    let (resolution, base) = match (explicit_resolution, words.as_slice()) {
        (Some(r), _) => {
            let base = mark.trim_start_matches(r.as_str()).trim().to_string();
            (Some(r), base)
        }
        (None, [res, base]) => (Some(res.to_string()), base.to_string()),
        (None, _) => (None, mark.clone()),
    };

    decl.base_type = base;
    decl.constraint = constraint;
    decl.resolution = resolution;
    decl
}

fn parameters(node: Node<'_>) -> Vec<Parameter> {
    let list = node
        .child_by_field_name("parameters")
        .or_else(|| node.child_of_kind(NodeKind::ParameterList));
    let params = match list {
        Some(list) => collect_shallow(list, NodeKind::Parameter),
        None => node
            .named_children()
            .filter(|c| c.kind() == NodeKind::Parameter)
            .collect(),
    };

    let mut out = Vec::new();
    for param in params {
        let decl = object_decl(param);
        let direction = decl
            .mode
            .as_deref()
            .map(Direction::parse)
            .filter(|d| *d != Direction::None)
            .unwrap_or(Direction::In);
        for (name, line) in &decl.names {
            out.push(Parameter {
                name: name.clone(),
                direction,
                param_type: decl.type_text.clone(),
                class: decl.class.clone(),
                default: decl.default.clone(),
                line: *line,
            });
        }
    }
    out
}

fn subprogram_name(node: Node<'_>) -> String {
    node.child_by_field_name("name")
        .or_else(|| node.child_by_field_name("designator"))
        .or_else(|| {
            node.named_children().find(|c| {
                matches!(c.kind(), NodeKind::Identifier | NodeKind::StringLiteral)
            })
        })
        .map(|n| n.text().trim().to_string())
        .unwrap_or_default()
}

fn has_body(node: Node<'_>) -> bool {
    node.tag().ends_with("_body")
        || node.child_of_kind(NodeKind::SubprogramBody).is_some()
        || node.children().any(|c| c.is_token("begin"))
}

pub(crate) fn function_declaration(node: Node<'_>, scope: &Scope) -> FunctionDeclaration {
    let children: Vec<_> = node.children().collect();
    let return_type = node
        .child_by_field_name("return_type")
        .or_else(|| {
            let pos = children.iter().position(|c| c.is_token("return"))?;
            children[pos + 1..].iter().find(|c| c.is_named()).copied()
        })
        .map(|n| squash(n.text()))
        .unwrap_or_default();
    let impure = children.iter().any(|c| c.is_token("impure"))
        || node.text().trim_start().to_ascii_lowercase().starts_with("impure");

    FunctionDeclaration {
        name: subprogram_name(node),
        return_type,
        parameters: parameters(node),
        is_pure: !impure,
        has_body: has_body(node),
        in_package: scope.package().map(str::to_string),
        in_arch: scope.arch().map(str::to_string),
        line: node.line(),
    }
}

pub(crate) fn procedure_declaration(node: Node<'_>, scope: &Scope) -> ProcedureDeclaration {
    ProcedureDeclaration {
        name: subprogram_name(node),
        parameters: parameters(node),
        has_body: has_body(node),
        in_package: scope.package().map(str::to_string),
        in_arch: scope.arch().map(str::to_string),
        line: node.line(),
    }
}
