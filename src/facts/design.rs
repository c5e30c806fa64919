//! Declaration facts: design units, interfaces, objects, types and subprograms.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An entity declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub line: usize,
    pub generics: Vec<Port>,
    pub ports: Vec<Port>,
}

/// An architecture body. `entity_name` may name an entity in another file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    pub name: String,
    pub entity_name: String,
    pub line: usize,
}

/// A package declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub line: usize,
}

/// A configuration declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub entity_name: String,
    pub line: usize,
}

/// Interface mode. Generics carry [`Direction::None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Inout,
    Buffer,
    Linkage,
    #[default]
    #[serde(rename = "")]
    None,
}

impl Direction {
    /// Parse a mode keyword (case-insensitive). Unknown text is `None`.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "in" => Direction::In,
            "out" => Direction::Out,
            "inout" => Direction::Inout,
            "buffer" => Direction::Buffer,
            "linkage" => Direction::Linkage,
            _ => Direction::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Inout => "inout",
            Direction::Buffer => "buffer",
            Direction::Linkage => "linkage",
            Direction::None => "",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A port or generic of an entity or component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub port_type: String,
    pub default: Option<String>,
    /// Interface class keyword when written (`signal`, `constant`, ...).
    pub class: Option<String>,
    /// Estimated bit width, 0 when unknown.
    pub width: u32,
    /// Owning entity or component.
    pub entity: String,
    pub line: usize,
}

impl Port {
    pub fn is_generic(&self) -> bool {
        self.direction == Direction::None
    }
}

/// A signal declaration, one per declared name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    #[serde(rename = "type")]
    pub signal_type: String,
    pub default: Option<String>,
    pub width: u32,
    /// Architecture or generate scope path (`rtl.gen_for`), or package name.
    pub scope: String,
    pub line: usize,
}

/// A constant declaration, one per declared name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    #[serde(rename = "type")]
    pub constant_type: String,
    pub value: Option<String>,
    pub in_package: Option<String>,
    pub in_arch: Option<String>,
    pub line: usize,
}

/// A shared variable declared outside any process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub variable_type: String,
    pub scope: String,
    pub line: usize,
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(flatten)]
    pub kind: TypeKind,
    pub in_package: Option<String>,
    pub in_arch: Option<String>,
    pub line: usize,
}

/// Kind-specific payload of a type declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Enum {
        literals: Vec<String>,
    },
    Record {
        fields: Vec<RecordField>,
    },
    Array {
        element_type: String,
        index_types: Vec<String>,
        unconstrained: bool,
    },
    Physical {
        range: Option<String>,
        base_unit: String,
        units: Vec<String>,
    },
    Access {
        designated_type: String,
    },
    File {
        designated_type: String,
    },
    Incomplete,
    Protected {
        is_body: bool,
    },
    Range {
        low: String,
        high: String,
        direction: String,
    },
    Alias {
        target: String,
        alias_type: Option<String>,
    },
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Enum { .. } => "enum",
            TypeKind::Record { .. } => "record",
            TypeKind::Array { .. } => "array",
            TypeKind::Physical { .. } => "physical",
            TypeKind::Access { .. } => "access",
            TypeKind::File { .. } => "file",
            TypeKind::Incomplete => "incomplete",
            TypeKind::Protected { .. } => "protected",
            TypeKind::Range { .. } => "range",
            TypeKind::Alias { .. } => "alias",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One element of a record type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub line: usize,
}

/// A subtype declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtypeDeclaration {
    pub name: String,
    pub base_type: String,
    pub constraint: Option<String>,
    pub resolution: Option<String>,
    pub in_package: Option<String>,
    pub in_arch: Option<String>,
    pub line: usize,
}

/// A subprogram parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub param_type: String,
    pub class: Option<String>,
    pub default: Option<String>,
    pub line: usize,
}

/// A function declaration or body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub is_pure: bool,
    pub has_body: bool,
    pub in_package: Option<String>,
    pub in_arch: Option<String>,
    pub line: usize,
}

/// A procedure declaration or body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDeclaration {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub has_body: bool,
    pub in_package: Option<String>,
    pub in_arch: Option<String>,
    pub line: usize,
}

/// A component declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub generics: Vec<Port>,
    pub ports: Vec<Port>,
    pub line: usize,
}

/// A component or entity instantiation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance label.
    pub name: String,
    /// Component name, or `library.entity` for direct entity instantiation.
    pub target: String,
    pub is_entity: bool,
    /// Named port associations, formal to full actual text.
    pub port_map: BTreeMap<String, String>,
    /// Named generic associations, formal to full actual text.
    pub generic_map: BTreeMap<String, String>,
    pub associations: Vec<Association>,
    pub in_arch: String,
    pub line: usize,
}

/// Which map an association belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
    #[default]
    Port,
    Generic,
}

/// Shape of an association actual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActualKind {
    #[default]
    Name,
    Literal,
    Open,
    Expression,
}

/// One element of a port or generic map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub kind: AssociationKind,
    /// Formal name, empty for positional associations.
    pub formal: String,
    pub actual: String,
    pub is_positional: bool,
    pub position_index: usize,
    pub actual_kind: ActualKind,
    /// Root identifier of a name actual.
    pub actual_base: String,
    /// Dotted path of a name actual, without indices.
    pub actual_full: String,
    pub line: usize,
}

/// A `use` clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UseClause {
    /// Full selected name, e.g. `ieee.numeric_std.all`.
    pub path: String,
    pub library: String,
    pub package: String,
    pub item: String,
    pub line: usize,
}

/// A `library` clause, one per library name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryClause {
    pub name: String,
    pub line: usize,
}

/// A `context` reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextClause {
    pub name: String,
    pub line: usize,
}

/// What produced a dependency edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    #[default]
    Use,
    Library,
    Context,
    Instance,
    Component,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Use => "use",
            DependencyKind::Library => "library",
            DependencyKind::Context => "context",
            DependencyKind::Instance => "instance",
            DependencyKind::Component => "component",
        }
    }
}

/// A reference from one design unit (or the file) to another name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub source: String,
    pub target: String,
    pub kind: DependencyKind,
    pub line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse_and_serialize() {
        assert_eq!(Direction::parse("IN"), Direction::In);
        assert_eq!(Direction::parse(" buffer "), Direction::Buffer);
        assert_eq!(Direction::parse(""), Direction::None);
        assert_eq!(serde_json::to_string(&Direction::None).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&Direction::Inout).unwrap(), "\"inout\"");
    }

    #[test]
    fn test_type_kind_is_flattened_with_tag() {
        let decl = TypeDeclaration {
            name: "state_t".to_string(),
            kind: TypeKind::Enum {
                literals: vec!["IDLE".to_string(), "RUN".to_string()],
            },
            in_package: None,
            in_arch: Some("rtl".to_string()),
            line: 3,
        };
        let value = serde_json::to_value(&decl).unwrap();
        assert_eq!(value["kind"], "enum");
        assert_eq!(value["literals"][1], "RUN");

        let back: TypeDeclaration = serde_json::from_value(value).unwrap();
        assert_eq!(back, decl);
    }
}
