//! Node kind vocabulary.
//!
//! Grammar type tags are mapped onto a closed enum once, when a tree is
//! built. Extractors dispatch with `match` on [`NodeKind`]; anything the
//! engine does not understand becomes [`NodeKind::Other`] and is walked as
//! a plain container.

use std::fmt;

/// Kind of a syntax tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Design units and clauses
    DesignFile,
    LibraryClause,
    UseClause,
    ContextReference,
    EntityDeclaration,
    ArchitectureBody,
    PackageDeclaration,
    PackageBody,
    ConfigurationDeclaration,
    ComponentDeclaration,

    // Interface lists
    GenericClause,
    PortClause,
    ParameterList,
    Parameter,
    Mode,
    InterfaceClass,

    // Object declarations
    SignalDeclaration,
    ConstantDeclaration,
    VariableDeclaration,
    FileDeclaration,
    AliasDeclaration,

    // Types
    TypeDeclaration,
    SubtypeDeclaration,
    SubtypeIndication,
    EnumerationTypeDefinition,
    RecordTypeDefinition,
    ElementDeclaration,
    ArrayTypeDefinition,
    PhysicalTypeDefinition,
    AccessTypeDefinition,
    FileTypeDefinition,
    RangeConstraint,
    ProtectedTypeDeclaration,
    Range,

    // Subprograms
    FunctionDeclaration,
    ProcedureDeclaration,
    SubprogramBody,

    // Instantiation
    ComponentInstantiation,
    GenericMapAspect,
    PortMapAspect,
    AssociationElement,
    Open,

    // Processes and sequential statements
    ProcessStatement,
    SensitivityList,
    SequentialSignalAssignment,
    VariableAssignment,
    IfStatement,
    ElsifClause,
    ElseClause,
    CaseStatement,
    CaseAlternative,
    CaseChoice,
    Others,
    LoopStatement,
    WaitStatement,
    SensitivityClause,
    ConditionClause,
    TimeoutClause,
    ProcedureCallStatement,

    // Concurrent statements
    ConcurrentSignalAssignment,
    GenerateStatement,
    ForGenerate,
    IfGenerate,
    CaseGenerate,

    // Names and expressions
    Identifier,
    SelectedName,
    IndexedName,
    SliceName,
    FunctionCall,
    AttributeName,
    QualifiedExpression,
    Aggregate,
    ElementAssociation,
    RelationalExpression,
    MultiplicativeExpression,
    ExponentialExpression,

    // Literals
    CharacterLiteral,
    StringLiteral,
    BitStringLiteral,
    DecimalLiteral,
    BasedLiteral,
    PhysicalLiteral,

    Comment,
    Other,
}

impl NodeKind {
    /// Map a grammar type tag onto a kind.
    ///
    /// Several grammars spell the same construct differently; all known
    /// spellings land on one variant.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "design_file" | "source_file" => NodeKind::DesignFile,
            "library_clause" => NodeKind::LibraryClause,
            "use_clause" => NodeKind::UseClause,
            "context_reference" | "context_clause" => NodeKind::ContextReference,
            "entity_declaration" => NodeKind::EntityDeclaration,
            "architecture_body" | "architecture_declaration" => NodeKind::ArchitectureBody,
            "package_declaration" => NodeKind::PackageDeclaration,
            "package_body" => NodeKind::PackageBody,
            "configuration_declaration" => NodeKind::ConfigurationDeclaration,
            "component_declaration" => NodeKind::ComponentDeclaration,

            "generic_clause" => NodeKind::GenericClause,
            "port_clause" => NodeKind::PortClause,
            "parameter_list" | "formal_parameter_list" | "interface_list" => NodeKind::ParameterList,
            "parameter" | "interface_declaration" | "interface_element" => NodeKind::Parameter,
            "port_direction" | "mode" => NodeKind::Mode,
            "parameter_class" | "interface_class" => NodeKind::InterfaceClass,

            "signal_declaration" => NodeKind::SignalDeclaration,
            "constant_declaration" => NodeKind::ConstantDeclaration,
            "variable_declaration" | "shared_variable_declaration" => NodeKind::VariableDeclaration,
            "file_declaration" => NodeKind::FileDeclaration,
            "alias_declaration" => NodeKind::AliasDeclaration,

            "type_declaration" | "full_type_declaration" | "incomplete_type_declaration" => {
                NodeKind::TypeDeclaration
            }
            "subtype_declaration" => NodeKind::SubtypeDeclaration,
            "subtype_indication" => NodeKind::SubtypeIndication,
            "enumeration_type_definition" => NodeKind::EnumerationTypeDefinition,
            "record_type_definition" => NodeKind::RecordTypeDefinition,
            "element_declaration" => NodeKind::ElementDeclaration,
            "array_type_definition"
            | "constrained_array_definition"
            | "unbounded_array_definition" => NodeKind::ArrayTypeDefinition,
            "physical_type_definition" => NodeKind::PhysicalTypeDefinition,
            "access_type_definition" => NodeKind::AccessTypeDefinition,
            "file_type_definition" => NodeKind::FileTypeDefinition,
            "range_constraint" | "integer_type_definition" => NodeKind::RangeConstraint,
            "protected_type_declaration" | "protected_type_body" => {
                NodeKind::ProtectedTypeDeclaration
            }
            "range" | "simple_range" | "discrete_range" => NodeKind::Range,

            "function_declaration" | "function_body" | "function_specification" => {
                NodeKind::FunctionDeclaration
            }
            "procedure_declaration" | "procedure_body" | "procedure_specification" => {
                NodeKind::ProcedureDeclaration
            }
            "subprogram_body" => NodeKind::SubprogramBody,

            "component_instantiation" | "component_instantiation_statement" => {
                NodeKind::ComponentInstantiation
            }
            "generic_map_aspect" => NodeKind::GenericMapAspect,
            "port_map_aspect" => NodeKind::PortMapAspect,
            "association_element" | "named_association" | "positional_association" => {
                NodeKind::AssociationElement
            }
            "open" => NodeKind::Open,

            "process_statement" => NodeKind::ProcessStatement,
            "sensitivity_list" => NodeKind::SensitivityList,
            "sequential_signal_assignment" | "simple_signal_assignment" => {
                NodeKind::SequentialSignalAssignment
            }
            "variable_assignment" | "assignment_statement" | "simple_variable_assignment" => {
                NodeKind::VariableAssignment
            }
            "if_statement" => NodeKind::IfStatement,
            "elsif_clause" => NodeKind::ElsifClause,
            "else_clause" => NodeKind::ElseClause,
            "case_statement" => NodeKind::CaseStatement,
            "case_alternative" | "case_statement_alternative" => NodeKind::CaseAlternative,
            "case_choice" | "choice" => NodeKind::CaseChoice,
            "others" | "others_choice" => NodeKind::Others,
            "loop_statement" => NodeKind::LoopStatement,
            "wait_statement" => NodeKind::WaitStatement,
            "sensitivity_clause" => NodeKind::SensitivityClause,
            "condition_clause" => NodeKind::ConditionClause,
            "timeout_clause" => NodeKind::TimeoutClause,
            "procedure_call_statement" => NodeKind::ProcedureCallStatement,

            "concurrent_signal_assignment"
            | "signal_assignment"
            | "concurrent_simple_signal_assignment"
            | "concurrent_conditional_signal_assignment"
            | "concurrent_selected_signal_assignment" => NodeKind::ConcurrentSignalAssignment,
            "generate_statement" => NodeKind::GenerateStatement,
            "for_generate" | "for_generate_statement" => NodeKind::ForGenerate,
            "if_generate" | "if_generate_statement" => NodeKind::IfGenerate,
            "case_generate" | "case_generate_statement" => NodeKind::CaseGenerate,

            "identifier" | "simple_name" | "extended_identifier" => NodeKind::Identifier,
            "selected_name" => NodeKind::SelectedName,
            "indexed_name" => NodeKind::IndexedName,
            "slice_name" => NodeKind::SliceName,
            "function_call" => NodeKind::FunctionCall,
            "attribute_name" => NodeKind::AttributeName,
            "qualified_expression" => NodeKind::QualifiedExpression,
            "aggregate" => NodeKind::Aggregate,
            "element_association" => NodeKind::ElementAssociation,
            "relational_expression" => NodeKind::RelationalExpression,
            "multiplicative_expression" => NodeKind::MultiplicativeExpression,
            "exponential_expression" => NodeKind::ExponentialExpression,

            "character_literal" => NodeKind::CharacterLiteral,
            "string_literal" => NodeKind::StringLiteral,
            "bit_string_literal" => NodeKind::BitStringLiteral,
            "decimal_literal" | "integer_literal" | "abstract_literal" => NodeKind::DecimalLiteral,
            "based_literal" => NodeKind::BasedLiteral,
            "physical_literal" => NodeKind::PhysicalLiteral,

            "comment" | "line_comment" | "block_comment" => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }

    /// Name-shaped nodes handled by the name resolver.
    pub fn is_name(&self) -> bool {
        matches!(
            self,
            NodeKind::Identifier
                | NodeKind::SelectedName
                | NodeKind::IndexedName
                | NodeKind::SliceName
                | NodeKind::FunctionCall
                | NodeKind::AttributeName
        )
    }

    /// Literal value nodes.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::CharacterLiteral
                | NodeKind::StringLiteral
                | NodeKind::BitStringLiteral
                | NodeKind::DecimalLiteral
                | NodeKind::BasedLiteral
                | NodeKind::PhysicalLiteral
        )
    }

    /// Type definition nodes that may appear under a type declaration.
    pub fn is_type_definition(&self) -> bool {
        matches!(
            self,
            NodeKind::EnumerationTypeDefinition
                | NodeKind::RecordTypeDefinition
                | NodeKind::ArrayTypeDefinition
                | NodeKind::PhysicalTypeDefinition
                | NodeKind::AccessTypeDefinition
                | NodeKind::FileTypeDefinition
                | NodeKind::RangeConstraint
                | NodeKind::ProtectedTypeDeclaration
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_share_a_kind() {
        assert_eq!(
            NodeKind::from_tag("signal_assignment"),
            NodeKind::ConcurrentSignalAssignment
        );
        assert_eq!(
            NodeKind::from_tag("concurrent_signal_assignment"),
            NodeKind::ConcurrentSignalAssignment
        );
        assert_eq!(
            NodeKind::from_tag("assignment_statement"),
            NodeKind::VariableAssignment
        );
        assert_eq!(NodeKind::from_tag("others_choice"), NodeKind::Others);
    }

    #[test]
    fn test_unknown_tag_is_other() {
        assert_eq!(NodeKind::from_tag("psl_directive"), NodeKind::Other);
        assert_eq!(NodeKind::from_tag(""), NodeKind::Other);
    }

    #[test]
    fn test_classifiers() {
        assert!(NodeKind::SelectedName.is_name());
        assert!(!NodeKind::Aggregate.is_name());
        assert!(NodeKind::BitStringLiteral.is_literal());
        assert!(NodeKind::RecordTypeDefinition.is_type_definition());
    }
}
