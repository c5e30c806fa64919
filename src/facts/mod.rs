//! Fact model.
//!
//! One [`FileFacts`] record is produced per source file. Every list keeps
//! traversal (document) order. Facts found inside generate statements are
//! flattened into the file-level lists with their qualified scope path; the
//! generate tree itself is kept in [`FileFacts::generates`] (top level only,
//! nested generates hang off their parent).

mod behavior;
mod design;
mod semantic;
pub mod tables;

pub use behavior::{
    Call, CaseStatement, ClockEdge, ConcurrentAssignment, ConcurrentKind, GenerateScheme,
    GenerateStatement, Process, ProcessKind, ResetPolarity, Variable, WaitStatement,
};
pub use design::{
    ActualKind, Architecture, Association, AssociationKind, Component, Configuration, Constant,
    ContextClause, Dependency, DependencyKind, Direction, Entity, FunctionDeclaration, Instance,
    LibraryClause, Package, Parameter, Port, ProcedureDeclaration, RecordField, SharedVariable,
    Signal, SubtypeDeclaration, TypeDeclaration, TypeKind, UseClause,
};
pub use semantic::{
    ArithmeticOp, CdcCrossing, ClockDomain, Comparison, ResetInfo, SignalDep, SignalUsage,
};
pub use tables::Tables;

use serde::{Deserialize, Serialize};

/// All facts extracted from a single file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileFacts {
    /// File path.
    pub file: String,

    pub entities: Vec<Entity>,
    pub architectures: Vec<Architecture>,
    pub packages: Vec<Package>,
    pub configurations: Vec<Configuration>,
    pub components: Vec<Component>,
    pub instances: Vec<Instance>,

    pub use_clauses: Vec<UseClause>,
    pub library_clauses: Vec<LibraryClause>,
    pub context_clauses: Vec<ContextClause>,
    pub dependencies: Vec<Dependency>,

    pub ports: Vec<Port>,
    pub generics: Vec<Port>,
    pub signals: Vec<Signal>,
    pub constants: Vec<Constant>,
    pub shared_variables: Vec<SharedVariable>,

    pub types: Vec<TypeDeclaration>,
    pub subtypes: Vec<SubtypeDeclaration>,
    pub functions: Vec<FunctionDeclaration>,
    pub procedures: Vec<ProcedureDeclaration>,

    pub processes: Vec<Process>,
    pub concurrent_assignments: Vec<ConcurrentAssignment>,
    pub case_statements: Vec<CaseStatement>,
    pub generates: Vec<GenerateStatement>,

    /// Enum literals and physical unit names, for filtering names that are
    /// not signals.
    pub enum_literals: Vec<String>,
    /// Constant names only.
    pub constant_names: Vec<String>,

    pub clock_domains: Vec<ClockDomain>,
    pub reset_infos: Vec<ResetInfo>,
    pub signal_usages: Vec<SignalUsage>,
    pub comparisons: Vec<Comparison>,
    pub arithmetic_ops: Vec<ArithmeticOp>,
    pub signal_deps: Vec<SignalDep>,
    pub cdc_crossings: Vec<CdcCrossing>,
}

impl FileFacts {
    /// Create empty facts for a file.
    pub fn empty(file: &str) -> Self {
        Self {
            file: file.to_string(),
            ..Self::default()
        }
    }

    /// Append every flat list of `other` to this record.
    ///
    /// `other.generates` is not appended: nested generates belong to the
    /// generate statement that owns them.
    pub fn absorb(&mut self, other: FileFacts) {
        let FileFacts {
            file: _,
            entities,
            architectures,
            packages,
            configurations,
            components,
            instances,
            use_clauses,
            library_clauses,
            context_clauses,
            dependencies,
            ports,
            generics,
            signals,
            constants,
            shared_variables,
            types,
            subtypes,
            functions,
            procedures,
            processes,
            concurrent_assignments,
            case_statements,
            generates: _,
            enum_literals,
            constant_names,
            clock_domains,
            reset_infos,
            signal_usages,
            comparisons,
            arithmetic_ops,
            signal_deps,
            cdc_crossings,
        } = other;

        self.entities.extend(entities);
        self.architectures.extend(architectures);
        self.packages.extend(packages);
        self.configurations.extend(configurations);
        self.components.extend(components);
        self.instances.extend(instances);
        self.use_clauses.extend(use_clauses);
        self.library_clauses.extend(library_clauses);
        self.context_clauses.extend(context_clauses);
        self.dependencies.extend(dependencies);
        self.ports.extend(ports);
        self.generics.extend(generics);
        self.signals.extend(signals);
        self.constants.extend(constants);
        self.shared_variables.extend(shared_variables);
        self.types.extend(types);
        self.subtypes.extend(subtypes);
        self.functions.extend(functions);
        self.procedures.extend(procedures);
        self.processes.extend(processes);
        self.concurrent_assignments.extend(concurrent_assignments);
        self.case_statements.extend(case_statements);
        self.enum_literals.extend(enum_literals);
        self.constant_names.extend(constant_names);
        self.clock_domains.extend(clock_domains);
        self.reset_infos.extend(reset_infos);
        self.signal_usages.extend(signal_usages);
        self.comparisons.extend(comparisons);
        self.arithmetic_ops.extend(arithmetic_ops);
        self.signal_deps.extend(signal_deps);
        self.cdc_crossings.extend(cdc_crossings);
    }

    /// Find an entity by name (case-insensitive).
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Find a process by label (case-insensitive).
    pub fn process(&self, label: &str) -> Option<&Process> {
        self.processes
            .iter()
            .find(|p| p.label.as_deref().is_some_and(|l| l.eq_ignore_ascii_case(label)))
    }

    /// Find an instance by label (case-insensitive).
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }

    /// Find a signal by name (case-insensitive), first declaration wins.
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Find a generate by label anywhere in the generate tree.
    pub fn generate(&self, label: &str) -> Option<&GenerateStatement> {
        self.generates
            .iter()
            .flat_map(|g| g.walk())
            .find(|g| g.label.eq_ignore_ascii_case(label))
    }

    /// Declared type text of a signal or port (case-insensitive lookup).
    pub fn declared_type(&self, name: &str) -> Option<&str> {
        self.signals
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.signal_type.as_str())
            .or_else(|| {
                self.ports
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
                    .map(|p| p.port_type.as_str())
            })
    }

    /// Total number of facts, used for summaries.
    pub fn fact_count(&self) -> usize {
        self.entities.len()
            + self.architectures.len()
            + self.packages.len()
            + self.configurations.len()
            + self.components.len()
            + self.instances.len()
            + self.ports.len()
            + self.generics.len()
            + self.signals.len()
            + self.constants.len()
            + self.types.len()
            + self.subtypes.len()
            + self.functions.len()
            + self.procedures.len()
            + self.processes.len()
            + self.concurrent_assignments.len()
            + self.case_statements.len()
            + self.generates.iter().map(|g| g.walk().len()).sum::<usize>()
    }
}
