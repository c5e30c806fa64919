//! Fact extraction.
//!
//! [`Extractor`] is the per-file entry point. It parses a file with the
//! registered [`CstParser`](crate::parser::CstParser), walks the tree once
//! depth-first while threading an immutable [`Scope`](scope::Scope), and
//! then runs the semantic analyzers over the accumulated record.
//!
//! Generate bodies are walked by a nested walker into their own
//! [`FileFacts`]; the result becomes the generate's nested lists and is then
//! absorbed into the parent record.

pub mod builtins;
mod concurrent;
mod declarations;
mod expressions;
mod generate;
mod instances;
pub mod names;
mod process;
pub mod scope;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::config::Config;
use crate::error::ExtractError;
use crate::facts::{Dependency, DependencyKind, FileFacts, GenerateStatement, TypeKind};
use crate::parser::{self, CstParser};
use crate::syntax::{Node, NodeKind, SyntaxError, SyntaxTree};

use names::NameLookup;
use scope::Scope;

/// Result of extracting one file in a batch.
#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub result: Result<FileFacts, ExtractError>,
}

/// Per-file fact extractor.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: Config,
}

impl Extractor {
    /// Extractor with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read, parse and extract one file. The parser is chosen by suffix.
    pub fn extract_file(&self, path: &Path) -> Result<FileFacts, ExtractError> {
        let parser = parser::for_path(path).ok_or_else(|| ExtractError::UnsupportedInput {
            path: path.to_path_buf(),
        })?;
        let source = fs::read(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.extract_source(&path.to_string_lossy(), &source, parser.as_ref())
    }

    /// Parse `source` with `parser` and extract it as `file`.
    pub fn extract_source(
        &self,
        file: &str,
        source: &[u8],
        parser: &dyn CstParser,
    ) -> Result<FileFacts, ExtractError> {
        debug!("extracting {} with {} parser", file, parser.name());
        let tree = parser.parse(source).map_err(|err| {
            let path = PathBuf::from(file);
            match err.downcast::<SyntaxError>() {
                Ok(source) => ExtractError::Syntax { path, source },
                Err(other) => ExtractError::Parse {
                    path,
                    message: other.to_string(),
                },
            }
        })?;
        Ok(self.extract_tree(file, &tree))
    }

    /// Walk an already-built tree. Never fails: unexpected shapes yield
    /// fewer facts.
    pub fn extract_tree(&self, file: &str, tree: &SyntaxTree) -> FileFacts {
        let names = NameTable::collect(tree.root(), &self.config);
        let mut walker = Walker::new(file, &names, &self.config);
        walker.node(tree.root(), &Scope::file());
        let mut facts = walker.finish();

        crate::semantic::analyze(&mut facts, &self.config);
        debug!(
            "extracted {} facts from {} ({} processes, {} generates)",
            facts.fact_count(),
            file,
            facts.processes.len(),
            facts.generates.len()
        );
        facts
    }

    /// Extract many files in parallel. Results are sorted by path; one
    /// file's failure does not affect the others.
    pub fn extract_files(&self, paths: &[PathBuf]) -> Vec<FileResult> {
        let mut results: Vec<FileResult> = paths
            .par_iter()
            .map(|path| {
                let result = self.extract_file(path);
                if let Err(err) = &result {
                    warn!("{}", err);
                }
                FileResult {
                    path: path.clone(),
                    result,
                }
            })
            .collect();
        results.sort_by(|a, b| a.path.cmp(&b.path));
        results
    }
}

/// File-wide name tables, collected in a pre-pass so that use before
/// declaration still resolves.
#[derive(Debug, Clone)]
pub(crate) struct NameTable<'c> {
    declared: HashSet<String>,
    excluded: HashSet<String>,
    subprograms: HashSet<String>,
    config: &'c Config,
}

impl<'c> NameTable<'c> {
    pub(crate) fn collect(root: Node<'_>, config: &'c Config) -> Self {
        let mut table = Self {
            declared: HashSet::new(),
            excluded: HashSet::new(),
            subprograms: HashSet::new(),
            config,
        };
        for node in root.descendants() {
            match node.kind() {
                NodeKind::SignalDeclaration
                | NodeKind::ConstantDeclaration
                | NodeKind::FileDeclaration
                | NodeKind::Parameter => {
                    for (name, _) in declarations::object_decl(node).names {
                        table.declared.insert(name.to_ascii_lowercase());
                    }
                }
                // Process variables are handled per process.
                NodeKind::VariableDeclaration if is_shared(node) => {
                    for (name, _) in declarations::object_decl(node).names {
                        table.declared.insert(name.to_ascii_lowercase());
                    }
                }
                NodeKind::AliasDeclaration => {
                    if let Some(name) = declarations::name_of(node) {
                        table.declared.insert(name.to_ascii_lowercase());
                    }
                }
                NodeKind::TypeDeclaration => {
                    let decl = declarations::type_declaration(node, &Scope::file());
                    for literal in non_signal_names(&decl.kind) {
                        table.excluded.insert(literal.to_ascii_lowercase());
                    }
                }
                NodeKind::FunctionDeclaration | NodeKind::ProcedureDeclaration => {
                    if let Some(name) = declarations::name_of(node) {
                        table.subprograms.insert(name.to_ascii_lowercase());
                    }
                }
                _ => {}
            }
        }
        table
    }
}

impl NameLookup for NameTable<'_> {
    fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    fn is_builtin(&self, name: &str) -> bool {
        self.config.is_builtin(name)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    fn is_subprogram(&self, name: &str) -> bool {
        self.subprograms.contains(name)
    }
}

/// Outer tables plus a generate loop parameter.
struct GenerateNames<'a> {
    outer: &'a dyn NameLookup,
    loop_var: Option<String>,
}

impl NameLookup for GenerateNames<'_> {
    fn is_declared(&self, name: &str) -> bool {
        self.outer.is_declared(name)
    }

    fn is_builtin(&self, name: &str) -> bool {
        self.outer.is_builtin(name)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.loop_var.as_deref() == Some(name) || self.outer.is_excluded(name)
    }

    fn is_subprogram(&self, name: &str) -> bool {
        self.outer.is_subprogram(name)
    }
}

/// Enum literals and physical unit names.
fn non_signal_names(kind: &TypeKind) -> Vec<String> {
    match kind {
        TypeKind::Enum { literals } => literals
            .iter()
            .filter(|l| !l.starts_with('\''))
            .cloned()
            .collect(),
        TypeKind::Physical {
            base_unit, units, ..
        } => {
            let mut out = vec![base_unit.clone()];
            out.extend(units.iter().cloned());
            out.retain(|u| !u.is_empty());
            out
        }
        _ => Vec::new(),
    }
}

fn is_shared(node: Node<'_>) -> bool {
    node.tag().starts_with("shared") || node.children().any(|c| c.is_token("shared"))
}

/// Depth-first walker accumulating one record.
struct Walker<'a> {
    names: &'a dyn NameLookup,
    config: &'a Config,
    facts: FileFacts,
    /// Design unit that dependencies found here belong to.
    unit: String,
    /// Clause dependencies waiting for the next design unit.
    pending: Vec<usize>,
}

impl<'a> Walker<'a> {
    fn new(file: &str, names: &'a dyn NameLookup, config: &'a Config) -> Self {
        Self {
            names,
            config,
            facts: FileFacts::empty(file),
            unit: String::new(),
            pending: Vec::new(),
        }
    }

    /// Assign clause dependencies seen so far to `unit`.
    fn enter_unit(&mut self, unit: &str) {
        self.unit = unit.to_string();
        for idx in self.pending.drain(..) {
            if let Some(dep) = self.facts.dependencies.get_mut(idx) {
                dep.source = unit.to_string();
            }
        }
    }

    fn finish(mut self) -> FileFacts {
        // Clauses with no following unit belong to the file.
        let file = self.facts.file.clone();
        for idx in self.pending.drain(..) {
            if let Some(dep) = self.facts.dependencies.get_mut(idx) {
                dep.source = file.clone();
            }
        }
        self.facts
    }

    fn clause_dependency(&mut self, target: String, kind: DependencyKind, line: usize) {
        self.pending.push(self.facts.dependencies.len());
        self.facts.dependencies.push(Dependency {
            source: String::new(),
            target,
            kind,
            line,
        });
    }

    fn unit_dependency(&mut self, target: String, kind: DependencyKind, line: usize) {
        let source = if self.unit.is_empty() {
            self.facts.file.clone()
        } else {
            self.unit.clone()
        };
        self.facts.dependencies.push(Dependency {
            source,
            target,
            kind,
            line,
        });
    }

    fn children(&mut self, node: Node<'_>, scope: &Scope) {
        for child in node.named_children() {
            self.node(child, scope);
        }
    }

    fn node(&mut self, node: Node<'_>, scope: &Scope) {
        match node.kind() {
            NodeKind::LibraryClause => {
                for clause in declarations::library_clause(node) {
                    self.clause_dependency(clause.name.clone(), DependencyKind::Library, clause.line);
                    self.facts.library_clauses.push(clause);
                }
            }
            NodeKind::UseClause => {
                for clause in declarations::use_clause(node) {
                    self.clause_dependency(clause.path.clone(), DependencyKind::Use, clause.line);
                    self.facts.use_clauses.push(clause);
                }
            }
            NodeKind::ContextReference => {
                for clause in declarations::context_clause(node) {
                    self.clause_dependency(clause.name.clone(), DependencyKind::Context, clause.line);
                    self.facts.context_clauses.push(clause);
                }
            }

            NodeKind::EntityDeclaration => {
                let entity = declarations::entity(node);
                self.enter_unit(&entity.name);
                let inner = scope.in_architecture(&entity.name);
                self.facts.generics.extend(entity.generics.iter().cloned());
                self.facts.ports.extend(entity.ports.iter().cloned());
                self.facts.entities.push(entity);
                for child in node.named_children() {
                    if !matches!(child.kind(), NodeKind::GenericClause | NodeKind::PortClause) {
                        self.node(child, &inner);
                    }
                }
            }
            NodeKind::ArchitectureBody => {
                let arch = declarations::architecture(node);
                self.enter_unit(&arch.entity_name);
                let inner = scope.in_architecture(&arch.name);
                self.facts.architectures.push(arch);
                self.children(node, &inner);
            }
            NodeKind::PackageDeclaration | NodeKind::PackageBody => {
                let package = declarations::package(node);
                self.enter_unit(&package.name);
                let inner = scope.in_package(&package.name);
                if node.kind() == NodeKind::PackageDeclaration {
                    self.facts.packages.push(package);
                }
                self.children(node, &inner);
            }
            NodeKind::ConfigurationDeclaration => {
                let configuration = declarations::configuration(node);
                self.enter_unit(&configuration.name);
                self.facts.configurations.push(configuration);
            }

            NodeKind::ComponentDeclaration => {
                let component = instances::component(node);
                self.unit_dependency(
                    component.name.clone(),
                    DependencyKind::Component,
                    component.line,
                );
                self.facts.components.push(component);
            }
            NodeKind::ComponentInstantiation => {
                let instance = instances::instance(node, scope, self.names);
                self.unit_dependency(
                    instance.target.clone(),
                    DependencyKind::Instance,
                    instance.line,
                );
                self.facts.instances.push(instance);
            }

            NodeKind::SignalDeclaration => {
                self.facts.signals.extend(declarations::signals(node, scope));
            }
            NodeKind::ConstantDeclaration => {
                let constants = declarations::constants(node, scope);
                self.facts
                    .constant_names
                    .extend(constants.iter().map(|c| c.name.clone()));
                self.facts.constants.extend(constants);
            }
            NodeKind::VariableDeclaration => {
                self.facts
                    .shared_variables
                    .extend(declarations::shared_variables(node, scope));
            }
            NodeKind::TypeDeclaration => {
                let decl = declarations::type_declaration(node, scope);
                self.facts.enum_literals.extend(non_signal_names(&decl.kind));
                self.facts.types.push(decl);
            }
            NodeKind::AliasDeclaration => {
                self.facts
                    .types
                    .push(declarations::alias_declaration(node, scope));
            }
            NodeKind::SubtypeDeclaration => {
                self.facts
                    .subtypes
                    .push(declarations::subtype_declaration(node, scope));
            }
            // Subprogram bodies are not walked: their statements are not
            // process or concurrent facts.
            NodeKind::FunctionDeclaration => {
                self.facts
                    .functions
                    .push(declarations::function_declaration(node, scope));
            }
            NodeKind::ProcedureDeclaration => {
                self.facts
                    .procedures
                    .push(declarations::procedure_declaration(node, scope));
            }

            NodeKind::ProcessStatement => {
                let p = process::extract_process(node, scope, self.names, self.config);
                self.facts.processes.push(p.process);
                self.facts.case_statements.extend(p.case_statements);
                self.facts.comparisons.extend(p.comparisons);
                self.facts.arithmetic_ops.extend(p.arithmetic_ops);
                self.facts.signal_deps.extend(p.signal_deps);
            }
            NodeKind::ConcurrentSignalAssignment => {
                let c = concurrent::extract_concurrent(node, scope, self.names);
                self.facts.concurrent_assignments.push(c.assignment);
                self.facts.comparisons.extend(c.comparisons);
                self.facts.arithmetic_ops.extend(c.arithmetic_ops);
                self.facts.signal_deps.extend(c.signal_deps);
            }
            NodeKind::GenerateStatement
            | NodeKind::ForGenerate
            | NodeKind::IfGenerate
            | NodeKind::CaseGenerate => self.generate(node, scope),

            NodeKind::Comment => {}
            k if k.is_name() || k.is_literal() => {}
            NodeKind::Other => {
                trace!("descending into unhandled node '{}'", node.tag());
                self.children(node, scope);
            }
            _ => self.children(node, scope),
        }
    }

    fn generate(&mut self, node: Node<'_>, scope: &Scope) {
        let header = generate::header(node);
        let inner = scope.in_generate(&header.label);
        let names = GenerateNames {
            outer: self.names,
            loop_var: header.loop_var().map(str::to_ascii_lowercase),
        };

        let mut sub = Walker {
            names: &names,
            config: self.config,
            facts: FileFacts::empty(&self.facts.file),
            unit: self.unit.clone(),
            pending: Vec::new(),
        };
        for child in &header.body {
            sub.node(*child, &inner);
        }
        let mut sub_facts = sub.facts;

        let statement = GenerateStatement {
            label: header.label,
            scheme: header.scheme,
            in_arch: scope.path().to_string(),
            line: node.line(),
            can_elaborate: false,
            iteration_count: -1,
            signals: sub_facts.signals.clone(),
            instances: sub_facts.instances.clone(),
            processes: sub_facts.processes.clone(),
            concurrent_assignments: sub_facts.concurrent_assignments.clone(),
            generates: std::mem::take(&mut sub_facts.generates),
        };
        trace!(
            "generate {} at {} holds {} processes",
            statement.label,
            statement.scope_path(),
            statement.processes.len()
        );
        self.facts.generates.push(statement);
        self.facts.absorb(sub_facts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ConcurrentKind, GenerateScheme};
    use crate::syntax::sexp;

    fn extract(src: &str) -> FileFacts {
        let tree = sexp::parse(src).unwrap();
        Extractor::new().extract_tree("test.sexp", &tree)
    }

    #[test]
    fn test_clause_dependencies_belong_to_next_unit() {
        let facts = extract(
            r#"(design_file
                 (library_clause library (identifier ieee) ;)
                 (use_clause use (selected_name prefix:(selected_name prefix:(identifier ieee) . suffix:(identifier std_logic_1164)) . suffix:(identifier all)) ;)
                 (entity_declaration entity name:(identifier top) is end ;))"#,
        );
        assert_eq!(facts.dependencies.len(), 2);
        assert!(facts.dependencies.iter().all(|d| d.source == "top"));
        assert_eq!(facts.dependencies[0].kind, DependencyKind::Library);
        assert_eq!(facts.dependencies[1].target, "ieee.std_logic_1164.all");
    }

    #[test]
    fn test_trailing_clauses_belong_to_file() {
        let facts = extract(r#"(design_file (library_clause library (identifier work) ;))"#);
        assert_eq!(facts.dependencies[0].source, "test.sexp");
    }

    #[test]
    fn test_package_scope_for_constants() {
        let facts = extract(
            r#"(design_file
                 (package_declaration package name:(identifier cfg_pkg) is
                   (constant_declaration constant (identifier DEPTH) : (identifier integer) := (decimal_literal 16) ;)
                 end ;))"#,
        );
        assert_eq!(facts.packages[0].name, "cfg_pkg");
        let c = &facts.constants[0];
        assert_eq!(c.in_package.as_deref(), Some("cfg_pkg"));
        assert_eq!(c.in_arch, None);
        assert_eq!(c.value.as_deref(), Some("16"));
        assert_eq!(facts.constant_names, vec!["DEPTH"]);
    }

    #[test]
    fn test_generate_facts_are_scoped_and_flattened() {
        let facts = extract(
            r#"(design_file
                 (architecture_body architecture name:(identifier rtl) of entity:(identifier top) is
                   (signal_declaration signal (identifier a) : (identifier std_logic_vector) ;)
                   begin
                   (generate_statement label:(identifier gen_bits) :
                     (for_generate for (identifier i) in (range (decimal_literal 0) to (decimal_literal 3)) generate
                       (signal_declaration signal (identifier t) : (identifier std_logic) ;)
                       begin
                       (concurrent_signal_assignment target:(identifier t) <= (indexed_name prefix:(identifier a) "(" (identifier i) ")") ;)
                       end generate ;))
                   end ;))"#,
        );
        let gen = facts.generate("gen_bits").unwrap();
        assert!(gen.can_elaborate);
        assert_eq!(gen.iteration_count, 4);
        assert_eq!(gen.signals[0].scope, "rtl.gen_bits");
        assert_eq!(gen.concurrent_assignments.len(), 1);

        let ca = &facts.concurrent_assignments[0];
        assert_eq!(ca.in_arch, "rtl.gen_bits");
        assert!(ca.in_generate);
        assert_eq!(ca.generate_label.as_deref(), Some("gen_bits"));
        assert_eq!(ca.kind, ConcurrentKind::Simple);
        // The loop parameter is not a signal.
        assert_eq!(ca.read_signals, vec!["a"]);
        assert_eq!(facts.signals.len(), 2);
    }

    #[test]
    fn test_nested_generates_stay_in_tree() {
        let facts = extract(
            r#"(design_file
                 (architecture_body architecture name:(identifier rtl) of entity:(identifier top) is begin
                   (generate_statement label:(identifier outer) :
                     (if_generate if condition:(identifier EN) generate
                       (generate_statement label:(identifier inner) :
                         (if_generate if condition:(identifier EN2) generate
                           (concurrent_signal_assignment target:(identifier y) <= (identifier x) ;)
                         end generate ;))
                     end generate ;))
                 end ;))"#,
        );
        assert_eq!(facts.generates.len(), 1);
        let outer = &facts.generates[0];
        assert_eq!(outer.generates.len(), 1);
        assert_eq!(outer.generates[0].in_arch, "rtl.outer");
        assert!(matches!(outer.scheme, GenerateScheme::If { .. }));
        assert!(!outer.can_elaborate);
        assert_eq!(outer.iteration_count, -1);
        assert_eq!(facts.concurrent_assignments[0].in_arch, "rtl.outer.inner");
    }

    #[test]
    fn test_instance_dependency_source_is_entity() {
        let facts = extract(
            r#"(design_file
                 (architecture_body architecture name:(identifier rtl) of entity:(identifier top) is
                   (component_declaration component name:(identifier fifo) end component ;)
                   begin
                   (component_instantiation label:(identifier u0) : component:(identifier fifo) ;)
                 end ;))"#,
        );
        let kinds: Vec<_> = facts.dependencies.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DependencyKind::Component, DependencyKind::Instance]);
        assert!(facts.dependencies.iter().all(|d| d.source == "top"));
        assert_eq!(facts.instances[0].in_arch, "rtl");
    }

    #[test]
    fn test_enum_literals_are_not_reads() {
        let facts = extract(
            r#"(design_file
                 (architecture_body architecture name:(identifier rtl) of entity:(identifier top) is
                   (type_declaration type name:(identifier state_t) is definition:(enumeration_type_definition "(" (identifier IDLE) , (identifier RUN) ")") ;)
                   (signal_declaration signal (identifier state) (identifier nxt) : (identifier state_t) ;)
                   begin
                   (concurrent_signal_assignment target:(identifier nxt) <= (identifier RUN) when (relational_expression left:(identifier state) operator:"=" right:(identifier IDLE)) else (identifier state) ;)
                 end ;))"#,
        );
        assert_eq!(facts.enum_literals, vec!["IDLE", "RUN"]);
        assert_eq!(facts.concurrent_assignments[0].read_signals, vec!["state"]);
    }

    #[test]
    fn test_unsupported_suffix_is_an_error() {
        let err = Extractor::new()
            .extract_file(Path::new("design.unknown_ext"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedInput { .. }));
    }

    #[test]
    fn test_syntax_error_is_reported_without_facts() {
        parser::init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.sexp");
        fs::write(&path, "(design_file (entity_declaration").unwrap();
        let err = Extractor::new().extract_file(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Syntax { .. }));
        assert_eq!(err.path(), &path);
    }
}
