//! Relational form of the fact model.
//!
//! [`Tables`] regroups the facts of many files by kind, one row per fact,
//! with the file path (and scope) as explicit foreign keys.

use serde::{Deserialize, Serialize};

use super::{FileFacts, GenerateStatement};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub files: Vec<FileRow>,
    pub entities: Vec<UnitRow>,
    pub architectures: Vec<ArchitectureRow>,
    pub packages: Vec<UnitRow>,
    pub ports: Vec<PortRow>,
    pub signals: Vec<SignalRow>,
    pub instances: Vec<InstanceRow>,
    pub dependencies: Vec<DependencyRow>,
    pub use_clauses: Vec<ClauseRow>,
    pub library_clauses: Vec<ClauseRow>,
    pub context_clauses: Vec<ClauseRow>,
    pub processes: Vec<ProcessRow>,
    pub generates: Vec<GenerateRow>,
    pub types: Vec<TypeRow>,
    pub subtypes: Vec<SubtypeRow>,
    pub functions: Vec<FunctionRow>,
    pub procedures: Vec<ProcedureRow>,
    pub constants: Vec<ConstantRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRow {
    pub path: String,
    pub fact_count: usize,
}

/// Entity or package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitRow {
    pub name: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureRow {
    pub name: String,
    pub entity_name: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortRow {
    pub entity: String,
    pub name: String,
    /// Empty for generics.
    pub direction: String,
    #[serde(rename = "type")]
    pub port_type: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub name: String,
    #[serde(rename = "type")]
    pub signal_type: String,
    pub scope: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceRow {
    pub name: String,
    pub target: String,
    pub in_arch: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyRow {
    pub source: String,
    pub target: String,
    pub kind: String,
    pub file: String,
    pub line: usize,
}

/// Use, library or context clause; `name` is the full referenced name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClauseRow {
    pub name: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub label: String,
    pub in_arch: String,
    pub is_sequential: bool,
    pub is_combinational: bool,
    pub has_wait: bool,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateRow {
    pub label: String,
    pub kind: String,
    /// Label of the enclosing generate, empty at top level.
    pub parent: String,
    pub in_arch: String,
    pub can_elaborate: bool,
    pub iteration_count: i64,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeRow {
    pub name: String,
    pub kind: String,
    pub in_package: String,
    pub in_arch: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtypeRow {
    pub name: String,
    pub base_type: String,
    pub in_package: String,
    pub in_arch: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionRow {
    pub name: String,
    pub return_type: String,
    pub is_pure: bool,
    pub has_body: bool,
    pub in_package: String,
    pub in_arch: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureRow {
    pub name: String,
    pub has_body: bool,
    pub in_package: String,
    pub in_arch: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstantRow {
    pub name: String,
    #[serde(rename = "type")]
    pub constant_type: String,
    pub value: String,
    pub in_package: String,
    pub in_arch: String,
    pub file: String,
    pub line: usize,
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl Tables {
    /// Build the tables. Files are visited in path order, so identical
    /// inputs give identical rows whatever order they arrive in.
    pub fn from_facts(facts: &[FileFacts]) -> Self {
        let mut ordered: Vec<&FileFacts> = facts.iter().collect();
        ordered.sort_by(|a, b| a.file.cmp(&b.file));

        let mut tables = Tables::default();
        for f in ordered {
            tables.add_file(f);
        }
        tables
    }

    fn add_file(&mut self, f: &FileFacts) {
        let file = || f.file.clone();

        self.files.push(FileRow {
            path: file(),
            fact_count: f.fact_count(),
        });

        for e in &f.entities {
            self.entities.push(UnitRow {
                name: e.name.clone(),
                file: file(),
                line: e.line,
            });
        }
        for a in &f.architectures {
            self.architectures.push(ArchitectureRow {
                name: a.name.clone(),
                entity_name: a.entity_name.clone(),
                file: file(),
                line: a.line,
            });
        }
        for p in &f.packages {
            self.packages.push(UnitRow {
                name: p.name.clone(),
                file: file(),
                line: p.line,
            });
        }
        for p in f.generics.iter().chain(&f.ports) {
            self.ports.push(PortRow {
                entity: p.entity.clone(),
                name: p.name.clone(),
                direction: p.direction.as_str().to_string(),
                port_type: p.port_type.clone(),
                file: file(),
                line: p.line,
            });
        }
        for s in &f.signals {
            self.signals.push(SignalRow {
                name: s.name.clone(),
                signal_type: s.signal_type.clone(),
                scope: s.scope.clone(),
                file: file(),
                line: s.line,
            });
        }
        for i in &f.instances {
            self.instances.push(InstanceRow {
                name: i.name.clone(),
                target: i.target.clone(),
                in_arch: i.in_arch.clone(),
                file: file(),
                line: i.line,
            });
        }
        for d in &f.dependencies {
            self.dependencies.push(DependencyRow {
                source: d.source.clone(),
                target: d.target.clone(),
                kind: d.kind.as_str().to_string(),
                file: file(),
                line: d.line,
            });
        }
        for u in &f.use_clauses {
            self.use_clauses.push(ClauseRow {
                name: u.path.clone(),
                file: file(),
                line: u.line,
            });
        }
        for l in &f.library_clauses {
            self.library_clauses.push(ClauseRow {
                name: l.name.clone(),
                file: file(),
                line: l.line,
            });
        }
        for c in &f.context_clauses {
            self.context_clauses.push(ClauseRow {
                name: c.name.clone(),
                file: file(),
                line: c.line,
            });
        }
        for p in &f.processes {
            self.processes.push(ProcessRow {
                label: p.label_str().to_string(),
                in_arch: p.in_arch.clone(),
                is_sequential: p.is_sequential,
                is_combinational: p.is_combinational,
                has_wait: p.has_wait,
                file: file(),
                line: p.line,
            });
        }
        for g in &f.generates {
            self.add_generate(g, "", &f.file);
        }
        for t in &f.types {
            self.types.push(TypeRow {
                name: t.name.clone(),
                kind: t.kind.as_str().to_string(),
                in_package: opt(&t.in_package),
                in_arch: opt(&t.in_arch),
                file: file(),
                line: t.line,
            });
        }
        for s in &f.subtypes {
            self.subtypes.push(SubtypeRow {
                name: s.name.clone(),
                base_type: s.base_type.clone(),
                in_package: opt(&s.in_package),
                in_arch: opt(&s.in_arch),
                file: file(),
                line: s.line,
            });
        }
        for func in &f.functions {
            self.functions.push(FunctionRow {
                name: func.name.clone(),
                return_type: func.return_type.clone(),
                is_pure: func.is_pure,
                has_body: func.has_body,
                in_package: opt(&func.in_package),
                in_arch: opt(&func.in_arch),
                file: file(),
                line: func.line,
            });
        }
        for p in &f.procedures {
            self.procedures.push(ProcedureRow {
                name: p.name.clone(),
                has_body: p.has_body,
                in_package: opt(&p.in_package),
                in_arch: opt(&p.in_arch),
                file: file(),
                line: p.line,
            });
        }
        for c in &f.constants {
            self.constants.push(ConstantRow {
                name: c.name.clone(),
                constant_type: c.constant_type.clone(),
                value: opt(&c.value),
                in_package: opt(&c.in_package),
                in_arch: opt(&c.in_arch),
                file: file(),
                line: c.line,
            });
        }
    }

    fn add_generate(&mut self, g: &GenerateStatement, parent: &str, file: &str) {
        self.generates.push(GenerateRow {
            label: g.label.clone(),
            kind: g.scheme.as_str().to_string(),
            parent: parent.to_string(),
            in_arch: g.in_arch.clone(),
            can_elaborate: g.can_elaborate,
            iteration_count: g.iteration_count,
            file: file.to_string(),
            line: g.line,
        });
        for child in &g.generates {
            self.add_generate(child, &g.label, file);
        }
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.files.len()
            + self.entities.len()
            + self.architectures.len()
            + self.packages.len()
            + self.ports.len()
            + self.signals.len()
            + self.instances.len()
            + self.dependencies.len()
            + self.use_clauses.len()
            + self.library_clauses.len()
            + self.context_clauses.len()
            + self.processes.len()
            + self.generates.len()
            + self.types.len()
            + self.subtypes.len()
            + self.functions.len()
            + self.procedures.len()
            + self.constants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{Direction, Entity, GenerateScheme, Port};

    fn generate(label: &str, children: Vec<GenerateStatement>) -> GenerateStatement {
        GenerateStatement {
            label: label.to_string(),
            scheme: GenerateScheme::If {
                condition: "EN".to_string(),
            },
            in_arch: "rtl".to_string(),
            line: 4,
            can_elaborate: false,
            iteration_count: -1,
            signals: Vec::new(),
            instances: Vec::new(),
            processes: Vec::new(),
            concurrent_assignments: Vec::new(),
            generates: children,
        }
    }

    #[test]
    fn test_files_sorted_and_keys_attached() {
        let mut b = FileFacts::empty("b.sexp");
        b.entities.push(Entity {
            name: "core".to_string(),
            line: 1,
            ..Entity::default()
        });
        let mut a = FileFacts::empty("a.sexp");
        a.generics.push(Port {
            name: "WIDTH".to_string(),
            direction: Direction::None,
            entity: "top".to_string(),
            line: 3,
            ..Port::default()
        });

        let tables = Tables::from_facts(&[b, a]);
        let paths: Vec<_> = tables.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.sexp", "b.sexp"]);
        assert_eq!(tables.entities[0].file, "b.sexp");
        assert_eq!(tables.ports[0].direction, "");
        assert_eq!(tables.ports[0].entity, "top");
    }

    #[test]
    fn test_nested_generates_carry_parent() {
        let mut f = FileFacts::empty("g.sexp");
        f.generates
            .push(generate("outer", vec![generate("inner", Vec::new())]));
        let tables = Tables::from_facts(&[f]);
        assert_eq!(tables.generates.len(), 2);
        assert_eq!(tables.generates[0].parent, "");
        assert_eq!(tables.generates[1].parent, "outer");
        assert_eq!(tables.generates[1].kind, "if");
    }

    #[test]
    fn test_identical_inputs_give_identical_rows() {
        let f = FileFacts::empty("x.sexp");
        let one = Tables::from_facts(&[f.clone(), FileFacts::empty("w.sexp")]);
        let two = Tables::from_facts(&[FileFacts::empty("w.sexp"), f]);
        assert_eq!(one, two);
        assert_eq!(one.row_count(), 2);
    }
}
