//! Behavioral facts: processes, concurrent assignments, case and generate
//! statements.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::design::{Instance, Signal};

/// Clock edge detected by an edge function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockEdge {
    Rising,
    Falling,
}

impl ClockEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockEdge::Rising => "rising",
            ClockEdge::Falling => "falling",
        }
    }
}

impl fmt::Display for ClockEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reset polarity, derived from the literal the reset is compared with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

/// Process classification. Exactly one applies to every process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessKind {
    /// Has a clock-edge condition.
    Sequential,
    /// Contains a wait statement and no clock edge.
    WaitBased,
    /// Neither.
    Combinational,
}

/// A process statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub label: Option<String>,
    /// Sensitivity list; `all` is kept as the single entry "all".
    pub sensitivity_list: Vec<String>,
    pub is_sequential: bool,
    pub is_combinational: bool,
    pub has_wait: bool,
    pub clock_signal: Option<String>,
    pub clock_edge: Option<ClockEdge>,
    pub has_reset: bool,
    pub reset_signal: Option<String>,
    pub reset_async: bool,
    pub reset_polarity: Option<ResetPolarity>,
    /// Written signals (full dotted paths), first-write order.
    pub assigned_signals: Vec<String>,
    /// Read signals (full dotted paths), first-read order.
    pub read_signals: Vec<String>,
    pub variables: Vec<Variable>,
    pub procedure_calls: Vec<Call>,
    pub function_calls: Vec<Call>,
    pub wait_statements: Vec<WaitStatement>,
    pub in_arch: String,
    pub line: usize,
}

impl Process {
    /// An unclassified, combinational process.
    pub fn new(label: Option<String>, in_arch: &str, line: usize) -> Self {
        Self {
            label,
            sensitivity_list: Vec::new(),
            is_sequential: false,
            is_combinational: true,
            has_wait: false,
            clock_signal: None,
            clock_edge: None,
            has_reset: false,
            reset_signal: None,
            reset_async: false,
            reset_polarity: None,
            assigned_signals: Vec::new(),
            read_signals: Vec::new(),
            variables: Vec::new(),
            procedure_calls: Vec::new(),
            function_calls: Vec::new(),
            wait_statements: Vec::new(),
            in_arch: in_arch.to_string(),
            line,
        }
    }

    /// Set the classification flags; they are mutually exclusive.
    pub fn set_kind(&mut self, kind: ProcessKind) {
        self.is_sequential = kind == ProcessKind::Sequential;
        self.has_wait = kind == ProcessKind::WaitBased;
        self.is_combinational = kind == ProcessKind::Combinational;
    }

    pub fn kind(&self) -> ProcessKind {
        if self.is_sequential {
            ProcessKind::Sequential
        } else if self.has_wait {
            ProcessKind::WaitBased
        } else {
            ProcessKind::Combinational
        }
    }

    /// Label, or empty for unlabeled processes.
    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}

/// A process-local variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub variable_type: String,
    pub line: usize,
}

/// A procedure or function call inside a process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Callee, dotted when package-qualified.
    pub name: String,
    /// Argument texts; named arguments keep their `formal => actual` form.
    pub args: Vec<String>,
    pub in_process: String,
    pub line: usize,
}

/// A wait statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitStatement {
    pub on_signals: Vec<String>,
    pub until_expr: Option<String>,
    pub for_expr: Option<String>,
    pub in_process: String,
    pub line: usize,
}

/// Syntactic shape of a concurrent assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrentKind {
    #[default]
    Simple,
    Conditional,
    Selected,
}

impl ConcurrentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcurrentKind::Simple => "simple",
            ConcurrentKind::Conditional => "conditional",
            ConcurrentKind::Selected => "selected",
        }
    }
}

/// A concurrent signal assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcurrentAssignment {
    /// Base signal of the target.
    pub target: String,
    /// Full dotted path of the target.
    pub target_full: String,
    pub read_signals: Vec<String>,
    pub kind: ConcurrentKind,
    pub in_arch: String,
    pub in_generate: bool,
    pub generate_label: Option<String>,
    pub line: usize,
}

/// A case statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseStatement {
    pub expression: String,
    pub choices: Vec<String>,
    pub has_others: bool,
    /// Same as `has_others`; no value coverage analysis is done.
    pub is_complete: bool,
    pub in_process: String,
    pub in_arch: String,
    pub line: usize,
}

/// Generate scheme with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GenerateScheme {
    For {
        loop_var: String,
        range_low: String,
        range_high: String,
        range_dir: String,
    },
    If {
        condition: String,
    },
    Case {
        expression: String,
        alternatives: Vec<String>,
    },
}

impl GenerateScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerateScheme::For { .. } => "for",
            GenerateScheme::If { .. } => "if",
            GenerateScheme::Case { .. } => "case",
        }
    }
}

/// A generate statement with the facts declared inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateStatement {
    pub label: String,
    #[serde(flatten)]
    pub scheme: GenerateScheme,
    /// Scope the generate sits in.
    pub in_arch: String,
    pub line: usize,
    /// Set by elaboration of `for` generates.
    pub can_elaborate: bool,
    pub iteration_count: i64,
    pub signals: Vec<Signal>,
    pub instances: Vec<Instance>,
    pub processes: Vec<Process>,
    pub concurrent_assignments: Vec<ConcurrentAssignment>,
    pub generates: Vec<GenerateStatement>,
}

impl GenerateStatement {
    /// Scope path of facts nested in this generate.
    pub fn scope_path(&self) -> String {
        if self.in_arch.is_empty() {
            self.label.clone()
        } else {
            format!("{}.{}", self.in_arch, self.label)
        }
    }

    /// This generate and all nested ones, depth-first.
    pub fn walk(&self) -> Vec<&GenerateStatement> {
        let mut out = vec![self];
        for child in &self.generates {
            out.extend(child.walk());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_kind_is_exclusive() {
        let mut p = Process::new(Some("p".to_string()), "rtl", 4);
        assert_eq!(p.kind(), ProcessKind::Combinational);

        p.set_kind(ProcessKind::Sequential);
        assert!(p.is_sequential && !p.is_combinational && !p.has_wait);

        p.set_kind(ProcessKind::WaitBased);
        assert!(!p.is_sequential && !p.is_combinational && p.has_wait);
        assert_eq!(p.kind(), ProcessKind::WaitBased);
    }

    #[test]
    fn test_generate_scope_path_and_walk() {
        let inner = GenerateStatement {
            label: "inner".to_string(),
            scheme: GenerateScheme::If {
                condition: "EN".to_string(),
            },
            in_arch: "rtl.outer".to_string(),
            line: 5,
            can_elaborate: false,
            iteration_count: -1,
            signals: Vec::new(),
            instances: Vec::new(),
            processes: Vec::new(),
            concurrent_assignments: Vec::new(),
            generates: Vec::new(),
        };
        let mut outer = inner.clone();
        outer.label = "outer".to_string();
        outer.in_arch = "rtl".to_string();
        outer.generates.push(inner);

        assert_eq!(outer.scope_path(), "rtl.outer");
        let labels: Vec<_> = outer.walk().iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["outer", "inner"]);

        let value = serde_json::to_value(&outer).unwrap();
        assert_eq!(value["kind"], "if");
        assert_eq!(value["condition"], "EN");
    }
}
