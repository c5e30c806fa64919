//! Concurrent signal assignments.

use crate::facts::{
    ArithmeticOp, Comparison, ConcurrentAssignment, ConcurrentKind, SignalDep,
};
use crate::syntax::{Node, NodeKind};

use super::declarations::{compact, squash};
use super::expressions::{arithmetic_ops, comparisons, Site};
use super::names::{argument_nodes, resolve, ExprScan, NameLookup};
use super::scope::Scope;

/// What one concurrent assignment contributes to the file record.
#[derive(Debug, Clone)]
pub(crate) struct ConcurrentFacts {
    pub assignment: ConcurrentAssignment,
    pub comparisons: Vec<Comparison>,
    pub arithmetic_ops: Vec<ArithmeticOp>,
    pub signal_deps: Vec<SignalDep>,
}

/// Classify from text: `with .. select` is selected, `when .. else` is
/// conditional, anything else is simple.
pub(crate) fn classify(text: &str) -> ConcurrentKind {
    let lower = squash(text).to_ascii_lowercase();
    if lower.starts_with("with ") && lower.contains(" select") {
        ConcurrentKind::Selected
    } else if lower.contains(" when ") && lower.contains(" else ") {
        ConcurrentKind::Conditional
    } else {
        ConcurrentKind::Simple
    }
}

pub(crate) fn extract_concurrent(
    node: Node<'_>,
    scope: &Scope,
    names: &dyn NameLookup,
) -> ConcurrentFacts {
    let children: Vec<_> = node
        .children()
        .filter(|c| c.field_name() != Some("label"))
        .collect();
    let arrow = children.iter().position(|c| c.is_token("<="));
    let target = node.child_by_field_name("target").or_else(|| {
        children[..arrow.unwrap_or(0)]
            .iter()
            .rev()
            .find(|c| c.is_named() && c.kind() != NodeKind::Comment)
            .copied()
    });

    // Text without the label, so `lbl : with s select ...` still classifies.
    let body_text = match (
        children.iter().find(|c| !c.is_token(":")),
        children.last(),
    ) {
        (Some(first), Some(last)) => first.text_through(*last),
        _ => node.text(),
    };

    let resolved = target.and_then(|t| resolve(t, names));
    let (base, full) = match (&resolved, target) {
        (Some(r), _) => (r.base.clone(), r.full_path.clone()),
        (None, Some(t)) => (compact(t.text()), compact(t.text())),
        (None, None) => (String::new(), String::new()),
    };

    let mut inputs: Vec<Node<'_>> = children
        .iter()
        .filter(|c| c.is_named() && Some(**c) != target && c.kind() != NodeKind::Comment)
        .copied()
        .collect();
    if let Some(t) = target {
        inputs.extend(argument_nodes(t));
    }

    let site = Site {
        in_process: String::new(),
        in_arch: scope.path().to_string(),
        drives: Some(full.clone()).filter(|f| !f.is_empty()),
        guard: None,
    };
    let mut scan = ExprScan::default();
    let mut comps = Vec::new();
    let mut ops = Vec::new();
    for input in &inputs {
        scan.add(*input, names);
        comps.extend(comparisons(*input, &site, names));
        ops.extend(arithmetic_ops(*input, &site, names));
    }
    let read_signals = scan.read_paths();

    let signal_deps = if full.is_empty() {
        Vec::new()
    } else {
        read_signals
            .iter()
            .map(|source| SignalDep {
                source: source.clone(),
                target: full.clone(),
                in_process: String::new(),
                is_sequential: false,
                in_arch: scope.path().to_string(),
                line: node.line(),
            })
            .collect()
    };

    ConcurrentFacts {
        assignment: ConcurrentAssignment {
            target: base,
            target_full: full,
            read_signals,
            kind: classify(body_text),
            in_arch: scope.path().to_string(),
            in_generate: scope.generate().is_some(),
            generate_label: scope.generate().map(str::to_string),
            line: node.line(),
        },
        comparisons: comps,
        arithmetic_ops: ops,
        signal_deps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::names::tests::TestNames;
    use crate::syntax::sexp;

    fn run(src: &str, declared: &[&str]) -> ConcurrentFacts {
        let tree = sexp::parse(src).unwrap();
        extract_concurrent(
            tree.root(),
            &Scope::file().in_architecture("rtl"),
            &TestNames::with(declared),
        )
    }

    #[test]
    fn test_conditional_assignment() {
        let facts = run(
            r#"(concurrent_signal_assignment target:(identifier y) <= (identifier a) when
                 (relational_expression left:(identifier sel) operator:"=" right:(character_literal "'1'"))
                 else (identifier b) ;)"#,
            &["y", "a", "b", "sel"],
        );
        let a = &facts.assignment;
        assert_eq!(a.kind, ConcurrentKind::Conditional);
        assert_eq!(a.target, "y");
        assert_eq!(a.read_signals, vec!["a", "sel", "b"]);
        assert!(!a.in_generate);
        assert_eq!(facts.signal_deps.len(), 3);
        assert!(facts.signal_deps.iter().all(|d| !d.is_sequential));
        assert_eq!(facts.comparisons[0].result_drives.as_deref(), Some("y"));
    }

    #[test]
    fn test_selected_assignment() {
        let facts = run(
            r#"(concurrent_signal_assignment with (identifier sel) select target:(identifier z) <=
                 (identifier a) when (character_literal "'0'") , (identifier b) when (others) ;)"#,
            &["z", "a", "b", "sel"],
        );
        assert_eq!(facts.assignment.kind, ConcurrentKind::Selected);
        assert_eq!(facts.assignment.target, "z");
        assert_eq!(facts.assignment.read_signals, vec!["sel", "a", "b"]);
    }

    #[test]
    fn test_simple_assignment_without_target_field() {
        let facts = run(
            r#"(concurrent_signal_assignment (selected_name prefix:(identifier bus_o) . suffix:(identifier valid)) <= (identifier v) ;)"#,
            &["bus_o", "v"],
        );
        let a = &facts.assignment;
        assert_eq!(a.kind, ConcurrentKind::Simple);
        assert_eq!(a.target, "bus_o");
        assert_eq!(a.target_full, "bus_o.valid");
        assert_eq!(facts.signal_deps[0].target, "bus_o.valid");
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(classify("WITH s SELECT y <= a WHEN '0', b WHEN OTHERS;"), ConcurrentKind::Selected);
        assert_eq!(classify("y <= a when c = '1' else b;"), ConcurrentKind::Conditional);
        assert_eq!(classify("y <= a;"), ConcurrentKind::Simple);
    }
}
