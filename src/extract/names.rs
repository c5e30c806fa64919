//! Name resolution.
//!
//! Turns name-shaped nodes into `{base, full_path, flags}` and decides,
//! from syntax alone, whether an occurrence is a signal read. There is no
//! type system here; the call-versus-index decision is a documented
//! heuristic driven by a declared-name allowlist and a built-in denylist
//! (see [`NameLookup`]).

use crate::syntax::{Node, NodeKind};

/// Name tables consulted by the resolver. All arguments are lowercase.
pub trait NameLookup {
    /// Signals, ports, generics, constants, variables and aliases known at
    /// this point of the traversal.
    fn is_declared(&self, name: &str) -> bool;

    /// Built-in functions, conversions and predefined values.
    fn is_builtin(&self, name: &str) -> bool;

    /// Names that are never signal reads here (process variables, loop and
    /// generate parameters).
    fn is_excluded(&self, name: &str) -> bool;

    /// Functions and procedures declared in this file.
    fn is_subprogram(&self, _name: &str) -> bool {
        false
    }
}

/// A resolved name occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedName {
    /// Root identifier (`rec` for `rec.field(3)`).
    pub base: String,
    /// Dotted path without indices (`rec.field`).
    pub full_path: String,
    pub is_indexed: bool,
    pub is_attribute: bool,
    /// Tentative: an indexed bare name that is not declared.
    pub is_call: bool,
    pub attr_name: Option<String>,
    pub index_expressions: Vec<String>,
    pub line: usize,
}

impl ResolvedName {
    fn simple(text: &str, line: usize) -> Self {
        let text = text.trim();
        Self {
            base: text.to_string(),
            full_path: text.to_string(),
            line,
            ..Self::default()
        }
    }

    /// Last dotted segment of the full path.
    pub fn last_segment(&self) -> &str {
        self.full_path
            .rsplit('.')
            .next()
            .unwrap_or(&self.full_path)
    }
}

/// Resolve a name-shaped node. Returns `None` for anything else.
pub fn resolve(node: Node<'_>, names: &dyn NameLookup) -> Option<ResolvedName> {
    let mut resolved = resolve_inner(node)?;
    resolved.is_call = resolved.is_indexed
        && !resolved.is_attribute
        && !resolved.full_path.contains('.')
        && !names.is_declared(&resolved.base.to_ascii_lowercase());
    Some(resolved)
}

fn prefix_of(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("prefix")
        .or_else(|| node.child_by_field_name("name"))
        .or_else(|| node.named_children().next())
}

fn resolve_inner(node: Node<'_>) -> Option<ResolvedName> {
    let line = node.line();
    match node.kind() {
        NodeKind::Identifier => Some(ResolvedName::simple(node.text(), line)),

        NodeKind::SelectedName => {
            let named: Vec<_> = node.named_children().collect();
            if named.len() < 2 {
                return Some(resolve_dotted_text(node.text(), line));
            }
            let prefix = node.child_by_field_name("prefix").unwrap_or(named[0]);
            let suffix = node
                .child_by_field_name("suffix")
                .unwrap_or(named[named.len() - 1]);
            let mut resolved = resolve_inner(prefix)?;
            resolved.full_path = format!("{}.{}", resolved.full_path, suffix.text().trim());
            Some(resolved)
        }

        NodeKind::IndexedName | NodeKind::SliceName | NodeKind::FunctionCall => {
            match prefix_of(node) {
                Some(prefix) if prefix.kind().is_name() => {
                    let mut resolved = resolve_inner(prefix)?;
                    resolved.is_indexed = true;
                    resolved.index_expressions.extend(
                        argument_nodes(node)
                            .iter()
                            .map(|a| a.text().trim().to_string()),
                    );
                    Some(resolved)
                }
                _ => resolve_call_text(node.text(), line),
            }
        }

        NodeKind::AttributeName => {
            let named: Vec<_> = node.named_children().collect();
            let attr_from_text = || {
                node.text()
                    .rsplit('\'')
                    .next()
                    .map(|s| s.trim().to_string())
            };
            let mut resolved = match prefix_of(node) {
                Some(prefix) if prefix.kind().is_name() => resolve_inner(prefix)?,
                _ => {
                    let head = node.text().split('\'').next()?.trim();
                    if head.is_empty() {
                        return None;
                    }
                    resolve_dotted_text(head, line)
                }
            };
            resolved.is_attribute = true;
            resolved.attr_name = node
                .child_by_field_name("designator")
                .or_else(|| node.child_by_field_name("attribute"))
                .or_else(|| (named.len() >= 2).then(|| named[1]))
                .map(|n| n.text().trim().to_string())
                .or_else(attr_from_text);
            Some(resolved)
        }

        _ => None,
    }
}

fn resolve_dotted_text(text: &str, line: usize) -> ResolvedName {
    let compact: String = text.split_whitespace().collect();
    let base = compact.split('.').next().unwrap_or("").to_string();
    ResolvedName {
        base,
        full_path: compact,
        line,
        ..ResolvedName::default()
    }
}

/// Leaf fallback for `name(args)` written as a single token run.
fn resolve_call_text(text: &str, line: usize) -> Option<ResolvedName> {
    let open = text.find('(')?;
    let head = text[..open].trim();
    if head.is_empty() {
        return None;
    }
    let mut resolved = resolve_dotted_text(head, line);
    resolved.is_indexed = true;
    let inner = text[open + 1..].trim_end().trim_end_matches(')');
    resolved.index_expressions = split_top_level(inner, ',')
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    Some(resolved)
}

/// Split on `sep` outside parentheses.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Argument (index or actual parameter) nodes of an indexed or call form,
/// including those of indexed prefixes (`arr(i).f` yields `i`).
pub fn argument_nodes(node: Node<'_>) -> Vec<Node<'_>> {
    match node.kind() {
        NodeKind::IndexedName | NodeKind::SliceName | NodeKind::FunctionCall => {
            let prefix = prefix_of(node);
            let mut args = Vec::new();
            if let Some(p) = prefix {
                if p.kind().is_name() {
                    args.extend(argument_nodes(p));
                }
            }
            for child in node.named_children() {
                if Some(child) == prefix || child.kind() == NodeKind::Comment {
                    continue;
                }
                if is_argument_list(child) {
                    args.extend(child.named_children());
                } else {
                    args.push(child);
                }
            }
            args
        }
        NodeKind::SelectedName => prefix_of(node)
            .filter(|p| *p != node && p.kind().is_name())
            .map(argument_nodes)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn is_argument_list(node: Node<'_>) -> bool {
    node.kind() == NodeKind::Other
        && (node.tag().ends_with("_list")
            || node.tag() == "arguments"
            || node.tag() == "actual_parameter_part"
            || node.tag() == "index_constraint")
}

/// A subprogram call found while scanning an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    pub args: Vec<String>,
    pub line: usize,
}

/// Signal reads and calls found in an expression.
#[derive(Debug, Clone, Default)]
pub struct ExprScan {
    pub reads: Vec<ResolvedName>,
    pub calls: Vec<CallSite>,
}

impl ExprScan {
    /// Scan one expression subtree.
    pub fn of(node: Node<'_>, names: &dyn NameLookup) -> Self {
        let mut scan = Self::default();
        scan.add(node, names);
        scan
    }

    /// Scan another subtree into this result.
    pub fn add(&mut self, node: Node<'_>, names: &dyn NameLookup) {
        scan(node, names, self);
    }

    /// Distinct read paths in first-seen order.
    pub fn read_paths(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in &self.reads {
            if !out.iter().any(|p| p.eq_ignore_ascii_case(&r.full_path)) {
                out.push(r.full_path.clone());
            }
        }
        out
    }

    /// Distinct read base names in first-seen order.
    pub fn read_bases(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in &self.reads {
            if !out.iter().any(|p| p.eq_ignore_ascii_case(&r.base)) {
                out.push(r.base.clone());
            }
        }
        out
    }
}

fn scan(node: Node<'_>, names: &dyn NameLookup, out: &mut ExprScan) {
    let kind = node.kind();
    if kind.is_name() {
        scan_name(node, names, out);
        return;
    }
    match kind {
        NodeKind::QualifiedExpression => {
            let mark = node
                .child_by_field_name("type_mark")
                .or_else(|| node.named_children().next());
            for child in node.named_children() {
                if Some(child) != mark {
                    scan(child, names, out);
                }
            }
        }
        NodeKind::ElementAssociation | NodeKind::AssociationElement => {
            scan_association_value(node, names, out);
        }
        NodeKind::Comment | NodeKind::Others | NodeKind::Open => {}
        k if k.is_literal() => {}
        _ => {
            for child in node.named_children() {
                scan(child, names, out);
            }
        }
    }
}

/// Scan only the value side of `choice => value`.
fn scan_association_value(node: Node<'_>, names: &dyn NameLookup, out: &mut ExprScan) {
    if let Some(value) = node
        .child_by_field_name("value")
        .or_else(|| node.child_by_field_name("actual"))
    {
        scan(value, names, out);
        return;
    }
    let arrow = node.children().position(|c| c.is_token("=>"));
    for (i, child) in node.children().enumerate() {
        if !child.is_named() {
            continue;
        }
        if arrow.map_or(true, |a| i > a) {
            scan(child, names, out);
        }
    }
}

fn scan_name(node: Node<'_>, names: &dyn NameLookup, out: &mut ExprScan) {
    let Some(resolved) = resolve(node, names) else {
        for child in node.named_children() {
            scan(child, names, out);
        }
        return;
    };
    let base = resolved.base.to_ascii_lowercase();
    let last = resolved.last_segment().to_ascii_lowercase();
    let declared = names.is_declared(&base);
    let excluded = names.is_excluded(&base);

    // Type and subtype prefixes (`state_t'high`) are not reads.
    if resolved.is_attribute {
        if declared && !excluded {
            out.reads.push(resolved);
        }
        return;
    }

    let args = argument_nodes(node);
    if resolved.is_indexed {
        if excluded {
            // Indexing a local variable: only the indices are reads.
        } else if declared {
            out.reads.push(resolved);
        } else if names.is_builtin(&last) || names.is_builtin(&base) {
            // Conversion or library function: only the arguments are reads.
        } else {
            out.calls.push(CallSite {
                name: resolved.full_path.clone(),
                args: args.iter().map(|a| a.text().trim().to_string()).collect(),
                line: resolved.line,
            });
        }
        for arg in args {
            scan(arg, names, out);
        }
        return;
    }

    // A bare subprogram name is a parameterless call, not a read.
    if excluded || (!declared && (names.is_builtin(&base) || names.is_subprogram(&base))) {
        return;
    }
    out.reads.push(resolved);
    for arg in args {
        scan(arg, names, out);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extract::builtins;
    use crate::syntax::sexp;
    use std::collections::HashSet;

    /// Lookup over fixed sets, for resolver tests.
    #[derive(Default)]
    pub(crate) struct TestNames {
        pub declared: HashSet<String>,
        pub excluded: HashSet<String>,
    }

    impl TestNames {
        pub(crate) fn with(declared: &[&str]) -> Self {
            Self {
                declared: declared.iter().map(|s| s.to_string()).collect(),
                excluded: HashSet::new(),
            }
        }
    }

    impl NameLookup for TestNames {
        fn is_declared(&self, name: &str) -> bool {
            self.declared.contains(name)
        }
        fn is_builtin(&self, name: &str) -> bool {
            builtins::is_builtin(name)
        }
        fn is_excluded(&self, name: &str) -> bool {
            self.excluded.contains(name)
        }
    }

    fn reads(expr: &str, names: &TestNames) -> Vec<String> {
        let tree = sexp::parse(expr).unwrap();
        ExprScan::of(tree.root(), names).read_paths()
    }

    #[test]
    fn test_selected_name_keeps_root_as_base() {
        let tree = sexp::parse(
            "(selected_name prefix:(selected_name prefix:(identifier rec) . suffix:(identifier inner)) . suffix:(identifier field))",
        )
        .unwrap();
        let r = resolve(tree.root(), &TestNames::default()).unwrap();
        assert_eq!(r.base, "rec");
        assert_eq!(r.full_path, "rec.inner.field");
        assert!(!r.is_indexed && !r.is_call);
    }

    #[test]
    fn test_indexed_declared_name_is_not_a_call() {
        let tree = sexp::parse(
            "(indexed_name prefix:(identifier mem) \"(\" (identifier addr) \")\")",
        )
        .unwrap();
        let names = TestNames::with(&["mem"]);
        let r = resolve(tree.root(), &names).unwrap();
        assert!(r.is_indexed);
        assert!(!r.is_call);
        assert_eq!(r.index_expressions, vec!["addr"]);

        let r = resolve(tree.root(), &TestNames::default()).unwrap();
        assert!(r.is_call);
    }

    #[test]
    fn test_attribute_keeps_prefix_base() {
        let tree =
            sexp::parse("(attribute_name prefix:(identifier clk) ' designator:(identifier event))")
                .unwrap();
        let r = resolve(tree.root(), &TestNames::default()).unwrap();
        assert!(r.is_attribute);
        assert_eq!(r.base, "clk");
        assert_eq!(r.attr_name.as_deref(), Some("event"));
    }

    #[test]
    fn test_leaf_fallbacks() {
        let tree = sexp::parse("(indexed_name \"data(3)\")").unwrap();
        let r = resolve(tree.root(), &TestNames::default()).unwrap();
        assert_eq!(r.base, "data");
        assert_eq!(r.index_expressions, vec!["3"]);

        let tree = sexp::parse("(attribute_name \"sig'length\")").unwrap();
        let r = resolve(tree.root(), &TestNames::default()).unwrap();
        assert_eq!(r.base, "sig");
        assert_eq!(r.attr_name.as_deref(), Some("length"));
    }

    #[test]
    fn test_attribute_prefix_reads() {
        let names = TestNames::with(&["clk", "count"]);
        let got = reads(
            "(function_call prefix:(identifier to_unsigned) \"(\" (attribute_name prefix:(identifier state_t) ' designator:(identifier high)) , (attribute_name prefix:(identifier count) ' designator:(identifier length)) \")\")",
            &names,
        );
        assert_eq!(got, vec!["count"]);

        let got = reads(
            "(attribute_name prefix:(identifier clk) ' designator:(identifier event))",
            &names,
        );
        assert_eq!(got, vec!["clk"]);
    }

    #[test]
    fn test_builtin_conversions_are_not_reads() {
        let names = TestNames::with(&["count", "width"]);
        let got = reads(
            "(function_call prefix:(identifier to_unsigned) \"(\" (identifier count) , (identifier width) \")\")",
            &names,
        );
        assert_eq!(got, vec!["count", "width"]);
    }

    #[test]
    fn test_aggregate_choices_are_not_reads() {
        let names = TestNames::with(&["a", "b"]);
        let got = reads(
            "(aggregate \"(\" (element_association (identifier valid) => (identifier a)) , (element_association (others) => (identifier b)) \")\")",
            &names,
        );
        assert_eq!(got, vec!["a", "b"]);
    }

    #[test]
    fn test_qualified_expression_type_mark_is_not_a_read() {
        let names = TestNames::with(&["value"]);
        let got = reads(
            "(qualified_expression type_mark:(identifier word_t) ' \"(\" (identifier value) \")\")",
            &names,
        );
        assert_eq!(got, vec!["value"]);
    }

    #[test]
    fn test_user_calls_are_recorded_not_read() {
        let tree = sexp::parse(
            "(function_call prefix:(selected_name prefix:(identifier math_pkg) . suffix:(identifier f)) \"(\" (association_element formal:(identifier a) => actual:(function_call prefix:(identifier g) \"(\" (identifier b) \")\")) \")\")",
        )
        .unwrap();
        let names = TestNames::with(&["b"]);
        let scan = ExprScan::of(tree.root(), &names);
        let calls: Vec<_> = scan.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(calls, vec!["math_pkg.f", "g"]);
        assert_eq!(scan.calls[0].args, vec!["a => g ( b )"]);
        assert_eq!(scan.read_paths(), vec!["b"]);
    }

    #[test]
    fn test_excluded_names_are_skipped() {
        let mut names = TestNames::with(&["v", "d"]);
        names.excluded.insert("v".to_string());
        let got = reads(
            "(relational_expression left:(identifier v) operator:= right:(identifier d))",
            &names,
        );
        assert_eq!(got, vec!["d"]);
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("a, f(b, c), d", ','), vec!["a", " f(b, c)", " d"]);
    }
}
