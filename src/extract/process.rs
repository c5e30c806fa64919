//! Process extraction and classification.
//!
//! One pass over the process body collects writes, reads, calls, waits,
//! case statements and expression facts. Classification is decided after
//! the whole body has been seen:
//!
//! - an edge call (`rising_edge(clk)`) in any `if`/`elsif` condition makes
//!   the process sequential and fixes its clock;
//! - otherwise a `wait` statement makes it wait-based;
//! - otherwise it is combinational.
//!
//! An asynchronous reset is recognized on an `if` whose first condition
//! compares a reset-named signal with a literal and whose clock edge sits
//! in a later `elsif`. Synchronous resets are not classified.

use std::collections::HashSet;

use log::trace;

use crate::config::Config;
use crate::facts::{
    ArithmeticOp, Call, CaseStatement, ClockEdge, Comparison, Process, ProcessKind,
    ResetPolarity, SignalDep, Variable, WaitStatement,
};
use crate::syntax::{Node, NodeKind};

use super::declarations::{collect_shallow, compact, object_decl, squash};
use super::expressions::{arithmetic_ops, comparisons, relation, Site};
use super::names::{argument_nodes, resolve, split_top_level, ExprScan, NameLookup};
use super::scope::Scope;

/// Everything one process contributes to the file record.
#[derive(Debug, Clone)]
pub(crate) struct ProcessFacts {
    pub process: Process,
    pub case_statements: Vec<CaseStatement>,
    pub comparisons: Vec<Comparison>,
    pub arithmetic_ops: Vec<ArithmeticOp>,
    pub signal_deps: Vec<SignalDep>,
}

/// Outer name tables plus process-local variables and loop parameters.
struct Locals<'a> {
    outer: &'a dyn NameLookup,
    names: HashSet<String>,
}

impl NameLookup for Locals<'_> {
    fn is_declared(&self, name: &str) -> bool {
        self.names.contains(name) || self.outer.is_declared(name)
    }

    fn is_builtin(&self, name: &str) -> bool {
        self.outer.is_builtin(name)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.names.contains(name) || self.outer.is_excluded(name)
    }

    fn is_subprogram(&self, name: &str) -> bool {
        self.outer.is_subprogram(name)
    }
}

/// Branch context inherited by nested statements.
#[derive(Debug, Clone, Default)]
struct Ctx {
    under_edge: bool,
    guard: Option<String>,
}

/// One arm of an `if` statement.
#[derive(Debug, Default)]
struct Branch<'t> {
    condition: Option<Node<'t>>,
    body: Vec<Node<'t>>,
}

const DECLARATION_KINDS: [NodeKind; 9] = [
    NodeKind::VariableDeclaration,
    NodeKind::ConstantDeclaration,
    NodeKind::FileDeclaration,
    NodeKind::AliasDeclaration,
    NodeKind::TypeDeclaration,
    NodeKind::SubtypeDeclaration,
    NodeKind::FunctionDeclaration,
    NodeKind::ProcedureDeclaration,
    NodeKind::SensitivityList,
];

struct ProcessWalker<'a> {
    names: Locals<'a>,
    config: &'a Config,
    site: Site,
    process: Process,
    found_edge: bool,
    case_statements: Vec<CaseStatement>,
    comparisons: Vec<Comparison>,
    arithmetic_ops: Vec<ArithmeticOp>,
    /// (target, distinct read paths, line) per signal assignment.
    pending_deps: Vec<(String, Vec<String>, usize)>,
}

/// Extract one process statement.
pub(crate) fn extract_process(
    node: Node<'_>,
    scope: &Scope,
    names: &dyn NameLookup,
    config: &Config,
) -> ProcessFacts {
    let label = super::declarations::label_of(node);
    let mut process = Process::new(label, scope.path(), node.line());
    process.sensitivity_list = sensitivity_list(node);

    let (variables, local_names) = locals(node);
    process.variables = variables;

    let site = Site {
        in_process: process.label_str().to_string(),
        in_arch: scope.path().to_string(),
        drives: None,
        guard: None,
    };

    let mut walker = ProcessWalker {
        names: Locals {
            outer: names,
            names: local_names,
        },
        config,
        site,
        process,
        found_edge: false,
        case_statements: Vec::new(),
        comparisons: Vec::new(),
        arithmetic_ops: Vec::new(),
        pending_deps: Vec::new(),
    };
    walker.statement_list(node, &Ctx::default());
    walker.finish()
}

fn sensitivity_list(node: Node<'_>) -> Vec<String> {
    let Some(list) = node
        .child_by_field_name("sensitivity")
        .or_else(|| node.child_of_kind(NodeKind::SensitivityList))
    else {
        return Vec::new();
    };
    let named: Vec<String> = list
        .named_children()
        .filter(|c| c.kind() != NodeKind::Comment)
        .map(|c| compact(c.text()))
        .collect();
    if !named.is_empty() {
        return named;
    }
    let text = list.text().trim().trim_start_matches('(').trim_end_matches(')');
    split_top_level(text, ',')
        .into_iter()
        .map(compact)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Process variables, plus every name local to the body (variables,
/// constants, loop parameters).
fn locals(node: Node<'_>) -> (Vec<Variable>, HashSet<String>) {
    let mut variables = Vec::new();
    let mut names = HashSet::new();

    let mut stack: Vec<Node<'_>> = node.named_children().collect();
    stack.reverse();
    while let Some(n) = stack.pop() {
        match n.kind() {
            NodeKind::VariableDeclaration | NodeKind::ConstantDeclaration => {
                let decl = object_decl(n);
                for (name, line) in decl.names {
                    names.insert(name.to_ascii_lowercase());
                    if n.kind() == NodeKind::VariableDeclaration {
                        variables.push(Variable {
                            name,
                            variable_type: decl.type_text.clone(),
                            line,
                        });
                    }
                }
            }
            NodeKind::FunctionDeclaration | NodeKind::ProcedureDeclaration => {}
            _ => {
                if n.kind() == NodeKind::LoopStatement {
                    if let Some(param) = loop_parameter(n) {
                        names.insert(param.to_ascii_lowercase());
                    }
                }
                let mut children: Vec<_> = n.named_children().collect();
                children.reverse();
                stack.extend(children);
            }
        }
    }
    (variables, names)
}

/// The `for` parameter of a loop, if any.
pub(crate) fn loop_parameter(node: Node<'_>) -> Option<String> {
    if let Some(p) = node.child_by_field_name("parameter") {
        return Some(p.text().trim().to_string());
    }
    let mut seen_for = false;
    for n in node.descendants().skip(1) {
        if n.is_token("loop") || n.is_token("generate") {
            return None;
        }
        if n.is_token("for") {
            seen_for = true;
        } else if seen_for && n.kind() == NodeKind::Identifier {
            return Some(n.text().trim().to_string());
        }
    }
    None
}

/// Edge function call with a single simple-name argument.
fn edge_call(
    cond: Node<'_>,
    names: &dyn NameLookup,
    config: &Config,
) -> Option<(ClockEdge, String)> {
    for n in cond.descendants() {
        if !n.kind().is_name() {
            continue;
        }
        let Some(r) = resolve(n, names) else { continue };
        if !r.is_indexed || r.full_path.contains('.') {
            continue;
        }
        let Some(edge) = config.edge_kind(&r.base.to_ascii_lowercase()) else {
            continue;
        };
        if let [arg] = r.index_expressions.as_slice() {
            let arg = arg.trim();
            let simple = !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            if simple {
                return Some((edge, arg.to_string()));
            }
        }
    }
    None
}

/// Split an `if` statement into its arms.
fn branches(node: Node<'_>) -> Vec<Branch<'_>> {
    let mut out = Vec::new();
    let mut current: Option<Branch<'_>> = None;
    let mut expect_condition = false;

    for child in node.children() {
        if child.field_name() == Some("label") {
            continue;
        }
        if !child.is_named() {
            match child.text().to_ascii_lowercase().as_str() {
                "if" | "elsif" => {
                    out.extend(current.take());
                    current = Some(Branch::default());
                    expect_condition = true;
                }
                "else" => {
                    out.extend(current.take());
                    current = Some(Branch::default());
                    expect_condition = false;
                }
                "then" => expect_condition = false,
                "end" => break,
                _ => {}
            }
            continue;
        }
        match child.kind() {
            NodeKind::ElsifClause | NodeKind::ElseClause => {
                out.extend(current.take());
                out.extend(branches(child));
            }
            NodeKind::Comment => {}
            _ => {
                let branch = current.get_or_insert_with(Branch::default);
                let is_condition = child.field_name() == Some("condition")
                    || (expect_condition && branch.condition.is_none());
                if is_condition && branch.condition.is_none() {
                    branch.condition = Some(child);
                    expect_condition = false;
                } else {
                    branch.body.push(child);
                }
            }
        }
    }
    out.extend(current);
    out
}

fn is_expression(kind: NodeKind) -> bool {
    kind.is_name()
        || kind.is_literal()
        || matches!(
            kind,
            NodeKind::RelationalExpression
                | NodeKind::MultiplicativeExpression
                | NodeKind::ExponentialExpression
                | NodeKind::Aggregate
                | NodeKind::QualifiedExpression
                | NodeKind::Range
        )
}

impl<'a> ProcessWalker<'a> {
    /// Walk the named children of a statement container, stopping at `end`.
    fn statement_list(&mut self, node: Node<'_>, ctx: &Ctx) {
        for child in node.children() {
            if child.is_token("end") {
                break;
            }
            if !child.is_named() || child.field_name() == Some("label") {
                continue;
            }
            self.statement(child, ctx);
        }
    }

    fn statement(&mut self, node: Node<'_>, ctx: &Ctx) {
        match node.kind() {
            NodeKind::SequentialSignalAssignment => self.assignment(node, ctx, true),
            NodeKind::VariableAssignment => self.assignment(node, ctx, false),
            NodeKind::IfStatement => self.if_statement(node, ctx),
            NodeKind::CaseStatement => self.case_statement(node, ctx),
            NodeKind::WaitStatement => self.wait_statement(node),
            NodeKind::ProcedureCallStatement => self.procedure_call(node),
            NodeKind::Comment => {}
            k if DECLARATION_KINDS.contains(&k) => {}
            k if is_expression(k) => {
                self.expression(&[node], None, None, ctx);
            }
            other => {
                trace!("process {}: walking {} as container", self.site.in_process, other);
                self.statement_list(node, ctx);
            }
        }
    }

    /// Scan expression nodes: reads, calls, comparisons and arithmetic.
    /// `drives` is the assigned signal, `result` the assigned signal or
    /// variable.
    fn expression(
        &mut self,
        nodes: &[Node<'_>],
        drives: Option<&str>,
        result: Option<&str>,
        ctx: &Ctx,
    ) -> ExprScan {
        let mut scan = ExprScan::default();
        let compare_site = Site {
            drives: drives.map(str::to_string),
            guard: ctx.guard.clone(),
            ..self.site.clone()
        };
        let arith_site = Site {
            drives: result.map(str::to_string),
            ..compare_site.clone()
        };
        for node in nodes {
            scan.add(*node, &self.names);
            self.comparisons
                .extend(comparisons(*node, &compare_site, &self.names));
            self.arithmetic_ops
                .extend(arithmetic_ops(*node, &arith_site, &self.names));
        }
        for path in scan.read_paths() {
            push_unique(&mut self.process.read_signals, path);
        }
        for call in &scan.calls {
            self.process.function_calls.push(Call {
                name: call.name.clone(),
                args: call.args.clone(),
                in_process: self.site.in_process.clone(),
                line: call.line,
            });
        }
        scan
    }

    fn assignment(&mut self, node: Node<'_>, ctx: &Ctx, is_signal: bool) {
        let children: Vec<_> = node.children().collect();
        let arrow = children
            .iter()
            .position(|c| c.is_token("<=") || c.is_token(":="));
        let target = node.child_by_field_name("target").or_else(|| {
            children[..arrow.unwrap_or(children.len())]
                .iter()
                .find(|c| c.is_named() && c.field_name() != Some("label"))
                .copied()
        });
        let values: Vec<Node<'_>> = match node.child_by_field_name("value") {
            Some(v) => vec![v],
            None => match arrow {
                Some(a) => children[a + 1..]
                    .iter()
                    .filter(|c| c.is_named() && c.kind() != NodeKind::Comment)
                    .copied()
                    .collect(),
                None => Vec::new(),
            },
        };

        let resolved = target.and_then(|t| resolve(t, &self.names));
        let target_path = resolved.as_ref().map(|r| r.full_path.clone());

        let mut inputs = values;
        if let Some(t) = target {
            inputs.extend(argument_nodes(t));
        }
        let drives = if is_signal { target_path.as_deref() } else { None };
        let scan = self.expression(&inputs, drives, target_path.as_deref(), ctx);

        let Some(target_path) = target_path else {
            return;
        };
        if !is_signal {
            return;
        }
        push_unique(&mut self.process.assigned_signals, target_path.clone());
        self.pending_deps
            .push((target_path, scan.read_paths(), node.line()));
    }

    fn if_statement(&mut self, node: Node<'_>, ctx: &Ctx) {
        let arms = branches(node);
        let edges: Vec<Option<(ClockEdge, String)>> = arms
            .iter()
            .map(|b| {
                b.condition
                    .and_then(|c| edge_call(c, &self.names, self.config))
            })
            .collect();
        let edge_index = edges.iter().position(Option::is_some);

        if let Some(e) = edge_index {
            if !self.found_edge {
                if let Some((edge, clock)) = &edges[e] {
                    self.found_edge = true;
                    self.process.clock_signal = Some(clock.clone());
                    self.process.clock_edge = Some(*edge);
                }
            }
            if e > 0 && !ctx.under_edge && !self.process.has_reset {
                if let Some(cond) = arms[0].condition {
                    self.detect_reset(cond);
                }
            }
        }

        for (i, arm) in arms.iter().enumerate() {
            let is_edge = edges[i].is_some();
            let mut inner = Ctx {
                under_edge: ctx.under_edge || is_edge,
                guard: ctx.guard.clone(),
            };
            if let Some(cond) = arm.condition {
                let scan = self.expression(&[cond], None, None, ctx);
                if !is_edge {
                    if let Some(first) = scan.reads.first() {
                        inner.guard = Some(first.base.clone());
                    }
                }
            }
            for stmt in &arm.body {
                self.statement(*stmt, &inner);
            }
        }
    }

    fn detect_reset(&mut self, cond: Node<'_>) {
        let mut target = cond;
        while target.kind() != NodeKind::RelationalExpression {
            let mut named = target
                .named_children()
                .filter(|c| c.kind() != NodeKind::Comment);
            match (named.next(), named.next()) {
                (Some(only), None) if target.kind() == NodeKind::Other => target = only,
                _ => break,
            }
        }
        let Some(rel) = relation(target, &self.names) else {
            return;
        };
        if !rel.right_is_literal || !self.config.is_reset_name(&rel.left) {
            return;
        }
        self.process.has_reset = true;
        self.process.reset_async = true;
        self.process.reset_polarity = Some(if rel.right.trim() == "'0'" {
            ResetPolarity::ActiveLow
        } else {
            ResetPolarity::ActiveHigh
        });
        self.process.reset_signal = Some(rel.left);
    }

    fn case_statement(&mut self, node: Node<'_>, ctx: &Ctx) {
        let children: Vec<_> = node.children().collect();
        let expression = node.child_by_field_name("expression").or_else(|| {
            let start = children
                .iter()
                .position(|c| c.is_token("case"))
                .map_or(0, |p| p + 1);
            children[start..]
                .iter()
                .find(|c| c.is_named() && c.kind() != NodeKind::CaseAlternative)
                .copied()
        });
        if let Some(expr) = expression {
            self.expression(&[expr], None, None, ctx);
        }

        let mut case = CaseStatement {
            expression: expression.map(|e| squash(e.text())).unwrap_or_default(),
            choices: Vec::new(),
            has_others: false,
            is_complete: false,
            in_process: self.site.in_process.clone(),
            in_arch: self.site.in_arch.clone(),
            line: node.line(),
        };
        // Recorded before the body so nested cases follow their parent.
        let index = self.case_statements.len();
        self.case_statements.push(case.clone());

        for alternative in collect_shallow(node, NodeKind::CaseAlternative) {
            let alt_children: Vec<_> = alternative.children().collect();
            let arrow = alt_children.iter().position(|c| c.is_token("=>"));
            for (i, child) in alt_children.iter().enumerate() {
                if !child.is_named() || child.kind() == NodeKind::Comment {
                    continue;
                }
                let is_choice = child.field_name() == Some("choice")
                    || matches!(child.kind(), NodeKind::CaseChoice | NodeKind::Others)
                    || arrow.is_some_and(|a| i < a);
                if is_choice {
                    for choice in split_top_level(child.text(), '|') {
                        let choice = squash(choice);
                        if choice.eq_ignore_ascii_case("others") {
                            case.has_others = true;
                        }
                        if !choice.is_empty() {
                            case.choices.push(choice);
                        }
                    }
                    if child.kind() == NodeKind::Others
                        || child.descendants().any(|d| d.kind() == NodeKind::Others)
                    {
                        case.has_others = true;
                    }
                } else {
                    self.statement(*child, ctx);
                }
            }
        }

        case.is_complete = case.has_others;
        self.case_statements[index] = case;
    }

    fn wait_statement(&mut self, node: Node<'_>) {
        let mut parts = WaitParts::default();
        let mut section = Section::None;
        collect_wait(node, &mut section, &mut parts);

        let mut wait = WaitStatement {
            on_signals: parts.on.iter().map(|n| compact(n.text())).collect(),
            until_expr: span_text(&parts.until),
            for_expr: span_text(&parts.timeout),
            in_process: self.site.in_process.clone(),
            line: node.line(),
        };
        wait.on_signals.retain(|s| !s.is_empty());

        let mut inputs = parts.on.clone();
        inputs.extend(parts.until.iter().copied());
        inputs.extend(parts.timeout.iter().copied());
        self.expression(&inputs, None, None, &Ctx::default());
        self.process.wait_statements.push(wait);
    }

    fn procedure_call(&mut self, node: Node<'_>) {
        let named: Vec<_> = node
            .named_children()
            .filter(|c| c.field_name() != Some("label") && c.kind() != NodeKind::Comment)
            .collect();
        let Some(callee) = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("procedure"))
            .or_else(|| named.first().copied())
        else {
            return;
        };

        let (name, mut args) = match resolve(callee, &self.names) {
            Some(r) => (r.full_path.clone(), argument_nodes(callee)),
            None => (compact(callee.text()), Vec::new()),
        };
        for extra in named.iter().filter(|c| **c != callee) {
            if extra.kind() == NodeKind::Other && extra.tag().ends_with("_part") {
                args.extend(extra.named_children());
            } else {
                args.push(*extra);
            }
        }

        self.process.procedure_calls.push(Call {
            name,
            args: args.iter().map(|a| squash(a.text())).collect(),
            in_process: self.site.in_process.clone(),
            line: node.line(),
        });
        self.expression(&args, None, None, &Ctx::default());
    }

    fn finish(mut self) -> ProcessFacts {
        let kind = if self.found_edge {
            ProcessKind::Sequential
        } else if !self.process.wait_statements.is_empty() {
            ProcessKind::WaitBased
        } else {
            ProcessKind::Combinational
        };
        self.process.set_kind(kind);

        let is_sequential = kind == ProcessKind::Sequential;
        let mut signal_deps = Vec::new();
        for (target, reads, line) in self.pending_deps {
            for source in reads {
                signal_deps.push(SignalDep {
                    source,
                    target: target.clone(),
                    in_process: self.site.in_process.clone(),
                    is_sequential,
                    in_arch: self.site.in_arch.clone(),
                    line,
                });
            }
        }

        ProcessFacts {
            process: self.process,
            case_statements: self.case_statements,
            comparisons: self.comparisons,
            arithmetic_ops: self.arithmetic_ops,
            signal_deps,
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
        list.push(value);
    }
}

fn span_text(nodes: &[Node<'_>]) -> Option<String> {
    match (nodes.first(), nodes.last()) {
        (Some(first), Some(last)) => Some(squash(first.text_through(*last))),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    On,
    Until,
    For,
}

#[derive(Debug, Default)]
struct WaitParts<'t> {
    on: Vec<Node<'t>>,
    until: Vec<Node<'t>>,
    timeout: Vec<Node<'t>>,
}

fn collect_wait<'t>(node: Node<'t>, section: &mut Section, parts: &mut WaitParts<'t>) {
    for child in node.children() {
        if !child.is_named() {
            match child.text().to_ascii_lowercase().as_str() {
                "on" => *section = Section::On,
                "until" => *section = Section::Until,
                "for" => *section = Section::For,
                _ => {}
            }
            continue;
        }
        match child.kind() {
            NodeKind::Comment => {}
            NodeKind::SensitivityClause => {
                *section = Section::On;
                collect_wait(child, section, parts);
            }
            NodeKind::ConditionClause => {
                *section = Section::Until;
                collect_wait(child, section, parts);
            }
            NodeKind::TimeoutClause => {
                *section = Section::For;
                collect_wait(child, section, parts);
            }
            NodeKind::SensitivityList => {
                *section = Section::On;
                parts.on.extend(
                    child
                        .named_children()
                        .filter(|c| c.kind() != NodeKind::Comment),
                );
            }
            _ if child.field_name() == Some("label") => {}
            _ => match section {
                Section::On => parts.on.push(child),
                Section::Until => parts.until.push(child),
                Section::For => parts.timeout.push(child),
                Section::None => {}
            },
        }
    }
}
