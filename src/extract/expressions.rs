//! Comparison and arithmetic facts found inside expressions.

use crate::facts::{ArithmeticOp, Comparison};
use crate::syntax::{Node, NodeKind};

use super::declarations::squash;
use super::names::{resolve, NameLookup};

const RELATIONAL_OPS: [&str; 12] = [
    "=", "/=", "<", "<=", ">", ">=", "?=", "?/=", "?<", "?<=", "?>", "?>=",
];
const COSTLY_OPS: [&str; 4] = ["*", "/", "mod", "rem"];

/// Where an expression sits and what it feeds.
#[derive(Debug, Clone, Default)]
pub(crate) struct Site {
    pub in_process: String,
    pub in_arch: String,
    /// Signal assigned from the enclosing statement.
    pub drives: Option<String>,
    /// First signal read by the innermost enclosing non-clock `if`.
    pub guard: Option<String>,
}

/// The parts of a relational expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Relation {
    pub left: String,
    pub operator: String,
    pub right: String,
    pub right_is_literal: bool,
    pub line: usize,
}

/// Split a relational expression, structurally or from its text.
pub(crate) fn relation(node: Node<'_>, names: &dyn NameLookup) -> Option<Relation> {
    let named: Vec<_> = node
        .named_children()
        .filter(|c| c.kind() != NodeKind::Comment)
        .collect();
    let left = node
        .child_by_field_name("left")
        .or_else(|| named.first().copied());
    let right = node
        .child_by_field_name("right")
        .or_else(|| (named.len() >= 2).then(|| named[named.len() - 1]));

    let (Some(left), Some(right)) = (left, right) else {
        return relation_from_text(node.text(), node.line());
    };
    if left == right {
        return relation_from_text(node.text(), node.line());
    }
    let operator = node
        .child_by_field_name("operator")
        .map(|o| o.text().trim().to_string())
        .or_else(|| {
            node.children()
                .find(|c| {
                    (!c.is_named() && RELATIONAL_OPS.contains(&c.text().trim()))
                        || c.tag() == "relational_operator"
                })
                .map(|c| c.text().trim().to_string())
        })?;

    Some(Relation {
        left: operand(left, names),
        operator,
        right: operand(right, names),
        right_is_literal: is_literal_node(right),
        line: node.line(),
    })
}

fn relation_from_text(text: &str, line: usize) -> Option<Relation> {
    let (pos, op) = find_relational_op(text)?;
    let left = squash(&text[..pos]);
    let right = squash(&text[pos + op.len()..]);
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some(Relation {
        right_is_literal: is_literal_text(&right),
        left,
        operator: op.to_string(),
        right,
        line,
    })
}

/// First relational operator outside string and character literals.
fn find_relational_op(text: &str) -> Option<(usize, &'static str)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
            }
            b'\'' if i + 2 < bytes.len() && bytes[i + 2] == b'\'' => i += 2,
            b'/' | b'<' | b'>' | b'=' => {
                let two = text.get(i..i + 2).unwrap_or("");
                for op in ["/=", "<=", ">=", "=>"] {
                    if two == op {
                        return (op != "=>")
                            .then(|| RELATIONAL_OPS.iter().find(|o| **o == op))
                            .flatten()
                            .map(|o| (i, *o));
                    }
                }
                if bytes[i] != b'/' {
                    let one = &text[i..i + 1];
                    return RELATIONAL_OPS.iter().find(|o| **o == one).map(|o| (i, *o));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Operand text: the base signal of a name, else the literal or expression text.
fn operand(node: Node<'_>, names: &dyn NameLookup) -> String {
    if node.kind().is_name() {
        if let Some(r) = resolve(node, names) {
            return r.base;
        }
    }
    if node.kind() == NodeKind::Other && node.named_children().count() == 1 {
        if let Some(inner) = node.named_children().next() {
            return operand(inner, names);
        }
    }
    squash(node.text())
}

fn is_literal_node(node: Node<'_>) -> bool {
    if node.kind().is_literal() {
        return true;
    }
    if node.kind() == NodeKind::Other {
        return match node.named_children().next() {
            Some(inner) => is_literal_node(inner),
            None => is_literal_text(node.text()),
        };
    }
    false
}

/// Whether `text` looks like a literal value.
pub(crate) fn is_literal_text(text: &str) -> bool {
    let t = text.trim();
    let Some(first) = t.chars().next() else {
        return false;
    };
    first.is_ascii_digit()
        || first == '"'
        || (first == '\'' && t.len() >= 3)
        || bit_string_parts(t).is_some()
}

/// `(size, base, digits)` of a bit string literal like `8x"FF"` or `B"1010"`.
fn bit_string_parts(text: &str) -> Option<(Option<u32>, char, &str)> {
    let quote = text.find('"')?;
    if !text.ends_with('"') || quote + 1 >= text.len() {
        return None;
    }
    let prefix = &text[..quote];
    let digits = &text[quote + 1..text.len() - 1];
    let size_end = prefix
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(prefix.len());
    let size = prefix[..size_end].parse::<u32>().ok();
    let spec = prefix[size_end..].to_ascii_lowercase();
    let base = match spec.as_str() {
        "x" | "ux" | "sx" => 'x',
        "b" | "ub" | "sb" => 'b',
        "o" | "uo" | "so" => 'o',
        "d" => 'd',
        _ => return None,
    };
    Some((size, base, digits))
}

fn bits_for(value: u64) -> u32 {
    (64 - value.leading_zeros()).max(1)
}

/// Estimated bit width of a literal, 0 when unknown.
pub(crate) fn literal_bits(literal: &str) -> u32 {
    let t = literal.trim();
    if let Some((size, base, digits)) = bit_string_parts(t) {
        if let Some(size) = size {
            return size;
        }
        let clean: String = digits.chars().filter(|c| *c != '_').collect();
        let n = clean.chars().count() as u32;
        return match base {
            'x' => 4 * n,
            'b' => n,
            'o' => 3 * n,
            _ => clean.parse::<u64>().map(bits_for).unwrap_or(0),
        };
    }
    if t.starts_with('"') && t.ends_with('"') && t.len() >= 2 {
        return t[1..t.len() - 1].chars().filter(|c| *c != '_').count() as u32;
    }
    if t.starts_with('\'') && t.ends_with('\'') && t.len() >= 3 {
        return 1;
    }
    if let Some((base, rest)) = t.split_once('#') {
        let digits: String = rest.trim_end_matches('#').chars().filter(|c| *c != '_').collect();
        return base
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|b| u64::from_str_radix(&digits, b).ok())
            .map(bits_for)
            .unwrap_or(0);
    }
    let clean: String = t.chars().filter(|c| *c != '_').collect();
    clean.parse::<u64>().map(bits_for).unwrap_or(0)
}

/// Every comparison under `node`.
pub(crate) fn comparisons(node: Node<'_>, site: &Site, names: &dyn NameLookup) -> Vec<Comparison> {
    let mut out = Vec::new();
    for n in node.descendants() {
        let rel = if n.kind() == NodeKind::RelationalExpression {
            relation(n, names)
        } else {
            relation_from_operator_child(n, names)
        };
        let Some(rel) = rel else { continue };
        out.push(Comparison {
            literal_value: rel.right_is_literal.then(|| rel.right.clone()),
            literal_bits: if rel.right_is_literal {
                literal_bits(&rel.right)
            } else {
                0
            },
            is_literal: rel.right_is_literal,
            left: rel.left,
            operator: rel.operator,
            right: rel.right,
            result_drives: site.drives.clone(),
            in_process: site.in_process.clone(),
            in_arch: site.in_arch.clone(),
            line: rel.line,
        });
    }
    out
}

/// Flat shape: `(parent left (relational_operator) right)`.
fn relation_from_operator_child(node: Node<'_>, names: &dyn NameLookup) -> Option<Relation> {
    let children: Vec<_> = node.children().collect();
    let op = children
        .iter()
        .position(|c| c.is_named() && c.tag() == "relational_operator")?;
    let left = children[..op].iter().rev().find(|c| is_value(**c))?;
    let right = children[op + 1..].iter().find(|c| is_value(**c))?;
    Some(Relation {
        left: operand(*left, names),
        operator: children[op].text().trim().to_string(),
        right: operand(*right, names),
        right_is_literal: is_literal_node(*right) || is_literal_text(right.text()),
        line: children[op].line(),
    })
}

fn is_value(node: Node<'_>) -> bool {
    node.is_named() && (node.kind().is_name() || node.kind().is_literal())
}

/// Every multiply, divide, modulo, remainder and exponent under `node`.
pub(crate) fn arithmetic_ops(node: Node<'_>, site: &Site, names: &dyn NameLookup) -> Vec<ArithmeticOp> {
    let mut out = Vec::new();
    for n in node.descendants() {
        let (operator, operands) = match n.kind() {
            NodeKind::MultiplicativeExpression => {
                let Some(op) = n
                    .child_by_field_name("operator")
                    .or_else(|| {
                        n.children().find(|c| {
                            !c.is_named() && COSTLY_OPS.iter().any(|o| c.is_token(o))
                        })
                    })
                    .map(|o| o.text().trim().to_ascii_lowercase())
                else {
                    continue;
                };
                if !COSTLY_OPS.contains(&op.as_str()) {
                    continue;
                }
                let operands = ["left", "right"]
                    .iter()
                    .filter_map(|f| n.child_by_field_name(f))
                    .collect::<Vec<_>>();
                (op, operands)
            }
            NodeKind::ExponentialExpression => {
                let operands = ["base", "exponent"]
                    .iter()
                    .filter_map(|f| n.child_by_field_name(f))
                    .collect::<Vec<_>>();
                ("**".to_string(), operands)
            }
            _ => continue,
        };
        let operands = if operands.is_empty() {
            n.named_children()
                .filter(|c| c.kind() != NodeKind::Comment)
                .map(|c| operand(c, names))
                .collect()
        } else {
            operands.into_iter().map(|c| operand(c, names)).collect()
        };
        out.push(ArithmeticOp {
            operator,
            operands,
            result: site.drives.clone(),
            is_guarded: site.guard.is_some(),
            guard_signal: site.guard.clone(),
            in_process: site.in_process.clone(),
            in_arch: site.in_arch.clone(),
            line: n.line(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::names::tests::TestNames;
    use crate::syntax::sexp;

    fn site() -> Site {
        Site {
            in_process: "p_ctrl".into(),
            in_arch: "rtl".into(),
            drives: Some("hit".into()),
            guard: None,
        }
    }

    #[test]
    fn test_literal_bits() {
        assert_eq!(literal_bits("X\"FF\""), 8);
        assert_eq!(literal_bits("b\"1010\""), 4);
        assert_eq!(literal_bits("O\"17\""), 6);
        assert_eq!(literal_bits("12x\"ABC\""), 12);
        assert_eq!(literal_bits("\"0101_1\""), 5);
        assert_eq!(literal_bits("'1'"), 1);
        assert_eq!(literal_bits("0"), 1);
        assert_eq!(literal_bits("255"), 8);
        assert_eq!(literal_bits("256"), 9);
        assert_eq!(literal_bits("16#FF#"), 8);
        assert_eq!(literal_bits("WIDTH"), 0);
    }

    #[test]
    fn test_structured_comparison() {
        let tree = sexp::parse(
            r#"(relational_expression left:(identifier count) operator:"=" right:(bit_string_literal "x\"FF\""))"#,
        )
        .unwrap();
        let got = comparisons(tree.root(), &site(), &TestNames::with(&["count"]));
        assert_eq!(got.len(), 1);
        let c = &got[0];
        assert_eq!(c.left, "count");
        assert_eq!(c.operator, "=");
        assert!(c.is_literal);
        assert_eq!(c.literal_bits, 8);
        assert_eq!(c.result_drives.as_deref(), Some("hit"));
        assert_eq!(c.in_process, "p_ctrl");
    }

    #[test]
    fn test_comparison_from_text() {
        let tree = sexp::parse(r#"(relational_expression "rst_n = '0'")"#).unwrap();
        let rel = relation(tree.root(), &TestNames::default()).unwrap();
        assert_eq!(rel.left, "rst_n");
        assert_eq!(rel.operator, "=");
        assert_eq!(rel.right, "'0'");
        assert!(rel.right_is_literal);

        let tree = sexp::parse(r#"(relational_expression "a /= b")"#).unwrap();
        let rel = relation(tree.root(), &TestNames::default()).unwrap();
        assert_eq!(rel.operator, "/=");
        assert!(!rel.right_is_literal);
    }

    #[test]
    fn test_arithmetic_ops_carry_guard() {
        let tree = sexp::parse(
            "(multiplicative_expression left:(identifier a) operator:* right:(identifier b))",
        )
        .unwrap();
        let mut s = site();
        s.guard = Some("en".into());
        let ops = arithmetic_ops(tree.root(), &s, &TestNames::with(&["a", "b"]));
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operator, "*");
        assert_eq!(ops[0].operands, vec!["a", "b"]);
        assert!(ops[0].is_guarded);
        assert_eq!(ops[0].guard_signal.as_deref(), Some("en"));
        assert_eq!(ops[0].result.as_deref(), Some("hit"));
    }

    #[test]
    fn test_cheap_operators_are_ignored() {
        let tree = sexp::parse(
            "(multiplicative_expression left:(identifier a) operator:& right:(identifier b))",
        )
        .unwrap();
        assert!(arithmetic_ops(tree.root(), &site(), &TestNames::default()).is_empty());
    }
}
