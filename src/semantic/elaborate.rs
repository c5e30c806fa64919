//! Generate elaboration.
//!
//! Folds `for`-generate bounds into iteration counts using a
//! case-insensitive constant map. The evaluator understands decimal
//! integers, based literals (`16#FF#`), constant names and one binary
//! operator (`+ - * /`) per level, applied recursively to both sides.

use std::collections::HashMap;

use crate::facts::{Constant, GenerateScheme, GenerateStatement, Port};

/// Lowercase constant name to value.
pub type ConstantMap = HashMap<String, i64>;

/// Build the constant map from declarations in order; a value may refer to
/// constants declared before it. Generic defaults fill names no constant
/// defines.
pub fn build_constant_map(constants: &[Constant], generics: &[Port]) -> ConstantMap {
    let mut map = ConstantMap::new();
    for constant in constants {
        let Some(value) = constant.value.as_deref() else {
            continue;
        };
        if let Some(v) = evaluate(value, &map) {
            map.insert(constant.name.to_ascii_lowercase(), v);
        }
    }
    for generic in generics {
        let key = generic.name.to_ascii_lowercase();
        if map.contains_key(&key) {
            continue;
        }
        if let Some(v) = generic.default.as_deref().and_then(|d| evaluate(d, &map)) {
            map.insert(key, v);
        }
    }
    map
}

/// Evaluate a bound expression, `None` when it cannot be folded.
pub fn evaluate(expr: &str, constants: &ConstantMap) -> Option<i64> {
    let expr = strip_parens(expr.trim());
    if expr.is_empty() {
        return None;
    }
    if let Some(v) = parse_integer(expr) {
        return Some(v);
    }
    if let Some(v) = constants.get(&expr.to_ascii_lowercase()) {
        return Some(*v);
    }
    evaluate_binary(expr, constants)
}

fn strip_parens(mut expr: &str) -> &str {
    while expr.starts_with('(') && expr.ends_with(')') && balanced(&expr[1..expr.len() - 1]) {
        expr = expr[1..expr.len() - 1].trim();
    }
    expr
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Decimal (with `_` separators) or based literal.
fn parse_integer(text: &str) -> Option<i64> {
    if text.contains('#') {
        return parse_based(text);
    }
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    digits.parse().ok()
}

fn parse_based(text: &str) -> Option<i64> {
    let mut parts = text.split('#');
    let base: u32 = parts.next()?.trim().parse().ok()?;
    if !(2..=16).contains(&base) {
        return None;
    }
    let digits = parts.next()?;
    let mut value: i64 = 0;
    let mut any = false;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        let d = c.to_digit(base)? as i64;
        value = value.checked_mul(base as i64)?.checked_add(d)?;
        any = true;
    }
    any.then_some(value)
}

/// Split at the last top-level occurrence of an operator, lowest
/// precedence first, so `A - B - C` folds left to right.
fn evaluate_binary(expr: &str, constants: &ConstantMap) -> Option<i64> {
    for ops in [['+', '-'], ['*', '/']] {
        let Some((idx, op)) = last_top_level(expr, &ops) else {
            continue;
        };
        let left = evaluate(&expr[..idx], constants)?;
        let right = evaluate(&expr[idx + 1..], constants)?;
        return match op {
            '+' => left.checked_add(right),
            '-' => left.checked_sub(right),
            '*' => left.checked_mul(right),
            '/' if right != 0 => Some(left / right),
            _ => None,
        };
    }
    None
}

/// Last operator outside parentheses that has an operand on its left.
fn last_top_level(expr: &str, ops: &[char]) -> Option<(usize, char)> {
    let mut depth = 0i32;
    let mut found = None;
    let mut prev_operand = false;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if depth == 0 && ops.contains(&c) && prev_operand => found = Some((i, c)),
            _ => {}
        }
        if !c.is_whitespace() {
            prev_operand = !matches!(c, '+' | '-' | '*' | '/' | '(');
        }
    }
    found
}

/// Elaborate one generate. Only `for` generates can succeed; others keep
/// `can_elaborate = false` and `iteration_count = -1`.
pub fn elaborate_generate(generate: &mut GenerateStatement, constants: &ConstantMap) -> bool {
    generate.can_elaborate = false;
    generate.iteration_count = -1;

    let GenerateScheme::For {
        range_low,
        range_high,
        range_dir,
        ..
    } = &generate.scheme
    else {
        return false;
    };
    let (Some(low), Some(high)) = (evaluate(range_low, constants), evaluate(range_high, constants))
    else {
        return false;
    };
    let count = match range_dir.to_ascii_lowercase().as_str() {
        "to" => high - low + 1,
        "downto" => low - high + 1,
        _ => return false,
    };
    if count < 0 {
        return false;
    }
    generate.iteration_count = count;
    generate.can_elaborate = true;
    true
}

/// Elaborate a generate tree. Returns how many generates were elaborated.
pub fn elaborate_all(generates: &mut [GenerateStatement], constants: &ConstantMap) -> usize {
    let mut count = 0;
    for generate in generates.iter_mut() {
        if elaborate_generate(generate, constants) {
            count += 1;
        }
        count += elaborate_all(&mut generate.generates, constants);
    }
    count
}
