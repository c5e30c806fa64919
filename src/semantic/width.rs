//! Bit-width estimation from type text.
//!
//! Returns 0 for "unknown" and never guesses: parameterized bounds,
//! unconstrained numeric types and user types are all unknown.

use once_cell::sync::Lazy;
use regex::Regex;

static VECTOR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\(\s*(\d+)\s+(?:downto|to)\s+(\d+)\s*\)\s*$").unwrap()
});

static INTEGER_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:integer|natural|positive)\s+range\s+(-?\d+)\s+(?:downto|to)\s+(-?\d+)$")
        .unwrap()
});

const SCALARS: [&str; 4] = ["std_logic", "std_ulogic", "bit", "boolean"];
const VECTORS: [&str; 5] = [
    "std_logic_vector",
    "std_ulogic_vector",
    "bit_vector",
    "unsigned",
    "signed",
];

/// Strip a library/package prefix (`ieee.numeric_std.unsigned`).
fn type_mark(lower: &str) -> &str {
    let head = lower.split('(').next().unwrap_or(lower).trim();
    head.rsplit('.').next().unwrap_or(head)
}

/// Estimated width in bits, 0 when unknown.
pub fn estimate_width(type_text: &str) -> u32 {
    let lower = type_text.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return 0;
    }
    let mark = type_mark(&lower);

    if SCALARS.contains(&mark) && !lower.contains('(') {
        return 1;
    }

    if VECTORS.contains(&mark) {
        return match VECTOR_RANGE.captures(&lower) {
            Some(caps) => {
                let (Ok(high), Ok(low)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) else {
                    return 0;
                };
                // Widths that do not fit in u32 are unknown.
                high.abs_diff(low)
                    .checked_add(1)
                    .and_then(|w| u32::try_from(w).ok())
                    .unwrap_or(0)
            }
            None => 0,
        };
    }

    if let Some(caps) = INTEGER_RANGE.captures(&lower) {
        let (Ok(a), Ok(b)) = (caps[1].parse::<i64>(), caps[2].parse::<i64>()) else {
            return 0;
        };
        return match a.abs_diff(b).checked_add(1) {
            Some(values) => bits_for_values(values),
            None => 64,
        };
    }

    0
}

/// ceil(log2(values)), at least 1.
fn bits_for_values(values: u64) -> u32 {
    if values <= 2 {
        return 1;
    }
    64 - (values - 1).leading_zeros()
}

/// Whether a type names a vector-like (possibly multi-bit) type.
pub fn is_vector_type(type_text: &str) -> bool {
    let lower = type_text.trim().to_ascii_lowercase();
    VECTORS.contains(&type_mark(&lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_types() {
        assert_eq!(estimate_width("std_logic"), 1);
        assert_eq!(estimate_width("STD_ULOGIC"), 1);
        assert_eq!(estimate_width("bit"), 1);
        assert_eq!(estimate_width("boolean"), 1);
    }

    #[test]
    fn test_vector_ranges() {
        assert_eq!(estimate_width("std_logic_vector(7 downto 0)"), 8);
        assert_eq!(estimate_width("unsigned(0 to 15)"), 16);
        assert_eq!(estimate_width("signed(15 downto 8)"), 8);
        assert_eq!(estimate_width("ieee.numeric_std.unsigned(3 downto 0)"), 4);
        assert_eq!(estimate_width("std_logic_vector (31 downto 0)"), 32);
        assert_eq!(estimate_width("std_logic_vector(4294967295 downto 1)"), u32::MAX);
    }

    #[test]
    fn test_oversized_bounds_are_unknown() {
        assert_eq!(estimate_width("std_logic_vector(4294967296 downto 0)"), 0);
        assert_eq!(estimate_width("std_logic_vector(99999999999999999999 downto 0)"), 0);
        assert_eq!(
            estimate_width("integer range -9223372036854775808 to 9223372036854775807"),
            64
        );
        assert_eq!(estimate_width("integer range 0 to 99999999999999999999"), 0);
    }

    #[test]
    fn test_parameterized_is_unknown() {
        assert_eq!(estimate_width("std_logic_vector(WIDTH-1 downto 0)"), 0);
        assert_eq!(estimate_width("unsigned"), 0);
        assert_eq!(estimate_width("integer"), 0);
        assert_eq!(estimate_width("state_t"), 0);
        assert_eq!(estimate_width(""), 0);
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(estimate_width("integer range 0 to 255"), 8);
        assert_eq!(estimate_width("natural range 0 to 7"), 3);
        assert_eq!(estimate_width("natural range 0 to 8"), 4);
        assert_eq!(estimate_width("integer range 0 to 1"), 1);
        assert_eq!(estimate_width("integer range 0 to MAX"), 0);
    }

    #[test]
    fn test_is_vector_type() {
        assert!(is_vector_type("std_logic_vector(WIDTH-1 downto 0)"));
        assert!(is_vector_type("UNSIGNED"));
        assert!(!is_vector_type("std_logic"));
    }
}
