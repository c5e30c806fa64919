//! Built-in names that are never signal reads.
//!
//! Conversion functions, standard-library subprograms, edge functions and
//! predefined values. Lookups are on lowercase names.

use phf::phf_set;

static BUILTIN_FUNCTIONS: phf::Set<&'static str> = phf_set! {
    // Edge detection
    "rising_edge",
    "falling_edge",
    // numeric_std / std_logic_1164 conversions
    "to_unsigned",
    "to_signed",
    "to_integer",
    "to_natural",
    "resize",
    "unsigned",
    "signed",
    "std_logic_vector",
    "std_ulogic_vector",
    "bit_vector",
    "to_stdlogicvector",
    "to_stdulogicvector",
    "to_slv",
    "to_bitvector",
    "to_bit",
    "to_x01",
    "to_x01z",
    "to_ux01",
    "to_01",
    "is_x",
    "std_match",
    "shift_left",
    "shift_right",
    "rotate_left",
    "rotate_right",
    "find_leftmost",
    "find_rightmost",
    // std_logic_arith legacy
    "conv_integer",
    "conv_unsigned",
    "conv_signed",
    "conv_std_logic_vector",
    "ext",
    "sxt",
    // Reductions (VHDL-2008 and legacy)
    "and_reduce",
    "or_reduce",
    "xor_reduce",
    "nand_reduce",
    "nor_reduce",
    "xnor_reduce",
    // Type conversions by type mark
    "integer",
    "natural",
    "positive",
    "real",
    "boolean",
    "character",
    "string",
    "time",
    // math_real and friends
    "minimum",
    "maximum",
    "ceil",
    "floor",
    "round",
    "trunc",
    "log2",
    "sqrt",
    "uniform",
    "to_real",
    // fixed/float packages
    "to_sfixed",
    "to_ufixed",
    "to_float",
    // textio
    "to_string",
    "to_hstring",
    "to_ostring",
    "to_bstring",
    "endfile",
    "readline",
    "writeline",
    "read",
    "write",
    "hread",
    "hwrite",
    "oread",
    "owrite",
    // Predefined values
    "now",
    "true",
    "false",
    "null",
};

/// Whether `lower` names a built-in function, conversion or predefined value.
pub fn is_builtin(lower: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(lower)
}
