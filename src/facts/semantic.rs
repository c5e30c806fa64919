//! Derived facts produced by the semantic analyzers.

use serde::{Deserialize, Serialize};

use super::behavior::{ClockEdge, ResetPolarity};

/// Registers written under one clock by one process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockDomain {
    pub clock: String,
    pub edge: ClockEdge,
    pub registers: Vec<String>,
    pub process: String,
    pub in_arch: String,
    pub line: usize,
}

/// Reset detected in a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetInfo {
    pub signal: String,
    pub polarity: ResetPolarity,
    pub is_async: bool,
    pub registers: Vec<String>,
    pub process: String,
    pub in_arch: String,
    pub line: usize,
}

/// One read or write of a signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalUsage {
    pub signal: String,
    pub is_read: bool,
    pub is_written: bool,
    /// Process label, empty for concurrent statements and port maps.
    pub in_process: String,
    pub in_port_map: bool,
    pub instance_name: String,
    pub in_arch: String,
    pub line: usize,
}

/// A relational comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub left: String,
    pub operator: String,
    pub right: String,
    pub is_literal: bool,
    pub literal_value: Option<String>,
    pub literal_bits: u32,
    /// Signal assigned by the statement the comparison sits in.
    pub result_drives: Option<String>,
    pub in_process: String,
    pub in_arch: String,
    pub line: usize,
}

/// An expensive arithmetic operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArithmeticOp {
    pub operator: String,
    pub operands: Vec<String>,
    pub result: Option<String>,
    pub is_guarded: bool,
    pub guard_signal: Option<String>,
    pub in_process: String,
    pub in_arch: String,
    pub line: usize,
}

/// A read-to-write dependency edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalDep {
    pub source: String,
    pub target: String,
    /// Process label, empty for concurrent assignments.
    pub in_process: String,
    /// True when the edge passes through a register.
    pub is_sequential: bool,
    pub in_arch: String,
    pub line: usize,
}

/// A signal written under one clock and read under another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CdcCrossing {
    pub signal: String,
    pub source_clock: String,
    pub source_process: String,
    pub dest_clock: String,
    pub dest_process: String,
    pub is_synchronized: bool,
    pub sync_stages: u32,
    pub is_multi_bit: bool,
    pub in_arch: String,
    /// Line of the reading process.
    pub line: usize,
}
