//! vhdl-facts - semantic fact extraction for VHDL.
//!
//! Walks a concrete syntax tree of one VHDL source file and produces a
//! [`FileFacts`] record: design units, declarations, processes with their
//! clock/reset classification, concurrent assignments, instances, generate
//! statements, and file-level analyses such as clock-domain crossings.
//!
//! # Architecture
//!
//! - `syntax`: parser-independent syntax tree and node vocabulary
//! - `parser`: registry mapping file suffixes to tree readers
//! - `extract`: the per-file traversal that builds fact records
//! - `semantic`: post-traversal analyses (resets, usages, generates, CDC)
//! - `facts`: the fact model and its relational table form
//! - `config`, `cli`, `report`: the command-line application
//!
//! # Adding an Input Format
//!
//! Implement `parser::CstParser` for the format and register it with
//! `parser::register` under its file suffix.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod facts;
pub mod parser;
pub mod report;
pub mod semantic;
pub mod syntax;

pub use config::Config;
pub use error::ExtractError;
pub use extract::{Extractor, FileResult};
pub use facts::{FileFacts, Tables};
pub use parser::{for_extension, for_path, init as init_parsers, CstParser};
pub use syntax::{Node, NodeKind, SyntaxError, SyntaxTree};

/// Initialize all subsystems.
///
/// Call this once at startup.
pub fn init() {
    init_parsers();
}
