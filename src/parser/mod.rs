//! Parser boundary.
//!
//! This module provides:
//! - `CstParser` trait: anything that turns a source buffer into a [`SyntaxTree`]
//! - A factory registry keyed by file suffix
//! - Readers for s-expression (`.sexp`) and JSON (`.json`) tree dumps
//! - A tree-sitter adapter for caller-supplied grammars (feature `tree-sitter`)

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::syntax::{self, SyntaxTree};

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

/// Produces a concrete syntax tree from a source buffer.
pub trait CstParser: Send + Sync {
    /// Parse one source buffer.
    fn parse(&self, source: &[u8]) -> anyhow::Result<SyntaxTree>;

    /// Short name used in logs (e.g., "sexp", "json").
    fn name(&self) -> &str;
}

/// Reads the s-expression tree format.
pub struct SexpParser;

impl CstParser for SexpParser {
    fn parse(&self, source: &[u8]) -> anyhow::Result<SyntaxTree> {
        let text = std::str::from_utf8(source)?;
        Ok(syntax::sexp::parse(text)?)
    }

    fn name(&self) -> &str {
        "sexp"
    }
}

/// Reads JSON tree dumps.
pub struct JsonParser;

impl CstParser for JsonParser {
    fn parse(&self, source: &[u8]) -> anyhow::Result<SyntaxTree> {
        let text = std::str::from_utf8(source)?;
        Ok(syntax::json::parse(text)?)
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Factory function type for creating parser instances.
pub type ParserFactory = Arc<dyn Fn() -> Box<dyn CstParser> + Send + Sync>;

lazy_static::lazy_static! {
    /// Global parser registry mapping file suffixes to parser factories.
    static ref REGISTRY: RwLock<HashMap<String, ParserFactory>> = RwLock::new(HashMap::new());
}

/// Register a parser factory for a file suffix.
/// The suffix should include the dot (e.g., ".sexp", ".cst.json").
pub fn register<F>(suffix: &str, factory: F)
where
    F: Fn() -> Box<dyn CstParser> + Send + Sync + 'static,
{
    let mut registry = REGISTRY.write().unwrap();
    registry.insert(suffix.to_ascii_lowercase(), Arc::new(factory));
}

/// Get a parser for the given suffix.
/// Returns None if no parser is registered for it.
pub fn for_extension(suffix: &str) -> Option<Box<dyn CstParser>> {
    let registry = REGISTRY.read().unwrap();
    registry
        .get(&suffix.to_ascii_lowercase())
        .map(|factory| factory())
}

/// Get a parser for a path, matching the longest registered suffix.
pub fn for_path(path: &Path) -> Option<Box<dyn CstParser>> {
    let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
    let registry = REGISTRY.read().unwrap();
    registry
        .iter()
        .filter(|(suffix, _)| name.ends_with(suffix.as_str()))
        .max_by_key(|(suffix, _)| suffix.len())
        .map(|(_, factory)| factory())
}

/// Whether some parser handles this path.
pub fn is_supported(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy().to_ascii_lowercase();
    let registry = REGISTRY.read().unwrap();
    registry.keys().any(|suffix| name.ends_with(suffix.as_str()))
}

/// Return all registered suffixes, sorted.
pub fn supported_extensions() -> Vec<String> {
    let registry = REGISTRY.read().unwrap();
    let mut suffixes: Vec<String> = registry.keys().cloned().collect();
    suffixes.sort();
    suffixes
}

/// Initialize the registry with the built-in tree readers.
/// Call this once at startup before using parsers; repeated calls are harmless.
pub fn init() {
    register(".sexp", || Box::new(SexpParser));
    register(".json", || Box::new(JsonParser));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockParser;

    impl CstParser for MockParser {
        fn parse(&self, _source: &[u8]) -> anyhow::Result<SyntaxTree> {
            Ok(syntax::sexp::parse("(design_file)")?)
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_registry() {
        register(".mock", || Box::new(MockParser));

        let parser = for_extension(".mock").expect("mock parser registered");
        assert_eq!(parser.name(), "mock");
        let tree = parser.parse(b"anything").unwrap();
        assert_eq!(tree.root().tag(), "design_file");
    }

    #[test]
    fn test_unregistered_extension() {
        assert!(for_extension(".unknown").is_none());
        assert!(for_path(Path::new("design.unknown")).is_none());
    }

    #[test]
    fn test_longest_suffix_wins() {
        init();
        register(".cst.json", || Box::new(MockParser));

        let parser = for_path(Path::new("dir/top.cst.json")).unwrap();
        assert_eq!(parser.name(), "mock");
        let parser = for_path(Path::new("dir/TOP.JSON")).unwrap();
        assert_eq!(parser.name(), "json");
        assert!(is_supported(Path::new("a.sexp")));
    }

    #[test]
    fn test_builtin_readers() {
        let tree = SexpParser.parse(b"(design_file (identifier a))").unwrap();
        assert_eq!(tree.root().child(0).unwrap().text(), "a");
        assert!(JsonParser.parse(b"not json").is_err());
        assert!(SexpParser.parse(&[0xff, 0xfe]).is_err());
    }
}
