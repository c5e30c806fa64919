//! Tree-sitter based parser.
//!
//! No VHDL grammar is bundled. Applications that link one register it for
//! the raw source suffixes they care about:
//!
//! ```ignore
//! vhdl_facts::parser::treesitter::register_language(".vhd", tree_sitter_vhdl::LANGUAGE.into());
//! ```

use tree_sitter::{Language, Parser as TsParser};

use super::{register, CstParser};
use crate::syntax::{treesitter::from_tree, SyntaxTree};

/// Parses raw sources with a tree-sitter grammar.
pub struct TreeSitterParser {
    language: Language,
}

impl TreeSitterParser {
    /// Create a parser for the given grammar.
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl CstParser for TreeSitterParser {
    fn parse(&self, source: &[u8]) -> anyhow::Result<SyntaxTree> {
        let text = std::str::from_utf8(source)?;
        // A fresh parser per call; only the language is shared.
        let mut parser = TsParser::new();
        parser.set_language(&self.language)?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse source"))?;
        Ok(from_tree(&tree, text)?)
    }

    fn name(&self) -> &str {
        "tree-sitter"
    }
}

/// Register a tree-sitter grammar for a source suffix (e.g. ".vhd").
pub fn register_language(suffix: &str, language: Language) {
    register(suffix, move || Box::new(TreeSitterParser::new(language.clone())));
}
