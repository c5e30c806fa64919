//! S-expression syntax trees.
//!
//! A compact, hand-writable rendering of a concrete syntax tree:
//!
//! ```text
//! (design_file
//!   (concurrent_signal_assignment
//!     target:(identifier y) <= (identifier a) when
//!     (relational_expression left:(identifier sel) operator:= right:(character_literal '1'))
//!     else (identifier b) ;))
//! ```
//!
//! - `(kind item ...)` is a named node; `field:` before an item stores it
//!   under that field name.
//! - Bare atoms and `"quoted strings"` are anonymous tokens.
//! - A list whose items are all tokens is a leaf; its text is the tokens
//!   joined by spaces. An empty list `(others)` is a leaf spelled like its
//!   kind.
//! - `//` starts a comment that runs to the end of the line.
//!
//! The source buffer is synthesized from the tokens: single spaces between
//! tokens and a line break after every `;`, so statements land on their own
//! lines.

use super::{RawNode, SyntaxError, SyntaxTree};

/// Parse an s-expression into a syntax tree.
pub fn parse(text: &str) -> Result<SyntaxTree, SyntaxError> {
    let tokens = tokenize(text)?;
    let mut reader = Reader {
        tokens: &tokens,
        pos: 0,
    };
    let root = reader.item()?;
    if let Some(tok) = reader.peek() {
        return Err(SyntaxError::Sexp {
            offset: tok.offset,
            message: "trailing input after root node".to_string(),
        });
    }
    if !matches!(root, Item::List { .. }) {
        return Err(SyntaxError::Sexp {
            offset: 0,
            message: "root must be a list".to_string(),
        });
    }

    let mut emitter = Emitter::default();
    emitter.emit(&root, None);
    SyntaxTree::from_parts(emitter.source, emitter.nodes)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Open,
    Close,
    Atom(String),
    Str(String),
}

#[derive(Debug)]
struct Token {
    tok: Tok,
    offset: usize,
}

fn tokenize(text: &str) -> Result<Vec<Token>, SyntaxError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'(' => {
                tokens.push(Token {
                    tok: Tok::Open,
                    offset: i,
                });
                i += 1;
            }
            b')' => {
                tokens.push(Token {
                    tok: Tok::Close,
                    offset: i,
                });
                i += 1;
            }
            b'"' => {
                let start = i;
                i += 1;
                let mut value = String::new();
                let mut closed = false;
                while i < bytes.len() {
                    match bytes[i] {
                        b'\\' if i + 1 < bytes.len() => {
                            let Some(ch) = text[i + 1..].chars().next() else {
                                break;
                            };
                            value.push(ch);
                            i += 1 + ch.len_utf8();
                        }
                        b'"' => {
                            closed = true;
                            i += 1;
                            break;
                        }
                        _ => {
                            let Some(ch) = text[i..].chars().next() else {
                                break;
                            };
                            value.push(ch);
                            i += ch.len_utf8();
                        }
                    }
                }
                if !closed {
                    return Err(SyntaxError::Sexp {
                        offset: start,
                        message: "unterminated string".to_string(),
                    });
                }
                tokens.push(Token {
                    tok: Tok::Str(value),
                    offset: start,
                });
            }
            _ => {
                let start = i;
                while i < bytes.len() {
                    let b = bytes[i];
                    if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' | b'"') {
                        break;
                    }
                    // A field prefix ends right after its colon.
                    if b == b':' && i > start && is_field_start(&text[start..i]) {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                tokens.push(Token {
                    tok: Tok::Atom(text[start..i].to_string()),
                    offset: start,
                });
            }
        }
    }
    Ok(tokens)
}

fn is_field_start(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug)]
enum Item {
    List {
        field: Option<String>,
        kind: String,
        items: Vec<Item>,
    },
    Token {
        field: Option<String>,
        text: String,
    },
}

impl Item {
    fn is_plain_token(&self) -> bool {
        matches!(self, Item::Token { field: None, .. })
    }
}

struct Reader<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn eof_error(&self) -> SyntaxError {
        SyntaxError::Sexp {
            offset: self.tokens.last().map(|t| t.offset).unwrap_or(0),
            message: "unexpected end of input".to_string(),
        }
    }

    fn item(&mut self) -> Result<Item, SyntaxError> {
        let tok = self.next().ok_or_else(|| self.eof_error())?;
        match &tok.tok {
            Tok::Atom(a) if a.len() > 1 && a.ends_with(':') && is_field_start(&a[..a.len() - 1]) => {
                let field = a[..a.len() - 1].to_string();
                let mut inner = self.item()?;
                match &mut inner {
                    Item::List { field: f, .. } | Item::Token { field: f, .. } => {
                        *f = Some(field);
                    }
                }
                Ok(inner)
            }
            Tok::Atom(a) => Ok(Item::Token {
                field: None,
                text: a.clone(),
            }),
            Tok::Str(s) => Ok(Item::Token {
                field: None,
                text: s.clone(),
            }),
            Tok::Open => {
                let head = self.next().ok_or_else(|| self.eof_error())?;
                let kind = match &head.tok {
                    Tok::Atom(a) => a.clone(),
                    _ => {
                        return Err(SyntaxError::Sexp {
                            offset: head.offset,
                            message: "expected node kind after '('".to_string(),
                        })
                    }
                };
                let mut items = Vec::new();
                loop {
                    match self.peek() {
                        None => return Err(self.eof_error()),
                        Some(Token {
                            tok: Tok::Close, ..
                        }) => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => items.push(self.item()?),
                    }
                }
                Ok(Item::List {
                    field: None,
                    kind,
                    items,
                })
            }
            Tok::Close => Err(SyntaxError::Sexp {
                offset: tok.offset,
                message: "unbalanced ')'".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct Emitter {
    source: String,
    row: usize,
    nodes: Vec<RawNode>,
}

impl Emitter {
    /// Append a chunk of text, returning (start, end, row).
    fn append(&mut self, text: &str) -> (usize, usize, usize) {
        if !self.source.is_empty() && !self.source.ends_with('\n') {
            self.source.push(' ');
        }
        let start = self.source.len();
        let row = self.row;
        self.source.push_str(text);
        let end = self.source.len();
        self.row += text.matches('\n').count();
        if text == ";" {
            self.source.push('\n');
            self.row += 1;
        }
        (start, end, row)
    }

    fn emit(&mut self, item: &Item, field: Option<String>) -> usize {
        match item {
            Item::Token { text, field: own } => {
                let mut node = RawNode::new(text, false, own.clone().or(field));
                let (start, end, row) = self.append(text);
                node.start_byte = start;
                node.end_byte = end;
                node.start_row = row;
                self.nodes.push(node);
                self.nodes.len() - 1
            }
            Item::List {
                field: own,
                kind,
                items,
            } => {
                let field = own.clone().or(field);
                let id = self.nodes.len();
                self.nodes.push(RawNode::new(kind, true, field));

                if items.iter().all(Item::is_plain_token) {
                    let text = if items.is_empty() {
                        kind.clone()
                    } else {
                        items
                            .iter()
                            .filter_map(|i| match i {
                                Item::Token { text, .. } => Some(text.as_str()),
                                Item::List { .. } => None,
                            })
                            .collect::<Vec<_>>()
                            .join(" ")
                    };
                    let (start, end, row) = self.append(&text);
                    let node = &mut self.nodes[id];
                    node.start_byte = start;
                    node.end_byte = end;
                    node.start_row = row;
                    return id;
                }

                let children: Vec<usize> = items.iter().map(|i| self.emit(i, None)).collect();
                let (start, row) = children
                    .first()
                    .map(|&c| (self.nodes[c].start_byte, self.nodes[c].start_row))
                    .unwrap_or((self.source.len(), self.row));
                let end = children
                    .last()
                    .map(|&c| self.nodes[c].end_byte)
                    .unwrap_or(start);
                let node = &mut self.nodes[id];
                node.start_byte = start;
                node.end_byte = end;
                node.start_row = row;
                node.children = children;
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::NodeKind;

    #[test]
    fn test_parse_builds_fields_and_text() {
        let tree = parse(
            r#"(design_file
                 (concurrent_signal_assignment
                   target:(identifier y) <= (identifier a) and (identifier b) ;))"#,
        )
        .unwrap();
        let root = tree.root();
        assert_eq!(root.kind(), NodeKind::DesignFile);

        let assign = root.child(0).unwrap();
        assert_eq!(assign.kind(), NodeKind::ConcurrentSignalAssignment);
        assert_eq!(assign.text(), "y <= a and b ;");
        assert_eq!(assign.child_by_field_name("target").unwrap().text(), "y");
        assert_eq!(assign.named_children().count(), 3);
    }

    #[test]
    fn test_semicolons_break_lines() {
        let tree = parse(
            r#"(design_file
                 (signal_declaration signal (identifier a) : type:(subtype_indication std_logic) ;)
                 (signal_declaration signal (identifier b) : type:(subtype_indication std_logic) ;))"#,
        )
        .unwrap();
        let decls: Vec<_> = tree.root().named_children().collect();
        assert_eq!(decls[0].line(), 1);
        assert_eq!(decls[1].line(), 2);
    }

    #[test]
    fn test_quoted_strings_and_escapes() {
        let tree = parse(r#"(design_file (bit_string_literal "X\"FF\""))"#).unwrap();
        let lit = tree.root().child(0).unwrap();
        assert_eq!(lit.kind(), NodeKind::BitStringLiteral);
        assert_eq!(lit.text(), "X\"FF\"");
    }

    #[test]
    fn test_escaped_multibyte_characters() {
        let tree = parse("(design_file \"\\é\")").unwrap();
        assert_eq!(tree.root().text(), "é");

        let tree = parse("(design_file (string_literal \"\\\"ü\\\"\"))").unwrap();
        assert_eq!(tree.root().child(0).unwrap().text(), "\"ü\"");

        assert!(parse("(design_file \"\\é").is_err());
    }

    #[test]
    fn test_empty_list_is_spelled_like_its_kind() {
        let tree = parse("(case_choice (others))").unwrap();
        let others = tree.root().child(0).unwrap();
        assert_eq!(others.kind(), NodeKind::Others);
        assert_eq!(others.text(), "others");
    }

    #[test]
    fn test_comments_are_skipped() {
        let tree = parse("// header\n(design_file // trailing\n (identifier a))").unwrap();
        assert_eq!(tree.root().child(0).unwrap().text(), "a");
    }

    #[test]
    fn test_unbalanced_input_is_rejected() {
        assert!(parse("(design_file (identifier a)").is_err());
        assert!(parse("(design_file))").is_err());
        assert!(parse("\"just a token\"").is_err());
        assert!(parse("(design_file \"open").is_err());
    }
}
