//! SQL front-end for sqlshape.
//!
//! This module contains the lexer (tokenizer), the concrete syntax tree the
//! normalizer walks, and a recursive-descent parser that turns raw SELECT
//! text into that tree.

pub mod lexer;
pub mod parser;
pub mod tree;

pub use lexer::{Lexeme, Lexer, Token};
pub use parser::Parser;
pub use tree::{Clause, NodeKind, Span, SyntaxNode, SyntaxTree};
