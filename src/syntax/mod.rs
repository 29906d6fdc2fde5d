//! Java front end: lexer, parser and the parent-linked syntax tree

pub mod lexer;
pub mod parser;
pub mod tree;

pub use parser::ParseError;
pub use tree::{
    Import, LiteralKind, NodeId, NodeKind, Span, SyntaxNode, SyntaxTree, TypeKind, TypeName,
    MAX_ANCESTOR_DEPTH,
};
