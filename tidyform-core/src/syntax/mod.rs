//! Syntax layer for HCL native syntax
//!
//! Splits source text into classified tokens and groups them into a
//! format-preserving tree of bodies, attributes and blocks. Every token of the
//! input survives in the tree, so serializing an unmodified tree reproduces the
//! source exactly.

mod lexer;
mod token;
mod tree;

pub use lexer::lex;
pub use token::{Token, TokenKind, tokens_to_string};
pub use tree::{Attribute, Block, Body, BodyItem, File, parse, parse_tokens};

pub(crate) use token::write_token;

/// Error raised for input that is not valid native syntax
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Invalid token at {line}:{column}: {message}")]
    Lex {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Syntax error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
}

impl SyntaxError {
    pub fn line(&self) -> usize {
        match self {
            SyntaxError::Lex { line, .. } | SyntaxError::Parse { line, .. } => *line,
        }
    }
}
