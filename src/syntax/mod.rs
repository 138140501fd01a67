use thiserror::Error;

use crate::ast::{Pos, Program, Span};

mod lexer;
mod parser;

pub use lexer::{lex, Token, TokenKind};

/// Which syntax extensions are enabled for a file, chosen from its extension
/// by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `.djs`: the plain syntax
    Plain,
    /// `.djsx`: plain syntax plus bracket elements in expression position
    Jsx,
    /// `.djts`: plain syntax plus `: Type` annotations, parsed and discarded
    Typed,
}

/// Extensions of eligible source files, in the same order as [Dialect]
pub const EXTENSIONS: [&str; 3] = ["djs", "djsx", "djts"];

impl Dialect {
    pub fn of_extension(extension: &str) -> Option<Dialect> {
        match extension {
            "djs" => Some(Dialect::Plain),
            "djsx" => Some(Dialect::Jsx),
            "djts" => Some(Dialect::Typed),
            _ => None,
        }
    }

    pub fn jsx(&self) -> bool {
        matches!(self, Dialect::Jsx)
    }

    pub fn typed(&self) -> bool {
        matches!(self, Dialect::Typed)
    }
}

/// Fatal for the file: the source can't be turned into a tree. Carries the
/// offending position and the source line, so the driver can surface both.
#[derive(Debug, Clone, Error)]
#[error("{pos}: {message}")]
pub struct ParseError {
    pub pos: Pos,
    pub message: String,
    /// The full source line containing `pos`, for the surfaced diagnostic
    pub excerpt: String,
}

impl ParseError {
    pub(crate) fn new(pos: Pos, message: String, source: &str) -> Self {
        let excerpt = source
            .lines()
            .nth(pos.line.saturating_sub(1) as usize)
            .unwrap_or("")
            .to_owned();
        Self { pos, message, excerpt }
    }

    pub fn span(&self) -> Span {
        Span { start: self.pos, end: self.pos }
    }
}

/// Parse one source unit with the given dialect
pub fn parse(source: &str, dialect: Dialect) -> Result<Program, ParseError> {
    let tokens = lexer::lex(source)?;
    parser::Parser::new(source, tokens, dialect).program()
}
