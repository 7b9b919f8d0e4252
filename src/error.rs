use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while turning bytes into tokens. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("invalid number '{lexeme}' at line {line}, column {column}")]
    InvalidNumber {
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedChar {
        ch: char,
        line: usize,
        column: usize,
    },
}

/// Errors produced while turning tokens into a tree value. Each variant
/// carries a description of the offending token and its position.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("nothing to parse")]
    Empty,

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("expected string key in object, got {found} at line {line}, column {column}")]
    NonStringKey {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("expected ':' after object key, got {found} at line {line}, column {column}")]
    MissingColon {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("expected closing brace, got {found} at line {line}, column {column}")]
    MissingBrace {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("expected closing bracket, got {found} at line {line}, column {column}")]
    MissingBracket {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("unexpected {found} at line {line}, column {column}")]
    UnexpectedToken {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("number '{lexeme}' does not fit in a 64-bit float at line {line}, column {column}")]
    InvalidNumber {
        lexeme: String,
        line: usize,
        column: usize,
    },
}

/// Errors produced while converting between tree values and typed records.
/// Each variant names the dotted/bracketed path of the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("type mismatch at {}: {detail}", path_or_root(.path))]
    TypeMismatch { path: String, detail: String },

    #[error("number {number} overflows {target} at {}", path_or_root(.path))]
    Overflow {
        path: String,
        number: f64,
        target: &'static str,
    },

    #[error("unsupported kind {kind} at {}", path_or_root(.path))]
    UnsupportedType { path: String, kind: String },

    #[error("map key must be a string at {}", path_or_root(.path))]
    InvalidKey { path: String },

    #[error("{0}")]
    Custom(String),
}

fn path_or_root(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

impl serde::ser::Error for MapError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        MapError::Custom(msg.to_string())
    }
}

impl serde::de::Error for MapError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        MapError::Custom(msg.to_string())
    }
}

/// Any error a load or write can produce. Decode errors are fatal to the
/// load that raised them; merges already committed for earlier files are
/// not rolled back.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error("merge failed: {source}")]
    Merge { source: MapError },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("no codec registered for format '{0}'")]
    UnknownFormat(String),

    #[error("{0}")]
    Message(String),
}
