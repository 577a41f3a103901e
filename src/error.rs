//! Error types for pleat decoding.
//!
//! Every failure is reported as a single [`Error`]: the first point at which the
//! document stopped making sense. There is no partial-result mode.
//!
//! ## Error Categories
//!
//! - **Unhandled characters**: no state accepted the character at all
//! - **Invalid characters**: a state rejected the character with a named expectation
//! - **Malformed literals**: a number, escape, signature or heredoc failed its shape check
//! - **Indent mismatches**: closing collections did not land on the requested column
//! - **Structural violations**: nested arrays, keys inside sequences, values where keys belong
//!
//! ## Error Context
//!
//! Errors raised while reading characters carry the row/column of the offending
//! character, the number of characters consumed before it and a short window of
//! the input that was not consumed yet. Errors raised by the document decoder
//! carry the position of the token that triggered them.
//!
//! ## Examples
//!
//! ```rust
//! use serde_pleat::{decode_str, ErrorKind};
//!
//! let err = decode_str("a: 1\n b: 2").unwrap_err();
//! assert!(matches!(err.kind(), ErrorKind::IndentMismatch { .. }));
//! assert!(err.to_string().contains("line 2"));
//! ```

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// A zero-based position in the source text.
///
/// `col` counts the characters before the position on its line, which is also
/// the indentation signal the document decoder works with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Pos { row, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.row + 1, self.col + 1)
    }
}

/// The literal sub-grammar a [`ErrorKind::Malformed`] error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Literal {
    Number,
    Escape,
    Signature,
    Heredoc,
    String,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Literal::Number => "number",
            Literal::Escape => "escape sequence",
            Literal::Signature => "signature",
            Literal::Heredoc => "heredoc",
            Literal::String => "string",
        })
    }
}

/// What went wrong, independent of where it happened.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// No state accepted the character.
    #[error("unhandled character {0}")]
    UnhandledChar(String),

    /// A state rejected the character explicitly.
    #[error("invalid character {found}, expected {expected}")]
    InvalidChar {
        found: String,
        expected: Cow<'static, str>,
    },

    #[error("malformed {literal}: {detail}")]
    Malformed { literal: Literal, detail: String },

    /// Closing collections did not land on a frame at the requested column.
    #[error("indent mismatch: expected column {expected}, found column {found}")]
    IndentMismatch { expected: usize, found: usize },

    #[error("nested inline arrays are not supported")]
    NestedArray,

    #[error("keyed element inside a sequence")]
    KeyInSequence,

    #[error("indexed element inside a map")]
    IndexInMap,

    /// A value was supplied where a key was expected.
    #[error("expected a key, found {0}")]
    ExpectedKey(&'static str),

    /// A key or punctuation was supplied where a value was expected.
    #[error("expected a value, found {0}")]
    ExpectedValue(&'static str),

    #[error("expected ',' or ']', found {0}")]
    ExpectedSeparator(&'static str),

    #[error("unexpected {0} after the document value")]
    TrailingValue(&'static str),

    #[error("inline array is not closed")]
    UnclosedArray,

    #[error("nesting exceeds the limit of {0} collections")]
    DepthLimit(usize),

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(Cow<'static, str>),

    #[error(
        "could not parse word {0:?}: strings must be quoted, booleans must be exactly \
         `true` or `false`, and keys must start with a letter and end with a colon"
    )]
    BadWord(String),

    /// A jump escaped every labelled chain.
    #[error("jump to unknown label `{0}`")]
    UnresolvedJump(&'static str),

    /// The decoded shape does not fit the requested Rust type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Custom(String),
}

/// A decoding error, tagged with as much location information as was known
/// at the point of failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    pos: Option<Pos>,
    offset: Option<usize>,
    near: Option<String>,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            pos: None,
            offset: None,
            near: None,
        }
    }

    /// The character was not accepted by any state.
    pub fn unhandled(ch: Option<char>) -> Self {
        Error::new(ErrorKind::UnhandledChar(describe(ch)))
    }

    /// The character broke a specific grammar rule.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_pleat::Error;
    ///
    /// let err = Error::invalid(Some('\n'), "a closing quote");
    /// assert_eq!(err.to_string(), "invalid character <newline>, expected a closing quote");
    /// ```
    pub fn invalid(ch: Option<char>, expected: impl Into<Cow<'static, str>>) -> Self {
        Error::new(ErrorKind::InvalidChar {
            found: describe(ch),
            expected: expected.into(),
        })
    }

    pub fn malformed(literal: Literal, detail: impl Into<String>) -> Self {
        Error::new(ErrorKind::Malformed {
            literal,
            detail: detail.into(),
        })
    }

    pub fn eof(expected: impl Into<Cow<'static, str>>) -> Self {
        Error::new(ErrorKind::UnexpectedEof(expected.into()))
    }

    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::new(ErrorKind::Custom(msg.to_string()))
    }

    /// Creates an I/O error for reading failures.
    pub fn io(msg: &str) -> Self {
        Error::new(ErrorKind::Io(msg.to_string()))
    }

    /// Tags the error with a source position, replacing any previous one.
    #[must_use]
    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Fills in whatever location details are still missing.
    pub(crate) fn locate(mut self, pos: Pos, offset: usize, near: String) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos);
        }
        if self.offset.is_none() {
            self.offset = Some(offset);
        }
        if self.near.is_none() && !near.is_empty() {
            self.near = Some(near);
        }
        self
    }

    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn pos(&self) -> Option<Pos> {
        self.pos
    }

    /// Characters consumed before the failure.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Unconsumed input following the failure point.
    #[must_use]
    pub fn near(&self) -> Option<&str> {
        self.near.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(pos) = self.pos {
            write!(f, " at {}", pos)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset {})", offset)?;
        }
        if let Some(near) = &self.near {
            write!(f, ", near {:?}", near)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::custom(msg)
    }

    fn invalid_type(unexp: serde::de::Unexpected, exp: &dyn serde::de::Expected) -> Self {
        Error::new(ErrorKind::TypeMismatch {
            expected: format!("{}", exp),
            found: unexp.to_string(),
        })
    }
}

/// Renders a character (or the end of input) for error messages.
pub(crate) fn describe(ch: Option<char>) -> String {
    match ch {
        None => "<end of input>".to_string(),
        Some('\n') => "<newline>".to_string(),
        Some('\r') => "<carriage return>".to_string(),
        Some('\t') => "<tab>".to_string(),
        Some(' ') => "<space>".to_string(),
        Some(c) if c.is_control() => format!("U+{:04X}", c as u32),
        Some(c) => format!("'{}'", c),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
