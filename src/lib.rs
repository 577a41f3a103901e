//! # serde_pleat
//!
//! A Serde-compatible decoder for pleat, an indentation-sensitive structured
//! text format.
//!
//! ## What is pleat?
//!
//! Pleat describes maps, sequences and scalars the way block-style YAML does,
//! with a smaller and stricter grammar:
//!
//! - **Keys are signatures**: one or more words, each ending in a colon
//!   (`name:`, `first name:`, `outer:inner:`)
//! - **Sequences** use `- ` markers; **inline arrays** use `[a, b]`
//! - **Strings are always quoted**: `'folded'`, `"with \t escapes"`, or
//!   `` `raw` ``. Tripling the quote opens a heredoc
//! - **Indentation is structural**, measured in raw character columns
//! - **Comments** start with `#` and run to the end of the line
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! serde_pleat = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_pleat::from_str;
//!
//! #[derive(Deserialize, PartialEq, Debug)]
//! struct Config {
//!     name: String,
//!     retries: u8,
//!     hosts: Vec<String>,
//!     motd: String,
//! }
//!
//! let doc = r#"
//! ## service settings
//! name: "edge"
//! retries: 3
//! hosts:
//!   - "a.example"
//!   - "b.example"
//! motd: """
//!   Welcome.
//!   Be kind.
//!   """
//! "#;
//!
//! let config: Config = from_str(doc).unwrap();
//! assert_eq!(config.hosts.len(), 2);
//! assert_eq!(config.motd, "Welcome. Be kind.");
//! ```
//!
//! ### Dynamic Values
//!
//! ```rust
//! use serde_pleat::{decode_str, value};
//!
//! let decoded = decode_str("Field:\n  Next: 5").unwrap();
//! assert_eq!(decoded, value!({ "Field:": { "Next:": 5 } }));
//! ```
//!
//! ## How decoding works
//!
//! Every stage is a character-driven automaton built from the combinators in
//! [`state`]. The [`driver`] feeds characters into the [`token`]izer, whose
//! literal sub-grammars live in [`lex`]. Tokens stream into the [`decode`]r,
//! which tracks open collections by indentation column and hands entries to
//! pluggable [`builder`]s. Comment hooks are described in [`comment`].
//!
//! ## Errors
//!
//! Decoding stops at the first problem. The [`Error`] names the failure kind
//! and, where known, the line and column, the number of characters consumed
//! and a short window of the input that follows.

pub mod builder;
pub mod comment;
pub mod de;
pub mod decode;
pub mod driver;
pub mod error;
pub mod lex;
pub mod macros;
pub mod map;
pub mod options;
pub mod state;
pub mod token;
pub mod value;

pub use builder::{Builders, MapBuilder, SequenceBuilder, ValueBuilders};
pub use comment::{Collection, CollectionKind, Commentator, NoComments};
pub use decode::{decode_with, Decoder};
pub use error::{Error, ErrorKind, Literal, Pos, Result};
pub use map::Map;
pub use options::{DecodeOptions, DEFAULT_MAX_DEPTH};
pub use token::{tokenize, Token, TokenKind};
pub use value::{Number, Value};

use serde::de::DeserializeOwned;
use std::io;

/// Decodes a document into a [`Value`] tree.
///
/// # Examples
///
/// ```rust
/// use serde_pleat::{decode_str, Value};
///
/// assert_eq!(decode_str("true").unwrap(), Value::Bool(true));
/// assert_eq!(
///     decode_str("- 5\n- 10\n- 12").unwrap(),
///     Value::from(vec![Value::from(5), Value::from(10), Value::from(12)])
/// );
/// ```
///
/// # Errors
///
/// Returns the first tokenizing or structural error in the document.
pub fn decode_str(input: &str) -> Result<Value> {
    decode_str_with_options(input, &DecodeOptions::default())
}

/// Decodes a document into a [`Value`] tree with custom options.
///
/// # Errors
///
/// Returns the first tokenizing or structural error in the document, or
/// [`ErrorKind::DepthLimit`] when nesting exceeds `options.max_depth`.
pub fn decode_str_with_options(input: &str, options: &DecodeOptions) -> Result<Value> {
    decode_with(input, options, ValueBuilders, NoComments).map(|(value, _)| value)
}

/// Deserialize an instance of type `T` from a [`Value`].
///
/// # Errors
///
/// Returns [`ErrorKind::TypeMismatch`] when the value's shape does not fit `T`.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(value)
}

/// Deserialize an instance of type `T` from a string of pleat text.
///
/// # Examples
///
/// ```rust
/// use serde_pleat::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("x: 1\ny: 2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the input is not a valid document or cannot be
/// deserialized to type `T`. Document errors include line and column
/// information.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(decode_str(s)?)
}

/// Deserialize an instance of type `T` from an I/O stream of pleat text.
///
/// # Examples
///
/// ```rust
/// use serde_pleat::from_reader;
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_reader(Cursor::new(b"x: 1\ny: 2")).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if reading from the reader fails, the input is not a
/// valid document, or the data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Deserialize an instance of type `T` from bytes of pleat text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not a valid document,
/// or cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}
