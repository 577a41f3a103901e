//! The indentation-sensitive document decoder.
//!
//! [`Decoder`] consumes the token stream and assembles the value tree. It
//! keeps a stack of open collections ("frames"), each tagged with the column
//! its entries must start at. A key deeper than the innermost frame opens a
//! child collection; a shallower one closes frames until one sits exactly at
//! that column. Values are placed into the innermost frame's pending slot.
//!
//! ## Examples
//!
//! ```rust
//! use serde_pleat::{decode_str, value};
//!
//! let doc = "\
//! name: \"pleat\"
//! tags:
//!   - \"folded\"
//!   - \"indented\"
//! sizes: [1, 2,]";
//! assert_eq!(
//!     decode_str(doc).unwrap(),
//!     value!({
//!         "name:": "pleat",
//!         "tags:": ["folded", "indented"],
//!         "sizes:": [1, 2, null]
//!     })
//! );
//! ```

use crate::builder::{Builders, MapBuilder, SequenceBuilder, ValueBuilders};
use crate::comment::{Collection, CollectionKind, Commentator, NoComments};
use crate::driver::Parser;
use crate::error::{Error, ErrorKind, Literal, Pos, Result};
use crate::options::{DecodeOptions, DEFAULT_MAX_DEPTH};
use crate::token::{tokenizer, Lexer, Token, TokenKind, TokenSink};
use crate::Value;
use log::debug;

enum Partial<B: Builders> {
    Map { builder: B::Map, key: Option<String> },
    Sequence { builder: B::Sequence, len: usize },
}

impl<B: Builders> Partial<B> {
    /// Adds `value` under the pending key, or as the next element.
    fn put(self, value: Value) -> Result<Self> {
        match self {
            Partial::Map {
                builder,
                key: Some(key),
            } => Ok(Partial::Map {
                builder: builder.insert(key, value),
                key: None,
            }),
            Partial::Map { key: None, .. } => Err(ErrorKind::ExpectedKey("a value").into()),
            Partial::Sequence { builder, len } => Ok(Partial::Sequence {
                builder: builder.push(len, value),
                len: len + 1,
            }),
        }
    }

    fn finish(self) -> Value {
        match self {
            Partial::Map { builder, .. } => builder.finish(),
            Partial::Sequence { builder, .. } => builder.finish(),
        }
    }

    fn kind(&self) -> CollectionKind {
        match self {
            Partial::Map { .. } => CollectionKind::Map,
            Partial::Sequence { .. } => CollectionKind::Sequence,
        }
    }
}

struct Frame<B: Builders> {
    indent: usize,
    partial: Partial<B>,
}

/// Where a value goes once it is complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Root,
    Top,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expect {
    Element { after_separator: bool },
    Separator,
}

struct InlineArray<S> {
    builder: S,
    len: usize,
    expect: Expect,
    slot: Slot,
}

impl<S: SequenceBuilder> InlineArray<S> {
    fn push(mut self, value: Value) -> Self {
        self.builder = self.builder.push(self.len, value);
        self.len += 1;
        self.expect = Expect::Separator;
        self
    }
}

enum Mode<S> {
    /// Nothing read yet.
    DocStart,
    /// The innermost frame has a key or sequence marker without a value.
    WaitForValue,
    /// The innermost frame's last entry is complete.
    WaitForKey,
    /// The document is a single scalar or inline array, already read.
    DocValue,
    Array(InlineArray<S>),
}

/// Assembles tokens into a value tree.
///
/// The decoder is a [`TokenSink`]: plug it into a [`Lexer`] and the tokenizer
/// streams tokens straight into it. Call [`finish`](Decoder::finish) once the
/// input is exhausted.
pub struct Decoder<B: Builders = ValueBuilders, K: Commentator = NoComments> {
    builders: B,
    commentator: K,
    max_depth: Option<usize>,
    frames: Vec<Frame<B>>,
    mode: Mode<B::Sequence>,
    root: Option<Value>,
}

impl<B: Builders, K: Commentator> Decoder<B, K> {
    pub fn new(builders: B, commentator: K) -> Self {
        Decoder {
            builders,
            commentator,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            frames: Vec::new(),
            mode: Mode::DocStart,
            root: None,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn commentator(&self) -> &K {
        &self.commentator
    }

    /// Closes every open collection and returns the root value together with
    /// the commentator.
    ///
    /// An empty document decodes to [`Value::Null`]; a key without a value
    /// gets [`Value::Null`] too.
    pub fn finish(mut self) -> Result<(Value, K)> {
        match std::mem::replace(&mut self.mode, Mode::DocStart) {
            Mode::Array(_) => return Err(ErrorKind::UnclosedArray.into()),
            Mode::WaitForValue => {
                self.put(Value::Null)?;
                self.collapse()?;
            }
            Mode::WaitForKey => self.collapse()?,
            Mode::DocStart | Mode::DocValue => {}
        }
        Ok((self.root.unwrap_or_default(), self.commentator))
    }

    fn dispatch(&mut self, token: Token) -> Result<()> {
        let desc = token.kind.describe();
        let pos = token.pos;
        if let TokenKind::Comment(text) = &token.kind {
            self.comment(text);
            return Ok(());
        }
        match std::mem::replace(&mut self.mode, Mode::DocStart) {
            Mode::Array(array) => return self.array_token(array, token.kind, desc),
            mode => self.mode = mode,
        }
        match token.kind {
            TokenKind::Key(key) => self.key(key, pos, desc),
            TokenKind::OpenArray => self.open_array(pos),
            TokenKind::Separator | TokenKind::CloseArray => {
                Err(ErrorKind::ExpectedValue(desc).into())
            }
            kind => match scalar(kind) {
                Some(value) => self.scalar(value, pos, desc),
                None => Ok(()),
            },
        }
    }

    fn comment(&mut self, text: &str) {
        if text.is_empty() {
            self.commentator.on_blank_line();
            return;
        }
        for ch in text.chars() {
            self.commentator.write(ch);
        }
        self.commentator.write('\n');
    }

    fn key(&mut self, key: String, pos: Pos, desc: &'static str) -> Result<()> {
        if !key.is_empty() && !key.ends_with(':') {
            return Err(Error::malformed(
                Literal::Signature,
                "signature must end with a colon",
            ));
        }
        match self.mode {
            Mode::DocStart => self.push(&key, pos)?,
            Mode::WaitForValue => {
                if pos.col > self.top_indent() {
                    self.push(&key, pos)?;
                } else {
                    self.put(Value::Null)?;
                    self.pop_to(pos.col)?;
                }
            }
            Mode::WaitForKey => self.pop_to(pos.col)?,
            Mode::DocValue => return Err(ErrorKind::TrailingValue(desc).into()),
            Mode::Array(_) => return Err(ErrorKind::ExpectedValue(desc).into()),
        }
        self.set_key(key)
    }

    fn scalar(&mut self, value: Value, pos: Pos, desc: &'static str) -> Result<()> {
        let slot = self.prepare(pos.col, desc)?;
        self.place(slot, value)?;
        self.commentator.on_scalar_value();
        Ok(())
    }

    fn open_array(&mut self, pos: Pos) -> Result<()> {
        self.check_depth(self.frames.len())?;
        let slot = self.prepare(pos.col, "'['")?;
        let builder = self.builders.sequence(self.commentator.reserve_slot());
        debug!("open inline array at {}", pos);
        self.commentator.on_collection_begin(Collection {
            kind: CollectionKind::InlineArray,
            depth: self.frames.len(),
            pos,
        });
        self.mode = Mode::Array(InlineArray {
            builder,
            len: 0,
            expect: Expect::Element {
                after_separator: false,
            },
            slot,
        });
        Ok(())
    }

    fn array_token(
        &mut self,
        array: InlineArray<B::Sequence>,
        kind: TokenKind,
        desc: &'static str,
    ) -> Result<()> {
        match kind {
            TokenKind::OpenArray => Err(ErrorKind::NestedArray.into()),
            TokenKind::Key(_) => Err(ErrorKind::ExpectedValue(desc).into()),
            TokenKind::Separator => {
                let array = match array.expect {
                    Expect::Element { .. } => array.push(Value::Null),
                    Expect::Separator => array,
                };
                self.mode = Mode::Array(InlineArray {
                    expect: Expect::Element {
                        after_separator: true,
                    },
                    ..array
                });
                Ok(())
            }
            TokenKind::CloseArray => {
                let array = match array.expect {
                    Expect::Element {
                        after_separator: true,
                    } => array.push(Value::Null),
                    _ => array,
                };
                debug!("close inline array of {} elements", array.len);
                self.commentator.on_collection_end();
                self.place(array.slot, array.builder.finish())
            }
            kind => {
                if array.expect == Expect::Separator {
                    return Err(ErrorKind::ExpectedSeparator(desc).into());
                }
                let array = match scalar(kind) {
                    Some(value) => array.push(value),
                    None => array,
                };
                self.commentator.on_scalar_value();
                self.mode = Mode::Array(array);
                Ok(())
            }
        }
    }

    /// Decides where a value starting at `col` belongs, closing frames on the
    /// way if needed.
    fn prepare(&mut self, col: usize, desc: &'static str) -> Result<Slot> {
        match self.mode {
            Mode::DocStart => Ok(Slot::Root),
            Mode::WaitForValue if col >= self.top_indent() => Ok(Slot::Top),
            Mode::WaitForValue => {
                self.put(Value::Null)?;
                self.pop_to(col)?;
                Err(ErrorKind::ExpectedKey(desc).into())
            }
            Mode::WaitForKey => Err(ErrorKind::ExpectedKey(desc).into()),
            Mode::DocValue => Err(ErrorKind::TrailingValue(desc).into()),
            Mode::Array(_) => Err(ErrorKind::NestedArray.into()),
        }
    }

    fn place(&mut self, slot: Slot, value: Value) -> Result<()> {
        match slot {
            Slot::Root => {
                self.root = Some(value);
                self.mode = Mode::DocValue;
            }
            Slot::Top => {
                self.put(value)?;
                self.mode = Mode::WaitForKey;
            }
        }
        Ok(())
    }

    fn check_depth(&self, open: usize) -> Result<()> {
        match self.max_depth {
            Some(max) if open >= max => Err(ErrorKind::DepthLimit(max).into()),
            _ => Ok(()),
        }
    }

    fn push(&mut self, key: &str, pos: Pos) -> Result<()> {
        self.check_depth(self.frames.len())?;
        let reserve = self.commentator.reserve_slot();
        let partial = if key.is_empty() {
            Partial::Sequence {
                builder: self.builders.sequence(reserve),
                len: 0,
            }
        } else {
            Partial::Map {
                builder: self.builders.map(reserve),
                key: None,
            }
        };
        let kind = partial.kind();
        debug!("open {:?} at column {}", kind, pos.col);
        self.commentator.on_collection_begin(Collection {
            kind,
            depth: self.frames.len(),
            pos,
        });
        self.frames.push(Frame {
            indent: pos.col,
            partial,
        });
        Ok(())
    }

    fn set_key(&mut self, key: String) -> Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(ErrorKind::ExpectedValue("a key").into());
        };
        match (&mut frame.partial, key.is_empty()) {
            (Partial::Map { .. }, true) => return Err(ErrorKind::IndexInMap.into()),
            (Partial::Sequence { .. }, false) => return Err(ErrorKind::KeyInSequence.into()),
            (Partial::Sequence { .. }, true) => self.commentator.on_key_decoded(""),
            (Partial::Map { key: pending, .. }, false) => {
                self.commentator.on_key_decoded(&key);
                *pending = Some(key);
            }
        }
        self.mode = Mode::WaitForValue;
        Ok(())
    }

    fn top_indent(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.indent)
    }

    /// Stores `value` in the innermost frame's pending slot, or as the root
    /// when no frame is open.
    fn put(&mut self, value: Value) -> Result<()> {
        match self.frames.pop() {
            Some(Frame { indent, partial }) => self.frames.push(Frame {
                indent,
                partial: partial.put(value)?,
            }),
            None => self.root = Some(value),
        }
        Ok(())
    }

    fn pop_frame(&mut self) -> Result<()> {
        let Some(frame) = self.frames.pop() else {
            return Ok(());
        };
        debug!("close {:?} at column {}", frame.partial.kind(), frame.indent);
        self.commentator.on_collection_end();
        let value = frame.partial.finish();
        self.put(value)
    }

    /// Closes frames until the innermost one sits at `col`. The outermost
    /// frame is never closed here.
    fn pop_to(&mut self, col: usize) -> Result<()> {
        while self.frames.len() > 1 && self.top_indent() > col {
            self.pop_frame()?;
        }
        let indent = self.top_indent();
        if indent != col {
            return Err(ErrorKind::IndentMismatch {
                expected: indent,
                found: col,
            }
            .into());
        }
        Ok(())
    }

    fn collapse(&mut self) -> Result<()> {
        while !self.frames.is_empty() {
            self.pop_frame()?;
        }
        Ok(())
    }
}

impl<B: Builders, K: Commentator> TokenSink for Decoder<B, K> {
    fn accept(&mut self, token: Token) -> Result<()> {
        let pos = token.pos;
        self.dispatch(token).map_err(|err| err.at(pos))
    }
}

fn scalar(kind: TokenKind) -> Option<Value> {
    match kind {
        TokenKind::Bool(b) => Some(Value::Bool(b)),
        TokenKind::Number(n) => Some(Value::Number(n)),
        TokenKind::InterpretedString(s) | TokenKind::RawString(s) => Some(Value::String(s)),
        _ => None,
    }
}

/// Decodes `input` with caller-supplied builders and comment hooks.
///
/// Returns the root value and the commentator, so hooks that collected
/// comments can be inspected afterwards.
pub fn decode_with<B, K>(
    input: &str,
    options: &DecodeOptions,
    builders: B,
    commentator: K,
) -> Result<(Value, K)>
where
    B: Builders + 'static,
    K: Commentator + 'static,
{
    debug!("decoding {} characters", input.chars().count());
    let decoder = Decoder::new(builders, commentator).with_max_depth(options.max_depth);
    let mut parser =
        Parser::new(input, Lexer::new(decoder)).with_window(options.diagnostic_window);
    parser.parse_eof(tokenizer())?;
    let end = parser.pos();
    let decoded = parser
        .into_context()
        .into_sink()
        .finish()
        .map_err(|err| err.at(end));
    debug!("decoding finished: {}", if decoded.is_ok() { "ok" } else { "failed" });
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;
    use crate::Map;

    fn decode(input: &str) -> Result<Value> {
        decode_with(input, &DecodeOptions::default(), ValueBuilders, NoComments).map(|(v, _)| v)
    }

    fn int(i: i64) -> Value {
        Value::Number(Number::Integer(i))
    }

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Map>(),
        )
    }

    fn kind(input: &str) -> ErrorKind {
        decode(input).unwrap_err().kind().clone()
    }

    #[test]
    fn test_scalars_at_root() {
        assert_eq!(decode("true").unwrap(), Value::Bool(true));
        assert_eq!(decode("-5").unwrap(), int(-5));
        assert_eq!(decode("").unwrap(), Value::Null);
        assert_eq!(decode("# only a comment\n\n").unwrap(), Value::Null);
    }

    #[test]
    fn test_nested_collections() {
        let doc = "a:\n  b: 1\n  c:\n    - 2\n    - 3\nd: 4";
        assert_eq!(
            decode(doc).unwrap(),
            map(vec![
                ("a:", map(vec![("b:", int(1)), ("c:", Value::from(vec![int(2), int(3)]))])),
                ("d:", int(4)),
            ])
        );
    }

    #[test]
    fn test_sequence_of_maps() {
        let doc = "- a: 1\n  b: 2\n- a: 3";
        assert_eq!(
            decode(doc).unwrap(),
            Value::from(vec![
                map(vec![("a:", int(1)), ("b:", int(2))]),
                map(vec![("a:", int(3))]),
            ])
        );
    }

    #[test]
    fn test_sequence_of_sequences() {
        assert_eq!(
            decode("- - 1\n  - 2\n- 3").unwrap(),
            Value::from(vec![Value::from(vec![int(1), int(2)]), int(3)])
        );
    }

    #[test]
    fn test_implicit_nulls() {
        assert_eq!(
            decode("a:\nb: 1\nc:").unwrap(),
            map(vec![("a:", Value::Null), ("b:", int(1)), ("c:", Value::Null)])
        );
        assert_eq!(
            decode("-\n- 1").unwrap(),
            Value::from(vec![Value::Null, int(1)])
        );
        assert_eq!(
            decode("a:\n  b:\nc: 1").unwrap(),
            map(vec![("a:", map(vec![("b:", Value::Null)])), ("c:", int(1))])
        );
    }

    #[test]
    fn test_value_on_next_line() {
        assert_eq!(decode("a:\n  5").unwrap(), map(vec![("a:", int(5))]));
    }

    #[test]
    fn test_duplicate_keys_keep_first_position() {
        assert_eq!(
            decode("a: 1\nb: 2\na: 3").unwrap(),
            map(vec![("a:", int(3)), ("b:", int(2))])
        );
    }

    #[test]
    fn test_indent_mismatch() {
        assert_eq!(
            kind("a:\n    b: 1\n  c: 2"),
            ErrorKind::IndentMismatch {
                expected: 0,
                found: 2,
            }
        );
        assert_eq!(
            kind("  a: 1\nb: 2"),
            ErrorKind::IndentMismatch {
                expected: 2,
                found: 0,
            }
        );
    }

    #[test]
    fn test_structural_violations() {
        assert_eq!(kind("- 1\na: 2"), ErrorKind::KeyInSequence);
        assert_eq!(kind("a:\n- 1"), ErrorKind::IndexInMap);
        assert_eq!(kind("- 1\n-5"), ErrorKind::ExpectedKey("a number"));
        assert_eq!(kind("a: 1 2"), ErrorKind::ExpectedKey("a number"));
        assert_eq!(kind("1\n2"), ErrorKind::TrailingValue("a number"));
        assert_eq!(kind("1\na: 2"), ErrorKind::TrailingValue("a key"));
        assert_eq!(kind("a: ]"), ErrorKind::ExpectedValue("']'"));
    }

    #[test]
    fn test_shallower_value_is_rejected() {
        assert_eq!(kind("a:\n  b:\n 1"), ErrorKind::IndentMismatch { expected: 0, found: 1 });
        assert_eq!(kind("a:\n  b:\n\"x\""), ErrorKind::ExpectedKey("a string"));
    }

    #[test]
    fn test_errors_carry_token_position() {
        let err = decode("a: 1\n  - 2").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IndentMismatch { expected: 0, found: 2 });
        assert_eq!(err.pos(), Some(Pos::new(1, 2)));
    }

    #[test]
    fn test_inline_arrays() {
        assert_eq!(decode("[]").unwrap(), Value::from(Vec::<Value>::new()));
        assert_eq!(
            decode("[,]").unwrap(),
            Value::from(vec![Value::Null, Value::Null])
        );
        assert_eq!(decode("[1,]").unwrap(), Value::from(vec![int(1), Value::Null]));
        assert_eq!(
            decode("a: [1, \"x\", true]\nb: 2").unwrap(),
            map(vec![
                ("a:", Value::from(vec![int(1), Value::from("x"), Value::Bool(true)])),
                ("b:", int(2)),
            ])
        );
        assert_eq!(
            decode("- [1,\n   2]\n- 3").unwrap(),
            Value::from(vec![Value::from(vec![int(1), int(2)]), int(3)])
        );
    }

    #[test]
    fn test_inline_array_errors() {
        assert_eq!(kind("[[1]]"), ErrorKind::NestedArray);
        assert_eq!(kind("[1 2]"), ErrorKind::ExpectedSeparator("a number"));
        assert_eq!(kind("[a: 1]"), ErrorKind::ExpectedValue("a key"));
        assert_eq!(kind("a: [1, 2"), ErrorKind::UnclosedArray);
    }

    #[test]
    fn test_depth_limit() {
        let options = DecodeOptions::new().with_max_depth(1);
        let decode = |input: &str| decode_with(input, &options, ValueBuilders, NoComments);
        assert!(decode("a: 1\nb: [1]").is_err());
        assert!(decode("a: 1\nb: 2").is_ok());
        assert_eq!(
            decode("a:\n  b: 1").unwrap_err().kind(),
            &ErrorKind::DepthLimit(1)
        );
    }

    #[test]
    fn test_map_value_needs_pending_key() {
        let partial = Partial::<ValueBuilders>::Map {
            builder: ValueBuilders.map(false),
            key: None,
        };
        let err = partial.put(Value::Null).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ExpectedKey("a value"));

        let partial = Partial::<ValueBuilders>::Map {
            builder: ValueBuilders.map(false),
            key: Some("a:".to_string()),
        };
        let Partial::Map { builder, key } = partial.put(int(1)).unwrap() else {
            panic!("map partial turned into a sequence");
        };
        assert_eq!(key, None);
        assert_eq!(builder.finish(), map(vec![("a:", int(1))]));
    }

    #[derive(Default)]
    struct Events(Vec<String>);

    impl Commentator for Events {
        fn on_key_decoded(&mut self, key: &str) {
            self.0.push(format!("key {key}"));
        }

        fn on_scalar_value(&mut self) {
            self.0.push("scalar".to_string());
        }

        fn on_collection_begin(&mut self, collection: Collection) {
            self.0.push(format!("begin {:?} {}", collection.kind, collection.depth));
        }

        fn on_collection_end(&mut self) {
            self.0.push("end".to_string());
        }

        fn on_blank_line(&mut self) {
            self.0.push("blank".to_string());
        }
    }

    #[test]
    fn test_commentator_events() {
        let (_, events) = decode_with(
            "a:\n  - 1\n\nb: [2]",
            &DecodeOptions::default(),
            ValueBuilders,
            Events::default(),
        )
        .unwrap();
        assert_eq!(
            events.0,
            vec![
                "begin Map 0",
                "key a:",
                "begin Sequence 1",
                "key ",
                "scalar",
                "blank",
                "end",
                "key b:",
                "begin InlineArray 1",
                "scalar",
                "end",
                "end",
            ]
        );
    }
}
