//! The tokenizer.
//!
//! Lexing runs in [`Parallel`] with a position tracker: the lexer reads the
//! character at [`Lexer`]'s current position, then the tracker moves the
//! position past it. Tokens are pushed into a [`TokenSink`] as soon as they
//! are complete, so the document decoder can consume them without an
//! intermediate buffer.
//!
//! Each line starts with indentation, after which tokens must be separated by
//! blanks. Only `,` and `]` may follow a token directly.

use crate::driver::Parser;
use crate::error::{Error, ErrorKind, Pos, Result};
use crate::lex::{
    is_blank, number, signature, text, NumberAcc, NumberScratch, Quote, Signature,
    SignatureScratch, TextAcc, TextScratch,
};
use crate::state::{leave, looping, Boxed, FirstOf, Label, Looping, Outcome, Parallel, State, Step};
use crate::value::Number;

/// Unwinds a word once one reading of it has been emitted.
const WORD: Label = Label("word");

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// Where the token starts. For keys and scalars `pos.col` is the
    /// indentation signal.
    pub pos: Pos,
    pub kind: TokenKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Bool(bool),
    Number(Number),
    /// A single- or double-quoted string, or a heredoc opened by either.
    InterpretedString(String),
    /// A backtick string or heredoc.
    RawString(String),
    /// A comment including its `#`. Blank lines produce an empty comment.
    Comment(String),
    /// A map key with its colon, or the empty sequence marker.
    Key(String),
    OpenArray,
    Separator,
    CloseArray,
}

impl TokenKind {
    /// A short description for error messages.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Bool(_) => "a boolean",
            TokenKind::Number(_) => "a number",
            TokenKind::InterpretedString(_) | TokenKind::RawString(_) => "a string",
            TokenKind::Comment(_) => "a comment",
            TokenKind::Key(key) if key.is_empty() => "a sequence marker",
            TokenKind::Key(_) => "a key",
            TokenKind::OpenArray => "'['",
            TokenKind::Separator => "','",
            TokenKind::CloseArray => "']'",
        }
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TokenKind::Bool(_)
                | TokenKind::Number(_)
                | TokenKind::InterpretedString(_)
                | TokenKind::RawString(_)
        )
    }
}

/// Receives tokens as the tokenizer completes them.
pub trait TokenSink {
    fn accept(&mut self, token: Token) -> Result<()>;
}

impl TokenSink for Vec<Token> {
    fn accept(&mut self, token: Token) -> Result<()> {
        self.push(token);
        Ok(())
    }
}

/// The tokenizer's context: the sink plus every sub-decoder's scratch space.
pub struct Lexer<S> {
    sink: S,
    /// Position of the character being read.
    pos: Pos,
    /// Position of the first character of the current token.
    start: Pos,
    number: NumberAcc,
    text: TextAcc,
    signature: Signature,
    comment: String,
}

impl<S: TokenSink> Lexer<S> {
    pub fn new(sink: S) -> Self {
        Lexer {
            sink,
            pos: Pos::default(),
            start: Pos::default(),
            number: NumberAcc::default(),
            text: TextAcc::default(),
            signature: Signature::default(),
            comment: String::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn emit(&mut self, kind: TokenKind) -> Result<()> {
        self.sink.accept(Token {
            pos: self.start,
            kind,
        })
    }
}

impl<S> NumberScratch for Lexer<S> {
    fn number(&mut self) -> &mut NumberAcc {
        &mut self.number
    }
}

impl<S> TextScratch for Lexer<S> {
    fn text(&mut self) -> &mut TextAcc {
        &mut self.text
    }
}

impl<S> SignatureScratch for Lexer<S> {
    fn signature(&mut self) -> &mut Signature {
        &mut self.signature
    }
}

/// The root automaton: lexing and position tracking over the same characters.
pub fn tokenizer<S: TokenSink + 'static>() -> Boxed<Lexer<S>> {
    Box::new(Parallel::<Lexer<S>>::new(vec![
        Box::new(LineStart),
        Box::new(looping("position", (), track::<S>)),
    ]))
}

/// Splits `input` into tokens.
///
/// # Examples
///
/// ```rust
/// use serde_pleat::{tokenize, TokenKind};
///
/// let tokens = tokenize("- 5").unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Key(String::new()));
/// assert_eq!(tokens[1].pos.col, 2);
/// ```
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut parser = Parser::new(input, Lexer::new(Vec::new()));
    parser.parse_eof(tokenizer())?;
    Ok(parser.into_context().into_sink())
}

fn track<S: TokenSink + 'static>(
    this: Box<Looping<Lexer<S>, ()>>,
    cx: &mut Lexer<S>,
    input: Option<char>,
) -> Outcome<Lexer<S>> {
    match input {
        Some('\n') => {
            cx.pos.row += 1;
            cx.pos.col = 0;
            this.again()
        }
        Some(_) => {
            cx.pos.col += 1;
            this.again()
        }
        None => Outcome::Unhandled,
    }
}

/// Feeds `input` to a fresh `state`.
fn redispatch<C, T: State<C>>(state: T, cx: &mut C, input: Option<char>) -> Outcome<C> {
    Box::new(state).next(cx, input)
}

fn ends_word(input: Option<char>) -> bool {
    match input {
        None => true,
        Some(c) => is_blank(c) || matches!(c, '\n' | ',' | ']'),
    }
}

/// Indentation. The first other character starts a token.
struct LineStart;

impl<S: TokenSink + 'static> State<Lexer<S>> for LineStart {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        match input {
            Some(c) if is_blank(c) => Outcome::Next(self),
            Some('\n') => {
                cx.start = Pos::new(cx.pos.row, 0);
                if let Err(err) = cx.emit(TokenKind::Comment(String::new())) {
                    return Outcome::fail(err);
                }
                Outcome::Next(self)
            }
            None => Outcome::finished(),
            Some(_) => start_token(cx, input),
        }
    }
}

/// Right after a token: only blanks, the end of the line, `,` or `]`.
struct AfterToken;

impl<S: TokenSink + 'static> State<Lexer<S>> for AfterToken {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        match input {
            Some(c) if is_blank(c) => Outcome::next(Gap),
            Some('\n') => Outcome::next(LineStart),
            None => Outcome::finished(),
            Some(',' | ']') => start_token(cx, input),
            ch => Outcome::fail(Error::invalid(ch, "whitespace between tokens")),
        }
    }
}

/// Blanks between tokens.
struct Gap;

impl<S: TokenSink + 'static> State<Lexer<S>> for Gap {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        match input {
            Some(c) if is_blank(c) => Outcome::Next(self),
            Some('\n') => Outcome::next(LineStart),
            None => Outcome::finished(),
            Some(_) => start_token(cx, input),
        }
    }
}

fn start_token<S: TokenSink + 'static>(cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
    cx.start = cx.pos;
    let candidates = FirstOf::<Lexer<S>>::new(vec![
        Box::new(CommentStart),
        Box::new(QuoteStart),
        Box::new(DashStart),
        Box::new(NumberStart),
        Box::new(Word),
        Box::new(Punctuation),
    ]);
    match redispatch(candidates, cx, input) {
        Outcome::Unhandled => Outcome::fail(Error::invalid(
            input,
            "a value, a key, a comment or a sequence marker",
        )),
        outcome => outcome,
    }
}

struct Punctuation;

impl<S: TokenSink + 'static> State<Lexer<S>> for Punctuation {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        let (kind, then): (TokenKind, Boxed<Lexer<S>>) = match input {
            Some('[') => (TokenKind::OpenArray, Box::new(Gap)),
            Some(',') => (TokenKind::Separator, Box::new(Gap)),
            Some(']') => (TokenKind::CloseArray, Box::new(AfterToken)),
            _ => return Outcome::Unhandled,
        };
        if let Err(err) = cx.emit(kind) {
            return Outcome::fail(err);
        }
        Outcome::Next(then)
    }
}

struct CommentStart;

impl<S: TokenSink + 'static> State<Lexer<S>> for CommentStart {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        if input != Some('#') {
            return Outcome::Unhandled;
        }
        cx.comment.clear();
        cx.comment.push('#');
        Outcome::next(looping("comment", (), comment::<S>))
    }
}

fn comment<S: TokenSink + 'static>(
    this: Box<Looping<Lexer<S>, ()>>,
    cx: &mut Lexer<S>,
    input: Option<char>,
) -> Outcome<Lexer<S>> {
    let Some(c) = input.filter(|&c| c != '\n') else {
        let mut text = std::mem::take(&mut cx.comment);
        if text.ends_with('\r') {
            text.pop();
        }
        if let Err(err) = cx.emit(TokenKind::Comment(text)) {
            return Outcome::fail(err);
        }
        return match input {
            Some(_) => Outcome::next(LineStart),
            None => Outcome::finished(),
        };
    };
    cx.comment.push(c);
    this.again()
}

struct QuoteStart;

impl<S: TokenSink + 'static> State<Lexer<S>> for QuoteStart {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        let Some(quote) = input.and_then(Quote::from_char) else {
            return Outcome::Unhandled;
        };
        cx.text.begin(quote);
        Outcome::Next(Step::new(text::opened(), Box::new(EmitText)).boxed())
    }
}

struct EmitText;

impl<S: TokenSink + 'static> State<Lexer<S>> for EmitText {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        let raw = cx.text.quote() == Quote::Raw;
        let ends_line = cx.text.ends_line();
        let value = cx.text.take();
        let kind = if raw {
            TokenKind::RawString(value)
        } else {
            TokenKind::InterpretedString(value)
        };
        if let Err(err) = cx.emit(kind) {
            return Outcome::fail(err);
        }
        if ends_line {
            redispatch(LineStart, cx, input)
        } else {
            redispatch(AfterToken, cx, input)
        }
    }
}

struct DashStart;

impl<S: TokenSink + 'static> State<Lexer<S>> for DashStart {
    fn next(self: Box<Self>, _cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        match input {
            Some('-') => Outcome::next(DashNext),
            _ => Outcome::Unhandled,
        }
    }
}

/// A dash followed by whitespace marks a sequence element; anything else
/// makes it the sign of a numeral.
struct DashNext;

impl<S: TokenSink + 'static> State<Lexer<S>> for DashNext {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        match input {
            None | Some(' ' | '\t' | '\r' | '\n') => {
                if let Err(err) = cx.emit(TokenKind::Key(String::new())) {
                    return Outcome::fail(err);
                }
                redispatch(AfterToken, cx, input)
            }
            _ => {
                cx.number.reset();
                cx.number.negate();
                redispatch(Step::new(number::magnitude(), Box::new(EmitNumber)), cx, input)
            }
        }
    }
}

struct NumberStart;

impl<S: TokenSink + 'static> State<Lexer<S>> for NumberStart {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        match input {
            Some(c) if c.is_ascii_digit() || c == '+' => {
                cx.number.reset();
                redispatch(Step::new(number::signed(), Box::new(EmitNumber)), cx, input)
            }
            _ => Outcome::Unhandled,
        }
    }
}

struct EmitNumber;

impl<S: TokenSink + 'static> State<Lexer<S>> for EmitNumber {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        let emitted = cx
            .number
            .resolve()
            .and_then(|value| cx.emit(TokenKind::Number(value)));
        match emitted {
            Ok(()) => redispatch(AfterToken, cx, input),
            Err(err) => Outcome::fail(err),
        }
    }
}

/// A word is raced as `true`, as `false` and as a signature. Whichever
/// reading completes first emits its token and leaves the race.
struct Word;

impl<S: TokenSink + 'static> State<Lexer<S>> for Word {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        match input {
            Some(c) if c.is_alphabetic() => {
                cx.signature.reset();
                let race = Parallel::<Lexer<S>>::new(vec![
                    Box::new(Keyword::new("true", true)),
                    Box::new(Keyword::new("false", false)),
                    Step::new(signature::signature(), Box::new(EmitKey)).boxed(),
                ]);
                redispatch(Step::labeled(WORD, Box::new(race), Box::new(BadWord)), cx, input)
            }
            _ => Outcome::Unhandled,
        }
    }
}

struct Keyword {
    word: &'static str,
    value: bool,
    matched: usize,
}

impl Keyword {
    fn new(word: &'static str, value: bool) -> Self {
        Keyword {
            word,
            value,
            matched: 0,
        }
    }
}

impl<S: TokenSink + 'static> State<Lexer<S>> for Keyword {
    fn next(mut self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        if let Some(expected) = self.word[self.matched..].chars().next() {
            if input != Some(expected) {
                return Outcome::Unhandled;
            }
            self.matched += expected.len_utf8();
            return Outcome::Next(self);
        }
        if !ends_word(input) {
            return Outcome::Unhandled;
        }
        if let Err(err) = cx.emit(TokenKind::Bool(self.value)) {
            return Outcome::fail(err);
        }
        leave(WORD, redispatch(AfterToken, cx, input))
    }

    fn name(&self) -> &'static str {
        self.word
    }
}

struct EmitKey;

impl<S: TokenSink + 'static> State<Lexer<S>> for EmitKey {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, input: Option<char>) -> Outcome<Lexer<S>> {
        let Ok(key) = cx.signature.resolve() else {
            return Outcome::Unhandled;
        };
        if let Err(err) = cx.emit(TokenKind::Key(key)) {
            return Outcome::fail(err);
        }
        leave(WORD, redispatch(AfterToken, cx, input))
    }
}

struct BadWord;

impl<S: TokenSink + 'static> State<Lexer<S>> for BadWord {
    fn next(self: Box<Self>, cx: &mut Lexer<S>, _input: Option<char>) -> Outcome<Lexer<S>> {
        Outcome::fail(ErrorKind::BadWord(cx.signature.as_str().to_string()).into())
    }
}
