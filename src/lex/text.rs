//! Quoted strings and heredocs.
//!
//! The opening quote picks the flavour:
//!
//! | quote | escapes | newlines |
//! |-------|---------|----------|
//! | `'`   | no      | folded   |
//! | `"`   | yes     | folded   |
//! | `` ` `` | no    | kept     |
//!
//! Folding turns a newline and the blanks that start the following line into
//! one space.
//!
//! Repeating the opening quote right away makes the construct a heredoc when
//! a third quote follows: the rest of that line may name a closing tag, and
//! every following line is captured verbatim until a line holding only the
//! tag. The tag line's indentation is removed from every captured line, and
//! the body then follows the table above: a heredoc's blank lines stand for
//! the newlines a folding quote keeps.

use super::escape;
use crate::error::{Error, Literal, Result};
use crate::state::{looping, pass, Boxed, Label, Looping, Outcome, State, Step};

const HEREDOC: Label = Label("heredoc");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quote {
    Single,
    #[default]
    Double,
    Raw,
}

impl Quote {
    #[must_use]
    pub fn from_char(ch: char) -> Option<Quote> {
        match ch {
            '\'' => Some(Quote::Single),
            '"' => Some(Quote::Double),
            '`' => Some(Quote::Raw),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
            Quote::Raw => '`',
        }
    }

    #[must_use]
    pub fn escapes(self) -> bool {
        self == Quote::Double
    }

    #[must_use]
    pub fn folds(self) -> bool {
        self != Quote::Raw
    }

    fn closing(self) -> &'static str {
        match self {
            Quote::Single => "a closing single quote",
            Quote::Double => "a closing double quote",
            Quote::Raw => "a closing backtick",
        }
    }
}

/// Scratch space for the string automatons.
#[derive(Clone, Debug, Default)]
pub struct TextAcc {
    quote: Quote,
    buf: String,
    tag: String,
    heredoc: bool,
    ends_line: bool,
    pub(crate) code: u32,
    pub(crate) width: u32,
}

impl TextAcc {
    /// Starts a new string opened by `quote`.
    pub fn begin(&mut self, quote: Quote) {
        self.quote = quote;
        self.buf.clear();
        self.tag.clear();
        self.heredoc = false;
        self.ends_line = false;
    }

    #[must_use]
    pub fn quote(&self) -> Quote {
        self.quote
    }

    #[must_use]
    pub fn is_heredoc(&self) -> bool {
        self.heredoc
    }

    /// Whether the string consumed the end of its last line, as a heredoc's
    /// closing tag does.
    #[must_use]
    pub fn ends_line(&self) -> bool {
        self.ends_line
    }

    pub fn push(&mut self, ch: char) {
        self.buf.push(ch);
    }

    /// Hands out the decoded text, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }

    fn fold(&mut self) {
        if self.buf.ends_with('\r') {
            self.buf.pop();
        }
        self.buf.push(' ');
    }
}

/// Access to the string accumulator inside a larger context.
pub trait TextScratch {
    fn text(&mut self) -> &mut TextAcc;
}

impl TextScratch for TextAcc {
    fn text(&mut self) -> &mut TextAcc {
        self
    }
}

/// The automaton that runs right after the opening quote, which the caller
/// has already passed to [`TextAcc::begin`].
pub fn opened<C: TextScratch + 'static>() -> Boxed<C> {
    Box::new(Opened)
}

fn body<C: TextScratch + 'static>() -> Box<Looping<C, ()>> {
    Box::new(looping("string-body", (), body_char::<C>))
}

struct Opened;

impl<C: TextScratch + 'static> State<C> for Opened {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        if input == Some(cx.text().quote.as_char()) {
            return Outcome::next(SecondQuote);
        }
        body().next(cx, input)
    }
}

/// Two quotes in a row: an empty string, unless a third one opens a heredoc.
struct SecondQuote;

impl<C: TextScratch + 'static> State<C> for SecondQuote {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        let acc = cx.text();
        if input != Some(acc.quote.as_char()) {
            return Outcome::Unhandled;
        }
        acc.heredoc = true;
        Outcome::Next(heredoc_header())
    }
}

fn body_char<C: TextScratch + 'static>(
    this: Box<Looping<C, ()>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    let acc = cx.text();
    let quote = acc.quote;
    match input {
        Some(c) if c == quote.as_char() => Outcome::Next(pass()),
        Some('\\') if quote.escapes() => Outcome::Next(Step::new(escape::marker(), this).boxed()),
        Some('\n') if quote.folds() => {
            acc.fold();
            Outcome::Next(Step::new(Box::new(looping("fold", (), fold_blanks::<C>)), this).boxed())
        }
        Some(c) => {
            acc.push(c);
            this.again()
        }
        None => Outcome::fail(Error::eof(quote.closing())),
    }
}

fn fold_blanks<C: TextScratch + 'static>(
    this: Box<Looping<C, ()>>,
    _cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    match input {
        Some(' ' | '\t') => this.again(),
        _ => Outcome::Unhandled,
    }
}

fn heredoc_header<C: TextScratch + 'static>() -> Boxed<C> {
    let line = Step::new(
        Box::new(looping("header-blanks", (), header_blanks::<C>)),
        Step::new(
            Box::new(looping("header-tag", (), header_tag::<C>)),
            Step::new(
                Box::new(looping("header-blanks", (), header_blanks::<C>)),
                Box::new(HeaderEnd),
            )
            .boxed(),
        )
        .boxed(),
    );
    Step::labeled(HEREDOC, line.boxed(), Box::new(BadHeader)).boxed()
}

fn header_blanks<C: TextScratch + 'static>(
    this: Box<Looping<C, ()>>,
    _cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    match input {
        Some(' ' | '\t') => this.again(),
        _ => Outcome::Unhandled,
    }
}

fn header_tag<C: TextScratch + 'static>(
    this: Box<Looping<C, ()>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    match input {
        Some(c) if c.is_alphabetic() => {
            cx.text().tag.push(c);
            this.again()
        }
        _ => Outcome::Unhandled,
    }
}

struct HeaderEnd;

impl<C: TextScratch + 'static> State<C> for HeaderEnd {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        match input {
            Some('\r') => Outcome::Next(self),
            Some('\n') => {
                let acc = cx.text();
                let tag = if acc.tag.is_empty() {
                    acc.quote.as_char().to_string().repeat(3)
                } else {
                    std::mem::take(&mut acc.tag)
                };
                let doc = Heredoc {
                    tag,
                    lines: Vec::new(),
                    line: BodyLine::default(),
                };
                Outcome::Jump(HEREDOC, Box::new(looping("heredoc-body", doc, body_line::<C>)))
            }
            _ => Outcome::Unhandled,
        }
    }
}

struct BadHeader;

impl<C> State<C> for BadHeader {
    fn next(self: Box<Self>, _cx: &mut C, input: Option<char>) -> Outcome<C> {
        Outcome::fail(Error::invalid(input, "a heredoc tag followed by a newline"))
    }
}

#[derive(Clone, Debug, Default)]
struct BodyLine {
    lead: String,
    text: String,
}

/// Lines captured so far, plus the one being read.
struct Heredoc {
    tag: String,
    lines: Vec<BodyLine>,
    line: BodyLine,
}

impl Heredoc {
    fn at_tag(&self) -> bool {
        self.line.text.trim_end() == self.tag
    }

    fn end_line(&mut self) {
        let mut line = std::mem::take(&mut self.line);
        if line.text.ends_with('\r') {
            line.text.pop();
        }
        self.lines.push(line);
    }

    /// Joins the captured lines with the tag line's indentation removed.
    ///
    /// Raw heredocs keep every line break. The others fold: adjacent text
    /// lines are joined by a space and each blank line becomes one newline.
    /// Double-quoted heredocs then have their escapes processed.
    fn render(&self, quote: Quote) -> Result<String> {
        let cut = self.line.lead.chars().count();
        let mut out = String::new();
        let mut after_text = false;
        for (index, line) in self.lines.iter().enumerate() {
            let indent = line.lead.chars().count();
            let blank = line.text.is_empty();
            if indent < cut && !blank {
                return Err(Error::malformed(
                    Literal::Heredoc,
                    format!(
                        "line {} is indented {} columns, less than the closing tag's {}",
                        index + 1,
                        indent,
                        cut
                    ),
                ));
            }
            if !quote.folds() {
                out.extend(line.lead.chars().skip(cut));
                out.push_str(&line.text);
                out.push('\n');
            } else if blank {
                out.push('\n');
                after_text = false;
            } else {
                if after_text {
                    out.push(' ');
                }
                out.extend(line.lead.chars().skip(cut));
                out.push_str(&line.text);
                after_text = true;
            }
        }
        if quote.escapes() {
            return escape::unescape(&out);
        }
        Ok(out)
    }
}

fn body_line<C: TextScratch + 'static>(
    mut this: Box<Looping<C, Heredoc>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    let doc = &mut this.data;
    match input {
        Some(c @ (' ' | '\t')) if doc.line.text.is_empty() => {
            doc.line.lead.push(c);
            this.again()
        }
        Some('\n') if doc.at_tag() => close(cx, &this.data, Outcome::Next(pass())),
        Some('\n') => {
            doc.end_line();
            this.again()
        }
        Some(c) => {
            doc.line.text.push(c);
            this.again()
        }
        None if doc.at_tag() => close(cx, &this.data, Outcome::Unhandled),
        None => Outcome::fail(Error::eof(format!("the closing tag `{}`", doc.tag))),
    }
}

fn close<C: TextScratch>(cx: &mut C, doc: &Heredoc, then: Outcome<C>) -> Outcome<C> {
    let acc = cx.text();
    match doc.render(acc.quote) {
        Ok(text) => {
            acc.buf = text;
            acc.ends_line = true;
            then
        }
        Err(err) => Outcome::fail(err),
    }
}
