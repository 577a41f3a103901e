//! Escape sequences inside double-quoted strings.
//!
//! The automaton starts right after the backslash. Single-character escapes
//! map through a fixed table; `x`, `u` and `U` read exactly 2, 4 or 8 hex
//! digits and emit the code point they spell, provided it is a Unicode scalar
//! value.

use super::text::{TextAcc, TextScratch};
use crate::driver::Parser;
use crate::error::{Error, Literal, Result};
use crate::state::{looping, pass, Boxed, Looping, Outcome, State, Step};

/// The state that reads the character after the escape marker.
pub fn marker<C: TextScratch + 'static>() -> Boxed<C> {
    Box::new(Marker)
}

/// Processes every escape sequence in `text`.
///
/// Used for bodies captured verbatim, such as double-quoted heredocs. The
/// error carries no position of its own; the caller's driver locates it.
pub fn unescape(text: &str) -> Result<String> {
    let mut parser = Parser::new(text, TextAcc::default());
    parser
        .parse_eof(Box::new(looping("unescape", (), plain::<TextAcc>)))
        .map_err(|err| Error::new(err.kind().clone()))?;
    Ok(parser.into_context().take())
}

fn plain<C: TextScratch + 'static>(
    this: Box<Looping<C, ()>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    match input {
        Some('\\') => Outcome::Next(Step::new(marker(), this).boxed()),
        Some(c) => {
            cx.text().push(c);
            this.again()
        }
        None => Outcome::finished(),
    }
}

fn simple(ch: char) -> Option<char> {
    Some(match ch {
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{b}',
        '\\' => '\\',
        '"' => '"',
        _ => return None,
    })
}

struct Marker;

impl<C: TextScratch + 'static> State<C> for Marker {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        let width = match input {
            Some('x') => 2,
            Some('u') => 4,
            Some('U') => 8,
            Some(c) => match simple(c) {
                Some(mapped) => {
                    cx.text().push(mapped);
                    return Outcome::Next(pass());
                }
                None => return Outcome::fail(Error::invalid(input, "an escape sequence")),
            },
            None => return Outcome::fail(Error::eof("an escape sequence")),
        };
        let acc = cx.text();
        acc.code = 0;
        acc.width = width;
        Outcome::next(looping("hex-escape", (), hex_digit::<C>))
    }
}

fn hex_digit<C: TextScratch + 'static>(
    this: Box<Looping<C, ()>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    let Some(digit) = input.and_then(|c| c.to_digit(16)) else {
        return Outcome::fail(Error::invalid(input, "a hex digit"));
    };
    let acc = cx.text();
    acc.code = acc.code * 16 + digit;
    acc.width -= 1;
    if acc.width > 0 {
        return this.again();
    }
    match char::from_u32(acc.code) {
        Some(ch) => {
            acc.push(ch);
            Outcome::Next(pass())
        }
        None => Outcome::fail(Error::malformed(
            Literal::Escape,
            format!("U+{:04X} is not a valid character", acc.code),
        )),
    }
}
