//! The character-stream driver.
//!
//! A [`Parser`] owns the input, a cursor into it and the decoding context, and
//! feeds characters one at a time into a starting [`State`](crate::state::State)
//! until the input runs out, a state leaves a character unhandled, or a
//! terminal is reached.

use crate::error::{Error, ErrorKind, Pos, Result};
use crate::state::{Boxed, Outcome, Terminal};
use log::trace;

/// Default number of unconsumed characters attached to errors.
pub const DIAGNOSTIC_WINDOW: usize = 25;

/// Why [`Parser::parse`] stopped.
pub enum Halt<C> {
    /// The input ran out while this state was still live.
    Exhausted(Boxed<C>),
    /// A state reported that parsing is complete.
    Finished,
    Failed(Error),
}

pub struct Parser<'a, C> {
    input: &'a str,
    cursor: usize,
    offset: usize,
    pos: Pos,
    window: usize,
    cx: C,
    error: Option<Error>,
}

impl<'a, C: 'static> Parser<'a, C> {
    pub fn new(input: &'a str, cx: C) -> Self {
        Parser {
            input,
            cursor: 0,
            offset: 0,
            pos: Pos::default(),
            window: DIAGNOSTIC_WINDOW,
            cx,
            error: None,
        }
    }

    /// Sets how many unconsumed characters are quoted in error messages.
    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Feeds characters until the input is exhausted or a state stops.
    pub fn parse(&mut self, start: Boxed<C>) -> Halt<C> {
        let mut state = start;
        loop {
            let Some(ch) = self.input[self.cursor..].chars().next() else {
                return Halt::Exhausted(state);
            };
            trace!("{} <- {:?} at {}", state.name(), ch, self.pos);
            match state.next(&mut self.cx, Some(ch)) {
                Outcome::Next(next) => {
                    state = next;
                    self.advance(ch);
                }
                Outcome::Unhandled => return Halt::Failed(self.fail(Error::unhandled(Some(ch)))),
                Outcome::Done(Terminal::Finished) => {
                    self.advance(ch);
                    return Halt::Finished;
                }
                Outcome::Done(Terminal::Failed(err)) => return Halt::Failed(self.fail(err)),
                Outcome::Jump(label, _) => {
                    return Halt::Failed(self.fail(ErrorKind::UnresolvedJump(label.0).into()))
                }
            }
        }
    }

    /// Like [`parse`](Self::parse), but once the input is exhausted the last
    /// state receives the end-of-input character so it can resolve whatever it
    /// was still accumulating.
    ///
    /// A state that is still live after the end of input had nothing pending.
    pub fn parse_eof(&mut self, start: Boxed<C>) -> Result<()> {
        let state = match self.parse(start) {
            Halt::Exhausted(state) => state,
            Halt::Finished => return Ok(()),
            Halt::Failed(err) => return Err(err),
        };
        trace!("{} <- end of input at {}", state.name(), self.pos);
        match state.next(&mut self.cx, None) {
            Outcome::Next(_) | Outcome::Done(Terminal::Finished) => Ok(()),
            Outcome::Unhandled => Err(self.fail(Error::unhandled(None))),
            Outcome::Done(Terminal::Failed(err)) => Err(self.fail(err)),
            Outcome::Jump(label, _) => Err(self.fail(ErrorKind::UnresolvedJump(label.0).into())),
        }
    }

    fn advance(&mut self, ch: char) {
        self.cursor += ch.len_utf8();
        self.offset += 1;
        if ch == '\n' {
            self.pos.row += 1;
            self.pos.col = 0;
        } else {
            self.pos.col += 1;
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        let err = err.locate(self.pos, self.offset, self.remaining());
        self.error = Some(err.clone());
        err
    }

    /// Number of characters consumed so far.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Position of the next character to be consumed.
    #[must_use]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// A bounded window of the input that has not been consumed yet.
    #[must_use]
    pub fn remaining(&self) -> String {
        self.input[self.cursor..].chars().take(self.window).collect()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn context(&self) -> &C {
        &self.cx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.cx
    }

    pub fn into_context(self) -> C {
        self.cx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{looping, statement, Looping, Step};

    fn word(this: Box<Looping<String, ()>>, cx: &mut String, input: Option<char>) -> Outcome<String> {
        match input {
            Some(c) if c.is_alphabetic() => {
                cx.push(c);
                this.again()
            }
            _ => Outcome::Unhandled,
        }
    }

    fn semicolon(_cx: &mut String, input: Option<char>) -> Outcome<String> {
        match input {
            Some(';') => Outcome::finished(),
            None => Outcome::fail(Error::eof("';'")),
            ch => Outcome::fail(Error::invalid(ch, "';'")),
        }
    }

    fn statement_parser() -> Boxed<String> {
        Step::new(
            Box::new(looping("word", (), word)),
            Box::new(statement("semicolon", semicolon)),
        )
        .boxed()
    }

    #[test]
    fn test_parse_stops_on_finished() {
        let mut parser = Parser::new("abc;def", String::new());
        assert!(matches!(parser.parse(statement_parser()), Halt::Finished));
        assert_eq!(parser.offset(), 4);
        assert_eq!(parser.remaining(), "def");
        assert_eq!(parser.context(), "abc");
    }

    #[test]
    fn test_parse_reports_exhaustion() {
        let mut parser = Parser::new("abc", String::new());
        assert!(matches!(parser.parse(statement_parser()), Halt::Exhausted(_)));
        assert_eq!(parser.offset(), 3);
    }

    #[test]
    fn test_parse_eof_lets_state_resolve() {
        let mut parser = Parser::new("abc", String::new());
        let err = parser.parse_eof(statement_parser()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEof(_)));
        assert_eq!(err.offset(), Some(3));
        assert_eq!(parser.last_error(), Some(&err));
    }

    #[test]
    fn test_unhandled_character_is_located() {
        let mut parser = Parser::new("ab\ncd", String::new());
        let start: Boxed<String> = Box::new(looping("word", (), word));
        let Halt::Failed(err) = parser.parse(start) else {
            panic!("expected failure");
        };
        assert_eq!(err.kind(), &ErrorKind::UnhandledChar("<newline>".to_string()));
        assert_eq!(err.pos(), Some(Pos::new(0, 2)));
        assert_eq!(err.near(), Some("\ncd"));
    }

    #[test]
    fn test_window_is_bounded() {
        let input = format!("!{}", "x".repeat(100));
        let mut parser = Parser::new(&input, String::new()).with_window(5);
        let err = parser.parse_eof(statement_parser()).unwrap_err();
        assert_eq!(err.near(), Some("!xxxx"));
    }
}
