//! Map key signatures.
//!
//! A signature is one or more words, each ended by a colon that is kept in
//! the text: `name:`, `first name:`, `nested:key:`. A word starts with a letter
//! and continues with letters, digits, spaces or underscores.

use crate::error::{Error, Literal, Result};
use crate::state::{looping, Boxed, Looping, Outcome, State};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    text: String,
    /// A word was started and has not met its colon yet.
    pending: bool,
}

impl Signature {
    pub fn reset(&mut self) {
        self.text.clear();
        self.pending = false;
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the last word is still waiting for its colon.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// The complete key, colon included.
    pub fn resolve(&self) -> Result<String> {
        if self.pending || self.text.is_empty() {
            return Err(Error::malformed(
                Literal::Signature,
                "signature must end with a colon",
            ));
        }
        Ok(self.text.clone())
    }
}

pub trait SignatureScratch {
    fn signature(&mut self) -> &mut Signature;
}

impl SignatureScratch for Signature {
    fn signature(&mut self) -> &mut Signature {
        self
    }
}

/// Characters allowed after the first one of a word.
#[must_use]
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == ' ' || ch == '_'
}

pub fn signature<C: SignatureScratch + 'static>() -> Boxed<C> {
    Box::new(WordStart)
}

struct WordStart;

impl<C: SignatureScratch + 'static> State<C> for WordStart {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        match input {
            Some(c) if c.is_alphabetic() => {
                let sig = cx.signature();
                sig.text.push(c);
                sig.pending = true;
                Outcome::next(looping("word", (), word::<C>))
            }
            _ => Outcome::Unhandled,
        }
    }
}

fn word<C: SignatureScratch + 'static>(
    this: Box<Looping<C, ()>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    let sig = cx.signature();
    match input {
        Some(':') => {
            sig.text.push(':');
            sig.pending = false;
            Outcome::Next(Box::new(WordStart))
        }
        Some(c) if is_word_char(c) => {
            sig.text.push(c);
            this.again()
        }
        _ => Outcome::Unhandled,
    }
}
