//! Lexical sub-decoders.
//!
//! Each literal sub-grammar is a small automaton built from the combinators in
//! [`crate::state`]. The automatons are generic over the decoding context: they
//! only require access to their own scratch accumulator, expressed by the
//! `*Scratch` traits, so the tokenizer can embed all of them in one context and
//! tests can drive each one on its own.

pub mod escape;
pub mod number;
pub mod signature;
pub mod text;

pub use number::{NumberAcc, NumberScratch};
pub use signature::{Signature, SignatureScratch};
pub use text::{Quote, TextAcc, TextScratch};

/// Blanks that may appear between tokens and in indentation.
pub(crate) fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r')
}
