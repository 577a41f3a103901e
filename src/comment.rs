//! Comment event hooks.
//!
//! The document decoder reports its progress to a [`Commentator`] so a comment
//! subsystem can attach prose comments to the keys and collections around
//! them. Comment text arrives character by character through
//! [`Commentator::write`], each comment followed by a `'\n'`. Every hook has a
//! no-op default; [`NoComments`] uses them all.
//!
//! ## Examples
//!
//! ```rust
//! use serde_pleat::{decode_with, Commentator, DecodeOptions, ValueBuilders};
//!
//! #[derive(Default)]
//! struct Collect(String);
//!
//! impl Commentator for Collect {
//!     fn write(&mut self, ch: char) {
//!         self.0.push(ch);
//!     }
//! }
//!
//! let (_, comments) = decode_with(
//!     "# people\nname: \"Ann\" # first",
//!     &DecodeOptions::new(),
//!     ValueBuilders,
//!     Collect::default(),
//! )
//! .unwrap();
//! assert_eq!(comments.0, "# people\n# first\n");
//! ```

use crate::error::Pos;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    Map,
    Sequence,
    InlineArray,
}

/// A collection the decoder just opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collection {
    pub kind: CollectionKind,
    /// Number of collections open around this one.
    pub depth: usize,
    /// Position of the token that opened it.
    pub pos: Pos,
}

pub trait Commentator {
    /// Whether new maps and sequences should reserve a comment slot.
    fn reserve_slot(&self) -> bool {
        false
    }

    /// A map key or sequence marker was read. Sequence markers pass an
    /// empty key.
    fn on_key_decoded(&mut self, _key: &str) {}

    fn on_scalar_value(&mut self) {}

    fn on_collection_begin(&mut self, _collection: Collection) {}

    fn on_collection_end(&mut self) {}

    /// A line holding nothing but whitespace.
    fn on_blank_line(&mut self) {}

    fn write(&mut self, _ch: char) {}
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComments;

impl Commentator for NoComments {}
