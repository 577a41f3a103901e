//! Configuration options for pleat decoding.
//!
//! ## Examples
//!
//! ```rust
//! use serde_pleat::{decode_str_with_options, DecodeOptions, ErrorKind};
//!
//! let options = DecodeOptions::new().with_max_depth(2);
//! let err = decode_str_with_options("a:\n  b:\n    c: 1", &options).unwrap_err();
//! assert_eq!(err.kind(), &ErrorKind::DepthLimit(2));
//! ```

use crate::driver::DIAGNOSTIC_WINDOW;

/// Default limit on simultaneously open collections.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration options for pleat decoding.
///
/// # Examples
///
/// ```rust
/// use serde_pleat::DecodeOptions;
///
/// let options = DecodeOptions::new();
/// assert_eq!(options.diagnostic_window, 25);
/// assert_eq!(options.max_depth, Some(256));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Characters of unconsumed input quoted in error messages.
    pub diagnostic_window: usize,
    /// Maximum number of simultaneously open collections, inline arrays
    /// included. `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            diagnostic_window: DIAGNOSTIC_WINDOW,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how much unconsumed input errors quote. Zero disables the window.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_pleat::{decode_str_with_options, DecodeOptions};
    ///
    /// let options = DecodeOptions::new().with_diagnostic_window(3);
    /// let err = decode_str_with_options("a: @bcdef", &options).unwrap_err();
    /// assert_eq!(err.near(), Some("@bc"));
    /// ```
    #[must_use]
    pub fn with_diagnostic_window(mut self, window: usize) -> Self {
        self.diagnostic_window = window;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Lifts the nesting limit entirely.
    #[must_use]
    pub fn without_max_depth(mut self) -> Self {
        self.max_depth = None;
        self
    }
}
