//! Error types for prefix and range parsing.

use thiserror::Error;

/// Errors produced while building or parsing prefix IDs and ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    /// A prefix length exceeded the key width.
    #[error("length is too large, max {max}, got: {got}")]
    LengthTooLarge {
        /// The requested length.
        got: u8,
        /// The key width in bits.
        max: u8,
    },

    /// Range bounds were reversed or had mismatched lengths.
    #[error("invalid range {from}-{to}")]
    InvalidRange {
        /// The lower bound value.
        from: u64,
        /// The upper bound value.
        to: u64,
    },

    /// A range string was missing the `-` separator.
    #[error("no hyphen in range {0:?}")]
    NoHyphen(String),

    /// The `from` bound of a range string did not parse in the key width.
    #[error("invalid from id {id:?} in range {range:?}")]
    InvalidFrom {
        /// The offending bound text.
        id: String,
        /// The full range text.
        range: String,
    },

    /// The `to` bound of a range string did not parse in the key width.
    #[error("invalid to id {id:?} in range {range:?}")]
    InvalidTo {
        /// The offending bound text.
        id: String,
        /// The full range text.
        range: String,
    },

    /// A prefix ID string was not of the `value/length` form.
    #[error("invalid prefix id {0:?}")]
    InvalidPid(String),
}
