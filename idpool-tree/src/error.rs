//! Error types for tree façades.

use core::fmt;

use idpool_prefix::PrefixError;
use thiserror::Error;

/// Errors surfaced by the tree façades.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// An ID lies outside the configured window.
    #[error("id {id} is bigger than max allowed entries: {max}")]
    OutOfBounds {
        /// The offending ID value.
        id: u64,
        /// The window maximum.
        max: u64,
    },

    /// A claim hit an already-claimed exact prefix.
    #[error("entry {0} already exists")]
    Exists(String),

    /// A lookup, update or release named an absent prefix.
    #[error("entry {0} not found")]
    NotFound(String),

    /// `claim_free` found no unallocated prefix in the window.
    #[error("no free id available")]
    Exhausted,

    /// The requested allocation length exceeds the key width.
    #[error("cannot create a tree with allocation length > {max}, got: {got}")]
    LengthTooLarge {
        /// The requested allocation length.
        got: u8,
        /// The key width in bits.
        max: u8,
    },

    /// A range or prefix string failed to parse.
    #[error(transparent)]
    Prefix(#[from] PrefixError),

    /// Multiple failures from one bulk operation.
    #[error("{0}")]
    Multiple(Errors),
}

/// A list of failures accumulated across one bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Errors(
    /// The individual failures, in operation order.
    pub Vec<TreeError>,
);

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}
